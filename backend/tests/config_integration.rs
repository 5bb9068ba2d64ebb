//! Configuration loading: files, environment overrides and validation.

mod support;

use std::path::PathBuf;

use airq_forecast::config::{AppConfig, ScorerKind};
use airq_forecast::error::ConfigError;
use support::{with_scoped_env, write_fixture};

const CONFIG: &str = r#"
[data]
input = "measurements/who.csv"

[forecast]
horizon_years = 7
interval_width = 0.9

[resolver]
scorer = "levenshtein"

[[pollutants]]
key = "pm10"
label = "PM10 (μg/m3)"

[[aliases]]
token = "Oceania"
region = "Western Pacific Region"
"#;

const CLEAR: [(&str, Option<&str>); 3] = [
    ("AIRQ_INPUT", None),
    ("AIRQ_OUTPUT_DIR", None),
    ("AIRQ_HORIZON", None),
];

#[test]
fn test_load_file_without_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "airq.toml", CONFIG);

    let config = with_scoped_env(&CLEAR, || AppConfig::load(Some(&path))).unwrap();

    assert_eq!(config.data.input, PathBuf::from("measurements/who.csv"));
    assert_eq!(config.forecast.horizon_years, 7);
    assert_eq!(config.forecast.interval_width, 0.9);
    assert_eq!(config.resolver.scorer, ScorerKind::Levenshtein);
    assert_eq!(config.pollutants.len(), 1);
    assert_eq!(config.aliases.len(), 1);
    // Untouched sections keep their defaults.
    assert_eq!(config.data.region_column, "WHO Region");
    assert_eq!(config.output.chart_dir, PathBuf::from("results"));
}

#[test]
fn test_env_overrides_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "airq.toml", CONFIG);

    let config = with_scoped_env(
        &[
            ("AIRQ_INPUT", Some("/data/other.csv")),
            ("AIRQ_OUTPUT_DIR", Some("/tmp/charts")),
            ("AIRQ_HORIZON", Some("3")),
        ],
        || AppConfig::load(Some(&path)),
    )
    .unwrap();

    assert_eq!(config.data.input, PathBuf::from("/data/other.csv"));
    assert_eq!(config.output.chart_dir, PathBuf::from("/tmp/charts"));
    assert_eq!(config.forecast.horizon_years, 3);
}

#[test]
fn test_bad_horizon_override_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "airq.toml", CONFIG);

    let result = with_scoped_env(&[("AIRQ_HORIZON", Some("soon"))], || {
        AppConfig::load(Some(&path))
    });
    assert!(matches!(result, Err(ConfigError::Invalid(_))));

    let result = with_scoped_env(&[("AIRQ_HORIZON", Some("0"))], || {
        AppConfig::load(Some(&path))
    });
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_api_key_read_from_environment() {
    let config = AppConfig::default();

    let key = with_scoped_env(&[("GROQ_API_KEY", Some("test-key"))], || {
        config.narrative_api_key()
    });
    assert_eq!(key.as_deref(), Some("test-key"));

    let key = with_scoped_env(&[("GROQ_API_KEY", Some("  "))], || config.narrative_api_key());
    assert_eq!(key, None);

    let key = with_scoped_env(&[("GROQ_API_KEY", None)], || config.narrative_api_key());
    assert_eq!(key, None);
}

#[test]
fn test_invalid_interval_width_in_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "airq.toml", "[forecast]\ninterval_width = 1.5\n");

    let result = with_scoped_env(&CLEAR, || AppConfig::load(Some(&path)));
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_unreadable_file() {
    let result = with_scoped_env(&CLEAR, || {
        AppConfig::load(Some(std::path::Path::new("/no/such/airq.toml")))
    });
    assert!(matches!(result, Err(ConfigError::Read(_))));
}
