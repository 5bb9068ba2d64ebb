//! Application configuration.
//!
//! Configuration is read once from a TOML file, then overridden by environment
//! variables and finally by command-line flags. The resulting [`AppConfig`] is
//! immutable and handed to the services that need it.
//!
//! # Environment Variables
//! - `AIRQ_INPUT`: path of the input table
//! - `AIRQ_OUTPUT_DIR`: directory for chart artifacts
//! - `AIRQ_HORIZON`: forecast horizon in years
//! - `GROQ_API_KEY` (or the name set in `narrative.api_key_env`): narrative API key

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::models::{AliasEntry, Pollutant};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub forecast: ForecastSettings,
    /// Pollutant enumeration, in processing order.
    #[serde(default = "Pollutant::defaults")]
    pub pollutants: Vec<Pollutant>,
    /// Alias table, in matching order.
    #[serde(default = "default_aliases")]
    pub aliases: Vec<AliasEntry>,
    #[serde(default)]
    pub resolver: ResolverSettings,
    #[serde(default)]
    pub narrative: NarrativeSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

/// Input table settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSettings {
    #[serde(default = "default_input")]
    pub input: PathBuf,
    #[serde(default = "default_region_column")]
    pub region_column: String,
    #[serde(default = "default_year_column")]
    pub year_column: String,
}

/// Forecast engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSettings {
    #[serde(default = "default_horizon_years")]
    pub horizon_years: u32,
    /// Coverage of the uncertainty interval (0.8 = 80%).
    #[serde(default = "default_interval_width")]
    pub interval_width: f64,
    /// Fraction of the history in which changepoints may be placed.
    #[serde(default = "default_changepoint_range")]
    pub changepoint_range: f64,
    #[serde(default = "default_max_changepoints")]
    pub max_changepoints: usize,
    /// Ridge penalty on trend slope changes; larger values give straighter trends.
    #[serde(default = "default_changepoint_penalty")]
    pub changepoint_penalty: f64,
    #[serde(default = "default_seasonality_period_years")]
    pub seasonality_period_years: f64,
    #[serde(default = "default_seasonality_fourier_order")]
    pub seasonality_fourier_order: usize,
    /// Fit pollutants on parallel worker tasks.
    #[serde(default = "default_true")]
    pub concurrent: bool,
}

/// Similarity scorer used by the fuzzy stage of the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    /// `2 * LCS / (|a| + |b|)`
    SequenceRatio,
    /// `1 - distance / max(|a|, |b|)`
    Levenshtein,
}

/// Query resolver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverSettings {
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
    #[serde(default = "default_scorer")]
    pub scorer: ScorerKind,
}

/// Remote narrative service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

/// Artifact output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "default_chart_dir")]
    pub chart_dir: PathBuf,
}

fn default_input() -> PathBuf {
    PathBuf::from("data/Dataset.csv")
}

fn default_region_column() -> String {
    "WHO Region".to_string()
}

fn default_year_column() -> String {
    "Measurement Year".to_string()
}

fn default_horizon_years() -> u32 {
    10
}

fn default_interval_width() -> f64 {
    0.8
}

fn default_changepoint_range() -> f64 {
    0.8
}

fn default_max_changepoints() -> usize {
    25
}

fn default_changepoint_penalty() -> f64 {
    10.0
}

fn default_seasonality_period_years() -> f64 {
    1.0
}

fn default_seasonality_fourier_order() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_fuzzy_threshold() -> f64 {
    0.8
}

fn default_scorer() -> ScorerKind {
    ScorerKind::SequenceRatio
}

fn default_endpoint() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "llama3-70b-8192".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_chart_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_aliases() -> Vec<AliasEntry> {
    vec![
        AliasEntry::new("africa", "African Region"),
        AliasEntry::new("europa", "European Region"),
        AliasEntry::new("america", "Region of the Americas"),
        AliasEntry::new("pacifico", "Western Pacific Region"),
        AliasEntry::new("asia", "South East Asia Region"),
        AliasEntry::new("mediterraneo", "Eastern Mediterranean Region"),
    ]
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            input: default_input(),
            region_column: default_region_column(),
            year_column: default_year_column(),
        }
    }
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            horizon_years: default_horizon_years(),
            interval_width: default_interval_width(),
            changepoint_range: default_changepoint_range(),
            max_changepoints: default_max_changepoints(),
            changepoint_penalty: default_changepoint_penalty(),
            seasonality_period_years: default_seasonality_period_years(),
            seasonality_fourier_order: default_seasonality_fourier_order(),
            concurrent: true,
        }
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            fuzzy_threshold: default_fuzzy_threshold(),
            scorer: default_scorer(),
        }
    }
}

impl Default for NarrativeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_endpoint(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            chart_dir: default_chart_dir(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataSettings::default(),
            forecast: ForecastSettings::default(),
            pollutants: Pollutant::defaults(),
            aliases: default_aliases(),
            resolver: ResolverSettings::default(),
            narrative: NarrativeSettings::default(),
            output: OutputSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `airq.toml` in:
    /// 1. Current directory
    /// 2. `config/` directory
    /// 3. Parent directory
    ///
    /// Falls back to built-in defaults when no file exists.
    pub fn from_default_location() -> Result<Self, ConfigError> {
        let search_paths = [
            PathBuf::from("airq.toml"),
            PathBuf::from("config/airq.toml"),
            PathBuf::from("../airq.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load from `path` if given, otherwise from the default location, then
    /// apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::from_default_location()?,
        };
        let config = config.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `AIRQ_*` environment variable overrides.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(input) = env::var("AIRQ_INPUT") {
            self.data.input = PathBuf::from(input);
        }
        if let Ok(dir) = env::var("AIRQ_OUTPUT_DIR") {
            self.output.chart_dir = PathBuf::from(dir);
        }
        if let Ok(horizon) = env::var("AIRQ_HORIZON") {
            self.forecast.horizon_years = horizon.trim().parse().map_err(|_| {
                ConfigError::Invalid("AIRQ_HORIZON must be a positive integer".to_string())
            })?;
        }
        Ok(self)
    }

    /// Check value ranges and the pollutant enumeration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.forecast.horizon_years == 0 {
            return Err(ConfigError::Invalid(
                "forecast.horizon_years must be greater than zero".to_string(),
            ));
        }
        let width = self.forecast.interval_width;
        if !(width > 0.0 && width < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "forecast.interval_width must be in (0, 1), got {}",
                width
            )));
        }
        let range = self.forecast.changepoint_range;
        if !(range > 0.0 && range <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "forecast.changepoint_range must be in (0, 1], got {}",
                range
            )));
        }
        if !(self.forecast.changepoint_penalty >= 0.0) {
            return Err(ConfigError::Invalid(
                "forecast.changepoint_penalty must be non-negative".to_string(),
            ));
        }
        if !(self.forecast.seasonality_period_years > 0.0) {
            return Err(ConfigError::Invalid(
                "forecast.seasonality_period_years must be positive".to_string(),
            ));
        }
        let threshold = self.resolver.fuzzy_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "resolver.fuzzy_threshold must be in (0, 1], got {}",
                threshold
            )));
        }
        if self.pollutants.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one pollutant must be configured".to_string(),
            ));
        }
        for (i, pollutant) in self.pollutants.iter().enumerate() {
            if self.pollutants[..i].iter().any(|p| p.key == pollutant.key) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate pollutant key '{}'",
                    pollutant.key
                )));
            }
        }
        Ok(())
    }

    /// Read the narrative API key from the configured environment variable.
    pub fn narrative_api_key(&self) -> Option<String> {
        env::var(&self.narrative.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.forecast.horizon_years, 10);
        assert_eq!(config.pollutants.len(), 3);
        assert_eq!(config.pollutants[0].key, "pm2.5");
        assert_eq!(config.aliases[0], AliasEntry::new("africa", "African Region"));
        assert_eq!(config.resolver.fuzzy_threshold, 0.8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_parse_partial_sections() {
        let toml = r#"
[data]
input = "measurements.csv"

[forecast]
horizon_years = 5
concurrent = false

[resolver]
scorer = "levenshtein"

[[pollutants]]
key = "no2"
label = "NO2 (μg/m3)"

[[aliases]]
token = "europa"
region = "European Region"

[[aliases]]
token = "africa"
region = "African Region"
"#;

        let config = AppConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.data.input, PathBuf::from("measurements.csv"));
        assert_eq!(config.data.region_column, "WHO Region");
        assert_eq!(config.forecast.horizon_years, 5);
        assert!(!config.forecast.concurrent);
        assert_eq!(config.forecast.interval_width, 0.8);
        assert_eq!(config.resolver.scorer, ScorerKind::Levenshtein);
        assert_eq!(config.pollutants, vec![Pollutant::new("no2", "NO2 (μg/m3)")]);
        assert_eq!(config.aliases[0].token, "europa");
        assert_eq!(config.aliases[1].token, "africa");
    }

    #[test]
    fn test_invalid_toml() {
        let result = AppConfig::from_toml_str("[forecast\nhorizon_years = 5");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validate_rejects_zero_horizon() {
        let mut config = AppConfig::default();
        config.forecast.horizon_years = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_interval_width() {
        let mut config = AppConfig::default();
        config.forecast.interval_width = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_pollutants() {
        let mut config = AppConfig::default();
        config.pollutants.push(Pollutant::new("pm10", "PM10 again"));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_empty_pollutants() {
        let mut config = AppConfig::default();
        config.pollutants.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("airq.toml");
        fs::write(&path, "[output]\nchart_dir = \"charts\"\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.output.chart_dir, PathBuf::from("charts"));
    }

    #[test]
    fn test_from_missing_file() {
        let result = AppConfig::from_file("/definitely/not/here/airq.toml");
        assert!(matches!(result, Err(ConfigError::Read(_))));
    }
}
