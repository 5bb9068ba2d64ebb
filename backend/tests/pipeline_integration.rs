//! End-to-end runs from a CSV file on disk to charts and reports.

mod support;

use std::sync::Arc;

use airq_forecast::config::AppConfig;
use airq_forecast::error::{DataError, ForecastError, QueryError};
use airq_forecast::io::PollutantTable;
use airq_forecast::models::{MatchStage, ResolutionOutcome};
use airq_forecast::services::{
    build_catalog, chart_file_name, DisabledNarrator, ForecastOrchestrator, ForecastPipeline,
    IntentResolver, SvgChartRenderer,
};
use support::{write_fixture, SAMPLE_CSV};

fn load(dir: &std::path::Path, config: &AppConfig) -> PollutantTable {
    let path = write_fixture(dir, "Dataset.csv", SAMPLE_CSV);
    PollutantTable::from_path(&path, &config.data, &config.pollutants).unwrap()
}

#[test]
fn test_schema_reports_missing_pollutant() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::default();
    let table = load(dir.path(), &config);

    let missing: Vec<&str> = table
        .schema()
        .missing()
        .iter()
        .map(|p| p.key.as_str())
        .collect();
    assert_eq!(missing, vec!["no2"]);
    assert_eq!(
        table.regions(),
        vec![
            "European Region",
            "African Region",
            "Eastern Mediterranean Region"
        ]
    );
}

#[test]
fn test_resolver_over_loaded_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::default();
    let table = load(dir.path(), &config);
    let resolver = IntentResolver::from_settings(build_catalog(&table, &config), &config.resolver);

    assert_eq!(
        resolver.resolve("Come sarà l'aria in Europe?"),
        ResolutionOutcome::Resolved {
            region: "European Region".to_string(),
            stage: MatchStage::TokenOverlap,
        }
    );
    assert_eq!(
        resolver.resolve("e in africa?").region(),
        Some("African Region")
    );
    // Aliases pointing at regions without data still resolve; the forecast
    // path reports the missing data.
    assert_eq!(
        resolver.resolve("asia").region(),
        Some("South East Asia Region")
    );
}

#[test]
fn test_orchestrator_partial_failures() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::default();
    let table = load(dir.path(), &config);
    let orchestrator = ForecastOrchestrator::from_settings(&config.forecast);

    let european = orchestrator.run("European Region", &config.pollutants, &table);
    assert_eq!(european.len(), 2);
    let pm25 = european[0].1.as_ref().unwrap();
    assert_eq!(pm25.history.len(), 7);
    // 2012 is the mean of the two rows.
    assert_eq!(pm25.history.points()[2].value, 20.5);
    assert_eq!(pm25.future.len(), config.forecast.horizon_years as usize + 1);
    assert!(european[1].1.is_ok());

    let mediterranean = orchestrator.run("Eastern Mediterranean Region", &config.pollutants, &table);
    assert!(matches!(mediterranean[0].1, Err(ForecastError::FitFailure(_))));
    assert!(matches!(
        mediterranean[1].1,
        Err(ForecastError::InsufficientData { .. })
    ));
}

#[tokio::test]
async fn test_pipeline_writes_charts() {
    let dir = tempfile::tempdir().unwrap();
    let charts = dir.path().join("results");
    let mut config = AppConfig::default();
    config.forecast.horizon_years = 5;
    let table = load(dir.path(), &config);

    let pipeline = ForecastPipeline::new(
        &config,
        table,
        Box::new(SvgChartRenderer::new(&charts)),
        Arc::new(DisabledNarrator::new("off")),
    );

    let region = pipeline.resolve("Analizza African Region").unwrap();
    let reports = pipeline.forecast_region(&region).await;

    assert_eq!(reports.len(), 2);
    let artifacts = reports[0].outcome.as_ref().unwrap();
    let chart = artifacts.chart.as_ref().unwrap();
    assert_eq!(
        chart,
        &charts.join(chart_file_name("African Region", "PM2.5 (μg/m3)"))
    );
    assert!(std::fs::read_to_string(chart).unwrap().contains("African Region"));
    assert!(artifacts.explanation.is_none());
    assert!(reports[1].outcome.is_err());
}

#[test]
fn test_ambiguous_query_surfaces_candidates() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::default();
    let table = load(dir.path(), &config);
    let pipeline = ForecastPipeline::new(
        &config,
        table,
        Box::new(SvgChartRenderer::new(dir.path())),
        Arc::new(DisabledNarrator::default()),
    );

    match pipeline.resolve("Region") {
        Err(QueryError::Ambiguous { candidates }) => assert_eq!(candidates.len(), 3),
        other => panic!("expected ambiguity, got {other:?}"),
    }
}

#[test]
fn test_missing_year_column_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::default();
    let path = write_fixture(dir.path(), "bad.csv", "WHO Region,Year,PM2.5 (μg/m3)\nX,2010,1\n");

    let err = PollutantTable::from_path(&path, &config.data, &config.pollutants).unwrap_err();
    assert!(matches!(err, DataError::MissingColumn(ref c) if c == "Measurement Year"));
}
