//! End-to-end answer to a question: resolve, forecast, render, explain.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tracing::warn;

use super::chart::ChartRenderer;
use super::intent_resolver::IntentResolver;
use super::narrative::{with_retry, NarrativeRequest, NarrativeService};
use super::orchestrator::ForecastOrchestrator;
use crate::config::AppConfig;
use crate::error::{ForecastError, QueryError};
use crate::io::PollutantTable;
use crate::models::{ForecastResult, Pollutant, RegionCatalog};

/// What the user gets back for one pollutant.
#[derive(Debug, Clone, PartialEq)]
pub struct PollutantReport {
    pub pollutant: Pollutant,
    pub outcome: Result<ForecastArtifacts, ForecastError>,
}

/// A successful forecast plus whatever the collaborators managed to add.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastArtifacts {
    pub result: ForecastResult,
    pub chart: Option<PathBuf>,
    pub explanation: Option<String>,
}

/// Build the region catalog from the table's regions and the configured aliases.
pub fn build_catalog(table: &PollutantTable, config: &AppConfig) -> RegionCatalog {
    RegionCatalog::new(table.regions(), config.aliases.clone())
}

pub struct ForecastPipeline {
    table: Arc<PollutantTable>,
    pollutants: Vec<Pollutant>,
    resolver: IntentResolver,
    orchestrator: ForecastOrchestrator,
    renderer: Box<dyn ChartRenderer>,
    narrator: Arc<dyn NarrativeService>,
    narrative_timeout: Duration,
    concurrent: bool,
}

impl ForecastPipeline {
    pub fn new(
        config: &AppConfig,
        table: PollutantTable,
        renderer: Box<dyn ChartRenderer>,
        narrator: Arc<dyn NarrativeService>,
    ) -> Self {
        let catalog = build_catalog(&table, config);
        Self {
            table: Arc::new(table),
            pollutants: config.pollutants.clone(),
            resolver: IntentResolver::from_settings(catalog, &config.resolver),
            orchestrator: ForecastOrchestrator::from_settings(&config.forecast),
            renderer,
            narrator,
            narrative_timeout: Duration::from_secs(config.narrative.timeout_secs),
            concurrent: config.forecast.concurrent,
        }
    }

    pub fn catalog(&self) -> &RegionCatalog {
        self.resolver.catalog()
    }

    /// Map an utterance to exactly one known region.
    pub fn resolve(&self, utterance: &str) -> Result<String, QueryError> {
        self.resolver.resolve(utterance).into_result(self.resolver.catalog())
    }

    /// Forecast every configured pollutant of `region` and decorate the results.
    pub async fn forecast_region(&self, region: &str) -> Vec<PollutantReport> {
        self.reports(region).collect().await
    }

    /// One report per pollutant, in enumeration order, each yielded as soon as
    /// its chart and explanation are done.
    pub fn reports<'a>(&'a self, region: &str) -> impl Stream<Item = PollutantReport> + 'a {
        self.orchestrator
            .outcomes(region, &self.pollutants, Arc::clone(&self.table), self.concurrent)
            .then(move |(pollutant, outcome)| async move {
                let outcome = match outcome {
                    Ok(result) => Ok(self.decorate(result).await),
                    Err(e) => Err(e),
                };
                PollutantReport { pollutant, outcome }
            })
    }

    async fn decorate(&self, result: ForecastResult) -> ForecastArtifacts {
        let chart = match self.renderer.render(&result) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "chart rendering failed");
                None
            }
        };

        let explanation = match NarrativeRequest::from_result(&result) {
            Some(request) => {
                match with_retry(self.narrator.as_ref(), &request, self.narrative_timeout).await {
                    Ok(text) => Some(text),
                    Err(e) => {
                        warn!(error = %e, "narrative unavailable");
                        None
                    }
                }
            }
            None => None,
        };

        ForecastArtifacts {
            result,
            chart,
            explanation,
        }
    }
}
