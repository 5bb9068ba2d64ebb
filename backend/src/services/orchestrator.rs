//! Per-pollutant forecasting for one region.
//!
//! Every pollutant is prepared and fitted independently; a failure is recorded
//! next to its pollutant and never stops the batch. Results always come back
//! in the order the pollutants were given, either all at once or as a stream
//! that yields each outcome as soon as it and its predecessors are done.

use std::sync::Arc;

use futures::stream::{self, BoxStream, FuturesOrdered, StreamExt};
use tracing::{info, warn};

use super::forecast_engine::ForecastEngine;
use super::series_preparer::prepare;
use crate::config::ForecastSettings;
use crate::error::ForecastError;
use crate::io::PollutantTable;
use crate::models::{ForecastResult, Pollutant};

/// Outcome of one pollutant in a batch.
pub type PollutantOutcome = (Pollutant, Result<ForecastResult, ForecastError>);

#[derive(Debug, Clone)]
pub struct ForecastOrchestrator {
    engine: ForecastEngine,
    horizon_years: u32,
}

impl ForecastOrchestrator {
    pub fn new(engine: ForecastEngine, horizon_years: u32) -> Self {
        Self {
            engine,
            horizon_years,
        }
    }

    pub fn from_settings(settings: &ForecastSettings) -> Self {
        Self::new(ForecastEngine::new(settings), settings.horizon_years)
    }

    pub fn horizon_years(&self) -> u32 {
        self.horizon_years
    }

    /// Forecast each available pollutant in turn.
    ///
    /// Pollutants without a column in `table` are skipped silently; they were
    /// already reported when the table was loaded.
    pub fn run(
        &self,
        region: &str,
        pollutants: &[Pollutant],
        table: &PollutantTable,
    ) -> Vec<PollutantOutcome> {
        let batch = available(pollutants, table);
        info!(region, pollutants = batch.len(), "forecasting batch");

        batch
            .into_iter()
            .map(|pollutant| {
                let outcome = forecast_one(&self.engine, self.horizon_years, table, region, &pollutant);
                log_outcome(region, &pollutant, &outcome);
                (pollutant, outcome)
            })
            .collect()
    }

    /// Like [`run`](Self::run), fitting each pollutant on a blocking worker.
    pub async fn run_concurrent(
        &self,
        region: &str,
        pollutants: &[Pollutant],
        table: Arc<PollutantTable>,
    ) -> Vec<PollutantOutcome> {
        self.outcomes(region, pollutants, table, true).collect().await
    }

    /// Outcomes in enumeration order, each yielded as soon as it is ready.
    ///
    /// With `concurrent`, every fit moves to its own blocking worker once the
    /// stream is first polled; otherwise each pollutant is fitted when its turn
    /// comes. Dropping the stream abandons the outcomes not yet yielded.
    pub fn outcomes(
        &self,
        region: &str,
        pollutants: &[Pollutant],
        table: Arc<PollutantTable>,
        concurrent: bool,
    ) -> BoxStream<'static, PollutantOutcome> {
        let batch = available(pollutants, &table);
        info!(region, pollutants = batch.len(), concurrent, "forecasting batch");

        let engine = self.engine.clone();
        let horizon = self.horizon_years;
        let region = region.to_string();

        if !concurrent {
            return stream::iter(batch)
                .map(move |pollutant| {
                    let outcome = forecast_one(&engine, horizon, &table, &region, &pollutant);
                    log_outcome(&region, &pollutant, &outcome);
                    (pollutant, outcome)
                })
                .boxed();
        }

        batch
            .into_iter()
            .map(|pollutant| {
                let engine = engine.clone();
                let table = Arc::clone(&table);
                let region = region.clone();
                async move {
                    let worker = {
                        let pollutant = pollutant.clone();
                        let region = region.clone();
                        tokio::task::spawn_blocking(move || {
                            forecast_one(&engine, horizon, &table, &region, &pollutant)
                        })
                    };
                    let outcome = worker.await.unwrap_or_else(|e| {
                        Err(ForecastError::fit(format!("forecast worker failed: {}", e)))
                    });
                    log_outcome(&region, &pollutant, &outcome);
                    (pollutant, outcome)
                }
            })
            .collect::<FuturesOrdered<_>>()
            .boxed()
    }
}

fn available(pollutants: &[Pollutant], table: &PollutantTable) -> Vec<Pollutant> {
    pollutants
        .iter()
        .filter(|p| table.schema().is_available(p))
        .cloned()
        .collect()
}

fn forecast_one(
    engine: &ForecastEngine,
    horizon_years: u32,
    table: &PollutantTable,
    region: &str,
    pollutant: &Pollutant,
) -> Result<ForecastResult, ForecastError> {
    let series = prepare(table, region, pollutant)?;
    engine.fit_and_forecast(series, horizon_years)
}

fn log_outcome(region: &str, pollutant: &Pollutant, outcome: &Result<ForecastResult, ForecastError>) {
    match outcome {
        Ok(result) => info!(
            region,
            pollutant = %pollutant.label,
            mae = result.metrics.mean_absolute_error,
            r2 = result.metrics.r_squared,
            "pollutant forecast ready"
        ),
        Err(e) => warn!(region, pollutant = %pollutant.label, error = %e, "pollutant skipped"),
    }
}
