//! Fit-and-forecast for a single prepared series.
//!
//! The engine turns a [`Series`] into a [`ForecastResult`]: it fits an
//! [`AdditiveModel`], evaluates it over the historical timestamps plus the
//! requested number of future years, attaches uncertainty intervals and scores
//! the in-sample fit.

use chrono::NaiveDate;
use tracing::debug;

use crate::algorithms::stats::quantile_normal;
use crate::algorithms::{fit_metrics, AdditiveModel, ModelSpec};
use crate::config::ForecastSettings;
use crate::error::ForecastError;
use crate::models::time::{add_years, decimal_year};
use crate::models::{ComponentPoint, ForecastPoint, ForecastResult, Series};

/// Stateless forecaster configured once from [`ForecastSettings`].
#[derive(Debug, Clone)]
pub struct ForecastEngine {
    spec: ModelSpec,
    interval_width: f64,
}

impl ForecastEngine {
    pub fn new(settings: &ForecastSettings) -> Self {
        Self {
            spec: ModelSpec::from(settings),
            interval_width: settings.interval_width,
        }
    }

    /// Fit `series` and project it `horizon_years` past its last observation.
    ///
    /// `future` starts at the last historical timestamp and holds
    /// `horizon_years + 1` points.
    pub fn fit_and_forecast(
        &self,
        series: Series,
        horizon_years: u32,
    ) -> Result<ForecastResult, ForecastError> {
        if horizon_years == 0 {
            return Err(ForecastError::fit("forecast horizon must be at least one year"));
        }
        if series.len() < 2 {
            return Err(ForecastError::fit(format!(
                "at least 2 yearly observations are required for {} in {}, got {}",
                series.pollutant(),
                series.region(),
                series.len()
            )));
        }

        let history_times: Vec<f64> = series.timestamps().map(decimal_year).collect();
        let history_values: Vec<f64> = series.values().collect();
        let model = AdditiveModel::fit(&history_times, &history_values, &self.spec)?;

        let timeline = build_timeline(&series, horizon_years)?;
        let z = quantile_normal(0.5 + self.interval_width / 2.0);
        let sigma = model.sigma();

        let mut predictions = Vec::with_capacity(timeline.len());
        let mut components = Vec::with_capacity(timeline.len());
        for timestamp in timeline {
            let x = decimal_year(timestamp);
            let trend = model.trend(x);
            let seasonal = model.seasonal(x);
            let estimate = trend + seasonal;
            let half_width = z * (sigma * sigma + model.trend_variance(x)).sqrt();
            if !estimate.is_finite() || !half_width.is_finite() {
                return Err(ForecastError::fit(format!(
                    "non-finite prediction at {}",
                    timestamp
                )));
            }
            predictions.push(ForecastPoint {
                timestamp,
                point_estimate: estimate,
                lower_bound: estimate - half_width,
                upper_bound: estimate + half_width,
            });
            components.push(ComponentPoint {
                timestamp,
                trend,
                seasonal,
            });
        }

        let metrics = fit_metrics(series.points(), &predictions).ok_or_else(|| {
            ForecastError::fit("no timestamps shared by predictions and observations")
        })?;

        let last = series
            .last()
            .map(|p| p.timestamp)
            .ok_or_else(|| ForecastError::fit("empty series"))?;
        let future: Vec<ForecastPoint> = predictions
            .into_iter()
            .filter(|p| p.timestamp >= last)
            .collect();

        debug!(
            region = series.region(),
            pollutant = %series.pollutant(),
            observations = series.len(),
            horizon_years,
            changepoints = model.changepoint_count(),
            sigma,
            mae = metrics.mean_absolute_error,
            r2 = metrics.r_squared,
            "forecast complete"
        );

        Ok(ForecastResult {
            history: series,
            future,
            metrics,
            components,
        })
    }
}

/// Historical timestamps followed by one January 1 per future year.
fn build_timeline(series: &Series, horizon_years: u32) -> Result<Vec<NaiveDate>, ForecastError> {
    let last = series
        .last()
        .map(|p| p.timestamp)
        .ok_or_else(|| ForecastError::fit("empty series"))?;
    let mut timeline: Vec<NaiveDate> = series.timestamps().collect();
    for step in 1..=horizon_years {
        let step = i32::try_from(step)
            .map_err(|_| ForecastError::fit(format!("horizon {} out of range", horizon_years)))?;
        let next = add_years(last, step)
            .ok_or_else(|| ForecastError::fit(format!("date overflow {} years past {}", step, last)))?;
        timeline.push(next);
    }
    Ok(timeline)
}

#[cfg(test)]
#[path = "forecast_engine_tests.rs"]
mod tests;
