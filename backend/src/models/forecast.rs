//! Forecast output types.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{Pollutant, Series};

/// Point estimate with its two-sided uncertainty interval.
///
/// Invariant: `lower_bound <= point_estimate <= upper_bound`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: NaiveDate,
    pub point_estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl ForecastPoint {
    pub fn year(&self) -> i32 {
        self.timestamp.year()
    }

    pub fn interval_width(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }
}

/// In-sample fit quality over the timestamps shared by history and predictions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitMetrics {
    pub mean_absolute_error: f64,
    pub root_mean_squared_error: f64,
    /// Coefficient of determination; negative for fits worse than the mean.
    pub r_squared: f64,
    /// Number of joined timestamps the metrics were computed on.
    pub samples: usize,
}

/// Additive decomposition of the fitted curve at one timeline point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentPoint {
    pub timestamp: NaiveDate,
    pub trend: f64,
    pub seasonal: f64,
}

/// Everything produced for one (region, pollutant) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub history: Series,
    /// Points from the last historical timestamp onwards, in timeline order.
    pub future: Vec<ForecastPoint>,
    pub metrics: FitMetrics,
    /// Trend and seasonal parts for every timeline point (history and future).
    pub components: Vec<ComponentPoint>,
}

impl ForecastResult {
    pub fn region(&self) -> &str {
        self.history.region()
    }

    pub fn pollutant(&self) -> &Pollutant {
        self.history.pollutant()
    }

    pub fn first_future(&self) -> Option<&ForecastPoint> {
        self.future.first()
    }

    pub fn last_future(&self) -> Option<&ForecastPoint> {
        self.future.last()
    }
}
