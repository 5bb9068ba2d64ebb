//! Prepared yearly series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Pollutant;
use crate::error::ForecastError;

/// A single non-missing observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationPoint {
    pub timestamp: NaiveDate,
    pub value: f64,
}

impl ObservationPoint {
    pub fn new(timestamp: NaiveDate, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Identity of a series: which region and which pollutant it measures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    pub region: String,
    pub pollutant: Pollutant,
}

impl SeriesKey {
    pub fn new(region: impl Into<String>, pollutant: Pollutant) -> Self {
        Self {
            region: region.into(),
            pollutant,
        }
    }
}

/// Time-ordered observations with strictly increasing timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    key: SeriesKey,
    points: Vec<ObservationPoint>,
}

impl Series {
    /// Build a series, rejecting non-finite values and unordered or repeated timestamps.
    pub fn new(key: SeriesKey, points: Vec<ObservationPoint>) -> Result<Self, ForecastError> {
        if let Some(bad) = points.iter().find(|p| !p.value.is_finite()) {
            return Err(ForecastError::fit(format!(
                "non-finite value at {}",
                bad.timestamp
            )));
        }
        if let Some(pair) = points.windows(2).find(|w| w[0].timestamp >= w[1].timestamp) {
            return Err(ForecastError::fit(format!(
                "timestamps must be strictly increasing ({} then {})",
                pair[0].timestamp, pair[1].timestamp
            )));
        }
        Ok(Self { key, points })
    }

    pub fn key(&self) -> &SeriesKey {
        &self.key
    }

    pub fn region(&self) -> &str {
        &self.key.region
    }

    pub fn pollutant(&self) -> &Pollutant {
        &self.key.pollutant
    }

    pub fn points(&self) -> &[ObservationPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&ObservationPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&ObservationPoint> {
        self.points.last()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.timestamp)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::time::year_start;

    fn key() -> SeriesKey {
        SeriesKey::new("European Region", Pollutant::new("no2", "NO2 (μg/m3)"))
    }

    fn point(year: i32, value: f64) -> ObservationPoint {
        ObservationPoint::new(year_start(year).unwrap(), value)
    }

    #[test]
    fn test_new_accepts_increasing_timestamps() {
        let series = Series::new(key(), vec![point(2010, 1.0), point(2012, 2.0)]).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.region(), "European Region");
        assert_eq!(series.last().unwrap().value, 2.0);
    }

    #[test]
    fn test_new_rejects_duplicate_year() {
        let result = Series::new(key(), vec![point(2010, 1.0), point(2010, 2.0)]);
        assert!(matches!(result, Err(ForecastError::FitFailure(_))));
    }

    #[test]
    fn test_new_rejects_unordered() {
        let result = Series::new(key(), vec![point(2012, 1.0), point(2010, 2.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_rejects_nan() {
        let result = Series::new(key(), vec![point(2012, f64::NAN)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_series_is_valid() {
        let series = Series::new(key(), vec![]).unwrap();
        assert!(series.is_empty());
        assert!(series.first().is_none());
    }
}
