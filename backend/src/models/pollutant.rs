use serde::{Deserialize, Serialize};
use std::fmt;

/// A tracked air-quality measure.
///
/// `key` is the short internal identifier (`pm2.5`), `label` doubles as the
/// input-table column header and the display label (`PM2.5 (μg/m3)`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pollutant {
    pub key: String,
    pub label: String,
}

impl Pollutant {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }

    /// The default enumeration, in processing order.
    pub fn defaults() -> Vec<Pollutant> {
        vec![
            Pollutant::new("pm2.5", "PM2.5 (μg/m3)"),
            Pollutant::new("pm10", "PM10 (μg/m3)"),
            Pollutant::new("no2", "NO2 (μg/m3)"),
        ]
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}
