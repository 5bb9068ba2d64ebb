//! Extraction of one region's yearly series for one pollutant.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::ForecastError;
use crate::io::PollutantTable;
use crate::models::time::year_start;
use crate::models::{ObservationPoint, Pollutant, Series, SeriesKey};

/// Build the yearly series of `pollutant` in `region`.
///
/// Rows missing the year or the value are dropped, same-year observations are
/// averaged and each year is pinned to its January 1.
pub fn prepare(
    table: &PollutantTable,
    region: &str,
    pollutant: &Pollutant,
) -> Result<Series, ForecastError> {
    let insufficient = || ForecastError::insufficient(region, pollutant.label.clone());

    let column = table
        .schema()
        .column_index(pollutant)
        .ok_or_else(insufficient)?;

    // year -> (sum, count)
    let mut by_year: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    let mut kept = 0usize;
    for row in table.rows() {
        if row.region.as_deref() != Some(region) {
            continue;
        }
        let (Some(year), Some(Some(value))) = (row.year, row.values.get(column)) else {
            continue;
        };
        if !value.is_finite() {
            continue;
        }
        let entry = by_year.entry(year).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
        kept += 1;
    }

    if by_year.is_empty() {
        return Err(insufficient());
    }

    let points = by_year
        .into_iter()
        .filter_map(|(year, (sum, count))| {
            year_start(year).map(|ts| ObservationPoint::new(ts, sum / count as f64))
        })
        .collect::<Vec<_>>();

    if points.is_empty() {
        return Err(insufficient());
    }

    debug!(
        region,
        pollutant = %pollutant.label,
        rows = kept,
        years = points.len(),
        "prepared series"
    );

    Series::new(SeriesKey::new(region, pollutant.clone()), points)
}
