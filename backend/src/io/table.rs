//! CSV loading and schema validation for the measurements table.
//!
//! The table must carry a region column and a year column; every configured
//! pollutant column is optional. Which pollutant columns are present is
//! decided once here and exposed as [`TableSchema::available`], so the rest of
//! the pipeline never looks columns up by name.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::DataSettings;
use crate::error::DataError;
use crate::models::time::parse_year;
use crate::models::Pollutant;

/// Validated column layout of a loaded table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub region_column: String,
    pub year_column: String,
    available: Vec<Pollutant>,
    missing: Vec<Pollutant>,
}

impl TableSchema {
    pub fn new(
        region_column: impl Into<String>,
        year_column: impl Into<String>,
        available: Vec<Pollutant>,
        missing: Vec<Pollutant>,
    ) -> Self {
        Self {
            region_column: region_column.into(),
            year_column: year_column.into(),
            available,
            missing,
        }
    }

    /// Pollutants with a column in the table, in configuration order.
    pub fn available(&self) -> &[Pollutant] {
        &self.available
    }

    /// Configured pollutants without a column in the table.
    pub fn missing(&self) -> &[Pollutant] {
        &self.missing
    }

    pub fn is_available(&self, pollutant: &Pollutant) -> bool {
        self.column_index(pollutant).is_some()
    }

    /// Position of the pollutant's values inside [`TableRow`].
    pub fn column_index(&self, pollutant: &Pollutant) -> Option<usize> {
        self.available.iter().position(|p| p.key == pollutant.key)
    }
}

/// One measurement row. `values` is aligned with [`TableSchema::available`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub region: Option<String>,
    pub year: Option<i32>,
    pub values: Vec<Option<f64>>,
}

impl TableRow {
    fn is_blank(&self) -> bool {
        self.region.is_none() && self.year.is_none() && self.values.iter().all(Option::is_none)
    }
}

/// The measurements table after ingestion and cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct PollutantTable {
    schema: TableSchema,
    rows: Vec<TableRow>,
}

impl PollutantTable {
    /// Build a table from already-parsed rows. Blank rows are dropped.
    pub fn new(schema: TableSchema, rows: Vec<TableRow>) -> Self {
        let rows = rows.into_iter().filter(|r| !r.is_blank()).collect();
        Self { schema, rows }
    }

    /// Load a CSV file.
    pub fn from_path(
        path: &Path,
        settings: &DataSettings,
        pollutants: &[Pollutant],
    ) -> Result<Self, DataError> {
        let file = File::open(path).map_err(|source| DataError::Open {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_reader(BufReader::new(file), settings, pollutants)?;
        info!(
            path = %path.display(),
            rows = table.rows.len(),
            regions = table.regions().len(),
            "loaded input table"
        );
        Ok(table)
    }

    /// Parse CSV from any reader. The first record must be the header.
    pub fn from_reader<R: Read>(
        reader: R,
        settings: &DataSettings,
        pollutants: &[Pollutant],
    ) -> Result<Self, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let find = |name: &str| headers.iter().position(|h| h == name);

        let region_idx = find(&settings.region_column)
            .ok_or_else(|| DataError::MissingColumn(settings.region_column.clone()))?;
        let year_idx = find(&settings.year_column)
            .ok_or_else(|| DataError::MissingColumn(settings.year_column.clone()))?;

        let mut available = Vec::new();
        let mut missing = Vec::new();
        let mut value_idx = Vec::new();
        for pollutant in pollutants {
            match find(&pollutant.label) {
                Some(idx) => {
                    available.push(pollutant.clone());
                    value_idx.push(idx);
                }
                None => {
                    warn!(pollutant = %pollutant.label, "pollutant column not in input table");
                    missing.push(pollutant.clone());
                }
            }
        }

        let mut rows = Vec::new();
        let mut skipped_cells = 0usize;
        for record in reader.records() {
            let record = record?;
            let region = record
                .get(region_idx)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            let year = record.get(year_idx).and_then(parse_year);
            let values = value_idx
                .iter()
                .map(|&idx| {
                    let cell = record.get(idx).unwrap_or("");
                    let parsed = parse_value(cell);
                    if parsed.is_none() && !cell.is_empty() {
                        skipped_cells += 1;
                    }
                    parsed
                })
                .collect();
            rows.push(TableRow {
                region,
                year,
                values,
            });
        }

        if skipped_cells > 0 {
            debug!(skipped_cells, "unparseable pollutant cells treated as missing");
        }

        let schema = TableSchema::new(
            settings.region_column.clone(),
            settings.year_column.clone(),
            available,
            missing,
        );
        Ok(Self::new(schema, rows))
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Distinct region names in first-seen order.
    pub fn regions(&self) -> Vec<String> {
        let mut regions: Vec<String> = Vec::new();
        for region in self.rows.iter().filter_map(|r| r.region.as_ref()) {
            if !regions.contains(region) {
                regions.push(region.clone());
            }
        }
        regions
    }
}

fn parse_value(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}
