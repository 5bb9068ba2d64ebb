//! Input table ingestion.

pub mod table;

pub use table::{PollutantTable, TableRow, TableSchema};
