//! Tabular dataset for the data and graph pages.
//!
//! Loads a delimited file, makes column names unique, and derives the
//! filtered, sampled and aggregated views the dashboard renders.

pub mod error;
pub mod loader;
pub mod table;

pub use error::TableError;
pub use loader::{dedupe_columns, load, read_from, LoadReport};
pub use table::{GroupSum, Table, ALL};
