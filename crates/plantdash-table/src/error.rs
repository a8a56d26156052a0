use thiserror::Error;

use plantdash_core::error::DashError;

/// Errors from loading or querying a table.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(String),
    #[error("file has no header row")]
    NoHeader,
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    #[error("column is not numeric: {0}")]
    NotNumeric(String),
}

impl From<csv::Error> for TableError {
    fn from(err: csv::Error) -> Self {
        TableError::Csv(err.to_string())
    }
}

impl From<TableError> for DashError {
    fn from(err: TableError) -> Self {
        match err {
            TableError::Io(e) => DashError::Io(e),
            other => DashError::Table(other.to_string()),
        }
    }
}
