use thiserror::Error;

/// Top-level error type for plantdash.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for DashError` so that `?` works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DashError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Chat error: {0}")]
    Chat(String),

    #[error("Table error: {0}")]
    Table(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for DashError {
    fn from(err: toml::de::Error) -> Self {
        DashError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DashError {
    fn from(err: toml::ser::Error) -> Self {
        DashError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for DashError {
    fn from(err: serde_json::Error) -> Self {
        DashError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for plantdash operations.
pub type Result<T> = std::result::Result<T, DashError>;
