pub mod config;
pub mod error;
pub mod types;

pub use config::PlantdashConfig;
pub use error::{DashError, Result};
pub use types::*;
