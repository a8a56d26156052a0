//! plantdash API crate - axum HTTP server and route handlers.
//!
//! Serves the dashboard page plus the JSON endpoints behind it: machine
//! list, chat relay and history, and the data table and chart views.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
