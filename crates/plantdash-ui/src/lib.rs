//! plantdash UI crate - the embedded dashboard page.
//!
//! The dashboard is one self-contained HTML file (inline CSS and
//! JavaScript) compiled into the binary with `include_str!`, so the server
//! has no runtime asset directory.
//!
//! # Usage
//!
//! ```rust,ignore
//! use plantdash_ui::dashboard::DASHBOARD_HTML;
//!
//! async fn ui_handler() -> axum::response::Html<&'static str> {
//!     axum::response::Html(DASHBOARD_HTML)
//! }
//! ```

pub mod dashboard;

pub use dashboard::DASHBOARD_HTML;
