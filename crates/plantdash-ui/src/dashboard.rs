//! Dashboard HTML.
//!
//! Four pages behind a sidebar menu, all talking to the JSON API on the
//! same origin:
//!
//! - **Chat**: machine selector ("none" uses the shared history) and chat box
//! - **Chat by zone**: zone + machine selectors; the zone is sent to the webhook
//! - **Data**: column/value filter and the (possibly sampled) table
//! - **Data Visualization**: filter plus x/y selectors and an SVG bar chart

/// The complete self-contained dashboard HTML.
pub const DASHBOARD_HTML: &str = include_str!("../assets/dashboard.html");
