//! Router setup with all API routes and middleware.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use plantdash_core::config::PlantdashConfig;
use plantdash_core::error::{DashError, Result};

use crate::handlers;
use crate::state::AppState;

/// Largest accepted POST /chat body.
const CHAT_BODY_LIMIT: usize = 64 * 1024;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // The dashboard is served from this same server, under either host name.
    let port = state.config.general.port;
    let origins: Vec<HeaderValue> = [
        format!("http://127.0.0.1:{}", port),
        format!("http://localhost:{}", port),
    ]
    .iter()
    .filter_map(|origin| origin.parse().ok())
    .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/ui", get(handlers::ui))
        .route("/machines", get(handlers::machines))
        .route("/chat/history", get(handlers::chat_history))
        .route(
            "/chat",
            post(handlers::chat).layer(DefaultBodyLimit::max(CHAT_BODY_LIMIT)),
        )
        .route("/data/columns", get(handlers::data_columns))
        .route("/data/values", get(handlers::data_values))
        .route("/data/table", get(handlers::data_table))
        .route("/data/chart", get(handlers::data_chart))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind the configured address and serve until the process exits.
pub async fn start_server(config: &PlantdashConfig, state: AppState) -> Result<()> {
    let addr = format!("{}:{}", config.general.host, config.general.port);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| DashError::Api(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!("Dashboard available at http://{}/ui", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| DashError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
