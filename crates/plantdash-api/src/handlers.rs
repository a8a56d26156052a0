//! Route handler functions for all API endpoints.
//!
//! Chat handlers go through the shared `ChatService`. Data handlers reload
//! the dataset on every request so edits to the file show up on the next
//! page load.

use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use plantdash_chat::{EntityKey, RelayContext, ReplyKind};
use plantdash_core::types::Transcript;
use plantdash_table::{GroupSum, LoadReport, Table, ALL};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Query parameter and request types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub machine: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub machine: Option<String>,
    pub zone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ValuesParams {
    pub column: Option<String>,
}

/// Optional row filter shared by the table and chart pages.
#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    pub column: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChartParams {
    pub x: Option<String>,
    pub y: Option<String>,
    pub column: Option<String>,
    pub value: Option<String>,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MachinesResponse {
    pub zones: Vec<String>,
    pub machines: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub machine: Option<String>,
    pub transcript: Transcript,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub kind: ReplyKind,
    pub transcript: Transcript,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ColumnsResponse {
    pub columns: Vec<String>,
    pub numeric_columns: Vec<String>,
    pub row_count: usize,
    pub skipped_rows: usize,
    pub notice: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValuesResponse {
    pub column: String,
    pub values: Vec<String>,
    pub notice: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TableResponse {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Rows matching the filter, before sampling.
    pub total_rows: usize,
    pub displayed_rows: usize,
    pub sampled: bool,
    pub skipped_rows: usize,
    pub notice: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChartResponse {
    pub x: String,
    pub y: String,
    pub groups: Vec<GroupSum>,
    pub notice: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

fn load_dataset(state: &AppState) -> LoadReport {
    plantdash_table::load(&state.csv_path())
}

/// Apply `column = value` when a column is given. A missing value means
/// "All".
fn apply_filter(table: &Table, filter: &FilterParams) -> Result<Table, ApiError> {
    match filter.column.as_deref().map(str::trim) {
        Some(column) if !column.is_empty() => {
            let value = filter.value.as_deref().unwrap_or(ALL);
            Ok(table.filter(column, value)?)
        }
        _ => Ok(table.clone()),
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("Parameter '{}' is required", name)))
}

/// Webhook context for a chat request: `machine` and `zone` when present.
pub fn relay_context(machine: Option<&str>, zone: Option<&str>) -> RelayContext {
    let mut context = RelayContext::new();
    for (name, value) in [("machine", machine), ("zone", zone)] {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            context.insert(name.to_string(), v.to_string());
        }
    }
    context
}

// =============================================================================
// Handler functions
// =============================================================================

/// GET /health - liveness and uptime.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        started_at: state.started_at,
    })
}

/// GET /ui - serve the self-contained dashboard HTML.
pub async fn ui() -> impl IntoResponse {
    Html(plantdash_ui::DASHBOARD_HTML)
}

/// GET /machines - zones and machines for the sidebar selectors.
pub async fn machines(State(state): State<AppState>) -> Json<MachinesResponse> {
    Json(MachinesResponse {
        zones: state.config.chat.zones.clone(),
        machines: state.config.chat.machines.clone(),
    })
}

/// GET /chat/history - persisted transcript for a machine, or the shared
/// one when no machine is given.
pub async fn chat_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let key = EntityKey::parse_optional(params.machine.as_deref())?;
    let transcript = state.chat.history(key.as_ref())?;
    Ok(Json(HistoryResponse {
        machine: key.map(|k| k.as_str().to_string()),
        transcript,
    }))
}

/// POST /chat - relay a message to the webhook and record both turns.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let key = EntityKey::parse_optional(req.machine.as_deref())?;

    let context = relay_context(key.as_ref().map(EntityKey::as_str), req.zone.as_deref());

    let outcome = state.chat.send(key, &req.message, &context).await?;
    Ok(Json(ChatResponse {
        reply: outcome.reply.text,
        kind: outcome.reply.kind,
        transcript: outcome.transcript,
    }))
}

/// GET /data/columns - column names, which of them are numeric, and any
/// load notice.
pub async fn data_columns(State(state): State<AppState>) -> Json<ColumnsResponse> {
    let report = load_dataset(&state);
    Json(ColumnsResponse {
        numeric_columns: report.table.numeric_columns(),
        columns: report.table.columns().to_vec(),
        row_count: report.table.row_count(),
        skipped_rows: report.skipped_rows,
        notice: report.notice,
    })
}

/// GET /data/values - distinct values of one column for the filter selector.
pub async fn data_values(
    State(state): State<AppState>,
    Query(params): Query<ValuesParams>,
) -> Result<Json<ValuesResponse>, ApiError> {
    let column = required(&params.column, "column")?;
    let report = load_dataset(&state);
    let values = match report.notice {
        Some(_) => Vec::new(),
        None => report.table.unique_values(column)?,
    };
    Ok(Json(ValuesResponse {
        column: column.to_string(),
        values,
        notice: report.notice,
    }))
}

/// GET /data/table - filtered rows, randomly sampled above the display limit.
pub async fn data_table(
    State(state): State<AppState>,
    Query(filter): Query<FilterParams>,
) -> Result<Json<TableResponse>, ApiError> {
    let report = load_dataset(&state);

    // A stale filter cannot apply to a dataset that failed to load.
    if report.notice.is_some() {
        return Ok(Json(TableResponse {
            columns: Vec::new(),
            rows: Vec::new(),
            total_rows: 0,
            displayed_rows: 0,
            sampled: false,
            skipped_rows: 0,
            notice: report.notice,
        }));
    }

    let filtered = apply_filter(&report.table, &filter)?;
    let total_rows = filtered.row_count();
    let shown = filtered.sample_for_display(state.config.data.max_display_rows);
    debug!(total_rows, displayed = shown.row_count(), "Serving data table");

    Ok(Json(TableResponse {
        columns: shown.columns().to_vec(),
        displayed_rows: shown.row_count(),
        sampled: shown.row_count() < total_rows,
        rows: shown.rows().to_vec(),
        total_rows,
        skipped_rows: report.skipped_rows,
        notice: report.notice,
    }))
}

/// GET /data/chart - sum of `y` per distinct `x` over the filtered rows.
pub async fn data_chart(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> Result<Json<ChartResponse>, ApiError> {
    let x = required(&params.x, "x")?.to_string();
    let y = required(&params.y, "y")?.to_string();
    let report = load_dataset(&state);

    // Nothing to chart, but the page still gets the notice.
    if report.notice.is_some() {
        return Ok(Json(ChartResponse {
            x,
            y,
            groups: Vec::new(),
            notice: report.notice,
        }));
    }

    let filter = FilterParams {
        column: params.column,
        value: params.value,
    };
    let filtered = apply_filter(&report.table, &filter)?;
    let groups = filtered.aggregate(&x, &y)?;
    Ok(Json(ChartResponse {
        x,
        y,
        groups,
        notice: None,
    }))
}
