//! Integration tests for the plantdash API.
//!
//! Every route is exercised through `tower::ServiceExt::oneshot` against a
//! router whose webhook is replaced by an in-process relay and whose
//! dataset and transcripts live in a temp directory.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use plantdash_api::create_router;
use plantdash_api::error::ErrorBody;
use plantdash_api::handlers::{
    ChartResponse, ChatResponse, ColumnsResponse, HealthResponse, HistoryResponse,
    MachinesResponse, TableResponse, ValuesResponse,
};
use plantdash_api::state::AppState;
use plantdash_chat::{ChatRelay, RelayContext, Reply, ReplyKind};
use plantdash_core::config::PlantdashConfig;
use plantdash_core::types::Role;

// =============================================================================
// Helpers
// =============================================================================

const SAMPLE_CSV: &str = "x,y,machine\n1,10,FAN 1\n1,5,FAN 2\n2,3,FAN 1\n";

/// Relay that echoes the message back and remembers each context it saw.
#[derive(Default)]
struct EchoRelay {
    contexts: Mutex<Vec<RelayContext>>,
}

#[async_trait]
impl ChatRelay for EchoRelay {
    async fn send(&self, message: &str, context: &RelayContext) -> Reply {
        self.contexts.lock().unwrap().push(context.clone());
        Reply::delivered(format!("echo: {}", message))
    }
}

/// Relay standing in for an unreachable webhook.
struct DownRelay;

#[async_trait]
impl ChatRelay for DownRelay {
    async fn send(&self, _message: &str, _context: &RelayContext) -> Reply {
        Reply::connection_error("server responded with 500 Internal Server Error")
    }
}

struct Harness {
    _dir: TempDir,
    state: AppState,
    relay: Arc<EchoRelay>,
}

fn config_in(dir: &TempDir, csv: Option<&str>) -> PlantdashConfig {
    let mut config = PlantdashConfig::default();
    config.chat.history_dir = dir.path().join("chat_history").display().to_string();
    let csv_path = dir.path().join("merged_data.csv");
    if let Some(content) = csv {
        std::fs::write(&csv_path, content).unwrap();
    }
    config.data.csv_path = csv_path.display().to_string();
    config
}

fn harness_with(csv: Option<&str>, tweak: impl FnOnce(&mut PlantdashConfig)) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(&dir, csv);
    tweak(&mut config);
    let relay = Arc::new(EchoRelay::default());
    let state = AppState::new(config, relay.clone());
    Harness {
        _dir: dir,
        state,
        relay,
    }
}

fn harness() -> Harness {
    harness_with(Some(SAMPLE_CSV), |_| {})
}

impl Harness {
    fn app(&self) -> axum::Router {
        create_router(self.state.clone())
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

/// Read full response body bytes.
async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), 4 * 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

async fn json_body<T: serde::de::DeserializeOwned>(resp: axum::response::Response) -> T {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

// =============================================================================
// Health and UI
// =============================================================================

#[tokio::test]
async fn test_health_happy_path() {
    let h = harness();
    let resp = h.app().oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let health: HealthResponse = json_body(resp).await;
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, "0.1.0");
    assert_eq!(health.started_at, h.state.started_at);
}

#[tokio::test]
async fn test_ui_serves_dashboard() {
    let h = harness();
    let resp = h.app().oneshot(get("/ui")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));

    let html = String::from_utf8(body_bytes(resp).await).unwrap();
    assert!(html.contains("page-graph"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let h = harness();
    let resp = h.app().oneshot(get("/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Sidebar and chat
// =============================================================================

#[tokio::test]
async fn test_machines_lists_configured_entities() {
    let h = harness();
    let resp = h.app().oneshot(get("/machines")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: MachinesResponse = json_body(resp).await;
    assert_eq!(body.zones, vec!["Exsample", "iso10816-3"]);
    assert_eq!(body.machines.len(), 13);
    assert!(body.machines.iter().any(|m| m == "1A-1 - Pump"));
}

#[tokio::test]
async fn test_history_starts_empty() {
    let h = harness();
    let resp = h.app().oneshot(get("/chat/history")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: HistoryResponse = json_body(resp).await;
    assert!(body.machine.is_none());
    assert!(body.transcript.is_empty());
}

#[tokio::test]
async fn test_history_rejects_path_traversal() {
    let h = harness();
    let resp = h
        .app()
        .oneshot(get("/chat/history?machine=..%2F..%2Fetc%2Fpasswd"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let err: ErrorBody = json_body(resp).await;
    assert_eq!(err.error, "bad_request");
}

#[tokio::test]
async fn test_machine_named_like_shared_history_is_rejected() {
    let h = harness();
    let resp = h
        .app()
        .oneshot(get("/chat/history?machine=chat_history"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = h
        .app()
        .oneshot(post_json("/chat", r#"{"message":"hi","machine":"chat_history"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(h.relay.contexts.lock().unwrap().is_empty());

    let resp = h.app().oneshot(get("/chat/history")).await.unwrap();
    let shared: HistoryResponse = json_body(resp).await;
    assert!(shared.transcript.is_empty());
}

#[tokio::test]
async fn test_chat_records_two_turns_per_machine() {
    let h = harness();
    let resp = h
        .app()
        .oneshot(post_json("/chat", r#"{"message":"vibration ok?","machine":"PUMP 1"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: ChatResponse = json_body(resp).await;
    assert_eq!(body.reply, "echo: vibration ok?");
    assert_eq!(body.kind, ReplyKind::Delivered);
    assert_eq!(body.transcript.len(), 2);
    assert_eq!(body.transcript.turns()[0].role, Role::User);
    assert_eq!(body.transcript.turns()[1].content, "echo: vibration ok?");

    let resp = h
        .app()
        .oneshot(get("/chat/history?machine=PUMP%201"))
        .await
        .unwrap();
    let history: HistoryResponse = json_body(resp).await;
    assert_eq!(history.machine.as_deref(), Some("PUMP 1"));
    assert_eq!(history.transcript, body.transcript);

    // Other conversations are untouched.
    let resp = h.app().oneshot(get("/chat/history")).await.unwrap();
    let shared: HistoryResponse = json_body(resp).await;
    assert!(shared.transcript.is_empty());
}

#[tokio::test]
async fn test_chat_forwards_machine_and_zone() {
    let h = harness();
    let resp = h
        .app()
        .oneshot(post_json(
            "/chat",
            r#"{"message":"status","machine":"Gear EX","zone":"iso10816-3"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let contexts = h.relay.contexts.lock().unwrap();
    assert_eq!(contexts.len(), 1);
    assert_eq!(contexts[0].get("machine").map(String::as_str), Some("Gear EX"));
    assert_eq!(contexts[0].get("zone").map(String::as_str), Some("iso10816-3"));
}

#[tokio::test]
async fn test_chat_without_machine_sends_no_context() {
    let h = harness();
    let resp = h
        .app()
        .oneshot(post_json("/chat", r#"{"message":"hello"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(h.relay.contexts.lock().unwrap()[0].is_empty());
}

#[tokio::test]
async fn test_chat_empty_message_is_rejected() {
    let h = harness();
    let resp = h
        .app()
        .oneshot(post_json("/chat", r#"{"message":"   "}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(h.relay.contexts.lock().unwrap().is_empty());

    let resp = h.app().oneshot(get("/chat/history")).await.unwrap();
    let history: HistoryResponse = json_body(resp).await;
    assert!(history.transcript.is_empty());
}

#[tokio::test]
async fn test_chat_malformed_body_is_client_error() {
    let h = harness();
    let resp = h
        .app()
        .oneshot(post_json("/chat", r#"{"text":"missing message field"}"#))
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn test_chat_body_limit() {
    let h = harness();
    let huge = format!(r#"{{"message":"{}"}}"#, "x".repeat(70 * 1024));
    let resp = h.app().oneshot(post_json("/chat", &huge)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_chat_webhook_failure_is_recorded_as_reply() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new(config_in(&dir, Some(SAMPLE_CSV)), Arc::new(DownRelay));
    let app = create_router(state);

    let resp = app
        .oneshot(post_json("/chat", r#"{"message":"hi","machine":"FAN 1"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: ChatResponse = json_body(resp).await;
    assert_eq!(body.kind, ReplyKind::ConnectionError);
    assert!(body.reply.contains("Error connecting"));
    assert_eq!(body.transcript.len(), 2);
    assert!(body.transcript.turns()[1].content.contains("Error connecting"));
}

// =============================================================================
// Data pages
// =============================================================================

#[tokio::test]
async fn test_columns_reports_numeric_columns() {
    let h = harness();
    let resp = h.app().oneshot(get("/data/columns")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: ColumnsResponse = json_body(resp).await;
    assert_eq!(body.columns, vec!["x", "y", "machine"]);
    assert_eq!(body.numeric_columns, vec!["x", "y"]);
    assert_eq!(body.row_count, 3);
    assert!(body.notice.is_none());
}

#[tokio::test]
async fn test_columns_missing_file_shows_notice() {
    let h = harness_with(None, |_| {});
    let resp = h.app().oneshot(get("/data/columns")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: ColumnsResponse = json_body(resp).await;
    assert!(body.columns.is_empty());
    assert!(body.notice.unwrap().contains("merged_data.csv"));
}

#[tokio::test]
async fn test_columns_counts_skipped_rows() {
    let h = harness_with(Some("a,b\n1,2\n1,2,3\n4,5\n"), |_| {});
    let resp = h.app().oneshot(get("/data/columns")).await.unwrap();
    let body: ColumnsResponse = json_body(resp).await;
    assert_eq!(body.row_count, 2);
    assert_eq!(body.skipped_rows, 1);
}

#[tokio::test]
async fn test_values_missing_file_shows_notice() {
    let h = harness_with(None, |_| {});
    let resp = h.app().oneshot(get("/data/values?column=machine")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: ValuesResponse = json_body(resp).await;
    assert!(body.values.is_empty());
    assert!(body.notice.unwrap().contains("merged_data.csv"));
}

#[tokio::test]
async fn test_values_are_distinct_and_sorted() {
    let h = harness();
    let resp = h.app().oneshot(get("/data/values?column=machine")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: ValuesResponse = json_body(resp).await;
    assert_eq!(body.column, "machine");
    assert_eq!(body.values, vec!["FAN 1", "FAN 2"]);
    assert!(body.notice.is_none());
}

#[tokio::test]
async fn test_values_requires_known_column() {
    let h = harness();
    let resp = h.app().oneshot(get("/data/values")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = h.app().oneshot(get("/data/values?column=rpm")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: ErrorBody = json_body(resp).await;
    assert!(err.message.contains("rpm"));
}

#[tokio::test]
async fn test_table_all_returns_every_row() {
    let h = harness();
    let resp = h
        .app()
        .oneshot(get("/data/table?column=machine&value=All"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: TableResponse = json_body(resp).await;
    assert_eq!(body.total_rows, 3);
    assert_eq!(body.displayed_rows, 3);
    assert!(!body.sampled);
    assert_eq!(body.rows[0], vec!["1", "10", "FAN 1"]);
}

#[tokio::test]
async fn test_table_filters_rows() {
    let h = harness();
    let resp = h
        .app()
        .oneshot(get("/data/table?column=machine&value=FAN%201"))
        .await
        .unwrap();
    let body: TableResponse = json_body(resp).await;
    assert_eq!(body.total_rows, 2);
    assert!(body.rows.iter().all(|r| r[2] == "FAN 1"));
}

#[tokio::test]
async fn test_table_missing_file_with_filter_shows_notice() {
    let h = harness_with(None, |_| {});
    let resp = h
        .app()
        .oneshot(get("/data/table?column=machine&value=FAN%201"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: TableResponse = json_body(resp).await;
    assert!(body.columns.is_empty());
    assert!(body.rows.is_empty());
    assert_eq!(body.total_rows, 0);
    assert!(body.notice.unwrap().contains("merged_data.csv"));
}

#[tokio::test]
async fn test_table_samples_large_datasets() {
    let mut csv = String::from("i,machine\n");
    for i in 0..500 {
        csv.push_str(&format!("{},PUMP {}\n", i, i % 3));
    }
    let h = harness_with(Some(&csv), |c| c.data.max_display_rows = 100);

    let resp = h.app().oneshot(get("/data/table")).await.unwrap();
    let body: TableResponse = json_body(resp).await;
    assert_eq!(body.total_rows, 500);
    assert_eq!(body.displayed_rows, 100);
    assert_eq!(body.rows.len(), 100);
    assert!(body.sampled);

    let indices: Vec<usize> = body.rows.iter().map(|r| r[0].parse().unwrap()).collect();
    assert!(indices.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn test_chart_sums_per_group() {
    let h = harness();
    let resp = h.app().oneshot(get("/data/chart?x=x&y=y")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = json_body(resp).await;
    assert_eq!(
        body["groups"],
        serde_json::json!([{"key": "1", "sum": 15.0}, {"key": "2", "sum": 3.0}])
    );
}

#[tokio::test]
async fn test_chart_applies_filter() {
    let h = harness();
    let resp = h
        .app()
        .oneshot(get("/data/chart?x=machine&y=y&column=x&value=1"))
        .await
        .unwrap();
    let body: ChartResponse = json_body(resp).await;
    let sums: Vec<(String, f64)> = body.groups.into_iter().map(|g| (g.key, g.sum)).collect();
    assert_eq!(
        sums,
        vec![("FAN 1".to_string(), 10.0), ("FAN 2".to_string(), 5.0)]
    );
}

#[tokio::test]
async fn test_chart_rejects_non_numeric_y() {
    let h = harness();
    let resp = h
        .app()
        .oneshot(get("/data/chart?x=x&y=machine"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = h.app().oneshot(get("/data/chart?x=x")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chart_missing_file_shows_notice() {
    let h = harness_with(None, |_| {});
    let resp = h
        .app()
        .oneshot(get("/data/chart?x=x&y=y&column=machine&value=FAN%201"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: ChartResponse = json_body(resp).await;
    assert!(body.groups.is_empty());
    assert!(body.notice.is_some());
}

#[tokio::test]
async fn test_data_is_reloaded_per_request() {
    let h = harness();
    let resp = h.app().oneshot(get("/data/columns")).await.unwrap();
    let before: ColumnsResponse = json_body(resp).await;
    assert_eq!(before.row_count, 3);

    std::fs::write(&h.state.config.data.csv_path, "x,y\n1,1\n").unwrap();
    let resp = h.app().oneshot(get("/data/columns")).await.unwrap();
    let after: ColumnsResponse = json_body(resp).await;
    assert_eq!(after.row_count, 1);
    assert_eq!(after.columns, vec!["x", "y"]);
}
