//! Egress Adapter: the downstream HTTP/WebSocket surface over the Tick
//! Store. Pull (`GET /api/ticks`) and push (`GET /ws`) views of the same
//! snapshot, plus a static `config.json` passthrough for the frontend.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tokio::sync::watch;

use crate::types::tick::TickEntry;

/// The full current snapshot, published as a single JSON object keyed by
/// instrument id — the shape `GET /api/ticks` and the realtime channel both
/// serve.
pub type Snapshot = Arc<HashMap<u32, TickEntry>>;

/// Shared state handed to every axum handler: a `watch` channel carrying the
/// latest snapshot (so new subscribers see the current value immediately
/// and slow ones only ever see the latest, never a backlog) plus the
/// directory `GET /config.json` is served from.
#[derive(Clone)]
pub struct EgressState {
    snapshot_rx: watch::Receiver<Snapshot>,
    deploy_dir: PathBuf,
}

impl EgressState {
    /// Construct egress state from a snapshot receiver and the deploy
    /// directory `config.json` is read from.
    pub fn new(snapshot_rx: watch::Receiver<Snapshot>, deploy_dir: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_rx,
            deploy_dir: deploy_dir.into(),
        }
    }
}

/// Build the egress router: `GET /api/ticks`, `GET /ws`, `GET /config.json`.
pub fn router(state: EgressState) -> Router {
    Router::new()
        .route("/api/ticks", get(get_ticks))
        .route("/ws", get(ws_handler))
        .route("/config.json", get(get_config_json))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /api/ticks` — pull endpoint. Always 200 with a (possibly empty)
/// JSON object; no caching.
async fn get_ticks(State(state): State<EgressState>) -> impl IntoResponse {
    let snapshot = state.snapshot_rx.borrow().clone();
    Json(snapshot.as_ref().clone())
}

/// `GET /ws` — realtime push channel. Sends the current snapshot
/// immediately on connect, then again on every subsequent update; slow
/// clients simply miss intermediate values (no per-client backpressure).
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<EgressState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.snapshot_rx))
}

async fn handle_socket(mut socket: WebSocket, mut rx: watch::Receiver<Snapshot>) {
    loop {
        let snapshot = rx.borrow_and_update().clone();
        let Ok(json) = serde_json::to_string(snapshot.as_ref()) else {
            continue;
        };
        if socket.send(Message::Text(json.into())).await.is_err() {
            return;
        }
        if rx.changed().await.is_err() {
            // Publisher side dropped (all upstreams gone / shutdown); the
            // channel simply stops emitting.
            return;
        }
    }
}

/// `GET /config.json` — passthrough of a deploy-time config file.
/// `Cache-Control: no-store`; 404 if the file is absent.
async fn get_config_json(State(state): State<EgressState>) -> Response {
    let path = state.deploy_dir.join("config.json");
    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/json"),
                (header::CACHE_CONTROL, "no-store"),
            ],
            bytes,
        )
            .into_response(),
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "config.json not found" })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::Request;
    use tower::ServiceExt;

    fn empty_state() -> EgressState {
        let (_tx, rx) = watch::channel(Arc::new(HashMap::new()));
        EgressState::new(rx, "/nonexistent-tick-relay-deploy-dir")
    }

    #[tokio::test]
    async fn ticks_endpoint_returns_empty_object_with_no_upstreams() {
        let app = router(empty_state());
        let response = app
            .oneshot(Request::builder().uri("/api/ticks").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: HashMap<u32, TickEntry> = serde_json::from_slice(&body).unwrap();
        assert!(parsed.is_empty());
    }

    #[tokio::test]
    async fn config_json_404s_when_absent() {
        let app = router(empty_state());
        let response = app
            .oneshot(Request::builder().uri("/config.json").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
