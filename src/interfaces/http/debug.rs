//! Debug listener: build and runtime variables plus a liveness probe.

use crate::infrastructure::observability::Metrics;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

pub struct DebugState {
    pub metrics: Metrics,
    pub config: serde_json::Value,
    pub started_at: DateTime<Utc>,
    pub started: Instant,
}

impl DebugState {
    pub fn new(metrics: Metrics, config: serde_json::Value) -> Self {
        Self {
            metrics,
            config,
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }
}

pub fn router(state: Arc<DebugState>) -> Router {
    Router::new()
        .route("/debug/vars", get(vars))
        .route("/debug/health", get(health))
        .with_state(state)
}

async fn vars(State(state): State<Arc<DebugState>>) -> Json<serde_json::Value> {
    Json(json!({
        "build": env!("CARGO_PKG_VERSION"),
        "started_at": state.started_at.to_rfc3339(),
        "uptime_seconds": state.started.elapsed().as_secs(),
        "poll_count": state.metrics.poll_count(),
        "cmdline": std::env::args().collect::<Vec<_>>(),
        "config": state.config,
    }))
}

async fn health() -> &'static str {
    "ok"
}
