// Health check handler

use axum::{response::IntoResponse, Json};
use chrono::{SecondsFormat, Utc};
use serde_json::json;

/// Liveness endpoint
#[tracing::instrument]
pub async fn healthz() -> impl IntoResponse {
    Json(json!({
        "ok": true,
        "time": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}
