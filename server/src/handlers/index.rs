// Main page handler

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use tera::Context;

use common::errors::ValidationError;
use common::models::DeviceConfig;
use common::runlog::TAIL_CAPACITY;

use crate::handlers::ErrorResponse;
use crate::state::AppState;
use crate::templates::TEMPLATES;

/// Index page: current configuration, edit form, active schedule, log tail.
/// Served with `Cache-Control: no-store` so the browser never shows a stale
/// config or log view.
#[tracing::instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Response, ErrorResponse> {
    let config = state
        .store
        .load()
        .map_err(|e| ErrorResponse::new("store_error", e.to_string()))?;

    let html = render_index(&state, &config, &[]).await?;
    Ok((
        StatusCode::OK,
        [(header::CACHE_CONTROL, "no-store")],
        Html(html),
    )
        .into_response())
}

/// Render the index template. Shared with the save handler, which re-renders
/// the page with field errors on a rejected submission.
pub(crate) async fn render_index(
    state: &AppState,
    config: &DeviceConfig,
    errors: &[ValidationError],
) -> Result<String, ErrorResponse> {
    let config_json = serde_json::to_string_pretty(config)
        .map_err(|e| ErrorResponse::new("render_error", e.to_string()))?;
    let schedule = state.scheduler.current_spec().await.map(|s| s.to_string());
    let errors: Vec<String> = errors.iter().map(|e| e.to_string()).collect();

    let mut context = Context::new();
    context.insert("config", config);
    context.insert("config_json", &config_json);
    context.insert("schedule", &schedule);
    context.insert("timezone", &state.settings.scheduler.timezone);
    context.insert("log_tail", &state.run_log.tail(TAIL_CAPACITY));
    context.insert("errors", &errors);

    TEMPLATES
        .render("index.html", &context)
        .map_err(|e| ErrorResponse::new("template_error", format!("Template error: {}", e)))
}
