// Configuration save handler

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;

use common::errors::SaveError;
use common::models::ConfigPatch;

use crate::handlers::index::render_index;
use crate::handlers::ErrorResponse;
use crate::state::AppState;

/// Persist the submitted configuration and reinstall the trigger.
///
/// Invalid `dow` or `time` values reject the whole submission: the stored
/// config stays untouched and the page is re-rendered with the field errors.
/// On success the new trigger replaces the old one before the redirect.
#[tracing::instrument(skip(state, patch))]
pub async fn save(
    State(state): State<AppState>,
    Form(patch): Form<ConfigPatch>,
) -> Result<Response, ErrorResponse> {
    match state.store.save(&patch) {
        Ok(_) => {
            let spec = state
                .scheduler
                .reconfigure()
                .await
                .map_err(|e| ErrorResponse::new("scheduler_error", e.to_string()))?;
            tracing::info!(schedule = %spec, "Configuration saved, trigger reinstalled");
            Ok(Redirect::to("/").into_response())
        }
        Err(SaveError::Validation(errors)) => {
            tracing::warn!(
                fields = ?errors.iter().map(|e| e.field()).collect::<Vec<_>>(),
                "Rejected config save"
            );
            let config = state
                .store
                .load()
                .map_err(|e| ErrorResponse::new("store_error", e.to_string()))?;
            let html = render_index(&state, &config, &errors).await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response())
        }
        Err(SaveError::Store(e)) => Err(ErrorResponse::new("store_error", e.to_string())),
    }
}
