// Manual run handler

use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};

use crate::handlers::ErrorResponse;
use crate::state::AppState;

/// Run the reboot action immediately, then redirect back to the index.
///
/// The redirect happens regardless of the script's exit code; the outcome is
/// visible in the log tail. Only a failure to record the run is an error.
#[tracing::instrument(skip(state))]
pub async fn run_now(State(state): State<AppState>) -> Result<Response, ErrorResponse> {
    let record = state
        .runner
        .run_once()
        .await
        .map_err(|e| ErrorResponse::new("log_error", e.to_string()))?;

    tracing::info!(exit_code = record.exit_code, "Manual run finished");
    Ok(Redirect::to("/").into_response())
}
