use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the main application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index::index))
        .route("/save", post(handlers::config::save))
        .route("/run-now", post(handlers::run::run_now))
        .route("/healthz", get(handlers::health::healthz))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use proptest::prelude::*;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use common::config::Settings;
    use common::models::DeviceConfig;
    use common::runlog::RunLog;
    use common::runner::ActionRunner;
    use common::scheduler::RebootScheduler;
    use common::store::ConfigStore;

    fn test_settings(dir: &TempDir) -> Settings {
        let mut settings = Settings::default();
        settings.paths.config_file = dir.path().join("config.json");
        settings.paths.log_file = dir.path().join("rebooter.log");
        settings.paths.reboot_script = dir.path().join("reboot.sh");
        settings
    }

    async fn test_state(dir: &TempDir) -> AppState {
        let settings = test_settings(dir);
        let store = ConfigStore::new(&settings.paths.config_file);
        store.ensure().unwrap();

        let run_log = Arc::new(RunLog::open(&settings.paths.log_file));
        let runner = Arc::new(ActionRunner::new(
            &settings.paths.reboot_script,
            &settings.paths.config_file,
            run_log.clone(),
        ));
        let scheduler = Arc::new(RebootScheduler::new(
            store.clone(),
            runner.clone(),
            settings.scheduler.tz().unwrap(),
        ));
        scheduler.reconfigure().await.unwrap();

        AppState::new(store, run_log, runner, scheduler, settings)
    }

    #[cfg(unix)]
    fn write_script(path: &std::path::Path, body: &str) {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        fs::write(path, format!("#!/bin/sh\n{body}")).unwrap();
        let mut perms = fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).unwrap();
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn post_form(app: &Router, uri: &str, body: &str) -> (StatusCode, axum::http::HeaderMap) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        (response.status(), response.headers().clone())
    }

    #[tokio::test]
    async fn test_healthz_reports_ok() {
        let dir = TempDir::new().unwrap();
        let app = create_router(test_state(&dir).await);

        let (status, _, body) = get(&app, "/healthz").await;
        assert_eq!(status, StatusCode::OK);

        let payload: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(payload["ok"], true);
        let time = payload["time"].as_str().unwrap();
        assert!(time.contains('T') && time.ends_with('Z'));
    }

    #[tokio::test]
    async fn test_index_shows_config_schedule_and_is_uncached() {
        let dir = TempDir::new().unwrap();
        let app = create_router(test_state(&dir).await);

        let (status, headers, body) = get(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-store");
        assert!(body.contains("192.168.1.2"));
        assert!(body.contains("30 3 * * 0"));
        // Tera auto-escapes the slash in the rendered page.
        assert!(body.contains("Europe&#x2F;Paris"));
    }

    #[tokio::test]
    async fn test_save_updates_config_and_reinstalls_trigger() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir).await;
        let app = create_router(state.clone());

        let (status, headers) =
            post_form(&app, "/save", "ip=10.0.0.50&dow=5&time=14:05").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(headers.get(header::LOCATION).unwrap(), "/");

        let config = state.store.load().unwrap();
        assert_eq!(config.ip, "10.0.0.50");
        assert_eq!(config.dow, "5");
        assert_eq!(config.time, "14:05");

        let spec = state.scheduler.current_spec().await.unwrap();
        assert_eq!(spec.to_string(), "5 14 * * 5");
    }

    #[tokio::test]
    async fn test_save_with_invalid_fields_is_rejected() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir).await;
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/save")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("dow=9&time=99:99"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("Configuration not saved"));
        assert!(body.contains("must be a single digit 0-6"));
        assert!(body.contains("hours 0-23"));

        // The stored config is untouched
        assert_eq!(state.store.load().unwrap(), DeviceConfig::default());
        assert_eq!(
            state.scheduler.current_spec().await.unwrap().to_string(),
            "30 3 * * 0"
        );
    }

    #[tokio::test]
    async fn test_save_with_empty_fields_keeps_previous_values() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir).await;
        let app = create_router(state.clone());

        post_form(&app, "/save", "ip=172.16.0.4&username=operator").await;
        let (status, _) = post_form(&app, "/save", "ip=&username=&password=").await;
        assert_eq!(status, StatusCode::SEE_OTHER);

        let config = state.store.load().unwrap();
        assert_eq!(config.ip, "172.16.0.4");
        assert_eq!(config.username, "operator");
        assert_eq!(config.password, DeviceConfig::default().password);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_now_records_outcome_and_redirects() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir).await;
        write_script(
            &state.settings.paths.reboot_script,
            "echo no answer from device 1>&2\nexit 3\n",
        );
        let app = create_router(state.clone());

        let (status, headers) = post_form(&app, "/run-now", "").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(headers.get(header::LOCATION).unwrap(), "/");

        let tail = state.run_log.tail(1);
        assert!(tail.contains("exit=3"));
        assert!(tail.contains("no answer from device"));

        // And the index page now shows the recorded run
        let (_, _, body) = get(&app, "/").await;
        assert!(body.contains("exit=3"));
    }

    #[tokio::test]
    async fn test_run_now_redirects_even_when_script_is_missing() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir).await;
        let app = create_router(state.clone());

        let (status, _) = post_form(&app, "/run-now", "").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert!(state.run_log.tail(1).contains("exit=127"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let dir = TempDir::new().unwrap();
        let app = create_router(test_state(&dir).await);
        let (status, _, _) = get(&app, "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    /// *For any* valid schedule submitted through the form, the page served
    /// afterwards shows the matching five-field cron expression and the
    /// stored file holds the submitted values.
    #[test]
    fn property_saved_schedule_is_reflected_on_the_page() {
        proptest!(|(dow in 0u8..7, hour in 0u32..24, minute in 0u32..60)| {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let dir = TempDir::new().unwrap();
                let state = test_state(&dir).await;
                let app = create_router(state.clone());

                let form = format!("dow={dow}&time={hour}:{minute:02}");
                let (status, _) = post_form(&app, "/save", &form).await;
                assert_eq!(status, StatusCode::SEE_OTHER);

                let (_, _, body) = get(&app, "/").await;
                assert!(body.contains(&format!("{minute} {hour} * * {dow}")));

                let config = state.store.load().unwrap();
                assert_eq!(config.dow, dow.to_string());
                assert_eq!(config.time, format!("{hour}:{minute:02}"));

                state.scheduler.stop().await;
            });
        });
    }
}
