use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod handlers;
mod routes;
mod state;
mod templates;

use common::config::Settings;
use common::runlog::RunLog;
use common::runner::ActionRunner;
use common::scheduler::RebootScheduler;
use common::store::ConfigStore;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=info,common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    tracing::info!("Starting rebooter");

    // Load configuration
    let settings = Settings::load()?;
    settings.validate().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!(
        host = %settings.server.host,
        port = settings.server.port,
        timezone = %settings.scheduler.timezone,
        "Configuration loaded"
    );

    // Device config store; create the file with defaults on first run
    let store = ConfigStore::new(&settings.paths.config_file);
    store.ensure()?;

    let run_log = Arc::new(RunLog::open(&settings.paths.log_file));
    let runner = Arc::new(ActionRunner::new(
        &settings.paths.reboot_script,
        &settings.paths.config_file,
        run_log.clone(),
    ));

    // Install the weekly trigger from the stored config
    let tz = settings.scheduler.tz()?;
    let scheduler = Arc::new(RebootScheduler::new(store.clone(), runner.clone(), tz));
    scheduler.reconfigure().await?;

    // Create application state and router
    let state = AppState::new(store, run_log, runner, scheduler.clone(), settings.clone());
    let app = routes::create_router(state);

    // Start server
    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));
    tracing::info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await;
    tracing::info!("Rebooter stopped");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Initiating graceful shutdown");
}
