use std::sync::Arc;

use common::config::Settings;
use common::runlog::RunLog;
use common::runner::RebootAction;
use common::scheduler::RebootScheduler;
use common::store::ConfigStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: ConfigStore,
    pub run_log: Arc<RunLog>,
    pub runner: Arc<dyn RebootAction>,
    pub scheduler: Arc<RebootScheduler>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create a new AppState instance
    pub fn new(
        store: ConfigStore,
        run_log: Arc<RunLog>,
        runner: Arc<dyn RebootAction>,
        scheduler: Arc<RebootScheduler>,
        settings: Settings,
    ) -> Self {
        Self {
            store,
            run_log,
            runner,
            scheduler,
            settings: Arc::new(settings),
        }
    }
}
