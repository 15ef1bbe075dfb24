// Reboot trigger scheduling
//
// Exactly one weekly trigger is live at a time. Reconfiguring swaps the
// active timer task under a mutex: the previous task is signalled and
// awaited before the replacement is spawned, so a stale trigger can never
// fire alongside the new one.

use std::sync::Arc;

use chrono::Utc;
use chrono_tz::Tz;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::errors::SchedulerError;
use crate::runner::RebootAction;
use crate::schedule::TriggerSpec;
use crate::store::ConfigStore;

struct ActiveTrigger {
    spec: TriggerSpec,
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

/// Owns the timer task that fires the reboot action on the configured
/// weekly schedule.
pub struct RebootScheduler {
    store: ConfigStore,
    action: Arc<dyn RebootAction>,
    timezone: Tz,
    active: Mutex<Option<ActiveTrigger>>,
}

impl RebootScheduler {
    pub fn new(store: ConfigStore, action: Arc<dyn RebootAction>, timezone: Tz) -> Self {
        Self {
            store,
            action,
            timezone,
            active: Mutex::new(None),
        }
    }

    /// Derive the trigger from the stored configuration and install it,
    /// replacing any previously active trigger. Returns the installed spec.
    #[instrument(skip(self))]
    pub async fn reconfigure(&self) -> Result<TriggerSpec, SchedulerError> {
        let config = self.store.load()?;
        let spec = TriggerSpec::derive(&config);

        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            Self::shut_down(previous).await;
        }

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(Self::trigger_loop(
            spec,
            self.timezone,
            self.action.clone(),
            shutdown_rx,
        ));
        *active = Some(ActiveTrigger {
            spec,
            shutdown_tx,
            handle,
        });

        info!(spec = %spec, timezone = %self.timezone, "Reboot trigger installed");
        Ok(spec)
    }

    /// Stop the active trigger, if any. Used on graceful shutdown.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            Self::shut_down(previous).await;
            info!("Reboot trigger stopped");
        }
    }

    /// The currently installed trigger, for display.
    pub async fn current_spec(&self) -> Option<TriggerSpec> {
        self.active.lock().await.as_ref().map(|active| active.spec)
    }

    async fn shut_down(previous: ActiveTrigger) {
        let _ = previous.shutdown_tx.send(());
        if let Err(e) = previous.handle.await {
            warn!(error = %e, "Timer task ended abnormally");
        }
    }

    /// Timer loop for one installed trigger.
    ///
    /// Occurrences are computed strictly after the previous fire instant, so
    /// a fast wakeup can never fire the same occurrence twice. The action
    /// runs in its own task; a slow run delays nothing here, and overlap is
    /// the runner's concern.
    async fn trigger_loop(
        spec: TriggerSpec,
        timezone: Tz,
        action: Arc<dyn RebootAction>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        let mut after = Utc::now().with_timezone(&timezone);

        loop {
            let next = match spec.next_occurrence(&after) {
                Ok(next) => next,
                Err(e) => {
                    error!(error = %e, "Cannot compute next occurrence, stopping timer");
                    return;
                }
            };
            let now = Utc::now().with_timezone(&timezone);
            let wait = (next - now).to_std().unwrap_or_default();
            debug!(next = %next, "Sleeping until next reboot trigger");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    info!(spec = %spec, "Trigger fired, launching reboot action");
                    let action = action.clone();
                    tokio::spawn(async move {
                        if let Err(e) = action.run_once().await {
                            error!(error = %e, "Scheduled reboot action failed");
                        }
                    });
                    after = next;
                }
                _ = shutdown_rx.recv() => {
                    debug!("Trigger timer shutting down");
                    return;
                }
            }
        }
    }
}
