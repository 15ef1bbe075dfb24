// Reboot action execution
//
// Runs the external reboot script as a subprocess and records the outcome in
// the run log. The script contract: the config file path is the only
// positional argument, and LOG_FILE in the environment points at the run log
// so the script can write its own progress lines there.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::process::Command;
use tokio::sync::Mutex;

use crate::errors::RunnerError;
use crate::models::RunRecord;
use crate::runlog::RunLog;

/// Exit code recorded when the script cannot be launched at all, mirroring
/// the shell's command-not-found convention.
const LAUNCH_FAILURE_EXIT: i32 = 127;

/// Exit code recorded when the process was terminated without one, e.g. by
/// a signal.
const SIGNALED_EXIT: i32 = -1;

/// Seam between the scheduler and the concrete subprocess runner, so the
/// scheduler can be exercised with a mock action in tests.
#[async_trait]
pub trait RebootAction: Send + Sync {
    async fn run_once(&self) -> Result<RunRecord, RunnerError>;
}

pub struct ActionRunner {
    script: PathBuf,
    config_path: PathBuf,
    log: Arc<RunLog>,
    in_flight: Mutex<()>,
}

impl ActionRunner {
    pub fn new(
        script: impl Into<PathBuf>,
        config_path: impl Into<PathBuf>,
        log: Arc<RunLog>,
    ) -> Self {
        Self {
            script: script.into(),
            config_path: config_path.into(),
            log,
            in_flight: Mutex::new(()),
        }
    }
}

#[async_trait]
impl RebootAction for ActionRunner {
    /// Run the script once and append the outcome to the run log.
    ///
    /// At most one action is in flight at a time: concurrent callers queue
    /// on the internal mutex and run after the current invocation finishes.
    /// Script failures of every kind end up as data in the returned record;
    /// the only error that propagates is a failed log append.
    #[tracing::instrument(skip(self))]
    async fn run_once(&self) -> Result<RunRecord, RunnerError> {
        let _guard = self.in_flight.lock().await;

        let started = Utc::now();
        tracing::info!(script = %self.script.display(), "Running reboot action");

        let record = match Command::new(&self.script)
            .arg(&self.config_path)
            .env("LOG_FILE", self.log.path())
            .output()
            .await
        {
            Ok(output) => {
                let exit_code = output.status.code().unwrap_or(SIGNALED_EXIT);
                let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&output.stderr));
                RunRecord::new(started, exit_code, text)
            }
            Err(e) => {
                tracing::warn!(
                    script = %self.script.display(),
                    error = %e,
                    "Failed to launch reboot script"
                );
                RunRecord::new(started, LAUNCH_FAILURE_EXIT, e.to_string())
            }
        };

        self.log.append(&record)?;
        tracing::info!(exit_code = record.exit_code, "Reboot action finished");
        Ok(record)
    }
}
