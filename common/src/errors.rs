// Error handling framework

use thiserror::Error;

/// Schedule-related errors
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidCronExpression { expression: String, reason: String },

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("No next occurrence for trigger '{spec}'")]
    NoNextOccurrence { spec: String },
}

/// Validation errors for user-submitted config fields
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid field value for {field}: {reason}")]
    InvalidFieldValue { field: String, reason: String },
}

impl ValidationError {
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFieldValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the field this error refers to
    pub fn field(&self) -> &str {
        match self {
            ValidationError::InvalidFieldValue { field, .. } => field,
        }
    }
}

/// Config store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Filesystem error: {0}")]
    FileSystem(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
}

/// Errors returned by `ConfigStore::save`
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(Vec<ValidationError>),

    #[error("Store error: {0}")]
    Store(StoreError),
}

/// Run log errors
#[derive(Error, Debug)]
pub enum LogError {
    #[error("Filesystem error: {0}")]
    FileSystem(String),
}

/// Action runner errors
///
/// Subprocess failures are not errors here: they are recorded as data in
/// the run log. Only a failure to write that record surfaces.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed to append run record: {0}")]
    LogAppendFailed(String),
}

/// Scheduler engine errors
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Config store error: {0}")]
    Store(String),

    #[error("Schedule error: {0}")]
    Schedule(String),
}

// Implement From for common external errors

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::FileSystem(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::InvalidJson(err.to_string())
    }
}

impl From<StoreError> for SaveError {
    fn from(err: StoreError) -> Self {
        SaveError::Store(err)
    }
}

impl From<std::io::Error> for LogError {
    fn from(err: std::io::Error) -> Self {
        LogError::FileSystem(err.to_string())
    }
}

impl From<LogError> for RunnerError {
    fn from(err: LogError) -> Self {
        RunnerError::LogAppendFailed(err.to_string())
    }
}

impl From<StoreError> for SchedulerError {
    fn from(err: StoreError) -> Self {
        SchedulerError::Store(err.to_string())
    }
}

impl From<ScheduleError> for SchedulerError {
    fn from(err: ScheduleError) -> Self {
        SchedulerError::Schedule(err.to_string())
    }
}
