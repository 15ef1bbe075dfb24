use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ValidationError;
use crate::schedule::{is_valid_dow, is_valid_time};

/// The single reboot method currently honored. Forced on every save.
pub const RAW_CURL_METHOD: &str = "RAW_CURL";

/// Hard defaults for the schedule fields
pub const DEFAULT_DOW: &str = "0";
pub const DEFAULT_TIME: &str = "03:30";

// ============================================================================
// Device configuration
// ============================================================================

/// The persisted device configuration record.
///
/// There is exactly one of these, stored as pretty-printed JSON. Every field
/// carries a serde default so a partially hand-edited file still loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_ip")]
    pub ip: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_dow")]
    pub dow: String,
    #[serde(default = "default_time")]
    pub time: String,
    #[serde(default)]
    pub raw_curl_login: String,
    #[serde(default)]
    pub raw_curl_reboot: String,
}

fn default_ip() -> String {
    "192.168.1.2".to_string()
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_password() -> String {
    "password".to_string()
}

fn default_method() -> String {
    RAW_CURL_METHOD.to_string()
}

fn default_dow() -> String {
    DEFAULT_DOW.to_string()
}

fn default_time() -> String {
    DEFAULT_TIME.to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            ip: default_ip(),
            username: default_username(),
            password: default_password(),
            method: default_method(),
            dow: default_dow(),
            time: default_time(),
            raw_curl_login: String::new(),
            raw_curl_reboot: String::new(),
        }
    }
}

impl DeviceConfig {
    /// Overlay a patch on this record. Missing or empty patch fields keep the
    /// previous value; `method` is always forced to the supported value.
    pub fn merged(&self, patch: &ConfigPatch) -> DeviceConfig {
        DeviceConfig {
            ip: overlay(&self.ip, &patch.ip),
            username: overlay(&self.username, &patch.username),
            password: overlay(&self.password, &patch.password),
            method: RAW_CURL_METHOD.to_string(),
            dow: overlay(&self.dow, &patch.dow),
            time: overlay(&self.time, &patch.time),
            raw_curl_login: overlay(&self.raw_curl_login, &patch.raw_curl_login),
            raw_curl_reboot: overlay(&self.raw_curl_reboot, &patch.raw_curl_reboot),
        }
    }
}

fn overlay(current: &str, candidate: &Option<String>) -> String {
    match candidate {
        Some(value) if !value.is_empty() => value.clone(),
        _ => current.to_string(),
    }
}

/// Partial update over a [`DeviceConfig`].
///
/// Doubles as the `/save` form payload: HTML forms submit untouched inputs
/// as empty strings, which merge as "keep previous value".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigPatch {
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    // Accepted but never honored; the merge forces the supported method.
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub dow: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub raw_curl_login: Option<String>,
    #[serde(default)]
    pub raw_curl_reboot: Option<String>,
}

impl ConfigPatch {
    /// Field-level validation of the schedule fields.
    ///
    /// Only `dow` and `time` have a format to check; everything else is free
    /// text. Absent or empty fields are "keep previous" and never invalid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if let Some(dow) = self.dow.as_deref() {
            if !dow.is_empty() && !is_valid_dow(dow) {
                errors.push(ValidationError::invalid_field(
                    "dow",
                    "must be a single digit 0-6 (0 = Sunday)",
                ));
            }
        }

        if let Some(time) = self.time.as_deref() {
            if !time.is_empty() && !is_valid_time(time) {
                errors.push(ValidationError::invalid_field(
                    "time",
                    "must be HH:MM with hours 0-23 and minutes 00-59",
                ));
            }
        }

        errors
    }
}

// ============================================================================
// Run records
// ============================================================================

/// One completed invocation of the reboot action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub timestamp: DateTime<Utc>,
    pub exit_code: i32,
    pub output: String,
}

impl RunRecord {
    /// Carriage returns are stripped at construction so the record always
    /// holds the normalized output.
    pub fn new(timestamp: DateTime<Utc>, exit_code: i32, output: impl Into<String>) -> Self {
        Self {
            timestamp,
            exit_code,
            output: output.into().replace('\r', ""),
        }
    }
}

impl fmt::Display for RunRecord {
    /// Log file rendering: a `[RUN ...]` marker line followed by the captured
    /// output, without a trailing newline.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let timestamp = self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
        write!(f, "[RUN {}] exit={}", timestamp, self.exit_code)?;
        let body = self.output.trim_end_matches('\n');
        if !body.is_empty() {
            write!(f, "\n{}", body)?;
        }
        Ok(())
    }
}
