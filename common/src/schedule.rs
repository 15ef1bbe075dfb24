// Weekly trigger derivation and next-occurrence calculation
//
// The device configuration stores the schedule as two strings (`dow`, `time`);
// this module turns them into a concrete weekly trigger and computes fire
// times in the configured timezone.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule as CronSchedule;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::errors::ScheduleError;
use crate::models::{DeviceConfig, DEFAULT_DOW, DEFAULT_TIME};

fn time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([01]?\d|2[0-3]):[0-5]\d$").expect("Invalid time regex"))
}

fn dow_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-6]$").expect("Invalid day-of-week regex"))
}

/// `HH:MM`, 24-hour clock, single-digit hour allowed.
pub fn is_valid_time(value: &str) -> bool {
    time_regex().is_match(value)
}

/// Single digit `0`-`6`, Sunday-based.
pub fn is_valid_dow(value: &str) -> bool {
    dow_regex().is_match(value)
}

/// A weekly fire time: one day of the week, one wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerSpec {
    pub minute: u32,
    pub hour: u32,
    /// 0 = Sunday .. 6 = Saturday
    pub dow: u8,
}

impl TriggerSpec {
    /// Derive the trigger from a device configuration.
    ///
    /// Infallible: unparseable schedule fields are logged and coerced to the
    /// defaults, so a hand-mangled config file degrades instead of wedging
    /// the scheduler. Strict rejection happens on the save path instead.
    pub fn derive(config: &DeviceConfig) -> TriggerSpec {
        let dow = if is_valid_dow(&config.dow) {
            // Single ASCII digit, checked above.
            config.dow.parse::<u8>().unwrap_or(0)
        } else {
            tracing::warn!(
                dow = %config.dow,
                fallback = DEFAULT_DOW,
                "Stored day-of-week is not a digit 0-6, using fallback"
            );
            0
        };

        let time = if is_valid_time(&config.time) {
            config.time.as_str()
        } else {
            tracing::warn!(
                time = %config.time,
                fallback = DEFAULT_TIME,
                "Stored time is not HH:MM, using fallback"
            );
            DEFAULT_TIME
        };

        let (hour, minute) = split_time(time);
        TriggerSpec { minute, hour, dow }
    }

    /// Six-field expression for the `cron` crate (leading seconds field).
    ///
    /// The weekday is spelled by name: numeric day-of-week ordinals are
    /// ambiguous across cron dialects, names are not.
    pub fn cron_expression(&self) -> String {
        const DOW_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
        format!(
            "0 {} {} * * {}",
            self.minute, self.hour, DOW_NAMES[self.dow as usize]
        )
    }

    /// First fire time strictly after `after`, in `after`'s timezone.
    pub fn next_occurrence(&self, after: &DateTime<Tz>) -> Result<DateTime<Tz>, ScheduleError> {
        let expression = self.cron_expression();
        let schedule =
            CronSchedule::from_str(&expression).map_err(|e| ScheduleError::InvalidCronExpression {
                expression: expression.clone(),
                reason: e.to_string(),
            })?;

        schedule
            .after(after)
            .next()
            .ok_or_else(|| ScheduleError::NoNextOccurrence {
                spec: self.to_string(),
            })
    }

    /// Same as [`next_occurrence`](Self::next_occurrence) but anchored at the
    /// current instant in the given timezone.
    pub fn next_occurrence_from_now(&self, tz: Tz) -> Result<DateTime<Tz>, ScheduleError> {
        let now = Utc::now().with_timezone(&tz);
        self.next_occurrence(&now)
    }
}

impl fmt::Display for TriggerSpec {
    /// Classic five-field cron rendering, e.g. `5 14 * * 3` for Wednesday
    /// 14:05. This is the human-facing form shown in the dashboard.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} * * {}", self.minute, self.hour, self.dow)
    }
}

// Callers only pass validated "H:MM" / "HH:MM" strings.
fn split_time(time: &str) -> (u32, u32) {
    let mut parts = time.splitn(2, ':');
    let hour = parts
        .next()
        .and_then(|p| p.parse::<u32>().ok())
        .unwrap_or(3);
    let minute = parts
        .next()
        .and_then(|p| p.parse::<u32>().ok())
        .unwrap_or(30);
    (hour, minute)
}
