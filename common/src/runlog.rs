// Flat-file run log with an in-memory tail
//
// Every action run appends one rendered record to a plain text file. The
// reboot script writes to the same file (it receives the path via LOG_FILE),
// so the file may hold lines this process never wrote. On open the file is
// parsed leniently once to seed a bounded ring of recent records; tail
// queries are served from that ring, never from the file.

use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::errors::LogError;
use crate::models::RunRecord;

/// How many records the in-memory tail retains.
pub const TAIL_CAPACITY: usize = 200;

const RUN_MARKER: &str = "[RUN ";

#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    recent: Mutex<VecDeque<RunRecord>>,
}

impl RunLog {
    /// Open the log at `path`, seeding the in-memory tail from whatever is
    /// already there. The file itself is not created until the first append;
    /// a missing file just means an empty tail.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let recent = match fs::read_to_string(&path) {
            Ok(data) => {
                let records = parse_records(&data);
                tracing::debug!(
                    path = %path.display(),
                    records = records.len(),
                    "Seeded run log tail from existing file"
                );
                records
            }
            Err(_) => VecDeque::new(),
        };
        Self {
            path,
            recent: Mutex::new(recent),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record to the file and the in-memory tail.
    pub fn append(&self, record: &RunRecord) -> Result<(), LogError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        // Terminated with a newline so successive records never share a line.
        writeln!(file, "{record}")?;

        let mut recent = self.recent.lock().unwrap();
        recent.push_back(record.clone());
        while recent.len() > TAIL_CAPACITY {
            recent.pop_front();
        }
        Ok(())
    }

    /// The last `n` records, rendered and newline-joined. Empty string when
    /// nothing has been recorded yet.
    pub fn tail(&self, n: usize) -> String {
        let recent = self.recent.lock().unwrap();
        let skip = recent.len().saturating_sub(n);
        recent
            .iter()
            .skip(skip)
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Lenient record parse. A line opening with the `[RUN ...]` marker starts a
/// new record; every other line (including marker lines that fail to parse,
/// and anything the script wrote on its own) is carried as output of the
/// record in progress. Lines before the first marker have no record to
/// belong to and are skipped. Only the newest [`TAIL_CAPACITY`] records are
/// kept.
fn parse_records(data: &str) -> VecDeque<RunRecord> {
    let mut records: VecDeque<RunRecord> = VecDeque::new();

    for line in data.lines() {
        if let Some((timestamp, exit_code)) = parse_marker(line) {
            records.push_back(RunRecord::new(timestamp, exit_code, ""));
            while records.len() > TAIL_CAPACITY {
                records.pop_front();
            }
        } else if let Some(current) = records.back_mut() {
            if !current.output.is_empty() {
                current.output.push('\n');
            }
            current.output.push_str(line);
        }
    }

    records
}

/// `[RUN <rfc3339>] exit=<int>` or `None`.
fn parse_marker(line: &str) -> Option<(DateTime<Utc>, i32)> {
    let rest = line.strip_prefix(RUN_MARKER)?;
    let (timestamp, rest) = rest.split_once(']')?;
    let exit_code = rest.trim().strip_prefix("exit=")?.parse::<i32>().ok()?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp.trim())
        .ok()?
        .with_timezone(&Utc);
    Some((timestamp, exit_code))
}
