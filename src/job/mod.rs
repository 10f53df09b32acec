//! Upload-job tracking — state machine types for server-side PDF processing.
//!
//! After `POST /upload` the backend parses the report asynchronously; the
//! client owns a [`ProcessingJob`] per upload and drives it to a terminal
//! state by polling `GET /status/{file_id}` (see [`poller`]). `Pending` and
//! `Processing` both keep polling and differ only for display.

pub mod poller;
pub mod tracker;

pub use poller::{start_polling, JobStatusSource, PollEvent, PollHandle};
pub use tracker::JobTracker;

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Client-side job state. `Completed`, `Failed`, and `TimedOut` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    TimedOut,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::TimedOut)
    }

    /// Map a backend status string. Older backend builds report
    /// "processed" for success and "error" for failure.
    pub fn from_wire(status: &str) -> Option<Self> {
        match status {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" | "processed" => Some(Self::Completed),
            "failed" | "error" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// One tracked upload job. Owned by its polling loop for its lifetime.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingJob {
    pub file_id: String,
    pub status: JobStatus,
    /// Server-provided detail for `Failed`, or the timeout message.
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Polling cadence, wall-clock budget, and consecutive-failure thresholds.
///
/// Thresholds are configuration, not algorithm: below `warn_after` failed
/// checks stay silent, at or above it the UI gets a transient warning, and
/// at `fail_after` the job fails hard.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Duration,
    pub warn_after: u32,
    pub fail_after: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(120),
            warn_after: 2,
            fail_after: 5,
        }
    }
}
