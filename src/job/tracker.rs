//! Registry of active polling loops — one per file id.
//!
//! Re-uploading a report (or re-entering the upload screen) must not leave
//! two loops polling the same job. The tracker cancels any prior handle for
//! a file id before starting a new one, and cancels everything on shutdown.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::poller::{start_polling, JobStatusSource, PollEvent, PollHandle};
use super::PollConfig;

/// Owns at most one [`PollHandle`] per file id.
#[derive(Default)]
pub struct JobTracker {
    active: Mutex<HashMap<String, PollHandle>>,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start polling `file_id`, cancelling any loop already tracking it.
    ///
    /// The prior loop is cancelled under the lock before the new one is
    /// spawned, so two loops for the same id are never live at once.
    pub fn start<S>(
        &self,
        source: Arc<S>,
        file_id: &str,
        config: PollConfig,
        on_event: impl Fn(PollEvent) + Send + Sync + 'static,
    ) where
        S: JobStatusSource + Send + Sync + 'static,
    {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = active.remove(file_id) {
            tracing::debug!(file_id, "Replacing existing polling loop");
            previous.cancel();
        }
        let handle = start_polling(source, file_id, config, on_event);
        active.insert(file_id.to_string(), handle);
    }

    /// Cancel the loop for `file_id`, if any. Returns whether one existed.
    pub fn cancel(&self, file_id: &str) -> bool {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        match active.remove(file_id) {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every active loop (app shutdown, profile switch).
    pub fn cancel_all(&self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        for (_, handle) in active.drain() {
            handle.cancel();
        }
    }

    /// Is a live (not cancelled) loop tracking this file id?
    pub fn is_polling(&self, file_id: &str) -> bool {
        let active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        active
            .get(file_id)
            .map(|handle| !handle.is_cancelled())
            .unwrap_or(false)
    }
}
