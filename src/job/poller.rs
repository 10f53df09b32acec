//! Polling loop for one upload job.
//!
//! `start_polling` spawns an async loop that checks the job status
//! immediately, then every `interval`, until a terminal status, the
//! wall-clock timeout, or cancellation. Checks are issued strictly
//! sequentially — the loop awaits each one, so a slow check can never
//! overlap the next tick. The caller owns the returned [`PollHandle`];
//! dropping it (component unmount, navigation) cancels the loop.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{JobStatus, PollConfig, ProcessingJob};
use crate::error::ApiError;
use crate::net::client::JobStatusResponse;

/// Where status checks come from. `ApiClient` implements this; tests
/// substitute scripted sources.
pub trait JobStatusSource: Send + Sync {
    fn fetch_status(
        &self,
        file_id: &str,
    ) -> impl Future<Output = Result<JobStatusResponse, ApiError>> + Send;
}

/// Event delivered to the UI callback while polling.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PollEvent {
    /// The job transitioned (or was created); terminal statuses are final.
    Status { job: ProcessingJob },
    /// Checks are failing but polling continues — non-blocking UI warning.
    Warning {
        file_id: String,
        message: String,
        consecutive_failures: u32,
    },
}

/// Owned handle for one polling loop. Cancel is idempotent; the handle
/// cancels on drop so an unmounted view cannot leak a timer.
pub struct PollHandle {
    file_id: String,
    cancelled: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Stop all future checks and suppress any not-yet-delivered events.
    /// Safe to call repeatedly and from drop paths.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            tracing::debug!(file_id = %self.file_id, "Polling cancelled");
        }
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    /// Wait for the loop to reach a terminal state (test and shutdown aid).
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Start polling the given job. The first check runs immediately, not on
/// the first tick. Events reach `on_event` only while the handle is live —
/// the cancelled flag is checked before every emission, so no callback
/// fires after `cancel()`.
pub fn start_polling<S>(
    source: Arc<S>,
    file_id: impl Into<String>,
    config: PollConfig,
    on_event: impl Fn(PollEvent) + Send + Sync + 'static,
) -> PollHandle
where
    S: JobStatusSource + Send + Sync + 'static,
{
    let file_id = file_id.into();
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = cancelled.clone();
    let id = file_id.clone();

    let task = tokio::spawn(async move {
        let deadline = Instant::now() + config.timeout;
        let mut job = ProcessingJob {
            file_id: id,
            status: JobStatus::Pending,
            error_message: None,
            created_at: Utc::now(),
        };
        let emit = move |event: PollEvent| {
            if !flag.load(Ordering::SeqCst) {
                on_event(event);
            }
        };
        emit(PollEvent::Status { job: job.clone() });

        let mut consecutive_failures: u32 = 0;
        loop {
            // One status check, preempted by the wall-clock deadline.
            let outcome = tokio::select! {
                result = source.fetch_status(&job.file_id) => Some(result),
                _ = tokio::time::sleep_until(deadline) => None,
            };

            match outcome {
                None => {
                    job.status = JobStatus::TimedOut;
                    job.error_message =
                        Some(ApiError::JobTimeout { elapsed: config.timeout }.to_string());
                    tracing::warn!(file_id = %job.file_id, "Processing job timed out");
                    emit(PollEvent::Status { job: job.clone() });
                    return;
                }
                Some(Ok(response)) => {
                    consecutive_failures = 0;
                    let status = match JobStatus::from_wire(&response.status) {
                        Some(status) => status,
                        None => {
                            tracing::debug!(
                                file_id = %job.file_id,
                                status = %response.status,
                                "Unrecognized job status, still processing"
                            );
                            JobStatus::Processing
                        }
                    };
                    if status != job.status {
                        job.status = status;
                        if status == JobStatus::Failed {
                            job.error_message = Some(
                                response
                                    .error_message
                                    .unwrap_or_else(|| "Report processing failed".to_string()),
                            );
                        }
                        tracing::info!(file_id = %job.file_id, status = ?status, "Job status changed");
                        emit(PollEvent::Status { job: job.clone() });
                    }
                    if job.status.is_terminal() {
                        return;
                    }
                }
                Some(Err(err)) => {
                    consecutive_failures += 1;
                    if consecutive_failures >= config.fail_after {
                        job.status = JobStatus::Failed;
                        job.error_message = Some("Maximum retry attempts reached".to_string());
                        tracing::warn!(
                            file_id = %job.file_id,
                            consecutive_failures,
                            "Giving up on status checks"
                        );
                        emit(PollEvent::Status { job: job.clone() });
                        return;
                    }
                    if consecutive_failures >= config.warn_after {
                        emit(PollEvent::Warning {
                            file_id: job.file_id.clone(),
                            message: err.to_string(),
                            consecutive_failures,
                        });
                    } else {
                        tracing::debug!(
                            file_id = %job.file_id,
                            consecutive_failures,
                            error = %err,
                            "Status check failed, retrying silently"
                        );
                    }
                }
            }

            // Wait for the next tick, unless the deadline lands first.
            tokio::select! {
                _ = tokio::time::sleep(config.interval) => {}
                _ = tokio::time::sleep_until(deadline) => {
                    job.status = JobStatus::TimedOut;
                    job.error_message =
                        Some(ApiError::JobTimeout { elapsed: config.timeout }.to_string());
                    tracing::warn!(file_id = %job.file_id, "Processing job timed out");
                    emit(PollEvent::Status { job: job.clone() });
                    return;
                }
            }
        }
    });

    PollHandle {
        file_id,
        cancelled,
        task: Some(task),
    }
}
