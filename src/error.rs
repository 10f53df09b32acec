//! Classified API errors — the single error vocabulary for the client core.
//!
//! Every failure that crosses a network or storage boundary is normalized
//! into an [`ApiError`] before anything else sees it. Callers pattern-match
//! on variants (or use the accessor methods) instead of inspecting raw
//! transport errors; network-shaped variants are only ever constructed here
//! and in the retry wrapper.

use std::time::Duration;

/// Classified error for all remote calls and the history store.
///
/// The taxonomy mirrors what the UI needs to decide recovery:
/// - `Offline` / `Network` / `Server` are transient and retried by the
///   network wrapper before surfacing.
/// - `Client` is never retried — a malformed request cannot succeed twice.
/// - `JobTimeout` is terminal for a polling job.
/// - `StorageQuota` is recovered internally by the history store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// No connectivity at call time — the request was never sent.
    #[error("You appear to be offline. Check your connection and try again.")]
    Offline,

    /// Request sent but no usable response (connect refused, reset, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// 5xx response — the backend failed, retrying may help.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// 4xx response (or an undecodable body) — retrying cannot help.
    #[error("Request failed ({status}): {message}")]
    Client { status: u16, message: String },

    /// A polled processing job exceeded its wall-clock budget.
    #[error("Processing timed out after {} seconds", .elapsed.as_secs())]
    JobTimeout { elapsed: Duration },

    /// Persisted history write failed (quota or io) — recovered locally.
    #[error("History storage failed: {0}")]
    StorageQuota(String),
}

impl ApiError {
    /// Build from an HTTP status line, splitting 5xx from everything else.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if (500..600).contains(&status) {
            Self::Server { status, message }
        } else {
            Self::Client { status, message }
        }
    }

    /// HTTP status code, or 0 when the error has no HTTP response.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Server { status, .. } | Self::Client { status, .. } => *status,
            _ => 0,
        }
    }

    /// True when the request never produced a response (offline included).
    pub fn is_network_error(&self) -> bool {
        matches!(self, Self::Offline | Self::Network(_))
    }

    /// True only for the offline short-circuit. Implies `is_network_error`.
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Offline)
    }

    /// Should the network wrapper try this call again?
    /// Network failures and 5xx only — 4xx and local errors never retry.
    pub fn is_retryable(&self) -> bool {
        self.is_network_error() || matches!(self, Self::Server { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            Self::from_status(status.as_u16(), e.to_string())
        } else if e.is_decode() {
            // A response arrived but its body was not the expected shape.
            // Retrying would fetch the same body, so classify non-retryable.
            Self::Client {
                status: 0,
                message: format!("Malformed response: {e}"),
            }
        } else {
            Self::Network(e.to_string())
        }
    }
}
