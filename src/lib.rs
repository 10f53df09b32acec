//! Labwise client core — the resilience and synchronization layer of the
//! lab-report analysis client.
//!
//! Three responsibilities live here, everything else is UI plumbing owned
//! by the app shell:
//! - turning unreliable HTTP calls into predictable outcomes
//!   ([`net::retry::with_retry`] + [`error::ApiError`]),
//! - tracking the server-side PDF parse job to a terminal state
//!   ([`job::start_polling`]),
//! - selecting what to display from a duplicate-prone biomarker history
//!   ([`biomarker::dedupe::dedupe`], [`biomarker::favorites::select_favorites`]),
//!
//! plus bounded, best-effort interaction history ([`history::HistoryStore`]).

pub mod biomarker;
pub mod config;
pub mod error;
pub mod history;
pub mod job;
pub mod net;

pub use biomarker::dedupe::dedupe;
pub use biomarker::favorites::{select_favorites, BiomarkerSummary, FavoritesConfig, Trend};
pub use biomarker::Biomarker;
pub use config::ClientConfig;
pub use error::ApiError;
pub use history::HistoryStore;
pub use job::{start_polling, JobStatus, JobTracker, PollConfig, PollEvent, ProcessingJob};
pub use net::client::ApiClient;
pub use net::connectivity::NetworkStatus;
pub use net::retry::{with_retry, RetryPolicy};
