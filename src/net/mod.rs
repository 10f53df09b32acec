//! Networking: connectivity state, the retry wrapper, and the typed
//! backend client.

pub mod client;
pub mod connectivity;
pub mod retry;

pub use client::{ApiClient, BiomarkerQuery, JobStatusResponse, UploadResponse};
pub use connectivity::{Connectivity, NetworkStatus};
pub use retry::{with_retry, RetryPolicy};
