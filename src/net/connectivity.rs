//! Connectivity state — the offline short-circuit seam.
//!
//! The app shell owns the actual connectivity signal (OS network events,
//! a heartbeat, or a user toggle) and flips [`NetworkStatus`] accordingly.
//! The retry wrapper only ever asks "are we offline right now?" through the
//! [`Connectivity`] trait, so tests can simulate flaky links without touching
//! real sockets.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Read-only view of connectivity, checked before every network attempt.
pub trait Connectivity: Send + Sync {
    fn is_offline(&self) -> bool;
}

/// Shared connectivity flag. Clones observe the same underlying state.
///
/// Starts online — the pessimistic alternative would block every call
/// until the shell reports in.
#[derive(Clone, Debug, Default)]
pub struct NetworkStatus {
    offline: Arc<AtomicBool>,
}

impl NetworkStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the connection as lost. Subsequent calls short-circuit.
    pub fn set_offline(&self) {
        if !self.offline.swap(true, Ordering::Relaxed) {
            tracing::info!("Connectivity lost — remote calls will short-circuit");
        }
    }

    /// Mark the connection as restored.
    pub fn set_online(&self) {
        if self.offline.swap(false, Ordering::Relaxed) {
            tracing::info!("Connectivity restored");
        }
    }

    pub fn is_online(&self) -> bool {
        !self.offline.load(Ordering::Relaxed)
    }
}

impl Connectivity for NetworkStatus {
    fn is_offline(&self) -> bool {
        self.offline.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_online() {
        let status = NetworkStatus::new();
        assert!(status.is_online());
        assert!(!status.is_offline());
    }

    #[test]
    fn set_offline_and_back() {
        let status = NetworkStatus::new();
        status.set_offline();
        assert!(status.is_offline());
        status.set_online();
        assert!(status.is_online());
    }

    #[test]
    fn clones_share_state() {
        let status = NetworkStatus::new();
        let view = status.clone();
        status.set_offline();
        assert!(view.is_offline());
        view.set_online();
        assert!(!status.is_offline());
    }

    #[test]
    fn transitions_are_idempotent() {
        let status = NetworkStatus::new();
        status.set_offline();
        status.set_offline();
        assert!(status.is_offline());
        status.set_online();
        status.set_online();
        assert!(status.is_online());
    }
}
