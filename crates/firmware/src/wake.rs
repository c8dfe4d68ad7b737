//! Binary wake signal for the main loop.
//!
//! Any number of raises before the next wait collapse into one wake, and a
//! wait consumes it. The main loop never blocks longer than the heartbeat
//! timeout.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration};

/// Why a wait returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WakeReason {
    /// Someone raised the signal.
    Raised,
    /// The timeout elapsed first.
    TimedOut,
}

/// Count-limited (0 or 1) wake gate.
pub struct WakeSignal {
    inner: Signal<CriticalSectionRawMutex, ()>,
}

impl Default for WakeSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl WakeSignal {
    /// Create a drained signal.
    pub const fn new() -> Self {
        Self {
            inner: Signal::new(),
        }
    }

    /// Make the signal available. Safe from interrupt context.
    pub fn raise(&self) {
        self.inner.signal(());
    }

    /// Whether a raise is waiting to be consumed.
    pub fn is_raised(&self) -> bool {
        self.inner.signaled()
    }

    /// Wait for a raise, consuming it, or give up after `timeout`.
    pub async fn wait_timeout(&self, timeout: Duration) -> WakeReason {
        match with_timeout(timeout, self.inner.wait()).await {
            Ok(()) => WakeReason::Raised,
            Err(_) => WakeReason::TimedOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn raises_collapse_into_one_wake() {
        let wake = WakeSignal::new();
        wake.raise();
        wake.raise();
        assert!(wake.is_raised());
        assert_eq!(wake.wait_timeout(Duration::from_millis(50)).await, WakeReason::Raised);
        assert!(!wake.is_raised());
        assert_eq!(wake.wait_timeout(Duration::from_millis(20)).await, WakeReason::TimedOut);
    }
}
