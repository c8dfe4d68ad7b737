//! USB host confirmation poller.
//!
//! VBUS only says a cable is attached. A host is confirmed once the USB
//! stack reports the device configured, which it mirrors into EEPROM. The
//! poller waits the debounce interval after VBUS detection, reads that
//! status word, and keeps re-reading at the same interval while VBUS stays
//! present and no host has confirmed.
//!
//! There is exactly one poller task. Arming it while a run is already
//! pending folds into that run, so the read cadence never doubles.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Timer;
use platform::{read_u16_le, RegisterStore, UsbDeviceStatus};

use crate::config::CoordinatorConfig;
use crate::coordinator::PowerCore;

/// Single-slot request to start a poll run.
pub struct PollArm {
    inner: Signal<CriticalSectionRawMutex, ()>,
}

impl Default for PollArm {
    fn default() -> Self {
        Self::new()
    }
}

impl PollArm {
    /// Create an idle arm.
    pub const fn new() -> Self {
        Self {
            inner: Signal::new(),
        }
    }

    /// Request a run. Idempotent while a request is pending.
    pub fn arm(&self) {
        self.inner.signal(());
    }

    /// Whether a request has not been picked up yet.
    pub fn is_pending(&self) -> bool {
        self.inner.signaled()
    }

    async fn wait(&self) {
        self.inner.wait().await;
    }

    fn consume(&self) {
        self.inner.reset();
    }
}

/// What happens after one status read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollDecision {
    /// VBUS present, host not confirmed: read again after the interval.
    Reschedule,
    /// Host confirmed or VBUS gone: idle until re-armed.
    Finished,
}

/// Poller task state.
pub struct HostPoller<'a, S> {
    core: &'a PowerCore,
    store: S,
    config: CoordinatorConfig,
}

impl<'a, S: RegisterStore> HostPoller<'a, S> {
    /// Bind the poller to the shared state and the status store.
    pub fn new(core: &'a PowerCore, store: S, config: CoordinatorConfig) -> Self {
        Self {
            core,
            store,
            config,
        }
    }

    /// One status read and its consequences.
    pub async fn poll_once(&mut self) -> PollDecision {
        let presence = &self.core.presence;
        let epoch = presence.epoch();

        match read_u16_le(&mut self.store, self.config.usb_status_offset).await {
            Ok(raw) => {
                debug!("usb status {} ({})", raw, UsbDeviceStatus::from_raw(raw));
                if raw == self.config.configured_status {
                    if presence.confirm_host(epoch) {
                        info!("usb host confirmed");
                        self.core.wake.raise();
                    } else {
                        debug!("usb host confirmation discarded after vbus removal");
                    }
                }
            }
            Err(e) => warn!("usb status read failed: {}", e),
        }

        let flags = presence.snapshot();
        if !flags.host_confirmed && flags.vbus_present {
            PollDecision::Reschedule
        } else {
            PollDecision::Finished
        }
    }

    /// Serve poll requests forever.
    pub async fn run(&mut self) -> ! {
        loop {
            self.core.poll.wait().await;
            loop {
                Timer::after(self.config.host_check_interval).await;
                // Arms raised during the delay belong to this run.
                self.core.poll.consume();
                if self.poll_once().await == PollDecision::Finished {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use platform::mocks::MockEeprom;
    use platform::HalError;

    fn config() -> CoordinatorConfig {
        CoordinatorConfig::default()
    }

    #[tokio::test]
    async fn configured_status_confirms_and_raises_wake() {
        let core = PowerCore::new();
        core.presence.on_vbus_detected();
        let mut poller = HostPoller::new(&core, MockEeprom::new(3), config());

        assert_eq!(poller.poll_once().await, PollDecision::Finished);
        assert!(core.presence.is_host_confirmed());
        assert!(core.wake.is_raised());
    }

    #[tokio::test]
    async fn other_status_reschedules_while_vbus_present() {
        let core = PowerCore::new();
        core.presence.on_vbus_detected();
        let mut poller = HostPoller::new(&core, MockEeprom::new(2), config());

        assert_eq!(poller.poll_once().await, PollDecision::Reschedule);
        assert!(!core.presence.is_host_confirmed());
        assert!(!core.wake.is_raised());
    }

    #[tokio::test]
    async fn read_failure_falls_through_to_reschedule() {
        let core = PowerCore::new();
        core.presence.on_vbus_detected();
        let eeprom = MockEeprom::new(3);
        eeprom.push(Err(HalError::Timeout));
        let mut poller = HostPoller::new(&core, eeprom.clone(), config());

        assert_eq!(poller.poll_once().await, PollDecision::Reschedule);
        assert_eq!(poller.poll_once().await, PollDecision::Finished);
        assert_eq!(eeprom.reads(), 2);
    }

    #[tokio::test]
    async fn no_vbus_finishes_without_confirming() {
        let core = PowerCore::new();
        let mut poller = HostPoller::new(&core, MockEeprom::new(3), config());

        assert_eq!(poller.poll_once().await, PollDecision::Finished);
        assert!(!core.presence.is_host_confirmed());
    }

    #[tokio::test]
    async fn reads_configured_offset() {
        let core = PowerCore::new();
        let eeprom = MockEeprom::new(0);
        let mut poller =
            HostPoller::new(&core, eeprom.clone(), config().with_usb_status_offset(0x10));
        poller.poll_once().await;
        assert_eq!(eeprom.last_offset(), Some(0x10));
    }

    #[test]
    fn arm_is_idempotent() {
        let arm = PollArm::new();
        arm.arm();
        arm.arm();
        assert!(arm.is_pending());
        arm.consume();
        assert!(!arm.is_pending());
    }
}
