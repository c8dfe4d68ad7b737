//! Coordinator timing and register configuration.
//!
//! Defaults match the board: 100 ms USB host debounce, 1 s heartbeat, the
//! USB status word at EEPROM offset 0, and both nPM1300 VBUS events.

use embassy_time::Duration;
use platform::npm1300::EVENT_VBUS_MASK;
use platform::UsbDeviceStatus;

/// Delay between VBUS detection and the first status read, and between
/// subsequent reads while the host has not configured the device.
pub const HOST_CHECK_INTERVAL_MS: u64 = 100;

/// Upper bound on one main-loop wait for the wake signal.
pub const HEARTBEAT_TIMEOUT_MS: u64 = 1000;

/// Main-loop sleep after each heartbeat.
pub const LOOP_INTERVAL_MS: u64 = 1000;

/// Tunables for one coordinator instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Debounce before the first status read and spacing of later reads.
    pub host_check_interval: Duration,
    /// Longest the main loop blocks on the wake signal.
    pub heartbeat_timeout: Duration,
    /// Main-loop sleep per iteration.
    pub loop_interval: Duration,
    /// EEPROM offset of the USB status word.
    pub usb_status_offset: u32,
    /// Status value meaning the host configured the device.
    pub configured_status: u16,
    /// PMIC event bits to subscribe to.
    pub event_mask: u32,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            host_check_interval: Duration::from_millis(HOST_CHECK_INTERVAL_MS),
            heartbeat_timeout: Duration::from_millis(HEARTBEAT_TIMEOUT_MS),
            loop_interval: Duration::from_millis(LOOP_INTERVAL_MS),
            usb_status_offset: platform::config::USB_STATUS_EEPROM_OFFSET,
            configured_status: UsbDeviceStatus::CONFIGURED_CODE,
            event_mask: EVENT_VBUS_MASK,
        }
    }
}

impl CoordinatorConfig {
    /// Set the debounce / re-poll interval.
    pub fn with_host_check_interval(mut self, interval: Duration) -> Self {
        self.host_check_interval = interval;
        self
    }

    /// Set the wake-signal timeout.
    pub fn with_heartbeat_timeout(mut self, timeout: Duration) -> Self {
        self.heartbeat_timeout = timeout;
        self
    }

    /// Set the per-iteration sleep.
    pub fn with_loop_interval(mut self, interval: Duration) -> Self {
        self.loop_interval = interval;
        self
    }

    /// Set the EEPROM offset of the status word.
    pub fn with_usb_status_offset(mut self, offset: u32) -> Self {
        self.usb_status_offset = offset;
        self
    }

    /// Set the "configured" status value.
    pub fn with_configured_status(mut self, status: u16) -> Self {
        self.configured_status = status;
        self
    }

    /// Set the PMIC subscription mask.
    pub fn with_event_mask(mut self, mask: u32) -> Self {
        self.event_mask = mask;
        self
    }
}
