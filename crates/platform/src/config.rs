//! Board configuration and constants
//!
//! Central values for the Thingy:91 X class board this coordinator runs on.
//! Drivers and the firmware crate reference these rather than hardcoding
//! device names or bus addresses.

/// The application name
pub const APP_NAME: &str = "t91x-pm";

/// Application version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Runtime power-managed peripherals, in suspend / resume order.
pub const PM_DEVICE_NAMES: [&str; 2] = ["uart0", "pwm0"];

/// Status LEDs, in reconfiguration order. The first one is the heartbeat.
pub const STATUS_LED_NAMES: [&str; 3] = ["led0", "led1", "led2"];

/// Sensors gated with the sensor rail.
pub const GATED_SENSOR_NAMES: [&str; 4] = ["adxl367", "bmm150", "bmi270", "bme688"];

/// Load switch feeding the sensors.
pub const SENSOR_RAIL_NAME: &str = "ldsw-sensors";

/// Load switch feeding the radio front end.
pub const RADIO_RAIL_NAME: &str = "ldsw-radio";

/// EEPROM byte offset of the USB device status word.
pub const USB_STATUS_EEPROM_OFFSET: u32 = 0;

/// Development mode banner
pub const fn dev_banner() -> &'static str {
    "t91x-pm - Development Mode"
}
