//! Hardware Abstraction Layer (HAL) for the t91x power-mode coordinator
//!
//! This crate provides trait-based abstractions for every collaborator the
//! coordinator drives, enabling development and testing without physical
//! hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (pm-firmware crate: presence, poller, power modes)
//!         ↓
//! Platform HAL (this crate - trait abstractions + nPM1300 driver)
//!         ↓
//! Hardware Layer (board drivers: I2C, GPIO, EEPROM, modem)
//! ```
//!
//! # Abstractions
//!
//! - [`Regulator`] - Load switches feeding the sensors and the radio
//! - [`PmDevice`] - Peripherals with runtime suspend / resume
//! - [`SensorGate`] - Sensors quiesced before their rail drops
//! - [`ConfigurablePin`] - Status LEDs
//! - [`NetInterface`] - Cellular interface admin state
//! - [`RegisterStore`] - EEPROM holding the USB device status
//! - [`PowerManagementIc`] - PMIC registers and event line
//!
//! All of them report failure through [`HalError`].
//!
//! # Features
//!
//! - `std`: Enable standard library support and the [`mocks`] module
//! - `defmt`: Enable defmt logging derives

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // hex addresses and register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors: callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(async_fn_in_trait)] // Embassy no_std: single-threaded, Send bounds not needed

pub mod config;
pub mod error;
pub mod gpio;
pub mod network;
pub mod npm1300;
pub mod power;
pub mod storage;
pub mod usb_status;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

pub use error::HalError;
pub use gpio::{ConfigurablePin, PinMode};
pub use network::NetInterface;
pub use power::{PmAction, PmDevice, PowerManagementIc, Regulator, SensorGate};
pub use storage::{read_u16_le, RegisterStore};
pub use usb_status::UsbDeviceStatus;
