//! t91x Power-Mode Coordinator Firmware
//!
//! Decides from USB presence whether the board should run in full power
//! (peripherals resumed, radio on) or power save (peripherals suspended,
//! rails and radio off), and drives the transition.
//!
//! # Architecture
//!
//! ```text
//! PMIC event pump ──► PresenceEventSource ──► Presence ◄── HostPoller
//!                              │                 │             │
//!                              └──arm──► PollArm │        WakeSignal
//!                                                ▼             │
//!                         Coordinator (main loop) ◄────────────┘
//!                                                │
//!                         PowerModeMachine ──► PowerBoard ──► platform HAL
//! ```
//!
//! # Features
//!
//! - `defmt` - On-target logging through defmt
//! - `emulator` - Desktop simulator (tokio, tracing, clap)
//! - `std` - Enable standard library (for emulator and testing)
//!
//! # Examples
//!
//! ## Emulator Target
//!
//! ```bash
//! cargo run --example pm_simulator --features emulator -- --vbus-at-boot
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Critical correctness: deny these
#![deny(clippy::await_holding_lock)] // holding a blocking Mutex across .await is a bug
#![deny(unsafe_op_in_unsafe_fn)]
// unsafe fn body is not implicitly unsafe block
// Logging discipline
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)] // common in Rust crates; not a real issue
#![allow(clippy::missing_errors_doc)] // most errors are self-explanatory
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]
#![allow(async_fn_in_trait)]

// Must stay first: the logging macros are textually scoped.
#[macro_use]
mod fmt;

pub mod board;
pub mod boot;
pub mod config;
pub mod coordinator;
pub mod host_poll;
pub mod power_mode;
pub mod presence;
pub mod wake;

pub use board::{BoardError, Outcome, PowerBoard, PowerBoardBuilder, Step, StepLog, StepRecord};
pub use boot::{boot, run_event_pump, BootReport};
pub use config::CoordinatorConfig;
pub use coordinator::{Coordinator, Iteration, PowerCore};
pub use host_poll::{HostPoller, PollArm, PollDecision};
pub use power_mode::{PowerMode, PowerModeMachine, Transition};
pub use presence::{Presence, PresenceEventSource, PresenceEvents, PresenceFlags};
pub use wake::{WakeReason, WakeSignal};
