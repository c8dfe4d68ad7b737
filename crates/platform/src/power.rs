//! Power management abstraction
//!
//! Collaborators the power-mode coordinator drives when the board moves
//! between full power and power save: load-switch regulators, runtime
//! power-managed peripherals, sensor gates and the PMIC itself.
//!
//! The synchronous traits are object safe so a board can hold ordered
//! lists of `&mut dyn` handles. [`PowerManagementIc`] is async and is only
//! ever used through a generic parameter.

use crate::HalError;

/// A switchable supply rail (load switch or LDO).
pub trait Regulator {
    /// Rail name used in logs.
    fn name(&self) -> &'static str;

    /// Turn the rail on.
    fn enable(&mut self) -> Result<(), HalError>;

    /// Turn the rail off.
    fn disable(&mut self) -> Result<(), HalError>;

    /// Last commanded state of the rail.
    fn is_enabled(&self) -> bool;
}

/// Runtime power-management action for a peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PmAction {
    /// Put the peripheral into its low-power suspended state.
    Suspend,
    /// Bring the peripheral back to its active state.
    Resume,
}

impl PmAction {
    /// Lower-case action name for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Suspend => "suspend",
            Self::Resume => "resume",
        }
    }
}

impl core::fmt::Display for PmAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A peripheral whose driver supports runtime suspend / resume
/// (UART, PWM, ...).
pub trait PmDevice {
    /// Device name used in logs.
    fn name(&self) -> &'static str;

    /// Apply a power-management action.
    fn run_action(&mut self, action: PmAction) -> Result<(), HalError>;
}

/// A sensor that must be quiesced before its supply rail drops.
///
/// Both hooks default to success so boards can register sensors that need
/// no special handling.
pub trait SensorGate {
    /// Sensor name used in logs.
    fn name(&self) -> &'static str;

    /// Prepare for loss of power.
    fn quiesce(&mut self) -> Result<(), HalError> {
        Ok(())
    }

    /// Re-initialise after power returns.
    fn restore(&mut self) -> Result<(), HalError> {
        Ok(())
    }
}

/// Power management IC: register access plus an event line.
pub trait PowerManagementIc {
    /// Read one register byte. `base` selects the peripheral block,
    /// `offset` the register within it.
    async fn read_register(&mut self, base: u8, offset: u8) -> Result<u8, HalError>;

    /// Route the given event bits to the host interrupt line.
    fn subscribe(&mut self, mask: u32) -> Result<(), HalError>;

    /// Wait for the next batch of subscribed events and return their bits.
    async fn wait_for_events(&mut self) -> u32;
}
