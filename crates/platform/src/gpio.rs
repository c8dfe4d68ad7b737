//! GPIO pin abstraction layer
//!
//! Status LEDs are reconfigured at runtime: driven outputs while the board
//! is active, high-impedance inputs in power save so they cannot leak
//! current through the LED.

use crate::HalError;

/// Runtime pin configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// High-impedance input.
    Input,
    /// Output driven to its inactive level (LED off, active-low).
    OutputInactive,
}

impl core::fmt::Display for PinMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Input => "input",
            Self::OutputInactive => "output-inactive",
        })
    }
}

/// A pin whose direction can change at runtime.
pub trait ConfigurablePin {
    /// Pin name used in logs.
    fn name(&self) -> &'static str;

    /// Reconfigure the pin.
    fn configure(&mut self, mode: PinMode) -> Result<(), HalError>;

    /// Invert the output level. Fails if the pin is not an output.
    fn toggle(&mut self) -> Result<(), HalError>;
}
