//! Network interface abstraction
//!
//! Only the administrative state matters to power management: bringing the
//! interface down lets the modem power its radio off.

use crate::HalError;

/// Administrative control of a network interface.
pub trait NetInterface {
    /// Interface name used in logs.
    fn name(&self) -> &'static str {
        "net"
    }

    /// Whether the interface is administratively up.
    fn is_admin_up(&self) -> bool;

    /// Bring the interface up.
    fn up(&mut self) -> Result<(), HalError>;

    /// Take the interface down.
    fn down(&mut self) -> Result<(), HalError>;
}
