//! USB device-controller status codes.
//!
//! The USB stack writes its latest status callback code to EEPROM. Codes
//! follow the device-controller callback enumeration, in order.

/// Status reported by the USB device controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsbDeviceStatus {
    /// Controller error.
    Error,
    /// Bus reset.
    Reset,
    /// Cable connected.
    Connected,
    /// Host selected a configuration.
    Configured,
    /// Cable disconnected.
    Disconnected,
    /// Bus suspended.
    Suspend,
    /// Bus resumed.
    Resume,
    /// Interface selected.
    Interface,
    /// Endpoint halted.
    SetHalt,
    /// Endpoint halt cleared.
    ClearHalt,
    /// Start of frame.
    Sof,
    /// Any code outside the table.
    Unknown,
}

impl UsbDeviceStatus {
    /// Raw code of [`UsbDeviceStatus::Configured`].
    pub const CONFIGURED_CODE: u16 = 3;

    /// Decode a raw status code.
    pub const fn from_raw(raw: u16) -> Self {
        match raw {
            0 => Self::Error,
            1 => Self::Reset,
            2 => Self::Connected,
            3 => Self::Configured,
            4 => Self::Disconnected,
            5 => Self::Suspend,
            6 => Self::Resume,
            7 => Self::Interface,
            8 => Self::SetHalt,
            9 => Self::ClearHalt,
            10 => Self::Sof,
            _ => Self::Unknown,
        }
    }

    /// Status name for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Reset => "reset",
            Self::Connected => "connected",
            Self::Configured => "configured",
            Self::Disconnected => "disconnected",
            Self::Suspend => "suspend",
            Self::Resume => "resume",
            Self::Interface => "interface",
            Self::SetHalt => "set-halt",
            Self::ClearHalt => "clear-halt",
            Self::Sof => "sof",
            Self::Unknown => "unknown",
        }
    }
}

impl core::fmt::Display for UsbDeviceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
