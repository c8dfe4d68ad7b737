//! Unified collaborator error type.
//!
//! Every HAL trait in this crate reports failure through [`HalError`].
//! Variants carry only fixed-size data so the type stays `Copy` and can be
//! stored in step logs without `alloc`.

use thiserror_no_std::Error;

/// Failure reported by a hardware collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// Bus or register transfer failed.
    #[error("bus transfer failed")]
    Io,
    /// The device did not answer in time.
    #[error("device timed out")]
    Timeout,
    /// The device exists but its driver is not initialised.
    #[error("device not ready")]
    NotReady,
    /// The driver refused the request with a raw (negative errno style) code.
    #[error("request rejected with code {0}")]
    Rejected(i32),
    /// The device does not support the requested operation.
    #[error("operation not supported")]
    Unsupported,
}
