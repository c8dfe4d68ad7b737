//! Logging macros.
//!
//! On target the `defmt` feature routes log lines through defmt (RTT); the
//! desktop simulator (`emulator` feature) routes them through `tracing`.
//! With neither enabled the arguments are still type-checked but nothing is
//! emitted. Format strings must stick to plain `{}` placeholders so they
//! are valid for both backends.

#![allow(unused_macros)]

macro_rules! log_dispatch {
    ($level:ident, $($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::$level!($($arg)*);
        #[cfg(feature = "emulator")]
        ::tracing::$level!($($arg)*);
        #[cfg(not(any(feature = "defmt", feature = "emulator")))]
        {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}

macro_rules! trace {
    ($($arg:tt)*) => { log_dispatch!(trace, $($arg)*) };
}

macro_rules! debug {
    ($($arg:tt)*) => { log_dispatch!(debug, $($arg)*) };
}

macro_rules! info {
    ($($arg:tt)*) => { log_dispatch!(info, $($arg)*) };
}

macro_rules! warn {
    ($($arg:tt)*) => { log_dispatch!(warn, $($arg)*) };
}

macro_rules! error {
    ($($arg:tt)*) => { log_dispatch!(error, $($arg)*) };
}
