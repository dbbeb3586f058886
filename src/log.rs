//! Logging shims.
//!
//! On the target these forward to `defmt`. On the host (tests) they expand to
//! nothing, since there is no global defmt logger to link against.

macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(target_arch = "arm")]
        defmt::debug!($($arg)*);
    }};
}

macro_rules! log_info {
    ($($arg:tt)*) => {{
        #[cfg(target_arch = "arm")]
        defmt::info!($($arg)*);
    }};
}

macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(target_arch = "arm")]
        defmt::warn!($($arg)*);
    }};
}

macro_rules! log_error {
    ($($arg:tt)*) => {{
        #[cfg(target_arch = "arm")]
        defmt::error!($($arg)*);
    }};
}
