//! Conditional logging macros for the storage layer.
//!
//! Each calling module defines two constants: `ENABLE_LOGS` switches the
//! module's logging on or off, `LOG_TARGET` names the target the lines are
//! filed under (so `RUST_LOG=health_intake::workbook=debug` works).
//!
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//! const LOG_TARGET: &str = "health_intake::records";
//!
//! use crate::{log_info, log_warn, log_error};
//!
//! log_info!("saved record {}", id);
//! ```

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!(target: LOG_TARGET, $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!(target: LOG_TARGET, $($arg)*);
        }
    };
}

/// Warnings for degraded-but-recoverable paths (skipped rows, best-effort reads).
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!(target: LOG_TARGET, $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!(target: LOG_TARGET, $($arg)*);
        }
    };
}
