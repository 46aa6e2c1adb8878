//! Error types for the BlueDMA engine
//!
//! Errors are organized by domain:
//! - [`ConfigError`]: Engine configuration rejected at attach time
//! - [`TransferError`]: A blocking call gave up before its goal was reached
//!
//! The unified [`Error`] enum wraps both and is returned by the engine's
//! fallible methods.
//!
//! [`FatalError`] is deliberately *not* part of [`Error`]: it describes a
//! platform misconfiguration that the completion handler escalates to a
//! panic rather than returning to a caller.

use crate::driver::transfer::Direction;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Poll interval of zero microseconds
    ZeroPollInterval,
    /// A timeout shorter than a single poll interval
    TimeoutBelowPollInterval,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::ZeroPollInterval => "poll interval must be non-zero",
            ConfigError::TimeoutBelowPollInterval => "timeout shorter than poll interval",
        }
    }
}

// =============================================================================
// Transfer Errors
// =============================================================================

/// Errors from the blocking points of a transfer.
///
/// Both variants guarantee that nothing was written to the hardware by the
/// failing call: a cancelled issue never touches a register, and a cancelled
/// wait only stops observing a transfer that is already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferError {
    /// The wait was aborted by the caller's cancellation source
    Cancelled,
    /// The configured timeout elapsed
    Timeout,
}

impl core::fmt::Display for TransferError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TransferError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransferError::Cancelled => "cancelled while waiting",
            TransferError::Timeout => "operation timed out",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all recoverable errors for unified error handling.
///
/// ```ignore
/// match engine.copy_to_device(dev, host, len, &mut ctx) {
///     Ok(seq) => { /* wait for seq */ }
///     Err(Error::Transfer(TransferError::Cancelled)) => { /* caller was signalled */ }
///     Err(e) => { /* ... */ }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// Transfer error
    Transfer(TransferError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Transfer(e) => write!(f, "transfer: {}", e.as_str()),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<TransferError> for Error {
    fn from(e: TransferError) -> Self {
        Error::Transfer(e)
    }
}

/// Result type alias for engine operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for lock and completion waits
pub type TransferResult<T> = core::result::Result<T, TransferError>;

// =============================================================================
// Fatal Errors
// =============================================================================

/// Internal-consistency violations with no safe recovery at this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FatalError {
    /// A completion interrupt arrived carrying an identity this engine does
    /// not own: the platform's IRQ routing is broken.
    InterruptRouting {
        /// Identity the engine was attached with
        expected: u32,
        /// Identity that was delivered
        received: u32,
        /// Completion entry point that received it
        direction: Direction,
    },
}

impl core::fmt::Display for FatalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FatalError::InterruptRouting {
                expected,
                received,
                direction,
            } => write!(
                f,
                "interrupt routing violation: {} completion got irq {received}, engine owns irq {expected}",
                direction.as_str()
            ),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
