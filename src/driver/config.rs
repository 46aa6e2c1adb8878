//! Engine configuration.
//!
//! [`EngineConfig`] carries the interrupt identity the engine is attached to
//! and the timeout knobs of its two blocking points (command lock
//! acquisition and completion wait).

use crate::driver::error::{ConfigError, ConfigResult};
use crate::internal::constants::{
    DEFAULT_COMPLETION_TIMEOUT_US, DEFAULT_LOCK_TIMEOUT_US, DEFAULT_POLL_INTERVAL_US,
};

/// Complete engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineConfig {
    /// Interrupt line identity every completion must carry
    pub interrupt_id: u32,
    /// Upper bound on command lock acquisition (`None` = until cancelled)
    pub lock_timeout_us: Option<u32>,
    /// Upper bound on a completion wait (`None` = until cancelled)
    pub completion_timeout_us: Option<u32>,
    /// Sleep between re-checks for blockers that cannot be woken
    pub poll_interval_us: u32,
}

impl EngineConfig {
    /// Create a configuration for the given interrupt line with defaults
    #[must_use]
    pub const fn new(interrupt_id: u32) -> Self {
        Self {
            interrupt_id,
            lock_timeout_us: DEFAULT_LOCK_TIMEOUT_US,
            completion_timeout_us: DEFAULT_COMPLETION_TIMEOUT_US,
            poll_interval_us: DEFAULT_POLL_INTERVAL_US,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Bound command lock acquisition
    #[must_use]
    pub const fn with_lock_timeout_us(mut self, timeout_us: u32) -> Self {
        self.lock_timeout_us = Some(timeout_us);
        self
    }

    /// Bound completion waits
    #[must_use]
    pub const fn with_completion_timeout_us(mut self, timeout_us: u32) -> Self {
        self.completion_timeout_us = Some(timeout_us);
        self
    }

    /// Set the sleep between polls
    #[must_use]
    pub const fn with_poll_interval_us(mut self, interval_us: u32) -> Self {
        self.poll_interval_us = interval_us;
        self
    }

    /// Check the configuration for internal consistency.
    pub const fn validate(&self) -> ConfigResult<()> {
        if self.poll_interval_us == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if let Some(t) = self.lock_timeout_us {
            if t < self.poll_interval_us {
                return Err(ConfigError::TimeoutBelowPollInterval);
            }
        }
        if let Some(t) = self.completion_timeout_us {
            if t < self.poll_interval_us {
                return Err(ConfigError::TimeoutBelowPollInterval);
            }
        }
        Ok(())
    }
}
