//! Centralized Constants
//!
//! Single source of truth for the tunables used by the engine's blocking
//! paths and waker storage.
//!
//! # Note
//!
//! Register offsets and command opcodes remain in
//! [`register`](super::register) as they are specific to the hardware block.

// =============================================================================
// Timing
// =============================================================================

/// Interval between lock/completion polls in microseconds
pub const DEFAULT_POLL_INTERVAL_US: u32 = 10;

/// Default command lock timeout (`None` = wait until cancelled)
pub const DEFAULT_LOCK_TIMEOUT_US: Option<u32> = None;

/// Default completion wait timeout (`None` = wait until cancelled)
pub const DEFAULT_COMPLETION_TIMEOUT_US: Option<u32> = None;

// =============================================================================
// Waiters
// =============================================================================

/// Number of async waiters a single wait point can hold before evicting.
///
/// Evicted waiters are woken and simply register again on their next poll.
pub const MAX_WAITERS: usize = 8;
