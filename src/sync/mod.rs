//! Synchronization and Concurrency Support
//!
//! This module provides the synchronization the engine is built from:
//!
//! - **Primitives** (`primitives`): Low-level synchronization types
//!   - [`CriticalSectionCell`] - ISR-safe interior mutability
//!   - [`WakerSet`] - Broadcast waker storage woken from interrupts
//!
//! - **Command lock** (`lock`): [`CommandLock`] serializing access to the
//!   register block, with interruptible and timed acquisition
//!
//! - **Completion tracking** (`completion`): [`CompletionChannel`] holding a
//!   direction's counters and wait point
//!
//! - **Blocking waits** (`wait`): [`WaitContext`], the [`Blocker`] seam that
//!   lets the interrupt path wake parked threads (with [`Polling`] as the
//!   delay-based fallback), and the [`Cancellation`] trait
//!
//! - **Async Support** (`asynch`): futures for lock acquisition and
//!   completion, and the `AsyncDmaExt` extension trait
//!
//! # Feature Flags
//!
//! - `async`: Enables the `asynch` module

mod completion;
mod lock;
mod primitives;
mod wait;

pub use completion::CompletionChannel;
pub use lock::{CommandGuard, CommandLock};
pub use primitives::{CriticalSectionCell, WakerSet};
pub use wait::{Blocker, CancelFn, Cancellation, NeverCancel, Polling, WaitContext};

// Async support (requires async feature)
#[cfg(feature = "async")]
pub mod asynch;

#[cfg(feature = "async")]
pub use asynch::{AsyncDmaExt, CompletionFuture, LockFuture};
