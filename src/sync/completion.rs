//! Per-direction completion tracking.
//!
//! A [`CompletionChannel`] pairs two monotonic counters with a broadcast
//! wait point. `issued` advances on every doorbell write (under the command
//! lock), `completed` advances once per completion interrupt. Because the
//! hardware finishes commands of one direction in doorbell order, the
//! transfer issued as number `n` is done exactly when `completed >= n`.
//!
//! Every completion wakes all registered waiters: async tasks through their
//! wakers and parked threads through their [`Blocker`](super::Blocker)'s.

use core::sync::atomic::{AtomicU64, Ordering};
use core::task::Waker;

use super::primitives::WakerSet;
use super::wait::{Blocker, Cancellation, WaitContext};
use crate::driver::error::TransferResult;
use crate::driver::transfer::SequenceNumber;
use crate::internal::constants::MAX_WAITERS;

/// Counters and wait point for one transfer direction.
///
/// `W` sizes the waiter storage, see [`WakerSet`].
pub struct CompletionChannel<const W: usize = MAX_WAITERS> {
    issued: AtomicU64,
    completed: AtomicU64,
    waiters: WakerSet<W>,
}

impl<const W: usize> CompletionChannel<W> {
    /// Create a channel with both counters at zero.
    pub const fn new() -> Self {
        Self {
            issued: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            waiters: WakerSet::new(),
        }
    }

    /// Number of completion interrupts handled
    #[inline]
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    /// Number of transfers started
    #[inline]
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Acquire)
    }

    /// Transfers started but not yet reported complete
    #[inline]
    pub fn in_flight(&self) -> u64 {
        self.issued().saturating_sub(self.completed())
    }

    /// Whether the transfer identified by `seq` has completed
    #[inline]
    pub fn is_reached(&self, seq: SequenceNumber) -> bool {
        seq.is_reached_by(self.completed())
    }

    /// Allocate the sequence number of a transfer whose doorbell was just
    /// written. Callers must hold the command lock.
    #[inline]
    pub(crate) fn issue(&self) -> SequenceNumber {
        SequenceNumber::new(self.issued.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Record one completion and wake every waiter.
    ///
    /// Returns the new completion count.
    pub fn complete(&self) -> u64 {
        let count = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        self.waiters.wake_all();
        count
    }

    /// Register a task to be woken by the next completion.
    #[inline]
    pub fn register(&self, waker: &Waker) {
        self.waiters.register(waker);
    }

    /// Number of tasks currently waiting
    pub fn waiter_count(&self) -> usize {
        self.waiters.len()
    }

    /// Block until `seq` is reached, parking on the context's blocker until
    /// a completion wakes it.
    pub fn wait<C, B>(
        &self,
        seq: SequenceNumber,
        ctx: &mut WaitContext<C, B>,
        poll_interval_us: u32,
        timeout_us: Option<u32>,
    ) -> TransferResult<()>
    where
        C: Cancellation,
        B: Blocker,
    {
        ctx.poll_until(
            poll_interval_us,
            timeout_us,
            |waker| self.register(waker),
            || self.is_reached(seq).then_some(()),
        )
    }
}

impl<const W: usize> Default for CompletionChannel<W> {
    fn default() -> Self {
        Self::new()
    }
}
