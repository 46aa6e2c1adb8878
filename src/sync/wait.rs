//! Cancellable, optionally bounded blocking for the engine's blocking calls.
//!
//! A blocking call alternates between an attempt and parking on a
//! [`Blocker`]. Before parking it registers the blocker's waker at the wait
//! point, so the completion interrupt (or the release of the command lock)
//! ends the park immediately. Blockers that cannot be woken fall back to
//! sleeping one poll interval through [`Polling`].
//!
//! Before each park the caller's [`Cancellation`] source and the remaining
//! timeout are consulted, so an aborted wait returns without side effects.

use core::sync::atomic::{AtomicBool, Ordering};
use core::task::Waker;

use embedded_hal::delay::DelayNs;

use crate::driver::error::{TransferError, TransferResult};

/// Source of an external "stop waiting" signal.
pub trait Cancellation {
    /// Whether the caller has asked to abandon the current wait
    fn is_cancelled(&self) -> bool;
}

/// Cancellation source that never fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeverCancel;

impl Cancellation for NeverCancel {
    #[inline(always)]
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl Cancellation for AtomicBool {
    #[inline]
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

impl<T: Cancellation + ?Sized> Cancellation for &T {
    #[inline]
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

/// Adapts a `Fn() -> bool` predicate (e.g. "signal pending") to [`Cancellation`].
#[derive(Debug, Clone, Copy)]
pub struct CancelFn<F>(pub F);

impl<F: Fn() -> bool> Cancellation for CancelFn<F> {
    #[inline]
    fn is_cancelled(&self) -> bool {
        (self.0)()
    }
}

/// Platform primitive that suspends the calling thread until notified.
///
/// The engine registers [`waker`](Self::waker) with the wait point before
/// calling [`park`](Self::park); waking it must end a pending or the next
/// park (a "permit" as in `std::thread::park`), so no notification between
/// registration and parking is lost.
///
/// A park may also return early when the platform interrupts the sleep (for
/// example a pending signal); the caller's [`Cancellation`] is checked next.
pub trait Blocker {
    /// Waker that unparks this blocker, `None` if it cannot be notified
    fn waker(&self) -> Option<Waker>;

    /// Suspend until woken, or until `timeout_us` has elapsed (`None` waits
    /// for a wake only). Blockers without a waker must not sleep longer than
    /// `poll_interval_us`.
    ///
    /// Returns the microseconds actually spent, used for timeout accounting.
    fn park(&mut self, timeout_us: Option<u32>, poll_interval_us: u32) -> u32;
}

impl<B: Blocker + ?Sized> Blocker for &mut B {
    #[inline]
    fn waker(&self) -> Option<Waker> {
        (**self).waker()
    }

    #[inline]
    fn park(&mut self, timeout_us: Option<u32>, poll_interval_us: u32) -> u32 {
        (**self).park(timeout_us, poll_interval_us)
    }
}

/// Fallback [`Blocker`] that sleeps one poll interval at a time.
///
/// Use only where the platform offers no way to suspend a thread until it is
/// notified: completion is noticed one interval late at worst.
#[derive(Debug)]
pub struct Polling<D> {
    delay: D,
}

impl<D: DelayNs> Polling<D> {
    /// Poll using `delay` for the sleeps
    pub fn new(delay: D) -> Self {
        Self { delay }
    }

    /// Delay provider
    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// Recover the delay provider
    pub fn into_inner(self) -> D {
        self.delay
    }
}

impl<D: DelayNs> Blocker for Polling<D> {
    fn waker(&self) -> Option<Waker> {
        None
    }

    fn park(&mut self, timeout_us: Option<u32>, poll_interval_us: u32) -> u32 {
        let us = timeout_us.map_or(poll_interval_us, |t| t.min(poll_interval_us));
        self.delay.delay_us(us);
        us
    }
}

/// Cancellation source and blocker for a blocking call.
///
/// # Example
///
/// ```ignore
/// static SIGNAL: AtomicBool = AtomicBool::new(false);
///
/// // Woken by the completion interrupt:
/// let mut ctx = WaitContext::with_blocker(kthread_blocker).with_cancel(&SIGNAL);
/// // Or, with only a delay available:
/// let mut ctx = WaitContext::new(delay).with_cancel(&SIGNAL);
///
/// let seq = engine.copy_to_device(dev, host, len, &mut ctx)?;
/// engine.wait_for_completion(Direction::ToDevice, seq, &mut ctx)?;
/// ```
#[derive(Debug)]
pub struct WaitContext<C, B> {
    cancel: C,
    blocker: B,
}

impl<D: DelayNs> WaitContext<NeverCancel, Polling<D>> {
    /// Context that sleeps on `delay` and can only give up on timeout
    pub fn new(delay: D) -> Self {
        Self::with_blocker(Polling::new(delay))
    }
}

impl<B: Blocker> WaitContext<NeverCancel, B> {
    /// Context that parks on `blocker` and can only give up on timeout
    pub fn with_blocker(blocker: B) -> Self {
        Self {
            cancel: NeverCancel,
            blocker,
        }
    }
}

impl<C: Cancellation, B: Blocker> WaitContext<C, B> {
    /// Replace the cancellation source
    pub fn with_cancel<C2: Cancellation>(self, cancel: C2) -> WaitContext<C2, B> {
        WaitContext {
            cancel,
            blocker: self.blocker,
        }
    }

    /// Whether the caller has asked to abandon the current wait
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The blocker parked on between attempts
    pub fn blocker(&self) -> &B {
        &self.blocker
    }

    /// Split back into cancellation source and blocker
    pub fn into_inner(self) -> (C, B) {
        (self.cancel, self.blocker)
    }

    /// Retry `attempt` until it yields a value.
    ///
    /// The attempt always runs at least once, so a free resource is taken
    /// even when cancellation is already pending. Between attempts the
    /// blocker's waker is handed to `register` and the attempt is retried
    /// once more before parking, which closes the window in which a
    /// notification could slip past. Gives up with
    /// [`TransferError::Timeout`] once `timeout_us` has been spent parked.
    pub(crate) fn poll_until<T, F, N>(
        &mut self,
        poll_interval_us: u32,
        timeout_us: Option<u32>,
        register: N,
        mut attempt: F,
    ) -> TransferResult<T>
    where
        F: FnMut() -> Option<T>,
        N: Fn(&Waker),
    {
        let mut elapsed_us: u32 = 0;
        loop {
            if let Some(value) = attempt() {
                return Ok(value);
            }
            if self.cancel.is_cancelled() {
                return Err(TransferError::Cancelled);
            }
            let remaining = match timeout_us {
                Some(t) if elapsed_us >= t => return Err(TransferError::Timeout),
                Some(t) => Some(t - elapsed_us),
                None => None,
            };
            if let Some(waker) = self.blocker.waker() {
                register(&waker);
                if let Some(value) = attempt() {
                    return Ok(value);
                }
            }
            let spent = self.blocker.park(remaining, poll_interval_us);
            elapsed_us = elapsed_us.saturating_add(spent);
        }
    }
}
