//! Command slot lock.
//!
//! A lock around the register block that can be taken three ways: once
//! ([`CommandLock::try_lock`]), by polling with cancellation and an optional
//! timeout ([`CommandLock::lock`]), or by awaiting `lock_async` (feature
//! `async`). Releasing the guard wakes every waiter, parked threads and
//! async tasks alike, so one of them can take the slot.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

use super::primitives::WakerSet;
use super::wait::{Blocker, Cancellation, WaitContext};
use crate::driver::error::TransferResult;
use crate::internal::constants::MAX_WAITERS;

/// Exclusive-access lock guarding a value, usable from thread context.
///
/// Never take this lock from an interrupt handler: the holder may be the
/// interrupted thread.
///
/// `W` sizes the waiter storage, see [`WakerSet`].
pub struct CommandLock<T, const W: usize = MAX_WAITERS> {
    locked: AtomicBool,
    pub(crate) waiters: WakerSet<W>,
    value: UnsafeCell<T>,
}

// SAFETY: access to `value` is serialized by `locked`; `T: Send` because the
// value is handed between whichever threads take the lock.
unsafe impl<T: Send, const W: usize> Sync for CommandLock<T, W> {}

impl<T, const W: usize> CommandLock<T, W> {
    /// Create an unlocked lock (const, suitable for static initialization).
    pub const fn new(value: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            waiters: WakerSet::new(),
            value: UnsafeCell::new(value),
        }
    }

    /// Take the lock if it is free.
    #[inline]
    pub fn try_lock(&self) -> Option<CommandGuard<'_, T, W>> {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| CommandGuard { lock: self })
    }

    /// Take the lock, parking on the context's blocker while it is held.
    ///
    /// The release of the current holder unparks the caller. Gives up with
    /// `Cancelled` when the context's cancellation source fires, or
    /// `Timeout` after `timeout_us`. Either way the lock is not held on
    /// return.
    pub fn lock<C, B>(
        &self,
        ctx: &mut WaitContext<C, B>,
        poll_interval_us: u32,
        timeout_us: Option<u32>,
    ) -> TransferResult<CommandGuard<'_, T, W>>
    where
        C: Cancellation,
        B: Blocker,
    {
        ctx.poll_until(
            poll_interval_us,
            timeout_us,
            |waker| self.waiters.register(waker),
            || self.try_lock(),
        )
    }

    /// Check if the lock is currently held
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }

    /// Access the value through a unique borrow (no locking needed)
    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }

    /// Consume the lock, returning the value
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }

    fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
        self.waiters.wake_all();
    }
}

/// RAII guard; the lock is released when this is dropped.
pub struct CommandGuard<'a, T, const W: usize = MAX_WAITERS> {
    lock: &'a CommandLock<T, W>,
}

impl<T, const W: usize> Deref for CommandGuard<'_, T, W> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the guard proves exclusive ownership of the lock.
        unsafe { &*self.lock.value.get() }
    }
}

impl<T, const W: usize> DerefMut for CommandGuard<'_, T, W> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: the guard proves exclusive ownership of the lock.
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<T, const W: usize> Drop for CommandGuard<'_, T, W> {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}

#[cfg(test)]
#[allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]
mod tests {
    extern crate std;

    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::driver::error::TransferError;
    use crate::testing::{MockDelay, RecordingBlocker, ThreadBlocker, WakeCounter, test_waker};

    #[test]
    fn try_lock_is_exclusive() {
        let lock: CommandLock<u32> = CommandLock::new(0u32);
        let guard = lock.try_lock();
        assert!(guard.is_some());
        assert!(lock.is_locked());
        assert!(lock.try_lock().is_none());

        drop(guard);
        assert!(!lock.is_locked());
        assert!(lock.try_lock().is_some());
    }

    #[test]
    fn guard_gives_mutable_access() {
        let lock: CommandLock<u32> = CommandLock::new(1u32);
        *lock.try_lock().unwrap() += 41;
        assert_eq!(lock.into_inner(), 42);
    }

    #[test]
    fn lock_free_succeeds_without_sleeping() {
        let lock: CommandLock<()> = CommandLock::new(());
        let mut ctx = WaitContext::new(MockDelay::new());
        assert!(lock.lock(&mut ctx, 10, None).is_ok());
        assert_eq!(ctx.blocker().delay().total_us(), 0);
    }

    #[test]
    fn lock_cancelled_while_held() {
        let lock: CommandLock<()> = CommandLock::new(());
        let _held = lock.try_lock().unwrap();
        let flag = AtomicBool::new(true);
        let mut ctx = WaitContext::new(MockDelay::new()).with_cancel(&flag);

        let result = lock.lock(&mut ctx, 10, None).map(|_| ());
        assert_eq!(result, Err(TransferError::Cancelled));
        assert!(lock.is_locked());
    }

    #[test]
    fn lock_times_out_while_held() {
        let lock: CommandLock<()> = CommandLock::new(());
        let _held = lock.try_lock().unwrap();
        let mut ctx = WaitContext::new(MockDelay::new());

        let result = lock.lock(&mut ctx, 10, Some(30)).map(|_| ());
        assert_eq!(result, Err(TransferError::Timeout));
        assert_eq!(ctx.blocker().delay().total_us(), 30);
    }

    #[test]
    fn release_wakes_waiters() {
        let lock: CommandLock<()> = CommandLock::new(());
        let counter = WakeCounter::new();
        let guard = lock.try_lock().unwrap();
        lock.waiters.register(&test_waker(counter.clone()));

        drop(guard);
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn lock_serializes_threads() {
        let lock: Arc<CommandLock<u64>> = Arc::new(CommandLock::new(0u64));
        let handles: std::vec::Vec<_> = (0..4)
            .map(|_| {
                let lock = lock.clone();
                thread::spawn(move || {
                    let mut ctx = WaitContext::new(MockDelay::yielding());
                    for _ in 0..1_000 {
                        let mut guard = lock.lock(&mut ctx, 1, None).unwrap();
                        let v = *guard;
                        thread::yield_now();
                        *guard = v + 1;
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(*lock.try_lock().unwrap(), 4_000);
    }

    #[test]
    fn parked_caller_unparked_by_release() {
        let lock: CommandLock<u32> = CommandLock::new(0);
        let counter = WakeCounter::new();
        let mut held = Some(lock.try_lock().unwrap());
        let mut blocker = RecordingBlocker::with_hook(test_waker(counter.clone()), || {
            // The holder finishes while the caller is parked.
            drop(held.take());
        });
        let mut ctx = WaitContext::with_blocker(&mut blocker);

        let guard = lock.lock(&mut ctx, 10, None).map(|g| *g);
        assert_eq!(guard, Ok(0));
        drop(ctx);

        assert_eq!(blocker.parks(), 1);
        assert_eq!(blocker.requested(), std::vec![None]);
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn thread_blocked_on_lock_resumes_on_release() {
        let lock: Arc<CommandLock<u32>> = Arc::new(CommandLock::new(0));
        let held = lock.try_lock().unwrap();

        let waiter = {
            let lock = lock.clone();
            thread::spawn(move || {
                let mut ctx = WaitContext::with_blocker(ThreadBlocker::current());
                let value = lock.lock(&mut ctx, 10, None).map(|g| *g);
                (value, ctx.blocker().parks())
            })
        };

        while lock.waiters.is_empty() {
            thread::yield_now();
        }
        drop(held);

        let (value, parks) = waiter.join().unwrap();
        assert_eq!(value, Ok(0));
        assert!(parks >= 1);
    }
}
