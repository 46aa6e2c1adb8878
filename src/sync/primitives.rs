//! Synchronization primitives for ISR-safe access.
//!
//! Low-level primitives shared by the command lock and the completion
//! channels.

use core::cell::RefCell;
use core::task::Waker;
use critical_section::Mutex;

use crate::internal::constants::MAX_WAITERS;

/// Cell providing interior mutability with critical section protection.
///
/// Combines `critical_section::Mutex` with `RefCell` for safe mutable access
/// from both normal code and interrupt handlers.
pub struct CriticalSectionCell<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> CriticalSectionCell<T> {
    /// Create a new cell (const, suitable for static initialization).
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Execute a closure with exclusive mutable access.
    ///
    /// Interrupts are disabled for the duration of the closure.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| {
            let mut value = self.inner.borrow_ref_mut(cs);
            f(&mut value)
        })
    }

    /// Execute a closure with immutable access.
    #[inline]
    pub fn with_ref<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        critical_section::with(|cs| {
            let value = self.inner.borrow_ref(cs);
            f(&value)
        })
    }
}

// SAFETY: CriticalSectionCell uses critical sections to protect all access.
unsafe impl<T: Send> Sync for CriticalSectionCell<T> {}

/// Broadcast waker storage for a single wait point.
///
/// Every registered task is woken on [`wake_all`](Self::wake_all); each one
/// re-checks its own condition and registers again if it still has to wait.
///
/// `W` is the number of concurrent waiters the set holds without churn, and
/// should be sized to the most tasks or threads that can wait on one point.
/// One extra overflow slot absorbs the first waiter past `W`. Beyond that,
/// each newcomer displaces the overflow waker, which is woken so it is never
/// lost; only the displaced tasks pay for the missing capacity.
pub struct WakerSet<const W: usize = MAX_WAITERS> {
    slots: CriticalSectionCell<Slots<W>>,
}

struct Slots<const W: usize> {
    wakers: [Option<Waker>; W],
    overflow: Option<Waker>,
}

impl<const W: usize> Slots<W> {
    const EMPTY: Self = Self {
        wakers: [const { None }; W],
        overflow: None,
    };

    fn iter(&self) -> impl Iterator<Item = &Waker> {
        self.wakers.iter().chain(core::iter::once(&self.overflow)).flatten()
    }
}

impl<const W: usize> WakerSet<W> {
    /// Create an empty set (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            slots: CriticalSectionCell::new(Slots::EMPTY),
        }
    }

    /// Register a waker to be woken by the next broadcast.
    pub fn register(&self, waker: &Waker) {
        let displaced = self.slots.with(|slots| {
            if slots.iter().any(|w| w.will_wake(waker)) {
                return None;
            }
            if let Some(free) = slots.wakers.iter_mut().find(|s| s.is_none()) {
                *free = Some(waker.clone());
                return None;
            }
            slots.overflow.replace(waker.clone())
        });

        if let Some(displaced) = displaced {
            warn!("waker set over capacity {}, displacing a waiter", W);
            displaced.wake();
        }
    }

    /// Wake and clear every registered waker, returning how many were woken.
    ///
    /// Wakers run outside the critical section.
    pub fn wake_all(&self) -> usize {
        let taken = self
            .slots
            .with(|slots| core::mem::replace(slots, Slots::EMPTY));

        let mut woken = 0;
        for w in taken.wakers.into_iter().chain(core::iter::once(taken.overflow)).flatten() {
            w.wake();
            woken += 1;
        }
        woken
    }

    /// Number of registered wakers
    pub fn len(&self) -> usize {
        self.slots.with_ref(|slots| slots.iter().count())
    }

    /// Check if no waker is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of waiters held without displacement
    pub const fn capacity(&self) -> usize {
        W + 1
    }
}

impl<const W: usize> Default for WakerSet<W> {
    fn default() -> Self {
        Self::new()
    }
}
