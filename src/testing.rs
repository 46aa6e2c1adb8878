//! Testing utilities and mock implementations
//!
//! This module provides mock implementations for exercising the engine on
//! the host without hardware access.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};
use std::boxed::Box;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::Wake;
use std::thread::{self, Thread};
use std::time::{Duration, Instant};
use std::vec::Vec;

use crate::internal::register::{Register, RegisterBlock};
use crate::sync::Blocker;

// =============================================================================
// Mock Register Block
// =============================================================================

/// One observable effect on the register block, in program order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterEvent {
    /// A 64-bit register store
    Write(Register, u64),
    /// A write barrier
    Barrier,
}

/// Register block that records every write and barrier.
///
/// Clones share one log, so a test can keep a handle after moving the block
/// into an engine.
///
/// # Example
///
/// ```ignore
/// let regs = MockRegisters::new();
/// let engine = DmaEngine::new(regs.clone(), EngineConfig::new(7));
/// engine.copy_to_device(dev, host, 64, &mut ctx).unwrap();
/// assert_eq!(regs.events().len(), 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockRegisters {
    log: Arc<Mutex<Vec<RegisterEvent>>>,
}

impl MockRegisters {
    /// Create an empty recording block
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded event
    pub fn events(&self) -> Vec<RegisterEvent> {
        self.log.lock().unwrap().clone()
    }

    /// Forget recorded events
    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }

    /// Number of doorbell writes recorded
    pub fn doorbells(&self) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, RegisterEvent::Write(Register::Cmd, _)))
            .count()
    }
}

impl RegisterBlock for MockRegisters {
    fn write(&mut self, reg: Register, value: u64) {
        self.log.lock().unwrap().push(RegisterEvent::Write(reg, value));
    }

    fn write_barrier(&mut self) {
        self.log.lock().unwrap().push(RegisterEvent::Barrier);
    }
}

// =============================================================================
// Mock Delay
// =============================================================================

/// Mock delay for testing without actual timing
///
/// Records delays for verification without actually waiting. The yielding
/// variant hands the CPU to other test threads on every delay.
#[derive(Debug, Default)]
pub struct MockDelay {
    total_ns: u64,
    yield_on_delay: bool,
}

impl MockDelay {
    /// Create a new mock delay
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock delay that yields the thread on every call
    pub fn yielding() -> Self {
        Self {
            total_ns: 0,
            yield_on_delay: true,
        }
    }

    /// Get total nanoseconds that were "delayed"
    pub fn total_ns(&self) -> u64 {
        self.total_ns
    }

    /// Get total microseconds that were "delayed"
    pub fn total_us(&self) -> u64 {
        self.total_ns / 1_000
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
        if self.yield_on_delay {
            std::thread::yield_now();
        }
    }
}

// =============================================================================
// Blockers
// =============================================================================

/// Blocker that records every park and can run a hook in place of sleeping.
///
/// The hook stands in for whatever happens on other CPUs while the caller is
/// parked, such as the completion interrupt.
pub struct RecordingBlocker<'a> {
    waker: Waker,
    requested: Vec<Option<u32>>,
    hook: Option<Box<dyn FnMut() + 'a>>,
}

impl<'a> RecordingBlocker<'a> {
    pub fn new(waker: Waker) -> Self {
        Self {
            waker,
            requested: Vec::new(),
            hook: None,
        }
    }

    /// Run `hook` on every park
    pub fn with_hook(waker: Waker, hook: impl FnMut() + 'a) -> Self {
        Self {
            hook: Some(Box::new(hook)),
            ..Self::new(waker)
        }
    }

    pub fn parks(&self) -> usize {
        self.requested.len()
    }

    /// Timeout passed to each park, in order
    pub fn requested(&self) -> Vec<Option<u32>> {
        self.requested.clone()
    }
}

impl Blocker for RecordingBlocker<'_> {
    fn waker(&self) -> Option<Waker> {
        Some(self.waker.clone())
    }

    fn park(&mut self, timeout_us: Option<u32>, poll_interval_us: u32) -> u32 {
        self.requested.push(timeout_us);
        if let Some(hook) = self.hook.as_mut() {
            hook();
        }
        timeout_us.unwrap_or(poll_interval_us)
    }
}

struct Unpark(Thread);

impl Wake for Unpark {
    fn wake(self: Arc<Self>) {
        self.0.unpark();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.0.unpark();
    }
}

/// Blocker that parks the OS thread until its waker fires.
///
/// Must be created on the thread that parks on it.
#[derive(Debug)]
pub struct ThreadBlocker {
    thread: Thread,
    parks: usize,
}

impl ThreadBlocker {
    pub fn current() -> Self {
        Self {
            thread: thread::current(),
            parks: 0,
        }
    }

    pub fn parks(&self) -> usize {
        self.parks
    }
}

impl Blocker for ThreadBlocker {
    fn waker(&self) -> Option<Waker> {
        Some(Waker::from(Arc::new(Unpark(self.thread.clone()))))
    }

    fn park(&mut self, timeout_us: Option<u32>, _poll_interval_us: u32) -> u32 {
        self.parks += 1;
        let start = Instant::now();
        match timeout_us {
            Some(us) => thread::park_timeout(Duration::from_micros(us as u64)),
            None => thread::park(),
        }
        start.elapsed().as_micros().min(u32::MAX as u128) as u32
    }
}

// =============================================================================
// Test Wakers
// =============================================================================

/// Counts how often a [`test_waker`] was woken.
#[derive(Debug)]
pub struct WakeCounter {
    count: AtomicUsize,
}

impl WakeCounter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            count: AtomicUsize::new(0),
        })
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

/// Build a waker that bumps `counter` when woken.
pub fn test_waker(counter: Arc<WakeCounter>) -> Waker {
    fn clone_fn(ptr: *const ()) -> RawWaker {
        // SAFETY: `ptr` originates from `Arc::into_raw` in this test helper.
        let arc = unsafe { Arc::from_raw(ptr as *const WakeCounter) };
        let cloned = arc.clone();
        core::mem::forget(arc);
        RawWaker::new(Arc::into_raw(cloned) as *const (), &VTABLE)
    }

    fn wake_fn(ptr: *const ()) {
        // SAFETY: `ptr` originates from `Arc::into_raw` in this test helper.
        let arc = unsafe { Arc::from_raw(ptr as *const WakeCounter) };
        arc.count.fetch_add(1, Ordering::SeqCst);
    }

    fn wake_by_ref_fn(ptr: *const ()) {
        // SAFETY: `ptr` originates from `Arc::into_raw` in this test helper.
        let arc = unsafe { Arc::from_raw(ptr as *const WakeCounter) };
        arc.count.fetch_add(1, Ordering::SeqCst);
        core::mem::forget(arc);
    }

    fn drop_fn(ptr: *const ()) {
        // SAFETY: `ptr` originates from `Arc::into_raw` in this test helper.
        unsafe {
            drop(Arc::from_raw(ptr as *const WakeCounter));
        }
    }

    static VTABLE: RawWakerVTable = RawWakerVTable::new(clone_fn, wake_fn, wake_by_ref_fn, drop_fn);

    let raw = RawWaker::new(Arc::into_raw(counter) as *const (), &VTABLE);
    // SAFETY: `raw` is built from a valid `RawWakerVTable` and pointer.
    unsafe { Waker::from_raw(raw) }
}

/// Poll a pinned future once with the given waker.
pub fn poll_once<F: core::future::Future + ?Sized>(
    fut: core::pin::Pin<&mut F>,
    waker: &Waker,
) -> Poll<F::Output> {
    let mut cx = Context::from_waker(waker);
    fut.poll(&mut cx)
}

// =============================================================================
// Self-tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::delay::DelayNs;

    #[test]
    fn mock_registers_record_in_order() {
        let regs = MockRegisters::new();
        let mut writer = regs.clone();
        writer.write(Register::FpgaAddr, 1);
        writer.write_barrier();
        writer.write(Register::Cmd, 2);

        assert_eq!(
            regs.events(),
            std::vec![
                RegisterEvent::Write(Register::FpgaAddr, 1),
                RegisterEvent::Barrier,
                RegisterEvent::Write(Register::Cmd, 2),
            ]
        );
        assert_eq!(regs.doorbells(), 1);

        regs.clear();
        assert!(regs.events().is_empty());
    }

    #[test]
    fn mock_delay_accumulates() {
        let mut delay = MockDelay::new();
        delay.delay_us(10);
        delay.delay_ns(500);
        assert_eq!(delay.total_ns(), 10_500);
        assert_eq!(delay.total_us(), 10);
    }

    #[test]
    fn test_waker_counts_wakes() {
        let counter = WakeCounter::new();
        let waker = test_waker(counter.clone());
        waker.wake_by_ref();
        waker.clone().wake();
        assert_eq!(counter.count(), 2);
    }
}
