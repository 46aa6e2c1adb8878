//! Async/await support for the engine.
//!
//! Provides futures for taking the command lock and for waiting on a
//! completion, and the [`AsyncDmaExt`] extension trait built from them.
//! Completion futures are woken by the interrupt entry points through the
//! direction's waker set; lock futures are woken when the guard is dropped.
//!
//! Cancellation is `drop`: a lock future dropped before it resolves has
//! written nothing, and a dropped completion future only stops observing.

use core::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use super::completion::CompletionChannel;
use super::lock::{CommandGuard, CommandLock};
use crate::driver::engine::DmaEngine;
use crate::driver::transfer::{BusAddress, DeviceAddress, Direction, SequenceNumber};
use crate::internal::constants::MAX_WAITERS;
use crate::internal::register::RegisterBlock;

/// Future resolving to a [`CommandGuard`] once the lock is free.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct LockFuture<'a, T, const W: usize = MAX_WAITERS> {
    lock: &'a CommandLock<T, W>,
}

impl<T, const W: usize> CommandLock<T, W> {
    /// Take the lock asynchronously.
    pub fn lock_async(&self) -> LockFuture<'_, T, W> {
        LockFuture { lock: self }
    }
}

impl<'a, T, const W: usize> Future for LockFuture<'a, T, W> {
    type Output = CommandGuard<'a, T, W>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let lock = self.lock;
        if let Some(guard) = lock.try_lock() {
            return Poll::Ready(guard);
        }

        lock.waiters.register(cx.waker());
        // The holder may have released between the attempt and registering.
        match lock.try_lock() {
            Some(guard) => Poll::Ready(guard),
            None => Poll::Pending,
        }
    }
}

/// Future resolving once a direction's completion count reaches a target.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct CompletionFuture<'a, const W: usize = MAX_WAITERS> {
    channel: &'a CompletionChannel<W>,
    seq: SequenceNumber,
}

impl<'a, const W: usize> CompletionFuture<'a, W> {
    /// Create a new completion future.
    pub fn new(channel: &'a CompletionChannel<W>, seq: SequenceNumber) -> Self {
        Self { channel, seq }
    }
}

impl<const W: usize> Future for CompletionFuture<'_, W> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.channel.is_reached(self.seq) {
            return Poll::Ready(());
        }

        self.channel.register(cx.waker());
        if self.channel.is_reached(self.seq) {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

/// Extension trait providing async methods for the engine.
///
/// `W` is the engine's waiter capacity.
pub trait AsyncDmaExt<const W: usize = MAX_WAITERS> {
    /// Start a transfer, awaiting the command lock instead of polling it.
    fn transfer_async(
        &self,
        direction: Direction,
        device: DeviceAddress,
        host: BusAddress,
        len: usize,
    ) -> impl Future<Output = SequenceNumber> + '_;

    /// Async form of `copy_from_device`.
    fn copy_from_device_async(
        &self,
        device: DeviceAddress,
        host: BusAddress,
        len: usize,
    ) -> impl Future<Output = SequenceNumber> + '_ {
        self.transfer_async(Direction::FromDevice, device, host, len)
    }

    /// Async form of `copy_to_device`.
    fn copy_to_device_async(
        &self,
        device: DeviceAddress,
        host: BusAddress,
        len: usize,
    ) -> impl Future<Output = SequenceNumber> + '_ {
        self.transfer_async(Direction::ToDevice, device, host, len)
    }

    /// Wait until `seq` of `direction` has completed.
    fn wait_for_completion_async(
        &self,
        direction: Direction,
        seq: SequenceNumber,
    ) -> CompletionFuture<'_, W>;
}

impl<R: RegisterBlock, const W: usize> AsyncDmaExt<W> for DmaEngine<R, W> {
    fn transfer_async(
        &self,
        direction: Direction,
        device: DeviceAddress,
        host: BusAddress,
        len: usize,
    ) -> impl Future<Output = SequenceNumber> + '_ {
        async move {
            let mut regs = self.command_lock().lock_async().await;
            debug!(
                "{} dev_addr = {:#x}, host_addr = {:#x}, len: {} bytes",
                direction.as_str(),
                device.0,
                host.0,
                len
            );
            self.program(&mut *regs, direction, device, host, len)
        }
    }

    fn wait_for_completion_async(
        &self,
        direction: Direction,
        seq: SequenceNumber,
    ) -> CompletionFuture<'_, W> {
        CompletionFuture::new(self.channel(direction), seq)
    }
}
