//! BlueDMA engine: command issuance and completion bookkeeping.
//!
//! One [`DmaEngine`] owns one register block. Callers on any number of
//! threads issue transfers through it; the platform's interrupt dispatch
//! reports completions to it (see [`interrupt`](super::interrupt)).
//!
//! # Issue path
//!
//! ```text
//! lock ── FPGA_ADDR ── HOST_ADDR ── BTT ── wmb ── CMD ── issued += 1 ── unlock
//! ```
//!
//! The lock covers only the register programming, never the hardware's
//! execution time, so transfers can be issued back to back while earlier
//! ones are still running.
//!
//! # Waiters
//!
//! Callers blocked on the lock or on a completion park on the
//! [`Blocker`] of their [`WaitContext`] and are woken by the lock release or
//! the completion interrupt. The `W` parameter sizes each wait point for
//! that many concurrent waiters (plus one overflow slot); size it to the
//! most threads and tasks that can wait on one direction at once.

use crate::driver::config::EngineConfig;
use crate::driver::error::{ConfigResult, Result};
use crate::driver::transfer::{BusAddress, DeviceAddress, Direction, SequenceNumber};
use crate::internal::constants::MAX_WAITERS;
use crate::internal::register::{Register, RegisterBlock};
use crate::sync::{Blocker, Cancellation, CommandLock, CompletionChannel, WaitContext};

/// DMA engine for one BlueDMA register block.
///
/// # Type Parameters
/// * `R` - Register block implementation ([`MmioRegisters`] on hardware)
/// * `W` - Waiters each wait point holds without churn (default [`MAX_WAITERS`])
///
/// [`MmioRegisters`]: crate::unsafe_registers::MmioRegisters
/// [`MAX_WAITERS`]: crate::constants::MAX_WAITERS
pub struct DmaEngine<R, const W: usize = MAX_WAITERS> {
    /// Register block, reachable only through the command lock
    registers: CommandLock<R, W>,
    /// Completion tracking, indexed by `Direction::index`
    channels: [CompletionChannel<W>; 2],
    config: EngineConfig,
}

impl<R, const W: usize> DmaEngine<R, W> {
    /// Attach an engine to a register block. Const-compatible.
    ///
    /// Counters start at zero. Use [`try_new`](Self::try_new) to have the
    /// configuration validated.
    #[must_use]
    pub const fn new(registers: R, config: EngineConfig) -> Self {
        Self {
            registers: CommandLock::new(registers),
            channels: [CompletionChannel::new(), CompletionChannel::new()],
            config,
        }
    }

    /// Attach an engine after validating `config`.
    pub fn try_new(registers: R, config: EngineConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::new(registers, config))
    }

    /// Engine configuration
    #[inline(always)]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Interrupt identity this engine accepts completions for
    #[inline(always)]
    pub fn interrupt_id(&self) -> u32 {
        self.config.interrupt_id
    }

    /// Completion channel of a direction
    #[inline(always)]
    pub fn channel(&self, direction: Direction) -> &CompletionChannel<W> {
        &self.channels[direction.index()]
    }

    /// Transfers of `direction` reported complete so far
    pub fn completed(&self, direction: Direction) -> u64 {
        self.channel(direction).completed()
    }

    /// Transfers of `direction` issued so far
    pub fn issued(&self, direction: Direction) -> u64 {
        self.channel(direction).issued()
    }

    /// Transfers of `direction` issued but not yet complete
    pub fn in_flight(&self, direction: Direction) -> u64 {
        self.channel(direction).in_flight()
    }

    /// Whether the transfer identified by `seq` has completed
    pub fn is_complete(&self, direction: Direction, seq: SequenceNumber) -> bool {
        self.channel(direction).is_reached(seq)
    }

    /// Detach from the hardware, handing the register block back.
    ///
    /// No transfer may be in flight; the caller that owns attach/detach is
    /// responsible for draining them first.
    pub fn into_registers(self) -> R {
        for direction in Direction::ALL {
            let pending = self.in_flight(direction);
            if pending != 0 {
                warn!(
                    "detaching with {} {} transfer(s) in flight",
                    pending,
                    direction.as_str()
                );
            }
        }
        self.registers.into_inner()
    }

    pub(crate) fn command_lock(&self) -> &CommandLock<R, W> {
        &self.registers
    }

    /// Block until `seq` of `direction` has completed.
    ///
    /// Returns immediately if it already has. Otherwise parks on the
    /// context's blocker until the completion interrupt wakes it, giving up
    /// with `Cancelled` when the context's cancellation source fires or
    /// `Timeout` after `completion_timeout_us`. Giving up does not affect the
    /// transfer itself.
    pub fn wait_for_completion<C, B>(
        &self,
        direction: Direction,
        seq: SequenceNumber,
        ctx: &mut WaitContext<C, B>,
    ) -> Result<()>
    where
        C: Cancellation,
        B: Blocker,
    {
        self.channel(direction)
            .wait(
                seq,
                ctx,
                self.config.poll_interval_us,
                self.config.completion_timeout_us,
            )
            .map_err(|e| {
                debug!(
                    "{} wait for #{} abandoned: {:?}",
                    direction.as_str(),
                    seq.get(),
                    e
                );
                e.into()
            })
    }
}

impl<R: RegisterBlock, const W: usize> DmaEngine<R, W> {
    /// Start a transfer and return its sequence number.
    ///
    /// `device` and `host` must already be resolved into the address spaces
    /// the hardware masters, and `len` must match the buffer behind `host`.
    /// Neither is checked here.
    ///
    /// Taking the command lock may park the caller until the holder releases
    /// it; it is abandoned with
    /// `Error::Transfer(TransferError::Cancelled)` when the context's
    /// cancellation source fires, or `Timeout` after `lock_timeout_us`.
    /// An abandoned call has written no register and changed no counter.
    ///
    /// The transfer is done once
    /// [`wait_for_completion`](Self::wait_for_completion) for the returned
    /// number succeeds.
    pub fn transfer<C, B>(
        &self,
        direction: Direction,
        device: DeviceAddress,
        host: BusAddress,
        len: usize,
        ctx: &mut WaitContext<C, B>,
    ) -> Result<SequenceNumber>
    where
        C: Cancellation,
        B: Blocker,
    {
        debug!(
            "{} dev_addr = {:#x}, host_addr = {:#x}, len: {} bytes",
            direction.as_str(),
            device.0,
            host.0,
            len
        );

        let mut regs = match self.registers.lock(
            ctx,
            self.config.poll_interval_us,
            self.config.lock_timeout_us,
        ) {
            Ok(guard) => guard,
            Err(e) => {
                warn!(
                    "{} transfer abandoned while acquiring the command lock: {:?}",
                    direction.as_str(),
                    e
                );
                return Err(e.into());
            }
        };

        let seq = self.program(&mut *regs, direction, device, host, len);
        drop(regs);
        Ok(seq)
    }

    /// Copy `len` bytes from device memory at `device` into the host buffer
    /// at `host`.
    pub fn copy_from_device<C, B>(
        &self,
        device: DeviceAddress,
        host: BusAddress,
        len: usize,
        ctx: &mut WaitContext<C, B>,
    ) -> Result<SequenceNumber>
    where
        C: Cancellation,
        B: Blocker,
    {
        self.transfer(Direction::FromDevice, device, host, len, ctx)
    }

    /// Copy `len` bytes from the host buffer at `host` to device memory at
    /// `device`.
    pub fn copy_to_device<C, B>(
        &self,
        device: DeviceAddress,
        host: BusAddress,
        len: usize,
        ctx: &mut WaitContext<C, B>,
    ) -> Result<SequenceNumber>
    where
        C: Cancellation,
        B: Blocker,
    {
        self.transfer(Direction::ToDevice, device, host, len, ctx)
    }

    /// Program one command. The caller holds the command lock and passes
    /// the guarded block in.
    pub(crate) fn program(
        &self,
        regs: &mut R,
        direction: Direction,
        device: DeviceAddress,
        host: BusAddress,
        len: usize,
    ) -> SequenceNumber {
        regs.write(Register::FpgaAddr, device.0);
        regs.write(Register::HostAddr, host.0);
        regs.write(Register::Btt, len as u64);
        // Operands must reach the device before the doorbell does.
        regs.write_barrier();
        regs.write(Register::Cmd, direction.opcode());
        self.channel(direction).issue()
    }
}
