//! BlueDMA Engine Driver
//!
//! A `no_std`, `no_alloc` Rust implementation of the control path for the
//! BlueDMA engine, a register-block DMA controller found on FPGA accelerator
//! cards attached over PCIe.
//!
//! The engine exposes one command slot: three 64-bit operand registers
//! (device address, host address, byte count) and a command register whose
//! write starts the transfer. Completion is signalled by one interrupt per
//! finished command and direction.
//!
//! # Architecture
//!
//! 1. **Engine** ([`driver::engine`]): Serialized programming of the command
//!    slot; returns a sequence number per transfer
//! 2. **Interrupts** ([`driver::interrupt`]): Completion entry points that
//!    advance per-direction counters and wake waiters
//! 3. **Synchronization** ([`sync`]): Command lock, completion channels and
//!    interruptible/timed blocking waits that park on a platform [`Blocker`]
//!    until the interrupt path wakes them
//!
//! Register access goes through [`unsafe_registers::RegisterBlock`], so the
//! whole engine runs against a recording mock in host tests.
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting for error types and defmt logging
//! - `log`: Route driver logging through the `log` facade
//! - `async`: Enable async/await support with wakers
//!
//! # Example
//!
//! ```ignore
//! use blue_dma::{BusAddress, DeviceAddress, Direction, WaitContext};
//!
//! blue_dma::dma_engine_static!(ENGINE, base = BAR0 + 0x1000, irq = DMA_IRQ);
//!
//! let mut ctx = WaitContext::with_blocker(blocker).with_cancel(&SIGNAL_PENDING);
//! let seq = ENGINE.copy_to_device(DeviceAddress(0x1000), BusAddress(dma_handle), 4096, &mut ctx)?;
//! ENGINE.wait_for_completion(Direction::ToDevice, seq, &mut ctx)?;
//!
//! // In the platform's interrupt dispatch:
//! ENGINE.on_write_complete(irq);
//! ```

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels mirror the [lints] tables in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements,
    clippy::let_underscore_future
)]

// Logging macros must be defined before any module that uses them.
#[macro_use]
mod fmt;

// =============================================================================
// Modules
// =============================================================================

pub mod driver;
pub mod sync;

// Internal implementation details (pub(crate) only)
mod internal;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::config::EngineConfig;
pub use driver::engine::DmaEngine;
pub use driver::error::{
    ConfigError, ConfigResult, Error, FatalError, Result, TransferError, TransferResult,
};
pub use driver::interrupt::IrqReturn;
pub use driver::transfer::{BusAddress, DeviceAddress, Direction, SequenceNumber};

pub use sync::{Blocker, CancelFn, Cancellation, NeverCancel, Polling, WaitContext};

// Re-export async types when async feature is enabled
#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub use sync::asynch::{AsyncDmaExt, CompletionFuture, LockFuture};

/// Low-level register accessors for advanced use.
///
/// These are intentionally separated from the primary facade. Most users should
/// prefer the [`DmaEngine`] APIs instead of touching registers directly.
///
/// # Safety
///
/// Direct register access bypasses the command lock. Writing the command
/// register while the engine is programming another transfer corrupts both.
pub mod unsafe_registers {
    pub use crate::internal::register::{
        CMD_READ, CMD_WRITE, MmioRegisters, REG_BLOCK_SIZE, REG_BTT_OFFSET, REG_CMD_OFFSET,
        REG_FPGA_ADDR_OFFSET, REG_HOST_ADDR_OFFSET, Register, RegisterBlock,
    };
}

/// Shared driver constants.
pub mod constants {
    pub use crate::internal::constants::{
        // Timing
        DEFAULT_COMPLETION_TIMEOUT_US,
        DEFAULT_LOCK_TIMEOUT_US,
        DEFAULT_POLL_INTERVAL_US,
        // Waker storage
        MAX_WAITERS,
    };
}

// =============================================================================
// Macro Helpers
// =============================================================================

/// Declare a static engine over a memory-mapped register block.
///
/// The engine is `Sync`, so the static can be shared by every issuing thread
/// and by the interrupt entry points.
///
/// # Safety
///
/// The expansion constructs [`MmioRegisters`](crate::unsafe_registers::MmioRegisters)
/// on the caller's behalf. The caller guarantees that `base` is a mapped,
/// 8-byte aligned BlueDMA register block owned by nothing else for the
/// program lifetime.
///
/// # Examples
///
/// ```ignore
/// blue_dma::dma_engine_static!(ENGINE, base = 0xF000_1000, irq = 5);
///
/// blue_dma::dma_engine_static!(
///     pub ENGINE2,
///     base = 0xF000_2000,
///     config = EngineConfig::new(6).with_lock_timeout_us(1_000)
/// );
///
/// // Sixteen threads and tasks may wait on one direction at once.
/// blue_dma::dma_engine_static!(
///     ENGINE3,
///     base = 0xF000_3000,
///     config = EngineConfig::new(7),
///     waiters = 16
/// );
/// ```
#[macro_export]
macro_rules! dma_engine_static {
    ($vis:vis $name:ident, base = $base:expr, config = $config:expr, waiters = $w:expr $(,)?) => {
        $vis static $name: $crate::DmaEngine<$crate::unsafe_registers::MmioRegisters, { $w }> =
            $crate::DmaEngine::new(
                {
                    const BASE: usize = $base;
                    // SAFETY: The caller guarantees the block is mapped and exclusively ours.
                    unsafe { $crate::unsafe_registers::MmioRegisters::new(BASE) }
                },
                $config,
            );
    };
    ($vis:vis $name:ident, base = $base:expr, config = $config:expr $(,)?) => {
        $crate::dma_engine_static!(
            $vis $name,
            base = $base,
            config = $config,
            waiters = $crate::constants::MAX_WAITERS
        );
    };
    ($vis:vis $name:ident, base = $base:expr, irq = $irq:expr $(,)?) => {
        $crate::dma_engine_static!(
            $vis $name,
            base = $base,
            config = $crate::EngineConfig::new($irq)
        );
    };
}
