//! Memory-mapped register definitions for the BlueDMA command block
//!
//! The block is a single command slot of four 64-bit registers. Three of
//! them carry the operands of the next transfer; writing the fourth (CMD)
//! is the doorbell that starts execution.
//!
//! All hardware access is volatile and goes through [`RegisterBlock`] so the
//! engine can be driven against a recording mock on the host.

use core::sync::atomic::{Ordering, fence};

// =============================================================================
// Register Offsets
// =============================================================================

/// Host address register offset (slv_reg0, PCIe/host bus address)
pub const REG_HOST_ADDR_OFFSET: usize = 0x00;
/// FPGA address register offset (slv_reg1, device bus address)
pub const REG_FPGA_ADDR_OFFSET: usize = 0x08;
/// Bytes-to-transfer register offset (slv_reg2)
pub const REG_BTT_OFFSET: usize = 0x10;
/// Command register offset (slv_reg3, doorbell)
pub const REG_CMD_OFFSET: usize = 0x20;

/// Size of the register block in bytes
pub const REG_BLOCK_SIZE: usize = 0x28;

// =============================================================================
// Command Opcodes
// =============================================================================

/// Copy from device memory to host memory ("read" from the device)
pub const CMD_READ: u64 = 0x1000_1000;
/// Copy from host memory to device memory ("write" to the device)
pub const CMD_WRITE: u64 = 0x1000_0001;

// =============================================================================
// Typed Register Access
// =============================================================================

/// The writable registers of the command block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// Host-side address operand
    HostAddr,
    /// Device-side address operand
    FpgaAddr,
    /// Byte count operand
    Btt,
    /// Doorbell
    Cmd,
}

impl Register {
    /// Byte offset from the block base
    #[inline(always)]
    pub const fn offset(self) -> usize {
        match self {
            Register::HostAddr => REG_HOST_ADDR_OFFSET,
            Register::FpgaAddr => REG_FPGA_ADDR_OFFSET,
            Register::Btt => REG_BTT_OFFSET,
            Register::Cmd => REG_CMD_OFFSET,
        }
    }
}

/// Write access to a BlueDMA command block.
///
/// Implementations must perform each [`write`](Self::write) as a single
/// 64-bit store in program order, and [`write_barrier`](Self::write_barrier)
/// must make every earlier store visible to the device before any later one.
pub trait RegisterBlock {
    /// Write a 64-bit value to a register
    fn write(&mut self, reg: Register, value: u64);

    /// Order all preceding register writes before all following ones
    fn write_barrier(&mut self) {
        fence(Ordering::SeqCst);
    }
}

impl<T: RegisterBlock + ?Sized> RegisterBlock for &mut T {
    #[inline(always)]
    fn write(&mut self, reg: Register, value: u64) {
        (**self).write(reg, value);
    }

    #[inline(always)]
    fn write_barrier(&mut self) {
        (**self).write_barrier();
    }
}

/// Write a 64-bit register at the given address
///
/// # Safety
/// The caller must ensure the address is valid, mapped and 8-byte aligned.
#[inline(always)]
pub unsafe fn write_reg64(addr: usize, value: u64) {
    unsafe { core::ptr::write_volatile(addr as *mut u64, value) }
}

/// Read a 64-bit register at the given address
///
/// # Safety
/// The caller must ensure the address is valid, mapped and 8-byte aligned.
#[inline(always)]
pub unsafe fn read_reg64(addr: usize) -> u64 {
    unsafe { core::ptr::read_volatile(addr as *const u64) }
}

/// Memory-mapped command block at a fixed base address.
#[derive(Debug)]
pub struct MmioRegisters {
    base: usize,
}

impl MmioRegisters {
    /// Wrap the command block mapped at `base`.
    ///
    /// # Safety
    ///
    /// `base` must point to a mapped BlueDMA register block of at least
    /// [`REG_BLOCK_SIZE`] bytes, aligned to 8 bytes, and no other
    /// `MmioRegisters` may exist for the same block.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    /// Base address of the block
    #[inline(always)]
    pub const fn base(&self) -> usize {
        self.base
    }

    /// Read back a register (diagnostics only; the engine never reads)
    #[inline(always)]
    pub fn read(&self, reg: Register) -> u64 {
        // SAFETY: `new` guarantees the block is mapped and exclusively ours.
        unsafe { read_reg64(self.base + reg.offset()) }
    }
}

impl RegisterBlock for MmioRegisters {
    #[inline(always)]
    fn write(&mut self, reg: Register, value: u64) {
        // SAFETY: `new` guarantees the block is mapped and exclusively ours.
        unsafe { write_reg64(self.base + reg.offset(), value) }
    }
}

// SAFETY: the block is exclusively owned; moving ownership between threads
// is sound because all access requires `&mut self`.
unsafe impl Send for MmioRegisters {}
