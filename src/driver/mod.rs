//! Core driver components for the BlueDMA engine.
//!
//! - [`config`] - Engine configuration and builder
//! - [`error`] - Error types and result aliases
//! - [`transfer`] - Directions, addresses and sequence numbers
//! - [`engine`] - The engine and its issue path
//! - [`interrupt`] - Completion interrupt entry points
//!
//! # Example
//!
//! ```ignore
//! use blue_dma::driver::{DmaEngine, EngineConfig, DeviceAddress, BusAddress};
//!
//! let engine = DmaEngine::try_new(regs, EngineConfig::new(DMA_IRQ))?;
//! let seq = engine.copy_to_device(DeviceAddress(0x1000), host, 4096, &mut ctx)?;
//! engine.wait_for_completion(Direction::ToDevice, seq, &mut ctx)?;
//! ```

// Submodules
pub mod config;
pub mod engine;
pub mod error;
pub mod interrupt;
pub mod transfer;

// Re-exports for convenience
pub use config::EngineConfig;
pub use engine::DmaEngine;
pub use error::{
    ConfigError, ConfigResult, Error, FatalError, Result, TransferError, TransferResult,
};
pub use interrupt::IrqReturn;
pub use transfer::{BusAddress, DeviceAddress, Direction, SequenceNumber};
