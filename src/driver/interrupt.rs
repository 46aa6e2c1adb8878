//! Completion interrupt entry points.
//!
//! The platform's interrupt dispatch calls [`DmaEngine::on_read_complete`]
//! or [`DmaEngine::on_write_complete`] once per finished command, passing
//! the identity of the line that fired. Each call advances the matching
//! completion counter and wakes every waiter of that direction.
//!
//! # Example
//!
//! ```ignore
//! static ENGINE: DmaEngine<MmioRegisters> = /* ... */;
//!
//! #[interrupt]
//! fn DMA_READ_DONE() {
//!     ENGINE.on_read_complete(DMA_IRQ);
//! }
//! ```

use crate::driver::engine::DmaEngine;
use crate::driver::error::FatalError;
use crate::driver::transfer::Direction;

/// Outcome reported back to the platform's interrupt layer.
///
/// Every call that returns has handled its interrupt. A line that is not
/// this engine's is a routing fault, reported as [`FatalError`] rather than
/// as "not mine".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqReturn {
    /// The interrupt was ours and has been handled
    Handled,
}

impl<R, const W: usize> DmaEngine<R, W> {
    /// Record a completion, returning the routing violation instead of
    /// escalating it.
    ///
    /// On a mismatched `irq` nothing is counted and nobody is woken. Use this
    /// when the platform wants to log its own diagnostics before aborting;
    /// [`handle_completion`](Self::handle_completion) is the escalating form.
    pub fn try_handle_completion(
        &self,
        direction: Direction,
        irq: u32,
    ) -> Result<IrqReturn, FatalError> {
        let expected = self.interrupt_id();
        if irq != expected {
            return Err(FatalError::InterruptRouting {
                expected,
                received: irq,
                direction,
            });
        }

        let count = self.channel(direction).complete();
        trace!("{} completion #{}", direction.as_str(), count);
        Ok(IrqReturn::Handled)
    }

    /// Record a completion for `direction` delivered on line `irq`.
    ///
    /// # Panics
    ///
    /// Panics if `irq` is not this engine's interrupt identity. The IRQ
    /// routing is then broken and counting the completion could release a
    /// waiter of another engine's transfer.
    pub fn handle_completion(&self, direction: Direction, irq: u32) -> IrqReturn {
        match self.try_handle_completion(direction, irq) {
            Ok(ret) => ret,
            Err(fatal) => {
                error!("{:?}", fatal);
                panic!("{fatal}");
            }
        }
    }

    /// Entry point for "device → host transfer finished" interrupts.
    #[inline]
    pub fn on_read_complete(&self, irq: u32) -> IrqReturn {
        self.handle_completion(Direction::FromDevice, irq)
    }

    /// Entry point for "host → device transfer finished" interrupts.
    #[inline]
    pub fn on_write_complete(&self, irq: u32) -> IrqReturn {
        self.handle_completion(Direction::ToDevice, irq)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
