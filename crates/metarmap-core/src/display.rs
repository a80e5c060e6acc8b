//! The display sink trait -- the LED strip seam.
//!
//! One LED per tracked airport, addressed by the airport's display slot.
//! The engine calls [`set`](DisplaySink::set) for every slot on each
//! refresh and [`commit`](DisplaySink::commit) exactly once after the
//! batch; implementations buffer writes until commit.
//!
//! Synchronous on purpose: pushing a frame to a local LED strip (or a
//! terminal, in the console implementation) does not await anything.

use crate::error::Result;
use crate::types::Color;

/// Buffered color output, one slot per tracked airport.
pub trait DisplaySink: Send {
    /// Stage a color for one display slot. Out-of-range slots are ignored.
    fn set(&mut self, slot: usize, color: Color);

    /// Push all staged colors to the physical output.
    fn commit(&mut self) -> Result<()>;
}
