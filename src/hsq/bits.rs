//! Instruction bit stream
//!
//! HSQ instruction bits arrive in 16-bit little-endian words interleaved with
//! the literal data stream. The word buffer is refilled from the shared
//! cursor only when all 16 bits have been consumed, so the refill position
//! depends on how much literal data the previous instructions pulled in
//! between.

use crate::common::Result;
use crate::cursor::ByteCursor;

/// Bit-level reader over the instruction word stream
#[derive(Debug, Default)]
pub(crate) struct InstructionBits {
    queue: u16,
    remaining: u8,
}

impl InstructionBits {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Consume the next instruction bit, refilling the 16-bit word buffer
    /// from the cursor when exhausted
    ///
    /// Bits are consumed starting from the least-significant bit of the word,
    /// most-significant bit last.
    pub(crate) fn read_bit(&mut self, cursor: &mut ByteCursor<'_>) -> Result<bool> {
        if self.remaining == 0 {
            self.queue = cursor.read_le_u16()?;
            self.remaining = 16;
        }

        let bit = self.queue & 1 == 1;
        self.queue >>= 1;
        self.remaining -= 1;
        Ok(bit)
    }
}
