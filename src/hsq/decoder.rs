//! HSQ instruction decoding and the main decompression loop

use super::bits::InstructionBits;
use super::METHOD1_WINDOW;
use crate::common::{HsqLibError, Result};
use crate::cursor::ByteCursor;

/// One decoded step of the compressed bitstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Instruction {
    /// Append one literal byte from the data stream
    CopyByte,
    /// Short back-reference: length 2-5, distance in [-256, -1]
    Method0 { length: u8, distance: i16 },
    /// Long back-reference: distance in [-8192, -1]; a zero escape length
    /// marks the end of the stream
    Method1 {
        length: u16,
        distance: i16,
        is_terminator: bool,
    },
}

/// Stateful decoder over one compressed HSQ body (header already stripped)
#[derive(Debug)]
pub struct HsqDecoder<'a> {
    cursor: ByteCursor<'a>,
    bits: InstructionBits,
    output: Vec<u8>,
}

impl<'a> HsqDecoder<'a> {
    /// Create a decoder over the compressed body, pre-sizing the output to
    /// the header-declared uncompressed size
    pub fn new(body: &'a [u8], size_hint: usize) -> Self {
        Self {
            cursor: ByteCursor::new(body),
            bits: InstructionBits::new(),
            output: Vec::with_capacity(size_hint),
        }
    }

    /// Run the decompression loop to completion
    ///
    /// Decoding stops at the end of the input or at a Method1 terminator,
    /// whichever comes first. Reads past the end of the input and
    /// back-references before the start of the output are reported as
    /// [`HsqLibError::Corrupt`].
    pub fn decode(mut self) -> Result<Vec<u8>> {
        while !self.cursor.is_eof() {
            match self.read_instruction()? {
                Instruction::CopyByte => {
                    let byte = self.cursor.read_u8().map_err(Self::truncated)?;
                    self.output.push(byte);
                }
                Instruction::Method0 { length, distance } => {
                    self.back_copy(length as usize, distance)?;
                }
                Instruction::Method1 {
                    is_terminator: true,
                    ..
                } => return Ok(self.output),
                Instruction::Method1 {
                    length, distance, ..
                } => {
                    self.back_copy(length as usize, distance)?;
                }
            }
        }

        Ok(self.output)
    }

    fn read_instruction(&mut self) -> Result<Instruction> {
        if self.read_bit()? {
            return Ok(Instruction::CopyByte);
        }

        if self.read_bit()? {
            return self.read_method1();
        }
        self.read_method0()
    }

    /// `01` prefix: 16-bit word packs a 3-bit length and a 13-bit distance
    fn read_method1(&mut self) -> Result<Instruction> {
        let raw = self.cursor.read_le_u16().map_err(Self::truncated)?;

        let mut length = raw & 7;
        let mut is_terminator = false;
        if length == 0 {
            length = self.cursor.read_u8().map_err(Self::truncated)? as u16;
            if length == 0 {
                is_terminator = true;
            }
        }
        if !is_terminator {
            length += 2;
        }

        // The plain right shift never sign-extends the 13-bit field, so fold
        // non-negative values down by the window size. Empirical fact of the
        // format; do not simplify.
        let mut distance = (raw >> 3) as i16;
        if distance >= 0 {
            distance -= METHOD1_WINDOW as i16;
        }

        Ok(Instruction::Method1 {
            length,
            distance,
            is_terminator,
        })
    }

    /// `00` prefix: two more instruction bits pick a length of 2-5, one data
    /// byte holds the distance as the low byte of a 0xFF-high 16-bit value
    fn read_method0(&mut self) -> Result<Instruction> {
        let long_bit = self.read_bit()?;
        let short_bit = self.read_bit()?;
        let length = 2 + u8::from(long_bit) * 2 + u8::from(short_bit);

        let low = self.cursor.read_u8().map_err(Self::truncated)?;
        let distance = i16::from_le_bytes([low, 0xFF]);

        Ok(Instruction::Method0 { length, distance })
    }

    /// Copy `length` bytes from `output.len() + distance` onto the end of the
    /// output
    ///
    /// The source range may overlap the bytes this copy appends, so the copy
    /// proceeds one byte at a time; a single non-overlapping memory copy
    /// would freeze the source and produce wrong output.
    fn back_copy(&mut self, length: usize, distance: i16) -> Result<()> {
        let start = self.output.len() as i64 + distance as i64;
        if start < 0 {
            return Err(HsqLibError::Corrupt(format!(
                "back-reference before start of output (length {}, distance {}, position {})",
                length,
                distance,
                self.output.len()
            )));
        }

        let start = start as usize;
        for i in 0..length {
            let byte = self.output[start + i];
            self.output.push(byte);
        }
        Ok(())
    }

    fn read_bit(&mut self) -> Result<bool> {
        self.bits
            .read_bit(&mut self.cursor)
            .map_err(Self::truncated)
    }

    fn truncated(err: HsqLibError) -> HsqLibError {
        match err {
            HsqLibError::UnexpectedEof => {
                HsqLibError::Corrupt("compressed stream ended mid-instruction".to_string())
            }
            other => other,
        }
    }
}
