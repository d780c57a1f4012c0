//! Embedded text instructions
//!
//! Sentences interleave character bytes with byte-coded instructions: a
//! trigger byte followed by the parameters the instruction declares. The
//! instruction set is data-driven and supplied by the caller;
//! [`dune_instructions`] carries the definitions documented for the game.
//! Expansion replaces each matched byte span with a readable placeholder
//! before charset decoding.

use serde::{Deserialize, Serialize};

use crate::common::{HsqLibError, Result};

/// How one instruction parameter consumes sentence bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamMode {
    /// One byte
    Read8,
    /// Two bytes, little-endian
    Read16,
    /// Bytes up to (not including) the terminator; the terminator is
    /// consumed with the instruction span
    ReadUntil(u8),
}

/// One declared instruction parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextInstructionParam {
    /// Parameter name, used in the rendered placeholder
    pub name: String,
    /// How the parameter consumes bytes
    pub mode: ParamMode,
}

/// One byte-coded instruction definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextInstruction {
    /// Placeholder tag name, e.g. "SietchName"
    pub function_name: String,
    /// Byte value that begins this instruction in sentence data
    pub trigger_byte: u8,
    /// Declared parameters, in consumption order
    pub params: Vec<TextInstructionParam>,
}

impl TextInstruction {
    fn param(name: &str, mode: ParamMode) -> TextInstructionParam {
        TextInstructionParam {
            name: name.to_string(),
            mode,
        }
    }

    /// Render this instruction's placeholder for the span starting at
    /// `span[0]` (the trigger byte)
    ///
    /// Returns the number of bytes consumed and the replacement bytes. A
    /// single-`ReadUntil` instruction renders as
    /// `<Name>captured</Name>`; anything else renders as a self-closing tag
    /// with one attribute per parameter.
    fn render_at(&self, span: &[u8], address: u16) -> Result<(usize, Vec<u8>)> {
        if let [TextInstructionParam {
            mode: ParamMode::ReadUntil(terminator),
            ..
        }] = self.params.as_slice()
        {
            let captured_len = span[1..]
                .iter()
                .position(|b| b == terminator)
                .ok_or_else(|| sentence_error(address, format!(
                    "unterminated {} instruction (no 0x{terminator:02X} terminator)",
                    self.function_name
                )))?;

            let mut replacement = format!("<{}>", self.function_name).into_bytes();
            replacement.extend_from_slice(&span[1..1 + captured_len]);
            replacement.extend_from_slice(format!("</{}>", self.function_name).as_bytes());

            // Trigger, captured bytes, terminator.
            return Ok((1 + captured_len + 1, replacement));
        }

        let mut cursor = 1usize;
        let mut replacement = format!("<{}", self.function_name).into_bytes();

        for param in &self.params {
            replacement.extend_from_slice(format!(" {}=\"", param.name).as_bytes());
            match param.mode {
                ParamMode::Read8 => {
                    let value = *span.get(cursor).ok_or_else(|| {
                        overrun(address, &self.function_name, &param.name)
                    })?;
                    cursor += 1;
                    replacement.extend_from_slice(format!("0x{value:02X}").as_bytes());
                }
                ParamMode::Read16 => {
                    if span.len() < cursor + 2 {
                        return Err(overrun(address, &self.function_name, &param.name));
                    }
                    let value = u16::from_le_bytes([span[cursor], span[cursor + 1]]);
                    cursor += 2;
                    replacement.extend_from_slice(format!("0x{value:04X}").as_bytes());
                }
                ParamMode::ReadUntil(terminator) => {
                    let captured_len = span[cursor..]
                        .iter()
                        .position(|b| *b == terminator)
                        .ok_or_else(|| overrun(address, &self.function_name, &param.name))?;
                    replacement.extend_from_slice(&span[cursor..cursor + captured_len]);
                    cursor += captured_len + 1;
                }
            }
            replacement.push(b'"');
        }

        replacement.extend_from_slice(b"/>");
        Ok((cursor, replacement))
    }
}

/// Replace every embedded instruction in `raw` with its placeholder
///
/// Trigger bytes are processed one definition at a time: each definition's
/// occurrences are consumed until none remain before the next definition is
/// scanned. `address` is the sentence start address, used for error
/// reporting only.
pub(crate) fn expand(
    raw: &[u8],
    instructions: &[TextInstruction],
    address: u16,
) -> Result<Vec<u8>> {
    let mut bytes = raw.to_vec();

    for instruction in instructions {
        while let Some(pos) = bytes.iter().position(|b| *b == instruction.trigger_byte) {
            let (consumed, replacement) = instruction.render_at(&bytes[pos..], address)?;
            bytes.splice(pos..pos + consumed, replacement);
        }
    }

    Ok(bytes)
}

fn sentence_error(address: u16, reason: String) -> HsqLibError {
    HsqLibError::Sentence { address, reason }
}

fn overrun(address: u16, function: &str, param: &str) -> HsqLibError {
    sentence_error(
        address,
        format!("{function} parameter {param} runs past the end of the sentence"),
    )
}

/// The instruction set documented for the game's text assets
pub fn dune_instructions() -> Vec<TextInstruction> {
    vec![
        // The smuggler location name, parameterless.
        TextInstruction {
            function_name: "SmugglerLocation".to_string(),
            trigger_byte: 0x86,
            params: vec![],
        },
        // A sietch name, referenced by a 16-bit index.
        TextInstruction {
            function_name: "SietchName".to_string(),
            trigger_byte: 0x80,
            params: vec![TextInstruction::param("Name", ParamMode::Read16)],
        },
        // A spice amount; the byte selects which spice variable is meant.
        TextInstruction {
            function_name: "SpiceVariable".to_string(),
            trigger_byte: 0x92,
            params: vec![TextInstruction::param("Value", ParamMode::Read8)],
        },
        // Inline small-text run, terminated by 0x08.
        TextInstruction {
            function_name: "SmallText".to_string(),
            trigger_byte: 0x06,
            params: vec![TextInstruction::param("Text", ParamMode::ReadUntil(0x08))],
        },
    ]
}
