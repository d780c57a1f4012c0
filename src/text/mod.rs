//! Text payload interpretation
//!
//! A decompressed text asset opens with a self-describing index of 16-bit
//! sentence boundary addresses: the first entry is both the index's byte
//! size and the address where sentence data begins. Consecutive entries
//! bound each sentence. Every sentence is decoded twice: once straight
//! through the charset (raw text) and once with embedded instructions
//! expanded into placeholders first. A sentence that fails to decode is
//! logged and skipped; the rest of the asset still decodes.

mod charset;
mod instructions;

pub use charset::{
    builtin_table, builtin_tables, CharsetRedirectTable, CARRIAGE_RETURN_BYTE, NEWLINE_BYTE,
};
pub use instructions::{dune_instructions, ParamMode, TextInstruction, TextInstructionParam};

use std::collections::BTreeMap;

use log::warn;
use serde::Serialize;

use crate::common::{HsqAsset, HsqLibError, Result};
use crate::cursor::ByteCursor;

/// One decoded sentence
#[derive(Debug, Clone, Serialize)]
pub struct Sentence {
    /// 0-based position in index order
    pub index: usize,
    /// First byte of the sentence within the decompressed buffer
    pub start_address: u16,
    /// One past the last byte of the sentence
    pub end_address: u16,
    /// Charset-decoded text, instructions left as raw codepoints
    pub raw_text: String,
    /// Text with embedded instructions expanded into placeholders
    pub text_with_instructions: String,
}

/// Decoded contents of one text asset, sentences keyed by start address
#[derive(Debug, Clone, Serialize)]
pub struct CryoTextData {
    /// Name of the originating file
    pub source_name: String,
    /// Locale of the charset table used for decoding
    pub culture: String,
    /// Sentences keyed by start address, in address order
    pub sentences: BTreeMap<u16, Sentence>,
}

/// Interpret a decompressed buffer as a text asset
///
/// `charset` and `instructions` are externally supplied configuration; see
/// [`builtin_tables`] and [`dune_instructions`] for the values shipped with
/// the game.
pub fn interpret_text(
    buf: &[u8],
    source_name: &str,
    charset: &CharsetRedirectTable,
    instructions: &[TextInstruction],
) -> Result<CryoTextData> {
    let addresses = read_sentence_index(buf)?;
    let mut sentences = BTreeMap::new();

    for (index, pair) in addresses.windows(2).enumerate() {
        let (start, end) = (pair[0], pair[1]);
        match decode_sentence(buf, start, end, index, charset, instructions) {
            Ok(sentence) => {
                if sentences.contains_key(&start) {
                    warn!("{source_name}: duplicate sentence start address 0x{start:04X}, keeping the first");
                    continue;
                }
                sentences.insert(start, sentence);
            }
            Err(err) => warn!("{source_name}: skipping {err}"),
        }
    }

    Ok(CryoTextData {
        source_name: source_name.to_string(),
        culture: charset.culture.clone(),
        sentences,
    })
}

/// Interpret a decompressed HSQ asset as a text asset
pub fn interpret_text_asset(
    asset: &HsqAsset,
    charset: &CharsetRedirectTable,
    instructions: &[TextInstruction],
) -> Result<CryoTextData> {
    interpret_text(&asset.bytes, &asset.source_name, charset, instructions)
}

/// Read the sentence boundary index
///
/// The first 16-bit entry is the index byte size; the index holds
/// `size / 2` entries including that first one, and the first entry is also
/// the start address of the first sentence.
fn read_sentence_index(buf: &[u8]) -> Result<Vec<u16>> {
    let mut cursor = ByteCursor::new(buf);

    let index_byte_size = cursor.read_le_u16()?;
    let entry_count = (index_byte_size / 2) as usize;
    if entry_count == 0 {
        return Err(HsqLibError::InvalidData(
            "sentence index declares zero entries".to_string(),
        ));
    }

    let mut addresses = Vec::with_capacity(entry_count);
    addresses.push(index_byte_size);
    for _ in 1..entry_count {
        addresses.push(cursor.read_le_u16()?);
    }

    Ok(addresses)
}

fn decode_sentence(
    buf: &[u8],
    start: u16,
    end: u16,
    index: usize,
    charset: &CharsetRedirectTable,
    instructions: &[TextInstruction],
) -> Result<Sentence> {
    let range = start as usize..end as usize;
    if range.start > range.end || range.end > buf.len() {
        return Err(HsqLibError::Sentence {
            address: start,
            reason: format!("range 0x{start:04X}..0x{end:04X} outside the buffer"),
        });
    }

    let raw = &buf[range];
    let raw_text = charset.decode(raw);
    let expanded = instructions::expand(raw, instructions, start)?;
    let text_with_instructions = charset.decode(&expanded);

    Ok(Sentence {
        index,
        start_address: start,
        end_address: end,
        raw_text,
        text_with_instructions,
    })
}
