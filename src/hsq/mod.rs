//! HSQ decompression
//!
//! This module implements the LZ-style bitstream decompressor for the HSQ
//! container format used by Cryo's 1990s-era game assets. The compressed body
//! interleaves two streams inside one byte sequence: an instruction stream of
//! 16-bit little-endian words consumed one bit at a time (least-significant
//! bit first), and a data stream of literal bytes and back-reference
//! parameters. Both advance independently within the same cursor: whenever
//! the 16 instruction bits are used up, the next word is pulled from the
//! current cursor position.
//!
//! Instruction encoding:
//! - `1` - copy one literal byte from the data stream to the output.
//! - `01` - "Method1": a 16-bit word holds a 3-bit length and a 13-bit
//!   backward distance; length 0 escapes to a one-byte length, and a zero
//!   escape byte terminates the stream.
//! - `00` - "Method0": two more instruction bits select a length of 2-5 and
//!   one data byte holds a short backward distance in [-256, -1].
//!
//! Back-references copy from already-produced output and may overlap the
//! bytes being appended by the same copy, so copies proceed one byte at a
//! time.

mod bits;
mod decoder;

pub use decoder::HsqDecoder;

use crate::common::{HsqAsset, HsqHeader, Result, HEADER_SIZE};

/// Backward window of a Method1 reference (13-bit distance field)
pub const METHOD1_WINDOW: usize = 8192;

/// Backward window of a Method0 reference (one distance byte)
pub const METHOD0_WINDOW: usize = 256;

/// Decompress a complete HSQ file held in memory
///
/// `data` must start with the 6-byte HSQ header. Set `verify_checksum` to
/// reject files whose header byte sum is not 0xAB mod 256.
pub fn unpack_bytes(data: &[u8], verify_checksum: bool) -> Result<Vec<u8>> {
    let asset = unpack_named("", data, verify_checksum)?;
    Ok(asset.bytes)
}

/// Decompress a complete HSQ file, carrying a source name through for
/// interpreter output naming
pub fn unpack_named(source_name: &str, data: &[u8], verify_checksum: bool) -> Result<HsqAsset> {
    let header = HsqHeader::from_bytes(data, verify_checksum)?;
    let bytes = HsqDecoder::new(&data[HEADER_SIZE..], header.uncompressed_size as usize).decode()?;

    Ok(HsqAsset {
        source_name: source_name.to_string(),
        header,
        bytes,
    })
}
