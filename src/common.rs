//! Common types and constants for the Cryo HSQ asset format
//!
//! This module defines the core types shared by the HSQ decompressor and the
//! image/text payload interpreters: the 6-byte HSQ header, the decoded asset
//! container, and the crate-wide error type.

use serde::Serialize;
use thiserror::Error;

/// Size of the HSQ file header in bytes
pub const HEADER_SIZE: usize = 6;

/// Expected value of the header byte sum, modulo 256
pub const HEADER_CHECKSUM: u8 = 0xAB;

/// Parsed HSQ file header
///
/// The header occupies the first 6 bytes of every HSQ file: the uncompressed
/// size (bytes 0-1, little-endian; byte 2 is a fixed zero control byte in the
/// final format revision), the compressed size (bytes 3-4, little-endian) and
/// a checksum byte chosen so that the sum of all 6 header bytes is 0xAB mod 256.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HsqHeader {
    /// Size of the decompressed payload in bytes
    pub uncompressed_size: u32,
    /// Size of the whole compressed file in bytes, header included
    pub compressed_size: u16,
    /// Raw checksum byte (byte 5)
    pub checksum_byte: u8,
}

impl HsqHeader {
    /// Check the header byte sum against the expected 0xAB value
    ///
    /// Returns `false` for slices that are not exactly [`HEADER_SIZE`] bytes.
    pub fn checksum_valid(data: &[u8]) -> bool {
        data.len() == HEADER_SIZE
            && data.iter().fold(0u8, |acc, b| acc.wrapping_add(*b)) == HEADER_CHECKSUM
    }

    /// Parse a header from the first [`HEADER_SIZE`] bytes of `data`
    ///
    /// With `verify_checksum` set, a header whose byte sum is not 0xAB mod 256
    /// is rejected with [`HsqLibError::BadChecksum`].
    pub fn from_bytes(data: &[u8], verify_checksum: bool) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(HsqLibError::HeaderTooShort(data.len()));
        }

        let raw = &data[..HEADER_SIZE];
        if verify_checksum && !Self::checksum_valid(raw) {
            let actual = raw.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
            return Err(HsqLibError::BadChecksum {
                expected: HEADER_CHECKSUM,
                actual,
            });
        }

        Ok(Self {
            uncompressed_size: u16::from_le_bytes([raw[0], raw[1]]) as u32,
            compressed_size: u16::from_le_bytes([raw[3], raw[4]]),
            checksum_byte: raw[5],
        })
    }

    /// Whether a decompressed buffer has the length the header declares
    pub fn matches_uncompressed_len(&self, len: usize) -> bool {
        self.uncompressed_size as usize == len
    }

    /// Whether a compressed file has the length the header declares
    pub fn matches_compressed_len(&self, len: usize) -> bool {
        self.compressed_size as usize == len
    }
}

/// A fully decompressed HSQ asset
///
/// Produced once by the decompressor; the payload interpreters consume the
/// byte buffer read-only. `source_name` is carried through for output naming.
#[derive(Debug, Clone)]
pub struct HsqAsset {
    /// Name of the originating file, carried through to interpreter output
    pub source_name: String,
    /// Parsed file header
    pub header: HsqHeader,
    /// Decompressed payload bytes
    pub bytes: Vec<u8>,
}

/// Error type for HSQ decoding operations
#[derive(Debug, Error)]
pub enum HsqLibError {
    /// Header slice shorter than the fixed 6-byte header
    #[error("HSQ header too short: {0} bytes (expected 6)")]
    HeaderTooShort(usize),

    /// Header byte sum did not match the expected checksum value
    #[error("HSQ header checksum mismatch: byte sum 0x{actual:02X}, expected 0x{expected:02X}")]
    BadChecksum {
        /// Expected byte-sum value (always 0xAB)
        expected: u8,
        /// Byte sum actually observed
        actual: u8,
    },

    /// A read ran past the end of the input buffer
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Structural inconsistency in the compressed bitstream; the asset is
    /// unrecoverable once the stream desyncs
    #[error("corrupt HSQ stream: {0}")]
    Corrupt(String),

    /// Structural inconsistency in a decompressed payload (index/offsets
    /// bookkeeping that must hold for the whole asset)
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A subpalette could not be decoded from the palette area
    #[error("palette error: {0}")]
    Palette(String),

    /// A single image part could not be decoded; recovered by skipping it
    #[error("part {index}: {reason}")]
    PartDecode {
        /// Positional index of the offending part
        index: usize,
        /// Why the part was rejected
        reason: String,
    },

    /// A single text sentence could not be decoded; recovered by skipping it
    #[error("sentence at 0x{address:04X}: {reason}")]
    Sentence {
        /// Start address of the offending sentence
        address: u16,
        /// Why the sentence was rejected
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for HSQ decoding operations
pub type Result<T> = std::result::Result<T, HsqLibError>;

#[cfg(test)]
mod tests {
    use super::*;

    // Header bytes of JESS.HSQ, BUNK.HSQ and CHAN.HSQ from the original game
    // data, all with valid checksums.
    const JESS: [u8; 6] = [0x5F, 0x61, 0x00, 0x00, 0x25, 0xC6];
    const BUNK: [u8; 6] = [0xF2, 0x59, 0x00, 0xA6, 0x38, 0x82];
    const CHAN: [u8; 6] = [0x81, 0x4A, 0x00, 0xDE, 0x21, 0xE1];

    #[test]
    fn test_checksum_reference_headers() {
        for header in [JESS, BUNK, CHAN] {
            assert!(HsqHeader::checksum_valid(&header));
        }

        let mut jess = JESS;
        jess[4] = 0x61;
        assert!(!HsqHeader::checksum_valid(&jess));

        let mut bunk = BUNK;
        bunk[2] = 0x61;
        assert!(!HsqHeader::checksum_valid(&bunk));

        let mut chan = CHAN;
        chan[3] = 0x61;
        assert!(!HsqHeader::checksum_valid(&chan));
    }

    #[test]
    fn test_header_sizes() {
        let jess = HsqHeader::from_bytes(&JESS, true).unwrap();
        let bunk = HsqHeader::from_bytes(&BUNK, true).unwrap();
        let chan = HsqHeader::from_bytes(&CHAN, true).unwrap();

        assert_eq!(jess.uncompressed_size, 24927);
        assert_eq!(bunk.uncompressed_size, 23026);
        assert_eq!(chan.uncompressed_size, 19073);

        assert_eq!(jess.compressed_size, 9472);
        assert!(chan.matches_uncompressed_len(19073));
        assert!(!chan.matches_uncompressed_len(666));
    }

    #[test]
    fn test_bad_checksum_rejected() {
        let header = [0x10, 0x00, 0x00, 0x14, 0x00, 0x00];
        assert!(matches!(
            HsqHeader::from_bytes(&header, true),
            Err(HsqLibError::BadChecksum { .. })
        ));

        // Same header parses fine when verification is skipped.
        let parsed = HsqHeader::from_bytes(&header, false).unwrap();
        assert_eq!(parsed.uncompressed_size, 0x10);
        assert_eq!(parsed.compressed_size, 0x14);
    }

    #[test]
    fn test_header_too_short() {
        assert!(matches!(
            HsqHeader::from_bytes(&[0x01, 0x02], true),
            Err(HsqLibError::HeaderTooShort(2))
        ));
    }
}
