//! HsqLib - Rust decoder for the Cryo HSQ asset format family
//!
//! This crate provides a pure Rust decoder for the HSQ container format
//! (1990s DOS era) used by Cryo Interactive's game assets, together with the
//! two payload interpreters layered on top of it: a packed-pixel
//! sprite/palette format and a byte-coded localized text format with
//! embedded variable-substitution instructions.
//!
//! # Features
//!
//! - **Decompression** - bit-exact reconstruction of the original
//!   uncompressed asset bytes, including the format's historical quirks
//! - **Image interpretation** - subpalette decoding, offsets-array walking,
//!   nibble-packed and RLE-compressed sprite pixels
//! - **Text interpretation** - sentence indexing, per-locale charset
//!   redirection, data-driven instruction expansion
//! - Per-part and per-sentence error isolation: one corrupt unit never
//!   aborts the rest of the asset
//!
//! # Example - Decompression
//!
//! ```no_run
//! use hsqlib::unpack_bytes;
//!
//! let compressed = std::fs::read("ICONES.HSQ")?;
//! let decompressed = unpack_bytes(&compressed, true)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Example - Full image pipeline
//!
//! ```no_run
//! use hsqlib::{interpret_image_asset, unpack_named};
//!
//! let compressed = std::fs::read("ICONES.HSQ")?;
//! let asset = unpack_named("ICONES.HSQ", &compressed, true)?;
//! let image = interpret_image_asset(&asset)?;
//! println!(
//!     "{}: {} subpalette(s), {} sprite(s)",
//!     image.source_name,
//!     image.sub_palettes.len(),
//!     image.image_parts.len()
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Example - Text pipeline
//!
//! ```no_run
//! use hsqlib::text::{builtin_table, dune_instructions};
//! use hsqlib::{interpret_text_asset, unpack_named};
//!
//! let compressed = std::fs::read("PHRASE11.HSQ")?;
//! let asset = unpack_named("PHRASE11.HSQ", &compressed, true)?;
//! let charset = builtin_table("fr-FR").expect("built-in locale");
//! let text = interpret_text_asset(&asset, &charset, &dune_instructions())?;
//! for sentence in text.sentences.values() {
//!     println!("{:04X}: {}", sentence.start_address, sentence.text_with_instructions);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

// Public modules
pub mod common;
pub mod cursor;
pub mod error;
pub mod hsq;
pub mod image;
pub mod text;

// Re-export commonly used types
pub use common::{HsqAsset, HsqHeader, HsqLibError, Result, HEADER_CHECKSUM, HEADER_SIZE};
pub use cursor::ByteCursor;
pub use hsq::{unpack_bytes, unpack_named, HsqDecoder};
pub use image::{interpret_image, interpret_image_asset, CryoImageData};
pub use text::{interpret_text, interpret_text_asset, CryoTextData};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports() {
        // Test that common types are accessible
        let _ = HEADER_CHECKSUM;
        assert_eq!(HEADER_SIZE, 6);

        // Test that the pipeline functions are accessible
        let header = [0x08, 0x00, 0x00, 0x08, 0x00, 0x9B];
        assert!(HsqHeader::checksum_valid(&header));
    }
}
