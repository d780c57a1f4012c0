//! Image payload interpretation
//!
//! A decompressed image asset lays out as: a 16-bit offset to the offsets
//! array, the palette area, the offsets array itself, then the parts the
//! array points at. Offsets are stored relative to the array start and are
//! resolved to absolute addresses here. One corrupt part never aborts the
//! asset: failed parts are logged and skipped, per-part.

mod palette;
mod part;

pub use palette::{
    decode_palette_area, Palette, PaletteColor, Sprite, SubPalette, CHANNEL_SCALE,
    PALETTE_END_MARKER, PALETTE_SIZE,
};
pub use part::{ImagePart, Part, UnknownPart};

use log::{info, warn};
use serde::Serialize;

use crate::common::{HsqAsset, HsqLibError, Result};
use crate::cursor::ByteCursor;

/// Decoded contents of one image asset
#[derive(Debug, Clone, Serialize)]
pub struct CryoImageData {
    /// Name of the originating file
    pub source_name: String,
    /// Subpalettes from the palette area, in discovery order
    pub sub_palettes: Vec<SubPalette>,
    /// Successfully decoded sprites, in offsets-array order
    pub image_parts: Vec<ImagePart>,
    /// Parts whose header marks them as not-an-image, in offsets-array order
    pub unknown_parts: Vec<UnknownPart>,
}

/// Interpret a decompressed buffer as an image asset
///
/// Structural bookkeeping failures (offsets array inconsistency) abort the
/// asset; a part that fails to decode is logged and omitted while the rest
/// of the file decodes normally.
pub fn interpret_image(buf: &[u8], source_name: &str) -> Result<CryoImageData> {
    let mut cursor = ByteCursor::new(buf);

    let offsets_start = cursor.read_le_u16()? as usize;
    if offsets_start < 2 || offsets_start > buf.len() {
        return Err(HsqLibError::InvalidData(format!(
            "offsets array start 0x{offsets_start:04X} outside the buffer"
        )));
    }

    let palette_area = cursor.read_bytes(offsets_start - 2)?;
    let sub_palettes = decode_palette_area(palette_area);

    let absolute = read_offsets_array(&mut cursor, offsets_start)?;
    info!(
        "offsets array of {} holds {} part(s)",
        source_name,
        absolute.len()
    );

    // The array describes its own end: the first part must start exactly
    // where the array stops.
    if absolute[0] != cursor.position() {
        return Err(HsqLibError::InvalidData(format!(
            "first part address 0x{:04X} does not follow the offsets array (cursor at 0x{:04X})",
            absolute[0],
            cursor.position()
        )));
    }

    let mut image_parts = Vec::new();
    let mut unknown_parts = Vec::new();

    for (index, (start, end)) in address_pairs(&absolute, buf.len()).into_iter().enumerate() {
        match decode_range(buf, start, end, index) {
            Ok(Part::Image(part)) => image_parts.push(part),
            Ok(Part::Unknown(part)) => unknown_parts.push(part),
            Err(err) => warn!("{source_name}: skipping {err}"),
        }
    }

    if !unknown_parts.is_empty() {
        info!(
            "{} part(s) of {} were not image parts",
            unknown_parts.len(),
            source_name
        );
    }

    Ok(CryoImageData {
        source_name: source_name.to_string(),
        sub_palettes,
        image_parts,
        unknown_parts,
    })
}

/// Interpret a decompressed HSQ asset as an image asset
pub fn interpret_image_asset(asset: &HsqAsset) -> Result<CryoImageData> {
    interpret_image(&asset.bytes, &asset.source_name)
}

/// Read the offsets array and resolve every entry to an absolute address
///
/// The first 16-bit entry doubles as the array's own byte size; every entry
/// is relative to the array start.
fn read_offsets_array(cursor: &mut ByteCursor<'_>, offsets_start: usize) -> Result<Vec<usize>> {
    let total_byte_size = cursor.read_le_u16()? as usize;
    let entry_count = total_byte_size / 2;
    if entry_count == 0 {
        return Err(HsqLibError::InvalidData(
            "offsets array declares zero entries".to_string(),
        ));
    }

    let mut absolute = Vec::with_capacity(entry_count);
    absolute.push(offsets_start + total_byte_size);
    for _ in 1..entry_count {
        absolute.push(offsets_start + cursor.read_le_u16()? as usize);
    }

    Ok(absolute)
}

/// Derive `[start, end)` ranges from consecutive absolute addresses
///
/// The final range's end is the buffer length; it is implicit, never stored.
fn address_pairs(absolute: &[usize], buffer_len: usize) -> Vec<(usize, usize)> {
    (0..absolute.len())
        .map(|i| {
            let end = if i + 1 < absolute.len() {
                absolute[i + 1]
            } else {
                buffer_len
            };
            (absolute[i], end)
        })
        .collect()
}

fn decode_range(buf: &[u8], start: usize, end: usize, index: usize) -> Result<Part> {
    if start > end || end > buf.len() {
        return Err(HsqLibError::PartDecode {
            index,
            reason: format!("address range 0x{start:04X}..0x{end:04X} outside the buffer"),
        });
    }
    part::decode_part(&buf[start..end], index)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a minimal image asset: subpalette of one color, one packed
    /// 2x1 image part and one unknown part.
    fn sample_image_buffer() -> Vec<u8> {
        let mut buf = Vec::new();
        // Palette area: subpalette at slot 4 with one color, end marker.
        let palette_area = [0x04, 0x01, 10, 20, 30, 0xFF, 0xFF];
        let offsets_start = 2 + palette_area.len();
        buf.extend_from_slice(&(offsets_start as u16).to_le_bytes());
        buf.extend_from_slice(&palette_area);
        // Offsets array: two entries (4 bytes). Entries are relative to the
        // array start; the first entry is the array size itself.
        buf.extend_from_slice(&4u16.to_le_bytes());
        buf.extend_from_slice(&10u16.to_le_bytes());
        // Part 0 at offsets_start + 4: packed 2x1, pixels (1, 2), padded row.
        buf.extend_from_slice(&[0x02, 0x00, 0x01, 0x00, 0x21, 0x00]);
        // Part 1 at offsets_start + 10: zero header, opaque blob.
        buf.extend_from_slice(&[0x00, 0x00, 0xCA, 0xFE]);
        buf
    }

    #[test]
    fn test_interpret_sample_image() {
        let buf = sample_image_buffer();
        let data = interpret_image(&buf, "SAMPLE.HSQ").unwrap();

        assert_eq!(data.sub_palettes.len(), 1);
        assert_eq!(data.sub_palettes[0].location_in_palette, 4);
        assert_eq!(
            data.sub_palettes[0].colors[0],
            PaletteColor {
                r: 40,
                g: 80,
                b: 120
            }
        );

        assert_eq!(data.image_parts.len(), 1);
        let part = &data.image_parts[0];
        assert_eq!(part.index, 0);
        assert_eq!((part.width, part.height), (2, 1));
        assert_eq!(part.pixels, vec![Some(1), Some(2)]);

        assert_eq!(data.unknown_parts.len(), 1);
        assert_eq!(data.unknown_parts[0].index, 1);
        assert_eq!(data.unknown_parts[0].raw_bytes, vec![0xCA, 0xFE]);
    }

    #[test]
    fn test_first_address_mismatch_is_fatal() {
        let mut buf = sample_image_buffer();
        // An odd declared array size puts the first part address past the
        // bytes actually read for the array.
        let offsets_start = 2 + 7;
        buf[offsets_start] = 5;
        assert!(matches!(
            interpret_image(&buf, "SAMPLE.HSQ"),
            Err(HsqLibError::InvalidData(_))
        ));
    }

    #[test]
    fn test_corrupt_part_is_skipped_not_fatal() {
        let mut buf = sample_image_buffer();
        // Turn part 0 into an RLE part whose repeat run overflows the 2x1
        // pixel buffer; part 1 must still decode.
        let part0 = 2 + 7 + 4;
        buf[part0 + 1] = 0x80;
        buf[part0 + 4] = 0xFF;
        buf[part0 + 5] = 0xCA;
        let data = interpret_image(&buf, "SAMPLE.HSQ").unwrap();

        assert!(data.image_parts.is_empty());
        assert_eq!(data.unknown_parts.len(), 1);
        assert_eq!(data.unknown_parts[0].raw_bytes, vec![0xCA, 0xFE]);
    }
}
