//! Image part decoding: nibble-packed and RLE-compressed sprite pixels
//!
//! Each part located by the offsets array opens with a 16-bit field mixing a
//! compression flag (top bit) with the sprite width (lower 15 bits). A zero
//! field marks a part that is not an image at all; those are surfaced as
//! [`UnknownPart`] rather than rejected. Pixels are 4-bit palette indices,
//! two per byte with the low nibble rendered first; a zero nibble is
//! transparent.

use log::debug;
use serde::Serialize;

use crate::common::{HsqLibError, Result};
use crate::cursor::ByteCursor;

/// Top bit of the compression-and-width field: set for RLE-compressed parts
const COMPRESSION_FLAG: u16 = 0x8000;

/// One decoded sprite
#[derive(Debug, Clone, Serialize)]
pub struct ImagePart {
    /// Positional index in offsets-array order
    pub index: usize,
    /// Display name, assigned by discovery order
    pub name: String,
    /// Whether the pixel data was RLE-compressed
    pub is_compressed: bool,
    /// Width in pixels
    pub width: u16,
    /// Height in pixels
    pub height: u8,
    /// Offset applied to pixel values when resolving palette slots
    pub palette_offset: u8,
    /// Raw pixel-area bytes as stored in the asset
    pub raw_bytes: Vec<u8>,
    /// Decoded pixels, row-major, `width * height` entries; `None` is
    /// transparent
    pub pixels: Vec<Option<u8>>,
}

/// A part whose header marks it as not-an-image
#[derive(Debug, Clone, Serialize)]
pub struct UnknownPart {
    /// Positional index in offsets-array order
    pub index: usize,
    /// Display name, assigned by discovery order
    pub name: String,
    /// Raw bytes following the zero header field
    pub raw_bytes: Vec<u8>,
}

/// One unit located by the offsets array
#[derive(Debug, Clone, Serialize)]
pub enum Part {
    /// A decodable sprite
    Image(ImagePart),
    /// The sentinel all-zero-header case
    Unknown(UnknownPart),
}

/// Decode one part from its `[start, end)` byte range
pub(crate) fn decode_part(data: &[u8], index: usize) -> Result<Part> {
    let mut cursor = ByteCursor::new(data);

    let compression_and_width = cursor
        .read_le_u16()
        .map_err(|_| part_error(index, "part too short for its header"))?;

    if compression_and_width == 0 {
        debug!("part {index} does not look like an image part");
        let raw_bytes = cursor.read_bytes(cursor.remaining())?.to_vec();
        return Ok(Part::Unknown(UnknownPart {
            index,
            name: format!("part{index}"),
            raw_bytes,
        }));
    }

    let is_compressed = compression_and_width > 0x7FFF;
    let width = compression_and_width & !COMPRESSION_FLAG;
    if width == 0 {
        return Err(part_error(index, "image part with zero width"));
    }

    let height = cursor
        .read_u8()
        .map_err(|_| part_error(index, "part too short for its header"))?;
    let palette_offset = cursor
        .read_u8()
        .map_err(|_| part_error(index, "part too short for its header"))?;
    let raw_bytes = cursor.read_bytes(cursor.remaining())?.to_vec();

    let pixels = if is_compressed {
        debug!("part {index}: RLE-compressed, {width}x{height}");
        decode_rle(width as usize, height as usize, &raw_bytes, index)?
    } else {
        decode_packed(width as usize, height as usize, &raw_bytes, index)?
    };

    Ok(Part::Image(ImagePart {
        index,
        name: format!("part{index}"),
        is_compressed,
        width,
        height,
        palette_offset,
        raw_bytes,
        pixels,
    }))
}

/// Stored size of one row of packed pixels
///
/// Half a byte per pixel rounded up, then rounded up again to an even byte
/// count: odd-width rows carry garbage byte(s) at the end.
fn bytes_per_line(width: usize) -> usize {
    let mut result = width.div_ceil(2);
    if result % 2 == 1 {
        result += 1;
    }
    result
}

/// Unpack an uncompressed nibble-packed pixel area
fn decode_packed(
    width: usize,
    height: usize,
    data: &[u8],
    index: usize,
) -> Result<Vec<Option<u8>>> {
    if data.is_empty() {
        return Err(part_error(index, "no pixel data for uncompressed sprite"));
    }

    let line_bytes = bytes_per_line(width);
    let mut cursor = ByteCursor::new(data);
    let mut pixels = Vec::with_capacity(width * height);

    for row in 0..height {
        let line = cursor.read_bytes(line_bytes).map_err(|_| {
            part_error(index, format!("pixel data ends inside row {row}"))
        })?;

        for x in 0..width {
            let byte = line[x / 2];
            // Low nibble renders first, high nibble second.
            let nibble = if x % 2 == 0 { byte & 0x0F } else { byte >> 4 };
            pixels.push((nibble != 0).then_some(nibble));
        }

        let used = width.div_ceil(2);
        if used < line_bytes {
            debug!("part {index} row {row}: {} padding byte(s)", line_bytes - used);
        }
    }

    Ok(pixels)
}

/// Expand an RLE-compressed pixel area
///
/// Each row is a run of command bytes until the row's pixel budget is spent.
/// The budget is `4 * ceil(width / 4)`, a run-rounding quantum distinct from
/// the packed path's row padding; both conventions are reproduced as
/// observed, not unified. A command byte with the high bit set repeats one
/// value byte `257 - cmd` times; otherwise `cmd + 1` value bytes follow
/// literally. Every value byte carries two pixels, low nibble first, and a
/// zero nibble leaves the destination transparent.
fn decode_rle(width: usize, height: usize, data: &[u8], index: usize) -> Result<Vec<Option<u8>>> {
    let mut pixels: Vec<Option<u8>> = vec![None; width * height];
    let mut cursor = ByteCursor::new(data);

    for row in 0..height {
        let mut dst = 0usize;
        let mut line_remain = (4 * width.div_ceil(4)) as i32;

        while line_remain > 0 {
            let cmd = cursor.read_u8().map_err(|_| {
                part_error(index, format!("RLE stream ends inside row {row}"))
            })?;

            let count = if cmd & 0x80 != 0 {
                let count = 257 - cmd as i32;
                let value = cursor.read_u8().map_err(|_| {
                    part_error(index, format!("RLE repeat run truncated in row {row}"))
                })?;
                for _ in 0..count {
                    put_pair(&mut pixels, row, width, &mut dst, value, index)?;
                }
                count
            } else {
                let count = cmd as i32 + 1;
                for _ in 0..count {
                    let value = cursor.read_u8().map_err(|_| {
                        part_error(index, format!("RLE literal run truncated in row {row}"))
                    })?;
                    put_pair(&mut pixels, row, width, &mut dst, value, index)?;
                }
                count
            };

            line_remain -= 2 * count;
        }
    }

    Ok(pixels)
}

/// Write the two nibbles of one value byte at the row cursor
///
/// Zero nibbles advance the cursor without writing (transparent). A non-zero
/// nibble that lands outside the pixel buffer is a corrupt run.
fn put_pair(
    pixels: &mut [Option<u8>],
    row: usize,
    width: usize,
    dst: &mut usize,
    value: u8,
    index: usize,
) -> Result<()> {
    for nibble in [value & 0x0F, value >> 4] {
        if nibble != 0 {
            let slot = pixels.get_mut(row * width + *dst).ok_or_else(|| {
                part_error(index, format!("RLE run overflows pixel buffer in row {row}"))
            })?;
            *slot = Some(nibble);
        }
        *dst += 1;
    }
    Ok(())
}

fn part_error(index: usize, reason: impl Into<String>) -> HsqLibError {
    HsqLibError::PartDecode {
        index,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(part: Part) -> ImagePart {
        match part {
            Part::Image(p) => p,
            Part::Unknown(p) => panic!("expected image part, got unknown part {}", p.index),
        }
    }

    #[test]
    fn test_zero_header_is_unknown_part() {
        let data = [0x00, 0x00, 0xDE, 0xAD, 0xBE, 0xEF];
        match decode_part(&data, 3).unwrap() {
            Part::Unknown(p) => {
                assert_eq!(p.index, 3);
                assert_eq!(p.raw_bytes, vec![0xDE, 0xAD, 0xBE, 0xEF]);
            }
            Part::Image(_) => panic!("zero header must not decode as an image"),
        }
    }

    #[test]
    fn test_packed_odd_width_low_nibble_first() {
        // width 3: bytes-per-line is ceil(3/2)=2 rounded up to 2. Byte 0x21
        // holds pixels 1 then 2; the third pixel is the low nibble of the
        // next byte, and its high nibble is padding.
        let data = [0x03, 0x00, 0x01, 0x00, 0x21, 0x03];
        let part = image(decode_part(&data, 0).unwrap());

        assert!(!part.is_compressed);
        assert_eq!(part.width, 3);
        assert_eq!(part.height, 1);
        assert_eq!(part.pixels, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_packed_zero_nibble_is_transparent() {
        // width 2, height 1: byte 0x30 is transparent then 3. Row pads to 2 bytes.
        let data = [0x02, 0x00, 0x01, 0x00, 0x30, 0x00];
        let part = image(decode_part(&data, 0).unwrap());
        assert_eq!(part.pixels, vec![None, Some(3)]);
    }

    #[test]
    fn test_rle_repeat_run() {
        // width 4, compressed: header 0x8004. Command 0xFF repeats the value
        // byte 0x34 twice; each pair is (4, 3) in render order.
        let data = [0x04, 0x80, 0x01, 0x05, 0xFF, 0x34];
        let part = image(decode_part(&data, 0).unwrap());

        assert!(part.is_compressed);
        assert_eq!(part.palette_offset, 5);
        assert_eq!(
            part.pixels,
            vec![Some(4), Some(3), Some(4), Some(3)]
        );
    }

    #[test]
    fn test_rle_literal_run_with_transparency() {
        // width 4: command 0x01 takes two value bytes; zero nibbles stay None.
        let data = [0x04, 0x80, 0x01, 0x00, 0x01, 0x20, 0x05];
        let part = image(decode_part(&data, 0).unwrap());
        assert_eq!(part.pixels, vec![None, Some(2), Some(5), None]);
    }

    #[test]
    fn test_rle_truncated_stream_is_part_error() {
        let data = [0x04, 0x80, 0x02, 0x00, 0xFF];
        assert!(matches!(
            decode_part(&data, 7),
            Err(HsqLibError::PartDecode { index: 7, .. })
        ));
    }

    #[test]
    fn test_zero_width_rejected() {
        // Compression flag set but all width bits clear.
        let data = [0x00, 0x80, 0x01, 0x00, 0x11];
        assert!(matches!(
            decode_part(&data, 0),
            Err(HsqLibError::PartDecode { .. })
        ));
    }

    #[test]
    fn test_uncompressed_without_pixel_data_rejected() {
        let data = [0x02, 0x00, 0x01, 0x00];
        assert!(matches!(
            decode_part(&data, 0),
            Err(HsqLibError::PartDecode { .. })
        ));
    }
}
