//! Palette-area decoding and total palette construction
//!
//! The palette area of an image asset holds zero or more subpalettes, each a
//! run of RGB triples anchored at an offset within the 256-slot VGA palette.
//! Channel values are stored as 6-bit DAC values and are scaled by 4 on
//! decode. The area ends with a 0xFFFF marker word; anything between the
//! marker and the offsets array is junk and is discarded.

use log::{debug, warn};
use serde::Serialize;

use crate::common::{HsqLibError, Result};
use crate::cursor::ByteCursor;

/// Word value terminating the palette area (peeked, never part of a subpalette)
pub const PALETTE_END_MARKER: u16 = 0xFFFF;

/// Scale factor from 6-bit VGA DAC channel values to 8-bit channels
pub const CHANNEL_SCALE: u16 = 4;

/// Number of slots in a complete palette
pub const PALETTE_SIZE: usize = 256;

/// One 8-bit-per-channel palette color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaletteColor {
    /// Red channel, pre-scaled
    pub r: u8,
    /// Green channel, pre-scaled
    pub g: u8,
    /// Blue channel, pre-scaled
    pub b: u8,
}

/// A partial, offset-anchored run of colors within the 256-slot palette
#[derive(Debug, Clone, Serialize)]
pub struct SubPalette {
    /// Display name, assigned by discovery order
    pub name: String,
    /// First palette slot this subpalette covers
    pub location_in_palette: u8,
    /// Decoded colors, in slot order
    pub colors: Vec<PaletteColor>,
}

impl SubPalette {
    /// Build a total 256-slot palette from this subpalette, filling every
    /// uncovered slot with `default`
    pub fn to_palette(&self, default: PaletteColor) -> Palette {
        Palette::from_sub_palette(self, default)
    }
}

/// A total mapping from palette index 0..=255 to a color
#[derive(Debug, Clone)]
pub struct Palette {
    colors: [PaletteColor; PALETTE_SIZE],
}

impl Palette {
    /// Place one subpalette's colors at their anchored slots and fill all
    /// other slots with `default`
    ///
    /// Colors that would land past slot 255 are dropped.
    pub fn from_sub_palette(sub: &SubPalette, default: PaletteColor) -> Self {
        let mut colors = [default; PALETTE_SIZE];
        for (i, color) in sub.colors.iter().enumerate() {
            let slot = sub.location_in_palette as usize + i;
            if slot < PALETTE_SIZE {
                colors[slot] = *color;
            }
        }
        Self { colors }
    }

    /// Color at a palette index
    pub fn color(&self, index: u8) -> PaletteColor {
        self.colors[index as usize]
    }

    /// All 256 colors in slot order
    pub fn colors(&self) -> &[PaletteColor; PALETTE_SIZE] {
        &self.colors
    }

    /// Build an 8x32 preview sprite whose pixels ramp through all 256
    /// palette indices, for palette inspection
    pub fn index_ramp_sprite(&self) -> Sprite {
        const COLORS_PER_ROW: usize = 8;
        const ROWS: usize = PALETTE_SIZE / COLORS_PER_ROW;

        let pixels = (0..PALETTE_SIZE).map(|i| i as u8).collect();
        Sprite {
            width: COLORS_PER_ROW,
            height: ROWS,
            pixels,
            palette: self.clone(),
        }
    }
}

/// A rendered-pixel rectangle paired with the palette to view it through
#[derive(Debug, Clone)]
pub struct Sprite {
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    /// Palette indices, row-major, `width * height` entries
    pub pixels: Vec<u8>,
    /// Palette resolving each index to a color
    pub palette: Palette,
}

/// Decode every subpalette in the palette area
///
/// Scanning stops at the 0xFFFF marker, at the end of the area, or at the
/// first subpalette that fails to decode (the stream is desynced past that
/// point); already-decoded subpalettes are kept either way.
pub fn decode_palette_area(area: &[u8]) -> Vec<SubPalette> {
    let mut cursor = ByteCursor::new(area);
    let mut sub_palettes = Vec::new();

    loop {
        match cursor.peek_le_u16() {
            Ok(PALETTE_END_MARKER) => break,
            // Fewer than 2 bytes left: nothing more to scan.
            Err(_) => return sub_palettes,
            Ok(_) => {}
        }

        match decode_sub_palette(&mut cursor, sub_palettes.len()) {
            Ok(sub) => sub_palettes.push(sub),
            Err(err) => {
                warn!("palette area scan stopped after subpalette failure: {err}");
                return sub_palettes;
            }
        }
    }

    // Junk between the marker and the offsets array carries no meaning.
    let junk = cursor.remaining().saturating_sub(2);
    if junk > 0 {
        debug!("{junk} junk byte(s) after palette end marker");
    }

    sub_palettes
}

fn decode_sub_palette(cursor: &mut ByteCursor<'_>, index: usize) -> Result<SubPalette> {
    let location_in_palette = cursor.read_u8()?;
    let color_count = cursor.read_u8()?;

    let mut colors = Vec::with_capacity(color_count as usize);
    for _ in 0..color_count {
        colors.push(PaletteColor {
            r: scale_channel(cursor.read_u8()?)?,
            g: scale_channel(cursor.read_u8()?)?,
            b: scale_channel(cursor.read_u8()?)?,
        });
    }

    Ok(SubPalette {
        name: format!("subpalette{index}"),
        location_in_palette,
        colors,
    })
}

/// Scale a raw 6-bit DAC value to an 8-bit channel
///
/// A product outside the byte range means the value was never a 6-bit DAC
/// entry and the subpalette is corrupt.
fn scale_channel(raw: u8) -> Result<u8> {
    let scaled = raw as u16 * CHANNEL_SCALE;
    if scaled >= 256 {
        return Err(HsqLibError::Palette(format!(
            "channel value {raw} outside the 6-bit DAC range"
        )));
    }
    Ok(scaled as u8)
}
