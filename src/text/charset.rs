//! Character-set redirection
//!
//! Sentence bytes are a single-byte-per-character encoding. Most bytes map
//! straight to their numeric codepoint; a per-locale redirect table overrides
//! the handful of slots the game reuses for accented characters, and the
//! bytes 0xFE and 0x0D both render as a line break.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Byte rendered as a line break in every locale
pub const NEWLINE_BYTE: u8 = 0xFE;

/// Carriage return, also rendered as a line break
pub const CARRIAGE_RETURN_BYTE: u8 = 0x0D;

/// Per-locale mapping from raw byte to override character
///
/// Sparse: only overridden bytes are present. Supplied by the caller as
/// plain data; [`builtin_tables`] carries the tables shipped with the game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharsetRedirectTable {
    /// Locale identifier, e.g. "en-US"
    pub culture: String,
    /// Byte-to-character overrides
    pub redirects: BTreeMap<u8, char>,
}

impl CharsetRedirectTable {
    /// Create an empty table for a locale
    pub fn new(culture: &str) -> Self {
        Self {
            culture: culture.to_string(),
            redirects: BTreeMap::new(),
        }
    }

    /// Decode one byte to its rendered character
    pub fn decode_byte(&self, byte: u8) -> char {
        match byte {
            NEWLINE_BYTE | CARRIAGE_RETURN_BYTE => '\n',
            b => self.redirects.get(&b).copied().unwrap_or(b as char),
        }
    }

    /// Decode a byte sequence to a string
    pub fn decode(&self, bytes: &[u8]) -> String {
        bytes.iter().map(|b| self.decode_byte(*b)).collect()
    }
}

/// The charset tables shipped with the game: en-US (no overrides) and fr-FR
/// (accented characters stored in the bracket/brace slots)
pub fn builtin_tables() -> Vec<CharsetRedirectTable> {
    let mut fr = CharsetRedirectTable::new("fr-FR");
    fr.redirects = BTreeMap::from([
        (91, 'â'),  // '['
        (92, 'ê'),  // '\'
        (93, 'î'),  // ']'
        (94, 'ô'),  // '^'
        (95, 'û'),  // '_'
        (123, 'à'), // '{'
        (124, 'é'), // '|'
        (125, 'è'), // '}'
        (126, 'ù'), // '~'
        (127, 'ç'), // DEL
    ]);

    vec![CharsetRedirectTable::new("en-US"), fr]
}

/// Look up a built-in table by locale identifier
pub fn builtin_table(culture: &str) -> Option<CharsetRedirectTable> {
    builtin_tables().into_iter().find(|t| t.culture == culture)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_bytes_decode_as_codepoints() {
        let table = CharsetRedirectTable::new("en-US");
        assert_eq!(table.decode(b"Hello"), "Hello");
        assert_eq!(table.decode_byte(0x41), 'A');
    }

    #[test]
    fn test_newline_bytes() {
        let table = CharsetRedirectTable::new("en-US");
        assert_eq!(table.decode(&[b'a', 0xFE, b'b', 0x0D, b'c']), "a\nb\nc");
    }

    #[test]
    fn test_french_overrides() {
        let fr = builtin_table("fr-FR").unwrap();
        assert_eq!(fr.decode(&[124, 116, 124]), "été");
        assert_eq!(fr.decode_byte(127), 'ç');
        // Non-overridden bytes keep their codepoint.
        assert_eq!(fr.decode_byte(b'z'), 'z');
    }

    #[test]
    fn test_builtin_lookup() {
        assert!(builtin_table("en-US").unwrap().redirects.is_empty());
        assert!(builtin_table("de-DE").is_none());
    }
}
