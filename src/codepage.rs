//! Single-byte Cyrillic code pages
//!
//! Decoding is a plain table lookup: ASCII bytes pass through, bytes in the
//! upper half go through the code page's static table, and undefined cells
//! decode to U+FFFD.

use crate::{Encoding, REPLACEMENT_CHARACTER, tables};

/// One of the supported single-byte code pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodePage {
    /// Windows-1251
    Windows1251,
    /// KOI8-R
    Koi8R,
    /// ISO-8859-5
    Iso8859_5,
    /// MacCyrillic
    MacCyrillic,
}

impl CodePage {
    /// All code pages, in the order detection ranks ties.
    pub const ALL: [CodePage; 4] = [
        CodePage::Windows1251,
        CodePage::Koi8R,
        CodePage::Iso8859_5,
        CodePage::MacCyrillic,
    ];

    /// The encoding this code page decodes.
    pub fn encoding(self) -> Encoding {
        match self {
            CodePage::Windows1251 => Encoding::WINDOWS_1251,
            CodePage::Koi8R => Encoding::KOI8_R,
            CodePage::Iso8859_5 => Encoding::ISO_8859_5,
            CodePage::MacCyrillic => Encoding::MAC_CYRILLIC,
        }
    }

    fn table(self) -> &'static [u16; 128] {
        match self {
            CodePage::Windows1251 => &tables::WINDOWS_1251,
            CodePage::Koi8R => &tables::KOI8_R,
            CodePage::Iso8859_5 => &tables::ISO_8859_5,
            CodePage::MacCyrillic => &tables::MAC_CYRILLIC,
        }
    }

    /// Map one byte to its character, substituting U+FFFD for undefined bytes.
    #[inline]
    pub fn decode_byte(self, byte: u8) -> char {
        if byte < 0x80 {
            return char::from(byte);
        }

        match self.table()[(byte - 0x80) as usize] {
            0 => REPLACEMENT_CHARACTER,
            // Tables hold no surrogates, so this never falls back in practice
            cp => char::from_u32(u32::from(cp)).unwrap_or(REPLACEMENT_CHARACTER),
        }
    }

    /// Decode a whole buffer under this code page.
    pub fn decode(self, input: &[u8]) -> Vec<char> {
        input.iter().map(|&byte| self.decode_byte(byte)).collect()
    }
}
