//! Decoders for the wide Unicode encodings, UTF-16 and UTF-32
//!
//! Both decoders are lossy in the same way: a malformed unit becomes U+FFFD
//! and decoding carries on, and a trailing partial unit is dropped.

use crate::REPLACEMENT_CHARACTER;

/// Byte order of a UTF-16 or UTF-32 stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// Least significant byte first
    Little,
    /// Most significant byte first
    Big,
}

impl Endian {
    #[inline]
    fn u16(self, bytes: [u8; 2]) -> u16 {
        match self {
            Endian::Little => u16::from_le_bytes(bytes),
            Endian::Big => u16::from_be_bytes(bytes),
        }
    }

    #[inline]
    fn u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            Endian::Little => u32::from_le_bytes(bytes),
            Endian::Big => u32::from_be_bytes(bytes),
        }
    }
}

/// Decode UTF-16 with surrogate-pair handling.
///
/// A high surrogate not followed by a low surrogate yields one U+FFFD and the
/// unit after it is consumed along with it. An unpaired low surrogate yields
/// one U+FFFD.
pub fn decode_utf16(input: &[u8], endian: Endian) -> Vec<char> {
    let units: Vec<u16> = input
        .chunks_exact(2)
        .map(|chunk| endian.u16([chunk[0], chunk[1]]))
        .collect();

    let mut output = Vec::with_capacity(units.len());
    let mut i = 0;

    while i < units.len() {
        let unit = units[i];
        i += 1;

        match unit {
            0xD800..=0xDBFF => match units.get(i) {
                Some(&low @ 0xDC00..=0xDFFF) => {
                    i += 1;
                    let scalar =
                        0x10000 + ((u32::from(unit) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
                    output.push(char::from_u32(scalar).unwrap_or(REPLACEMENT_CHARACTER));
                }
                Some(_) => {
                    i += 1;
                    output.push(REPLACEMENT_CHARACTER);
                }
                None => output.push(REPLACEMENT_CHARACTER),
            },
            0xDC00..=0xDFFF => output.push(REPLACEMENT_CHARACTER),
            _ => output.push(char::from_u32(u32::from(unit)).unwrap_or(REPLACEMENT_CHARACTER)),
        }
    }

    output
}

/// Decode UTF-32, replacing surrogates and values above U+10FFFF with U+FFFD.
pub fn decode_utf32(input: &[u8], endian: Endian) -> Vec<char> {
    input
        .chunks_exact(4)
        .map(|chunk| {
            let value = endian.u32([chunk[0], chunk[1], chunk[2], chunk[3]]);
            char::from_u32(value).unwrap_or(REPLACEMENT_CHARACTER)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16_bytes(text: &str, endian: Endian) -> Vec<u8> {
        let mut output = Vec::new();
        for unit in text.encode_utf16() {
            match endian {
                Endian::Little => output.extend_from_slice(&unit.to_le_bytes()),
                Endian::Big => output.extend_from_slice(&unit.to_be_bytes()),
            }
        }
        output
    }

    fn units_le(units: &[u16]) -> Vec<u8> {
        units.iter().flat_map(|u| u.to_le_bytes()).collect()
    }

    #[test]
    fn test_utf16_basic() {
        assert_eq!(decode_utf16(&[0x41, 0x00, 0x42, 0x00], Endian::Little), ['A', 'B']);
        assert_eq!(decode_utf16(&[0x00, 0x41, 0x00, 0x42], Endian::Big), ['A', 'B']);
    }

    #[test]
    fn test_utf16_drops_trailing_odd_byte() {
        assert_eq!(decode_utf16(&[0x41, 0x00, 0x42], Endian::Little), ['A']);
        assert!(decode_utf16(&[0x41], Endian::Little).is_empty());
    }

    #[test]
    fn test_utf16_surrogate_pairs_round_trip() {
        for text in ["𝄞", "a😀b", "\u{10000}", "\u{10FFFF}", "Привет 🌍"] {
            for endian in [Endian::Little, Endian::Big] {
                let decoded: String = decode_utf16(&utf16_bytes(text, endian), endian)
                    .into_iter()
                    .collect();
                assert_eq!(decoded, text);
            }
        }
    }

    #[test]
    fn test_utf16_high_surrogate_without_low() {
        // followed by a regular unit: both units become one replacement
        assert_eq!(
            decode_utf16(&units_le(&[0xD800, 0x0041]), Endian::Little),
            [REPLACEMENT_CHARACTER]
        );
        assert_eq!(
            decode_utf16(&units_le(&[0xD800, 0x0041, 0x0042]), Endian::Little),
            [REPLACEMENT_CHARACTER, 'B']
        );
        // at end of input
        assert_eq!(
            decode_utf16(&units_le(&[0x0041, 0xDBFF]), Endian::Little),
            ['A', REPLACEMENT_CHARACTER]
        );
        // two high surrogates then a low: the second high is swallowed and
        // the low is left unpaired
        assert_eq!(
            decode_utf16(&units_le(&[0xD800, 0xD800, 0xDC00]), Endian::Little),
            [REPLACEMENT_CHARACTER, REPLACEMENT_CHARACTER]
        );
    }

    #[test]
    fn test_utf16_unpaired_low_surrogate() {
        assert_eq!(
            decode_utf16(&units_le(&[0xDC00, 0xDFFF, 0x0042]), Endian::Little),
            [REPLACEMENT_CHARACTER, REPLACEMENT_CHARACTER, 'B']
        );
    }

    #[test]
    fn test_utf32_basic_and_partial_unit() {
        let le = [0x41, 0, 0, 0, 0x1F, 0x04, 0, 0, 0xFF];
        assert_eq!(decode_utf32(&le, Endian::Little), ['A', 'П']);

        let be = [0, 0, 0, 0x41, 0, 0x01, 0xF6, 0x00];
        assert_eq!(decode_utf32(&be, Endian::Big), ['A', '😀']);
    }

    #[test]
    fn test_utf32_invalid_scalars() {
        let be = [
            0x00, 0x00, 0xD8, 0x00, // surrogate
            0x00, 0x11, 0x00, 0x00, // above U+10FFFF
            0xFF, 0xFF, 0xFF, 0xFF, // far out of range
            0x00, 0x10, 0xFF, 0xFF, // U+10FFFF is fine
        ];
        assert_eq!(
            decode_utf32(&be, Endian::Big),
            [
                REPLACEMENT_CHARACTER,
                REPLACEMENT_CHARACTER,
                REPLACEMENT_CHARACTER,
                '\u{10FFFF}'
            ]
        );
    }
}
