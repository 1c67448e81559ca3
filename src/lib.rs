//! # utf8-convert - Encoding Detection and UTF-8 Conversion
//!
//! Identifies the character encoding of a byte stream and re-encodes it as
//! UTF-8. Recognized inputs are UTF-8/16/32 with or without byte-order
//! marks, and the single-byte Cyrillic code pages Windows-1251, KOI8-R,
//! ISO-8859-5 and MacCyrillic.
//!
//! ## Features
//!
//! - **BOM-first detection**, with zero-byte heuristics for BOM-less UTF-16/32
//! - **Strict UTF-8 validation** rejecting overlong forms and encoded surrogates
//! - **Scored code page guessing** for legacy Cyrillic text
//! - **Lossy, never-failing decoding**: malformed input becomes U+FFFD
//! - **In-place conversion** through a sibling temporary file
//!
//! ## Quick Start
//!
//! ```rust
//! use utf8_convert::{Encoding, convert_buffer_to_utf8};
//!
//! // "Привет" in Windows-1251
//! let conversion = convert_buffer_to_utf8(&[0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2]);
//! assert_eq!(conversion.encoding, Encoding::WINDOWS_1251);
//! assert_eq!(conversion.into_string(), "Привет");
//! ```

#![deny(missing_docs)]

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Serialize, Serializer};

pub mod codepage;
pub mod convert;
pub mod detection;
pub mod multibyte;
pub mod replace;
pub mod score;
mod tables;
pub mod utf8;

pub use codepage::CodePage;
pub use convert::{Conversion, convert, convert_as};
pub use detection::{DetectionResult, EncodingDetector, detect};
pub use replace::ReplaceStrategy;

/// Substituted for every malformed or undefined input unit
pub const REPLACEMENT_CHARACTER: char = char::REPLACEMENT_CHARACTER;

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during conversion
///
/// Malformed text is never an error; only filesystem access can fail.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input file could not be opened or read
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },
    /// Output or temporary file could not be written
    #[error("cannot write {}: {source}", .path.display())]
    Write {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },
    /// Converted file could not be moved over the original
    #[error("failed to replace {}{}: {source}", .path.display(), data_loss_note(.original_removed))]
    Replace {
        /// File being converted in place
        path: PathBuf,
        /// Whether the original was deleted before the final rename failed
        original_removed: bool,
        /// Error from the final rename attempt
        source: io::Error,
    },
    /// Encoding label not recognized
    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),
}

fn data_loss_note(original_removed: &bool) -> &'static str {
    if *original_removed {
        " (original was removed, no file left at this path)"
    } else {
        ""
    }
}

/// Supported character encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Encoding {
    // Unicode encodings
    /// UTF-8 Unicode encoding (variable length, 1-4 bytes)
    UTF8,
    /// UTF-16LE Unicode encoding (little endian)
    UTF16LE,
    /// UTF-16BE Unicode encoding (big endian)
    UTF16BE,
    /// UTF-32LE Unicode encoding (little endian)
    UTF32LE,
    /// UTF-32BE Unicode encoding (big endian)
    UTF32BE,

    // Single-byte Cyrillic code pages
    /// Windows-1251 (Cyrillic)
    WINDOWS_1251,
    /// KOI8-R (Russian)
    KOI8_R,
    /// ISO-8859-5 (Cyrillic)
    ISO_8859_5,
    /// Macintosh Cyrillic
    MAC_CYRILLIC,
}

impl Encoding {
    /// Every supported encoding
    pub const ALL: [Encoding; 9] = [
        Encoding::UTF8,
        Encoding::UTF16LE,
        Encoding::UTF16BE,
        Encoding::UTF32LE,
        Encoding::UTF32BE,
        Encoding::WINDOWS_1251,
        Encoding::KOI8_R,
        Encoding::ISO_8859_5,
        Encoding::MAC_CYRILLIC,
    ];

    /// Get the canonical name of this encoding
    pub fn name(self) -> &'static str {
        match self {
            Encoding::UTF8 => "UTF-8",
            Encoding::UTF16LE => "UTF-16LE",
            Encoding::UTF16BE => "UTF-16BE",
            Encoding::UTF32LE => "UTF-32LE",
            Encoding::UTF32BE => "UTF-32BE",
            Encoding::WINDOWS_1251 => "WINDOWS-1251",
            Encoding::KOI8_R => "KOI8-R",
            Encoding::ISO_8859_5 => "ISO-8859-5",
            Encoding::MAC_CYRILLIC => "MACCYRILLIC",
        }
    }

    /// Check if this is one of the Unicode transformation formats
    pub fn is_unicode(self) -> bool {
        matches!(
            self,
            Encoding::UTF8
                | Encoding::UTF16LE
                | Encoding::UTF16BE
                | Encoding::UTF32LE
                | Encoding::UTF32BE
        )
    }

    /// Check if ASCII text is stored byte-for-byte in this encoding
    pub fn is_ascii_compatible(self) -> bool {
        !matches!(
            self,
            Encoding::UTF16LE | Encoding::UTF16BE | Encoding::UTF32LE | Encoding::UTF32BE
        )
    }

    /// The single-byte code page behind this encoding, if any
    pub fn code_page(self) -> Option<CodePage> {
        match self {
            Encoding::WINDOWS_1251 => Some(CodePage::Windows1251),
            Encoding::KOI8_R => Some(CodePage::Koi8R),
            Encoding::ISO_8859_5 => Some(CodePage::Iso8859_5),
            Encoding::MAC_CYRILLIC => Some(CodePage::MacCyrillic),
            _ => None,
        }
    }

    /// Get the byte order mark for this encoding
    pub fn bom(self) -> Option<&'static [u8]> {
        match self {
            Encoding::UTF8 => Some(&[0xEF, 0xBB, 0xBF]),
            Encoding::UTF16LE => Some(&[0xFF, 0xFE]),
            Encoding::UTF16BE => Some(&[0xFE, 0xFF]),
            Encoding::UTF32LE => Some(&[0xFF, 0xFE, 0x00, 0x00]),
            Encoding::UTF32BE => Some(&[0x00, 0x00, 0xFE, 0xFF]),
            _ => None,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let encoding = match s.to_uppercase().replace('_', "-").as_str() {
            "UTF8" | "UTF-8" => Encoding::UTF8,
            "UTF16LE" | "UTF-16LE" => Encoding::UTF16LE,
            "UTF16BE" | "UTF-16BE" => Encoding::UTF16BE,
            "UTF32LE" | "UTF-32LE" => Encoding::UTF32LE,
            "UTF32BE" | "UTF-32BE" => Encoding::UTF32BE,
            "WINDOWS-1251" | "WINDOWS1251" | "WIN1251" | "CP1251" => Encoding::WINDOWS_1251,
            "KOI8-R" | "KOI8R" => Encoding::KOI8_R,
            "ISO-8859-5" | "ISO88595" | "CYRILLIC" => Encoding::ISO_8859_5,
            "MACCYRILLIC" | "MAC-CYRILLIC" | "X-MAC-CYRILLIC" => Encoding::MAC_CYRILLIC,
            _ => return Err(Error::UnknownEncoding(s.to_string())),
        };

        Ok(encoding)
    }
}

impl Serialize for Encoding {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Detect the encoding of the file at `path`.
pub fn detect_encoding(path: impl AsRef<Path>) -> Result<Encoding> {
    let bytes = read_input(path.as_ref())?;
    Ok(detect(&bytes))
}

/// Convert an in-memory buffer to UTF-8.
pub fn convert_buffer_to_utf8(bytes: &[u8]) -> Conversion {
    convert(bytes)
}

/// Read the file at `path` and convert its contents to UTF-8.
pub fn convert_file_to_utf8(path: impl AsRef<Path>) -> Result<Conversion> {
    let bytes = read_input(path.as_ref())?;
    Ok(convert(&bytes))
}

/// Convert `input` to UTF-8 and write the result to `output`, leaving the
/// source untouched.
pub fn convert_file_to_utf8_into(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<Encoding> {
    let conversion = convert_file_to_utf8(input)?;
    let output = output.as_ref();

    std::fs::write(output, &conversion.bytes).map_err(|source| Error::Write {
        path: output.to_path_buf(),
        source,
    })?;

    Ok(conversion.encoding)
}

/// Convert the file at `path` to UTF-8 in place.
///
/// Uses [`ReplaceStrategy::RemoveAndRetry`]: if renaming the converted
/// temporary file over the original fails, the original is deleted and the
/// rename retried. Should the retry fail as well, no file remains at `path`
/// and the returned [`Error::Replace`] has `original_removed` set.
pub fn convert_file_to_utf8_in_place(path: impl AsRef<Path>) -> Result<Encoding> {
    convert_file_to_utf8_in_place_with(path, ReplaceStrategy::RemoveAndRetry)
}

/// Convert the file at `path` to UTF-8 in place using the given strategy.
pub fn convert_file_to_utf8_in_place_with(
    path: impl AsRef<Path>,
    strategy: ReplaceStrategy,
) -> Result<Encoding> {
    replace::replace_in_place_with(&replace::StdFileSystem, path.as_ref(), strategy)
}
