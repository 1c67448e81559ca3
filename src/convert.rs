//! Conversion of detected text to UTF-8
//!
//! A byte-order mark is trusted outright: it decides the encoding and is
//! stripped from the output, even where the scorer might prefer something
//! else. Without one, [`detect`](crate::detection::detect) picks the
//! encoding and the whole buffer is decoded.

use crate::codepage::CodePage;
use crate::detection::{self, detect_bom};
use crate::multibyte::{self, Endian};
use crate::{Encoding, utf8};

/// UTF-8 output together with the encoding it was decoded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    /// Source encoding
    pub encoding: Encoding,
    /// Converted text, always well-formed UTF-8 without a byte-order mark
    pub bytes: Vec<u8>,
}

impl Conversion {
    /// Take the converted text as a `String`.
    pub fn into_string(self) -> String {
        match String::from_utf8(self.bytes) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        }
    }
}

/// Detect the encoding of `input` and convert it to UTF-8.
pub fn convert(input: &[u8]) -> Conversion {
    if input.is_empty() {
        return Conversion {
            encoding: Encoding::UTF8,
            bytes: Vec::new(),
        };
    }

    match detect_bom(input) {
        Some(bom) => convert_as(&input[bom.len..], bom.encoding),
        None => convert_as(input, detection::detect(input)),
    }
}

/// Convert `input` to UTF-8, decoding it as `encoding`.
///
/// `input` must not include a byte-order mark. Input claimed as UTF-8 that
/// fails validation is decoded as Windows-1251 instead, and the returned
/// encoding says so.
pub fn convert_as(input: &[u8], encoding: Encoding) -> Conversion {
    let chars = match encoding {
        Encoding::UTF8 => {
            if utf8::is_valid_utf8(input) {
                return Conversion {
                    encoding,
                    bytes: input.to_vec(),
                };
            }
            tracing::debug!("input is not valid UTF-8, decoding as Windows-1251");
            return convert_as(input, Encoding::WINDOWS_1251);
        }
        Encoding::UTF16LE => multibyte::decode_utf16(input, Endian::Little),
        Encoding::UTF16BE => multibyte::decode_utf16(input, Endian::Big),
        Encoding::UTF32LE => multibyte::decode_utf32(input, Endian::Little),
        Encoding::UTF32BE => multibyte::decode_utf32(input, Endian::Big),
        Encoding::WINDOWS_1251 => CodePage::Windows1251.decode(input),
        Encoding::KOI8_R => CodePage::Koi8R.decode(input),
        Encoding::ISO_8859_5 => CodePage::Iso8859_5.decode(input),
        Encoding::MAC_CYRILLIC => CodePage::MacCyrillic.decode(input),
    };

    let bytes = utf8::encode(&chars);
    tracing::trace!(
        %encoding,
        input_len = input.len(),
        output_len = bytes.len(),
        "converted to UTF-8"
    );

    Conversion { encoding, bytes }
}
