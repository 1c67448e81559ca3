//! Encoding detection using byte-order marks, byte-pattern heuristics and
//! plausibility scoring
//!
//! Detection runs in a fixed order, first decisive step wins:
//!
//! 1. empty input is UTF-8
//! 2. a byte-order mark names its encoding
//! 3. zero-byte distribution suggests BOM-less UTF-32 or UTF-16
//! 4. input that validates as UTF-8 is UTF-8
//! 5. otherwise every single-byte candidate is decoded and scored, and the
//!    most plausible one wins
//!
//! The wide-encoding heuristics are tuned for mostly-ASCII text stored as
//! 16/32-bit units. Dense non-Latin UTF-16 without a BOM has few zero bytes
//! and will not be recognized; that is a known limitation of the approach.

use serde::Serialize;

use crate::codepage::CodePage;
use crate::multibyte::Endian;
use crate::{Encoding, score, utf8};

/// A recognized byte-order mark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BomDescriptor {
    /// Encoding the mark announces
    pub encoding: Encoding,
    /// Length of the mark in bytes
    pub len: usize,
}

/// Byte-order marks, longest first so UTF-32LE is not mistaken for UTF-16LE
const BOMS: [(&[u8], Encoding); 5] = [
    (&[0xFF, 0xFE, 0x00, 0x00], Encoding::UTF32LE),
    (&[0x00, 0x00, 0xFE, 0xFF], Encoding::UTF32BE),
    (&[0xEF, 0xBB, 0xBF], Encoding::UTF8),
    (&[0xFF, 0xFE], Encoding::UTF16LE),
    (&[0xFE, 0xFF], Encoding::UTF16BE),
];

/// Recognize a byte-order mark at the start of `data`.
pub fn detect_bom(data: &[u8]) -> Option<BomDescriptor> {
    BOMS.iter()
        .find(|(bom, _)| data.starts_with(bom))
        .map(|&(bom, encoding)| BomDescriptor {
            encoding,
            len: bom.len(),
        })
}

/// Whether zero bytes cluster in the high byte of each 16-bit unit.
fn looks_like_utf16(data: &[u8], endian: Endian) -> bool {
    if data.len() < 6 {
        return false;
    }

    let mut zeros_even = 0;
    let mut zeros_odd = 0;
    for unit in data.chunks_exact(2) {
        zeros_even += usize::from(unit[0] == 0);
        zeros_odd += usize::from(unit[1] == 0);
    }

    // ASCII in UTF-16LE leaves the odd byte zero, UTF-16BE the even one
    let (high, low) = match endian {
        Endian::Little => (zeros_odd, zeros_even),
        Endian::Big => (zeros_even, zeros_odd),
    };

    high > low * 3 && high > data.len() / 8
}

/// Whether many 32-bit units carry three zero bytes.
fn looks_like_utf32(data: &[u8], endian: Endian) -> bool {
    if data.len() < 8 {
        return false;
    }

    let narrow_units = data
        .chunks_exact(4)
        .filter(|unit| match endian {
            Endian::Little => unit[1..] == [0, 0, 0],
            Endian::Big => unit[..3] == [0, 0, 0],
        })
        .count();

    narrow_units > data.len() / 16
}

/// Guess a BOM-less wide encoding. Checks run UTF-32LE, UTF-32BE, UTF-16LE,
/// UTF-16BE; the first match wins.
pub fn guess_wide_encoding(data: &[u8]) -> Option<Encoding> {
    if looks_like_utf32(data, Endian::Little) {
        Some(Encoding::UTF32LE)
    } else if looks_like_utf32(data, Endian::Big) {
        Some(Encoding::UTF32BE)
    } else if looks_like_utf16(data, Endian::Little) {
        Some(Encoding::UTF16LE)
    } else if looks_like_utf16(data, Endian::Big) {
        Some(Encoding::UTF16BE)
    } else {
        None
    }
}

/// How a detection decision was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Input was empty
    Empty,
    /// A byte-order mark was found
    Bom,
    /// Zero-byte distribution matched a wide encoding
    Heuristic,
    /// Input is valid UTF-8
    Utf8,
    /// Best-scoring single-byte candidate
    Scored,
}

/// Plausibility score of one single-byte candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candidate {
    /// Candidate encoding
    pub encoding: Encoding,
    /// Plausibility of the input decoded under it
    pub score: f64,
}

/// Result of encoding detection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
    /// Detected encoding
    pub encoding: Encoding,
    /// Offset where content starts, past any byte-order mark
    pub content_offset: usize,
    /// Whether a byte-order mark was found
    pub bom_detected: bool,
    /// Which detection step decided
    pub method: DetectionMethod,
    /// Scored single-byte candidates, empty unless scoring ran
    pub candidates: Vec<Candidate>,
}

impl DetectionResult {
    fn decided(encoding: Encoding, method: DetectionMethod) -> Self {
        Self {
            encoding,
            content_offset: 0,
            bom_detected: false,
            method,
            candidates: Vec::new(),
        }
    }
}

/// Encoding detector
#[derive(Debug, Clone)]
pub struct EncodingDetector {
    /// Single-byte candidates in tie-break order
    code_pages: Vec<CodePage>,
}

impl Default for EncodingDetector {
    fn default() -> Self {
        Self {
            code_pages: CodePage::ALL.to_vec(),
        }
    }
}

impl EncodingDetector {
    /// Create a detector scoring all supported code pages
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector restricted to the given single-byte candidates.
    ///
    /// Order matters: on equal scores the earlier code page wins. With no
    /// candidates, undecided input falls back to Windows-1251.
    pub fn with_code_pages(code_pages: &[CodePage]) -> Self {
        Self {
            code_pages: code_pages.to_vec(),
        }
    }

    /// Detect the encoding of `data`
    pub fn detect(&self, data: &[u8]) -> DetectionResult {
        tracing::trace!(len = data.len(), "detecting encoding");

        if data.is_empty() {
            return DetectionResult::decided(Encoding::UTF8, DetectionMethod::Empty);
        }

        if let Some(bom) = detect_bom(data) {
            tracing::debug!(encoding = %bom.encoding, "chosen due to BOM");
            return DetectionResult {
                content_offset: bom.len,
                bom_detected: true,
                ..DetectionResult::decided(bom.encoding, DetectionMethod::Bom)
            };
        }

        if let Some(encoding) = guess_wide_encoding(data) {
            tracing::debug!(%encoding, "chosen due to zero-byte distribution");
            return DetectionResult::decided(encoding, DetectionMethod::Heuristic);
        }

        if utf8::is_valid_utf8(data) {
            tracing::debug!("UTF-8 chosen due to valid UTF-8");
            return DetectionResult::decided(Encoding::UTF8, DetectionMethod::Utf8);
        }

        self.score_code_pages(data)
    }

    fn score_code_pages(&self, data: &[u8]) -> DetectionResult {
        let candidates: Vec<Candidate> = self
            .code_pages
            .iter()
            .map(|page| {
                let score = score::plausibility(&page.decode(data));
                tracing::trace!(encoding = %page.encoding(), score, "scored candidate");
                Candidate {
                    encoding: page.encoding(),
                    score,
                }
            })
            .collect();

        let mut best: Option<Candidate> = None;
        for candidate in &candidates {
            // strict comparison keeps the earlier candidate on ties
            if best.is_none_or(|b| candidate.score > b.score) {
                best = Some(*candidate);
            }
        }

        let encoding = best.map_or(Encoding::WINDOWS_1251, |b| b.encoding);
        tracing::debug!(%encoding, "chosen due to plausibility score");

        DetectionResult {
            candidates,
            ..DetectionResult::decided(encoding, DetectionMethod::Scored)
        }
    }
}

/// Detect the encoding of `data` with the default detector.
pub fn detect(data: &[u8]) -> Encoding {
    EncodingDetector::new().detect(data).encoding
}
