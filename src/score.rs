//! Plausibility scoring of decoded text
//!
//! The score only ranks single-byte candidates against each other. It
//! rewards printable ASCII, Cyrillic letters and common punctuation, and
//! penalizes NULs, control characters and replacement characters:
//!
//! ```text
//! score = (good - bad + 1.5 * cyrillic) / len
//! ```

use crate::REPLACEMENT_CHARACTER;

const CYRILLIC_WEIGHT: f64 = 1.5;

/// Score a decoded character sequence; higher means more text-like.
///
/// An empty sequence scores `0.0`.
pub fn plausibility(text: &[char]) -> f64 {
    if text.is_empty() {
        return 0.0;
    }

    let mut good = 0usize;
    let mut bad = 0usize;
    let mut cyrillic = 0usize;

    for &ch in text {
        match ch {
            '\0' => bad += 3,
            '\t' | '\n' | '\r' => {}
            '\u{01}'..='\u{1F}' => bad += 2,
            '\u{0400}'..='\u{04FF}' => {
                good += 1;
                cyrillic += 1;
            }
            ' '..='~' | '\u{A0}' | '№' => good += 1,
            REPLACEMENT_CHARACTER => bad += 2,
            '\u{2000}'..='\u{206F}' => good += 1,
            _ => {}
        }
    }

    (good as f64 - bad as f64 + CYRILLIC_WEIGHT * cyrillic as f64) / text.len() as f64
}
