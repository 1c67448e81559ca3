//! Strict UTF-8 validation and UTF-8 encoding of decoded text

/// Check `input` against the UTF-8 grammar.
///
/// Rejects overlong forms, encoded surrogates, scalars above U+10FFFF and
/// truncated trailing sequences. On failure returns the offset of the first
/// byte of the offending sequence.
pub fn validate(input: &[u8]) -> Result<(), usize> {
    let mut i = 0;

    while i < input.len() {
        let lead = input[i];

        if lead < 0x80 {
            i += 1;
            continue;
        }

        let extra = match lead {
            0xC2..=0xDF => 1,
            0xE0..=0xEF => 2,
            0xF0..=0xF4 => 3,
            // stray continuation bytes, 0xC0/0xC1 overlong leads, > U+10FFFF
            _ => return Err(i),
        };

        if i + extra >= input.len() {
            return Err(i);
        }

        let tail = &input[i + 1..=i + extra];
        if tail.iter().any(|&b| b & 0xC0 != 0x80) {
            return Err(i);
        }

        let second = tail[0];
        let in_range = match lead {
            0xE0 => second >= 0xA0,
            0xED => second < 0xA0,
            0xF0 => second >= 0x90,
            0xF4 => second < 0x90,
            _ => true,
        };
        if !in_range {
            return Err(i);
        }

        i += extra + 1;
    }

    Ok(())
}

/// Whether the whole of `input` is well-formed UTF-8.
#[inline]
pub fn is_valid_utf8(input: &[u8]) -> bool {
    validate(input).is_ok()
}

/// Serialize decoded characters to UTF-8 bytes.
pub fn encode(chars: &[char]) -> Vec<u8> {
    let mut output = Vec::with_capacity(chars.iter().map(|c| c.len_utf8()).sum());
    let mut buf = [0u8; 4];

    for ch in chars {
        output.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
    }

    output
}
