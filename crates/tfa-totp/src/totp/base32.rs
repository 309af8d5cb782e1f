//! RFC 4648 Base32 secret decoding.
//!
//! Secrets arrive from copy-paste: grouped in blocks of four, lower-cased,
//! padded or littered with stray punctuation. The default decoder strips
//! separators and padding and skips anything outside the alphabet, so the
//! same key always comes out regardless of how it was formatted.

use log::debug;

use crate::totp::types::{DecodeMode, TotpError};

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '-' || c == '='
}

/// 5-bit value of an uppercase alphabet character.
fn value_of(c: char) -> Option<u8> {
    match c {
        'A'..='Z' => Some(c as u8 - b'A'),
        '2'..='7' => Some(c as u8 - b'2' + 26),
        _ => None,
    }
}

/// Remove whitespace, hyphens and `=` padding, then uppercase.
pub fn normalise(input: &str) -> String {
    input
        .chars()
        .filter(|c| !is_separator(*c))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Decode leniently: unknown characters are skipped, trailing bits that do
/// not fill a whole byte are dropped.
///
/// Returns an empty vector when nothing decodable remains; callers decide
/// whether that is an error.
pub fn decode(input: &str) -> Vec<u8> {
    let cleaned = normalise(input);
    let mut out = Vec::with_capacity(cleaned.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;
    let mut skipped = 0usize;

    for c in cleaned.chars() {
        let Some(v) = value_of(c) else {
            skipped += 1;
            continue;
        };
        buffer = (buffer << 5) | u32::from(v);
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
            buffer &= (1 << bits) - 1;
        }
    }

    if skipped > 0 {
        debug!("base32: skipped {} character(s) outside the alphabet", skipped);
    }
    out
}

/// Decode according to `mode`.
///
/// `Strict` rejects the first character outside `A–Z2–7` (after separators
/// and padding are stripped) instead of skipping it.
pub fn decode_with(input: &str, mode: DecodeMode) -> Result<Vec<u8>, TotpError> {
    match mode {
        DecodeMode::Lenient => Ok(decode(input)),
        DecodeMode::Strict => {
            let cleaned = normalise(input);
            if let Some((pos, bad)) = cleaned.chars().enumerate().find(|(_, c)| value_of(*c).is_none()) {
                return Err(TotpError::invalid_secret("Secret contains a non-Base32 character")
                    .with_detail(format!("{:?} at position {}", bad, pos)));
            }
            base32::decode(base32::Alphabet::Rfc4648 { padding: false }, &cleaned)
                .ok_or_else(|| TotpError::invalid_secret("Invalid base-32 secret"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::totp::types::TotpErrorKind;

    const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

    #[test]
    fn alphabet_values() {
        for (i, b) in ALPHABET.iter().enumerate() {
            assert_eq!(value_of(*b as char), Some(i as u8));
        }
        assert_eq!(value_of('a'), None);
        assert_eq!(value_of('1'), None);
        assert_eq!(value_of('8'), None);
    }

    // ── Lenient decoding ─────────────────────────────────────────

    #[test]
    fn decodes_known_value() {
        assert_eq!(decode("JBSWY3DPEHPK3PXP"), b"Hello!\xde\xad\xbe\xef");
    }

    #[test]
    fn rfc4648_vectors() {
        assert_eq!(decode("MY======"), b"f");
        assert_eq!(decode("MZXQ===="), b"fo");
        assert_eq!(decode("MZXW6==="), b"foo");
        assert_eq!(decode("MZXW6YQ="), b"foob");
        assert_eq!(decode("MZXW6YTB"), b"fooba");
        assert_eq!(decode("MZXW6YTBOI======"), b"foobar");
    }

    #[test]
    fn tolerates_spacing_case_and_hyphens() {
        let canonical = decode("JBSWY3DP");
        assert_eq!(decode("jbsw y3dp"), canonical);
        assert_eq!(decode("JBSW-Y3DP"), canonical);
        assert_eq!(decode("  jBsW\tY3dP\n"), canonical);
        assert_eq!(decode("JBSWY3DP===="), canonical);
    }

    #[test]
    fn skips_characters_outside_alphabet() {
        // '0', '1', '8', '9' and punctuation are not Base32
        assert_eq!(decode("JB0SW1Y8D9P!"), decode("JBSWYDP"));
        assert_eq!(decode("JBSW.Y3DP"), decode("JBSWY3DP"));
    }

    #[test]
    fn output_length_is_floor_of_five_eighths() {
        for n in 0..=16usize {
            let input = "A".repeat(n);
            assert_eq!(decode(&input).len(), n * 5 / 8, "length mismatch for {} chars", n);
        }
    }

    #[test]
    fn partial_trailing_bits_are_dropped() {
        // 'M' carries 5 bits, 'Y' adds 5 more: one byte emitted, 2 bits dropped
        assert_eq!(decode("MY"), b"f");
        assert!(decode("M").is_empty());
    }

    #[test]
    fn empty_and_garbage_yield_nothing() {
        assert!(decode("").is_empty());
        assert!(decode("!!!").is_empty());
        assert!(decode("   - = ").is_empty());
    }

    #[test]
    fn non_ascii_is_skipped() {
        assert_eq!(decode("JBSWé Y3DP"), decode("JBSWY3DP"));
    }

    // ── Normalisation ────────────────────────────────────────────

    #[test]
    fn normalise_strips_and_uppercases() {
        assert_eq!(normalise("jbsw y3dp-ehpk 3pxp=="), "JBSWY3DPEHPK3PXP");
    }

    // ── Strict decoding ──────────────────────────────────────────

    #[test]
    fn strict_matches_lenient_on_clean_input() {
        for s in ["JBSWY3DPEHPK3PXP", "jbsw y3dp ehpk 3pxp", "MZXW6YQ=", "GEZDGNBVGY3TQOJQ"] {
            assert_eq!(decode_with(s, DecodeMode::Strict).unwrap(), decode(s), "mismatch for {}", s);
        }
    }

    #[test]
    fn strict_rejects_invalid_character() {
        let err = decode_with("JBSW1Y3DP", DecodeMode::Strict).unwrap_err();
        assert_eq!(err.kind, TotpErrorKind::InvalidSecret);
        assert!(err.to_string().contains("position 4"));
    }

    #[test]
    fn strict_position_counts_characters_not_bytes() {
        let err = decode_with("é1", DecodeMode::Strict).unwrap_err();
        assert!(err.to_string().contains("'é' at position 0"), "{}", err);
        let err = decode_with("JBSWÜY", DecodeMode::Strict).unwrap_err();
        assert!(err.to_string().contains("position 4"), "{}", err);
        let err = decode_with("ÄÖ1", DecodeMode::Strict).unwrap_err();
        assert!(err.to_string().contains("position 0"), "{}", err);
    }

    #[test]
    fn lenient_mode_never_errors() {
        assert_eq!(decode_with("!!!", DecodeMode::Lenient).unwrap(), Vec::<u8>::new());
    }
}
