//! Core OTP generation: RFC 4226 (HOTP) and RFC 6238 (TOTP).
//!
//! Counter encoding, dynamic truncation, time-window arithmetic and the
//! convenience entry points that run the whole pipeline with HMAC-SHA1.
//! Every function that reads the clock has an `_at` twin taking an explicit
//! Unix timestamp.

use log::{debug, trace, warn};

use crate::totp::base32;
use crate::totp::signer::{HmacSha1, Signer};
use crate::totp::types::*;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Raw HMAC-OTP (RFC 4226 §5.3)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// RFC 4226 moving factor: the counter as 8 big-endian bytes.
pub fn encode_counter(counter: u64) -> [u8; 8] {
    counter.to_be_bytes()
}

/// Dynamic truncation per RFC 4226 §5.4, yielding a 31-bit value.
pub fn dynamic_truncate(digest: &[u8]) -> Result<u32, TotpError> {
    let last = digest
        .last()
        .ok_or_else(|| TotpError::generation_failed("Empty HMAC digest"))?;
    let offset = (last & 0x0f) as usize;
    let window = digest.get(offset..offset + 4).ok_or_else(|| {
        TotpError::generation_failed("HMAC digest too short for dynamic truncation")
            .with_detail(format!("{} bytes, offset {}", digest.len(), offset))
    })?;
    Ok(u32::from_be_bytes([window[0] & 0x7f, window[1], window[2], window[3]]))
}

/// Reduce a truncated value to `digits` decimal digits, zero-padded.
///
/// # Panics
///
/// Panics if `digits` exceeds 19. Parameters built by [`TotpParams::new`]
/// stay within `1..=MAX_DIGITS`.
pub fn format_code(binary: u32, digits: u8) -> String {
    let modulus = 10u64.pow(u32::from(digits));
    let code = u64::from(binary) % modulus;
    format!("{:0>width$}", code, width = digits as usize)
}

/// Compute an HOTP code for raw key bytes and a counter.
pub fn hotp_raw<S: Signer + ?Sized>(
    signer: &S,
    key: &[u8],
    counter: u64,
    digits: u8,
) -> Result<String, TotpError> {
    let digest = signer.sign(key, &encode_counter(counter))?;
    let binary = dynamic_truncate(&digest)?;
    Ok(format_code(binary, digits))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Time windows (RFC 6238)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Compute the current TOTP time-step counter.
pub fn time_step(period: u32) -> u64 {
    time_step_at(current_unix_time(), period)
}

/// Compute the time-step counter for a given unix timestamp.
///
/// # Panics
///
/// Panics if `period` is zero. [`TotpParams::new`] rejects that value.
pub fn time_step_at(unix_seconds: u64, period: u32) -> u64 {
    unix_seconds / u64::from(period)
}

/// Seconds remaining until the current time-step expires, `1..=period`.
pub fn seconds_remaining(period: u32) -> u32 {
    seconds_remaining_at(current_unix_time(), period)
}

/// Seconds remaining for a specific timestamp.
///
/// # Panics
///
/// Panics if `period` is zero. [`TotpParams::new`] rejects that value.
pub fn seconds_remaining_at(unix_seconds: u64, period: u32) -> u32 {
    let p = u64::from(period);
    (p - (unix_seconds % p)) as u32
}

/// Progress fraction (0.0 = fresh code, approaching 1.0 = about to expire).
pub fn progress_fraction(period: u32) -> f64 {
    progress_fraction_at(current_unix_time(), period)
}

/// Progress fraction for a specific timestamp.
///
/// # Panics
///
/// Panics if `period` is zero. [`TotpParams::new`] rejects that value.
pub fn progress_fraction_at(unix_seconds: u64, period: u32) -> f64 {
    let remaining = seconds_remaining_at(unix_seconds, period);
    f64::from(period - remaining) / f64::from(period)
}

/// Unix timestamp at which the window containing `unix_seconds` ends.
///
/// Saturates at `u64::MAX` for instants in the last window of the range.
///
/// # Panics
///
/// Panics if `period` is zero.
pub fn window_end_at(unix_seconds: u64, period: u32) -> u64 {
    (time_step_at(unix_seconds, period) + 1).saturating_mul(u64::from(period))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TOTP
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Decode a Base32 secret into key bytes; zero usable bytes is an error.
pub fn decode_secret(secret: &str, mode: DecodeMode) -> Result<Secret, TotpError> {
    let bytes = base32::decode_with(secret, mode)?;
    if bytes.is_empty() {
        warn!("totp: secret decoded to zero bytes");
        return Err(TotpError::invalid_secret("Secret contains no Base32 data"));
    }
    debug!("totp: decoded {}-byte key ({} mode)", bytes.len(), mode);
    Ok(Secret::from_bytes(bytes))
}

/// TOTP for an already-decoded key at an explicit timestamp.
///
/// # Panics
///
/// Panics on a zero `period` or an oversized `digits`; pass values taken
/// from a [`TotpParams`].
pub fn totp_at<S: Signer + ?Sized>(
    signer: &S,
    key: &Secret,
    period: u32,
    digits: u8,
    unix_seconds: u64,
) -> Result<String, TotpError> {
    let counter = time_step_at(unix_seconds, period);
    trace!("totp: counter {} (period {}s)", counter, period);
    hotp_raw(signer, key.as_bytes(), counter, digits)
}

/// Generate a TOTP code from a Base32 secret at the current time, using
/// HMAC-SHA1 and lenient decoding.
pub fn generate(secret: &str, period: u32, digits: u8) -> Result<String, TotpError> {
    generate_at(secret, period, digits, current_unix_time())
}

/// Generate a TOTP code at an explicit unix timestamp.
pub fn generate_at(
    secret: &str,
    period: u32,
    digits: u8,
    unix_seconds: u64,
) -> Result<String, TotpError> {
    let params = TotpParams::new(period, digits)?;
    let key = decode_secret(secret, params.decode_mode())?;
    totp_at(&HmacSha1, &key, params.time_step(), params.digits(), unix_seconds)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Utility helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Current unix timestamp in seconds.
pub fn current_unix_time() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Format an OTP code with a space in the middle (e.g. "123 456").
pub fn format_code_display(code: &str) -> String {
    if code.len() <= 4 {
        return code.to_string();
    }
    let mid = code.len() / 2;
    format!("{} {}", &code[..mid], &code[mid..])
}
