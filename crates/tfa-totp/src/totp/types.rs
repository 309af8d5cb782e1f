//! Core types for the TOTP engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// Default window size in seconds (RFC 6238 recommendation).
pub const DEFAULT_TIME_STEP: u32 = 30;
/// Default number of code digits.
pub const DEFAULT_DIGITS: u8 = 6;
/// A 31-bit truncated value never has more than 10 decimal digits.
pub const MAX_DIGITS: u8 = 10;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Decode mode
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// How the Base32 decoder treats characters outside `A–Z2–7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeMode {
    /// Skip unknown characters silently.
    Lenient,
    /// Reject the secret on the first unknown character.
    Strict,
}

impl Default for DecodeMode {
    fn default() -> Self {
        Self::Lenient
    }
}

impl fmt::Display for DecodeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lenient => write!(f, "lenient"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Parameters
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Validated generation parameters.
///
/// Only obtainable through [`TotpParams::new`] (deserialisation included),
/// so a zero time step or an out-of-range digit count never reaches the
/// engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTotpParams")]
pub struct TotpParams {
    time_step: u32,
    digits: u8,
    decode_mode: DecodeMode,
}

/// Unchecked wire form of [`TotpParams`].
#[derive(Deserialize)]
struct RawTotpParams {
    #[serde(default = "default_time_step")]
    time_step: u32,
    #[serde(default = "default_digits")]
    digits: u8,
    #[serde(default)]
    decode_mode: DecodeMode,
}

fn default_time_step() -> u32 {
    DEFAULT_TIME_STEP
}

fn default_digits() -> u8 {
    DEFAULT_DIGITS
}

impl TryFrom<RawTotpParams> for TotpParams {
    type Error = TotpError;

    fn try_from(raw: RawTotpParams) -> Result<Self, Self::Error> {
        Ok(Self::new(raw.time_step, raw.digits)?.with_decode_mode(raw.decode_mode))
    }
}

impl Default for TotpParams {
    fn default() -> Self {
        Self {
            time_step: DEFAULT_TIME_STEP,
            digits: DEFAULT_DIGITS,
            decode_mode: DecodeMode::Lenient,
        }
    }
}

impl TotpParams {
    /// Build parameters, rejecting a zero time step or an unusable digit count.
    pub fn new(time_step: u32, digits: u8) -> Result<Self, TotpError> {
        if time_step == 0 {
            return Err(TotpError::new(
                TotpErrorKind::InvalidParameters,
                "Time step must be at least one second",
            ));
        }
        if digits == 0 || digits > MAX_DIGITS {
            return Err(TotpError::new(
                TotpErrorKind::InvalidParameters,
                format!("Digits must be between 1 and {}", MAX_DIGITS),
            )
            .with_detail(format!("got {}", digits)));
        }
        Ok(Self {
            time_step,
            digits,
            decode_mode: DecodeMode::default(),
        })
    }

    /// Builder: set the Base32 decode mode.
    pub fn with_decode_mode(mut self, mode: DecodeMode) -> Self {
        self.decode_mode = mode;
        self
    }

    /// Window size in seconds, never zero.
    pub fn time_step(&self) -> u32 {
        self.time_step
    }

    /// Code width, `1..=MAX_DIGITS`.
    pub fn digits(&self) -> u8 {
        self.digits
    }

    pub fn decode_mode(&self) -> DecodeMode {
        self.decode_mode
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Secret
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Decoded shared key. Wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Zeroizing<Vec<u8>>);

impl Secret {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([REDACTED; {} bytes])", self.0.len())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Generated code
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A code together with the window it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedCode {
    /// Zero-padded decimal code.
    pub code: String,
    /// Window counter the code was derived from.
    pub counter: u64,
    /// Seconds until the window rolls over, `1..=period`.
    pub remaining_seconds: u32,
    /// Window size in seconds.
    pub period: u32,
    /// Fraction of the window already elapsed (0.0 = fresh).
    pub progress: f64,
    /// First instant of the next window.
    pub expires_at: DateTime<Utc>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TotpErrorKind {
    /// The secret decoded to zero usable bytes, or strict decoding rejected it.
    InvalidSecret,
    /// The HMAC primitive failed or produced an unusable digest.
    GenerationFailed,
    /// Time step or digit count out of range.
    InvalidParameters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("[{kind:?}] {message}{}", detail_suffix(.detail))]
pub struct TotpError {
    pub kind: TotpErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(" ({})", d),
        None => String::new(),
    }
}

impl TotpError {
    pub fn new(kind: TotpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn invalid_secret(msg: impl Into<String>) -> Self {
        Self::new(TotpErrorKind::InvalidSecret, msg)
    }

    pub fn generation_failed(msg: impl Into<String>) -> Self {
        Self::new(TotpErrorKind::GenerationFailed, msg)
    }
}

impl From<TotpError> for String {
    fn from(e: TotpError) -> String {
        e.to_string()
    }
}
