//! # tfa – offline TOTP engine
//!
//! Time-based one-time password generation that never leaves the process:
//!
//! - **Base32** – Lenient RFC 4648 secret decoding tolerant of copy-paste
//!   artifacts, with an opt-in strict mode
//! - **RFC 4226 / 6238** – HOTP dynamic truncation and TOTP time windows
//! - **Signer** – HMAC-SHA1 by default, injectable for other primitives
//! - **Countdown** – Seconds-remaining and progress helpers for displays

pub mod totp;
