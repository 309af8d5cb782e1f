//! The MAC primitive behind HOTP.
//!
//! Code generation only needs `sign(key, message) -> digest`; the hash is
//! picked by whichever [`Signer`] the engine is built with.

use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::totp::types::TotpError;

/// Computes a keyed digest over a message.
#[cfg_attr(test, mockall::automock)]
pub trait Signer {
    fn sign(&self, key: &[u8], message: &[u8]) -> Result<Vec<u8>, TotpError>;
}

/// HMAC-SHA1 (RFC 2104), the RFC 6238 default. Produces 20-byte digests.
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha1;

impl Signer for HmacSha1 {
    fn sign(&self, key: &[u8], message: &[u8]) -> Result<Vec<u8>, TotpError> {
        let mut mac = Hmac::<Sha1>::new_from_slice(key).map_err(|e| {
            TotpError::generation_failed("HMAC-SHA1 key setup failed").with_detail(e.to_string())
        })?;
        mac.update(message);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}
