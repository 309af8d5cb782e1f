//! Parameterised TOTP engine.
//!
//! Holds the validated [`TotpParams`] and the [`Signer`] so callers that poll
//! repeatedly (a ticking display) configure once and then only pass the
//! secret. The engine keeps no mutable state; concurrent calls on a shared
//! instance are independent.

use chrono::{DateTime, Utc};
use log::debug;

use crate::totp::core;
use crate::totp::signer::{HmacSha1, Signer};
use crate::totp::types::*;

/// TOTP generator bound to one set of parameters and one signer.
#[derive(Debug, Clone)]
pub struct TotpEngine<S = HmacSha1> {
    params: TotpParams,
    signer: S,
}

impl Default for TotpEngine<HmacSha1> {
    fn default() -> Self {
        Self::new(TotpParams::default())
    }
}

impl TotpEngine<HmacSha1> {
    /// Engine using HMAC-SHA1.
    pub fn new(params: TotpParams) -> Self {
        Self::with_signer(params, HmacSha1)
    }
}

impl<S: Signer> TotpEngine<S> {
    /// Engine using a caller-supplied MAC primitive.
    pub fn with_signer(params: TotpParams, signer: S) -> Self {
        Self { params, signer }
    }

    pub fn params(&self) -> &TotpParams {
        &self.params
    }

    /// Decode a Base32 secret with this engine's decode mode.
    pub fn decode(&self, secret: &str) -> Result<Secret, TotpError> {
        core::decode_secret(secret, self.params.decode_mode())
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    //  Code generation
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Code for `secret` in the current window.
    pub fn generate(&self, secret: &str) -> Result<String, TotpError> {
        self.generate_at(secret, core::current_unix_time())
    }

    /// Code for `secret` in the window containing `unix_seconds`.
    pub fn generate_at(&self, secret: &str, unix_seconds: u64) -> Result<String, TotpError> {
        let key = self.decode(secret)?;
        self.code_for_key_at(&key, unix_seconds)
    }

    /// Code for an already-decoded key.
    pub fn code_for_key_at(&self, key: &Secret, unix_seconds: u64) -> Result<String, TotpError> {
        if key.is_empty() {
            return Err(TotpError::invalid_secret("Secret contains no Base32 data"));
        }
        core::totp_at(
            &self.signer,
            key,
            self.params.time_step(),
            self.params.digits(),
            unix_seconds,
        )
    }

    /// Code plus window metadata for the current time.
    pub fn generate_code(&self, secret: &str) -> Result<GeneratedCode, TotpError> {
        self.generate_code_at(secret, core::current_unix_time())
    }

    /// Code plus window metadata at a specific timestamp.
    pub fn generate_code_at(&self, secret: &str, unix_seconds: u64) -> Result<GeneratedCode, TotpError> {
        let key = self.decode(secret)?;
        self.generated_code_for_key_at(&key, unix_seconds)
    }

    /// Code plus window metadata for an already-decoded key.
    pub fn generated_code_for_key_at(
        &self,
        key: &Secret,
        unix_seconds: u64,
    ) -> Result<GeneratedCode, TotpError> {
        let period = self.params.time_step();
        let code = self.code_for_key_at(key, unix_seconds)?;
        let counter = core::time_step_at(unix_seconds, period);
        let expires = core::window_end_at(unix_seconds, period);
        let expires_at = i64::try_from(expires)
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .ok_or_else(|| {
                TotpError::generation_failed("Window end is outside the representable time range")
                    .with_detail(format!("unix time {}", expires))
            })?;
        debug!("totp: generated code for counter {}", counter);
        Ok(GeneratedCode {
            code,
            counter,
            remaining_seconds: core::seconds_remaining_at(unix_seconds, period),
            period,
            progress: core::progress_fraction_at(unix_seconds, period),
            expires_at,
        })
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    //  Window helpers
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    pub fn time_step_at(&self, unix_seconds: u64) -> u64 {
        core::time_step_at(unix_seconds, self.params.time_step())
    }

    pub fn remaining_seconds(&self) -> u32 {
        core::seconds_remaining(self.params.time_step())
    }

    pub fn remaining_seconds_at(&self, unix_seconds: u64) -> u32 {
        core::seconds_remaining_at(unix_seconds, self.params.time_step())
    }
}
