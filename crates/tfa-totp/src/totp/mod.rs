//! TOTP crate: sub-modules.

pub mod types;
pub mod base32;
pub mod signer;
pub mod core;
pub mod engine;

// Re-export top-level items for convenience.
pub use types::*;
pub use signer::{HmacSha1, Signer};
pub use engine::TotpEngine;
