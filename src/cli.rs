//! Command-line surface.

use clap::Parser;
use tfa_totp::totp::{DEFAULT_DIGITS, DEFAULT_TIME_STEP};

/// tfa - offline TOTP authenticator
///
/// Paste a Base32 secret (one per line on stdin) and watch the current code
/// count down. Nothing is stored.
#[derive(Parser, Debug)]
#[command(name = "tfa")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Base32 secret. When omitted, secrets are read line by line from stdin
    #[arg(long, env = "TFA_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Window size in seconds
    #[arg(long, env = "TFA_TIME_STEP", default_value_t = DEFAULT_TIME_STEP)]
    pub time_step: u32,

    /// Number of code digits
    #[arg(long, env = "TFA_DIGITS", default_value_t = DEFAULT_DIGITS)]
    pub digits: u8,

    /// Reject secrets containing characters outside A-Z and 2-7
    #[arg(long)]
    pub strict: bool,

    /// Print a single code for --secret and exit
    #[arg(long)]
    pub once: bool,

    /// Emit JSON lines instead of text
    #[arg(long)]
    pub json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TFA_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}
