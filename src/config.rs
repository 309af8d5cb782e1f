//! Validated shell configuration.

use std::fmt;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tfa_totp::totp::{DecodeMode, TotpParams};

use crate::cli::Cli;

/// Poll cadence; comfortably below the one-second resolution of the counter.
pub const TICK_INTERVAL_MS: u64 = 500;

/// How frames are written to the output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    pub params: TotpParams,
    pub output: OutputMode,
    pub tick_interval_ms: u64,
    /// Generate one code and exit.
    pub once: bool,
    /// Initial secret from the command line or environment.
    #[serde(skip)]
    pub secret: Option<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            params: TotpParams::default(),
            output: OutputMode::Text,
            tick_interval_ms: TICK_INTERVAL_MS,
            once: false,
            secret: None,
        }
    }
}

impl fmt::Debug for ShellConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellConfig")
            .field("params", &self.params)
            .field("output", &self.output)
            .field("tick_interval_ms", &self.tick_interval_ms)
            .field("once", &self.once)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ShellConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mode = if cli.strict {
            DecodeMode::Strict
        } else {
            DecodeMode::Lenient
        };
        let params = TotpParams::new(cli.time_step, cli.digits)
            .context("invalid --time-step/--digits")?
            .with_decode_mode(mode);

        let secret = cli.secret.clone().filter(|s| !s.trim().is_empty());
        if cli.once && secret.is_none() {
            bail!("--once needs a secret (--secret or TFA_SECRET)");
        }

        Ok(Self {
            params,
            output: if cli.json { OutputMode::Json } else { OutputMode::Text },
            tick_interval_ms: TICK_INTERVAL_MS,
            once: cli.once,
            secret,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tfa").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let cfg = ShellConfig::from_cli(&parse(&[])).unwrap();
        assert_eq!(cfg.params.time_step(), 30);
        assert_eq!(cfg.params.digits(), 6);
        assert_eq!(cfg.params.decode_mode(), DecodeMode::Lenient);
        assert_eq!(cfg.output, OutputMode::Text);
        assert_eq!(cfg.tick_interval_ms, 500);
        assert!(!cfg.once);
    }

    #[test]
    fn flags_map_to_settings() {
        let cfg = ShellConfig::from_cli(&parse(&[
            "--time-step", "60", "--digits", "8", "--strict", "--json",
        ]))
        .unwrap();
        assert_eq!(cfg.params.time_step(), 60);
        assert_eq!(cfg.params.digits(), 8);
        assert_eq!(cfg.params.decode_mode(), DecodeMode::Strict);
        assert_eq!(cfg.output, OutputMode::Json);
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        assert!(ShellConfig::from_cli(&parse(&["--time-step", "0"])).is_err());
        assert!(ShellConfig::from_cli(&parse(&["--digits", "11"])).is_err());
    }

    #[test]
    fn once_requires_secret() {
        assert!(ShellConfig::from_cli(&parse(&["--once"])).is_err());
        assert!(ShellConfig::from_cli(&parse(&["--once", "--secret", "  "])).is_err());
        let cfg = ShellConfig::from_cli(&parse(&["--once", "--secret", "JBSWY3DP"])).unwrap();
        assert!(cfg.once);
    }

    #[test]
    fn debug_redacts_secret() {
        let cfg = ShellConfig::from_cli(&parse(&["--secret", "JBSWY3DPEHPK3PXP"])).unwrap();
        let dbg = format!("{:?}", cfg);
        assert!(!dbg.contains("JBSWY3DPEHPK3PXP"));
        assert!(dbg.contains("REDACTED"));
    }

    #[test]
    fn serialised_config_omits_secret() {
        let cfg = ShellConfig {
            secret: Some("JBSWY3DP".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("JBSWY3DP"));
        assert!(json.contains("\"output\":\"text\""));
    }
}
