//! tfa – paste a TOTP secret, watch the code.
//!
//! The run loop multiplexes a 500 ms ticker with secret input lines on a
//! single-threaded runtime and writes a line whenever the display changes.

pub mod cli;
pub mod config;
pub mod logging;
pub mod render;
pub mod shell;

use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tfa_totp::totp::core::current_unix_time;
use tfa_totp::totp::TotpEngine;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use config::{OutputMode, ShellConfig};
use shell::{Frame, InputOutcome, Shell, ERROR_MESSAGE};

pub const PROMPT: &str = "Paste your 2FA secret below";
pub const STORAGE_NOTE: &str = "Nothing is stored. Exit to clear.";

/// Run against the process's stdin/stdout until Ctrl-C, or until stdin
/// closes with nothing left to show.
pub async fn run(config: ShellConfig) -> Result<()> {
    if config.once {
        return run_once(&config, tokio::io::stdout(), current_unix_time).await;
    }
    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let shutdown = async {
        // Without a signal handler only stdin EOF ends the loop.
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    run_with(&config, input, tokio::io::stdout(), current_unix_time, shutdown).await
}

/// Print a single code for the configured secret.
pub async fn run_once<W, C>(config: &ShellConfig, output: W, clock: C) -> Result<()>
where
    W: AsyncWrite + Unpin,
    C: Fn() -> u64,
{
    let secret = config
        .secret
        .as_deref()
        .ok_or_else(|| anyhow!("no secret given"))?;
    let mut shell = Shell::new(TotpEngine::new(config.params));
    let mut out = Output::new(output, config.output);

    let frame = match shell.on_input(secret) {
        InputOutcome::Started => shell.tick_at(clock()),
        InputOutcome::Failed(frame) => Some(frame),
        InputOutcome::Cleared | InputOutcome::Unchanged => None,
    };
    match frame {
        Some(frame @ Frame::Code(_)) => out.frame(&frame).await,
        _ => Err(anyhow!(ERROR_MESSAGE)),
    }
}

/// The interactive loop over arbitrary input/output streams and clock.
pub async fn run_with<R, W, C, F>(
    config: &ShellConfig,
    input: R,
    output: W,
    clock: C,
    shutdown: F,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    C: Fn() -> u64,
    F: Future<Output = ()>,
{
    let mut shell = Shell::new(TotpEngine::new(config.params));
    let mut out = Output::new(output, config.output);
    let digits = config.params.digits();

    if config.output == OutputMode::Text {
        out.line(PROMPT).await?;
        out.line(STORAGE_NOTE).await?;
    }
    if let Some(secret) = &config.secret {
        apply_input(&mut shell, &mut out, secret, digits, &clock).await?;
    }

    let mut lines = input.lines();
    let mut input_open = true;
    let mut ticker = tokio::time::interval(Duration::from_millis(config.tick_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                debug!("shutdown requested");
                break;
            }
            line = lines.next_line(), if input_open => {
                match line.context("failed to read secret input")? {
                    Some(line) => apply_input(&mut shell, &mut out, &line, digits, &clock).await?,
                    None => {
                        debug!("input closed");
                        input_open = false;
                        if !shell.is_running() {
                            break;
                        }
                    }
                }
            }
            _ = ticker.tick() => {
                if let Some(frame) = shell.tick_at(clock()) {
                    emit(&shell, &mut out, &frame).await?;
                }
                if !input_open && !shell.is_running() {
                    break;
                }
            }
        }
    }

    info!("authenticator stopped");
    Ok(())
}

async fn apply_input<W, C>(
    shell: &mut Shell,
    out: &mut Output<W>,
    raw: &str,
    digits: u8,
    clock: &C,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
    C: Fn() -> u64,
{
    match shell.on_input(raw) {
        InputOutcome::Cleared => {
            let line = render::render_cleared(digits, out.mode);
            out.line(&line).await
        }
        InputOutcome::Unchanged => Ok(()),
        InputOutcome::Started => match shell.tick_at(clock()) {
            Some(frame) => emit(shell, out, &frame).await,
            None => Ok(()),
        },
        InputOutcome::Failed(frame) => emit(shell, out, &frame).await,
    }
}

async fn emit<W: AsyncWrite + Unpin>(shell: &Shell, out: &mut Output<W>, frame: &Frame) -> Result<()> {
    if !shell.is_current(frame) {
        debug!(revision = frame.revision(), "dropping stale frame");
        return Ok(());
    }
    out.frame(frame).await
}

struct Output<W> {
    writer: W,
    mode: OutputMode,
}

impl<W: AsyncWrite + Unpin> Output<W> {
    fn new(writer: W, mode: OutputMode) -> Self {
        Self { writer, mode }
    }

    async fn frame(&mut self, frame: &Frame) -> Result<()> {
        let line = render::render(frame, self.mode)?;
        self.line(&line).await
    }

    async fn line(&mut self, line: &str) -> Result<()> {
        self.writer
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .context("failed to write output")?;
        self.writer.flush().await.context("failed to flush output")
    }
}
