//! Turns shell frames into output lines.

use anyhow::Result;
use serde::Serialize;
use tfa_totp::totp::GeneratedCode;

use crate::config::OutputMode;
use crate::shell::Frame;

const BAR_WIDTH: usize = 20;

#[derive(Serialize)]
struct CodeLine<'a> {
    #[serde(flatten)]
    generated: &'a GeneratedCode,
    urgent: bool,
}

/// Dashes standing in for a code while nothing is running.
pub fn placeholder(digits: u8) -> String {
    "-".repeat(digits as usize)
}

/// Countdown bar that drains as the window elapses.
pub fn progress_bar(progress: f64, width: usize) -> String {
    let elapsed = (progress.clamp(0.0, 1.0) * width as f64).round() as usize;
    let left = width - elapsed.min(width);
    format!("[{}{}]", "#".repeat(left), ".".repeat(width - left))
}

pub fn render(frame: &Frame, mode: OutputMode) -> Result<String> {
    let line = match (frame, mode) {
        (Frame::Code(c), OutputMode::Text) => {
            let g = &c.generated;
            format!(
                "{}  {} {:>2}s{}",
                c.display,
                progress_bar(g.progress, BAR_WIDTH),
                g.remaining_seconds,
                if c.urgent { " !" } else { "" }
            )
        }
        (Frame::Code(c), OutputMode::Json) => serde_json::to_string(&CodeLine {
            generated: &c.generated,
            urgent: c.urgent,
        })?,
        (Frame::Error { message, .. }, OutputMode::Text) => format!("error: {}", message),
        (Frame::Error { message, .. }, OutputMode::Json) => {
            serde_json::to_string(&serde_json::json!({ "error": message }))?
        }
    };
    Ok(line)
}

/// Line emitted when the input is cleared.
pub fn render_cleared(digits: u8, mode: OutputMode) -> String {
    match mode {
        OutputMode::Text => placeholder(digits),
        OutputMode::Json => serde_json::json!({ "cleared": true }).to_string(),
    }
}
