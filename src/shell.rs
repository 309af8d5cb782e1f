//! Display state for the ticking authenticator.
//!
//! The shell owns no I/O. It is fed input changes and clock ticks and hands
//! back [`Frame`]s only when something visible changed, so the caller can
//! render whatever it receives.

use tfa_totp::totp::core::format_code_display;
use tfa_totp::totp::{GeneratedCode, HmacSha1, Secret, Signer, TotpEngine};
use tracing::{debug, info, warn};

/// Shown in place of a code whenever generation fails.
pub const ERROR_MESSAGE: &str = "Could not generate code — check your secret.";

/// Remaining seconds at or below which the display turns urgent.
pub const URGENT_THRESHOLD_SECS: u32 = 5;

/// What a change of input did to the shell.
#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    /// Input became empty: output hidden, any error cleared.
    Cleared,
    /// Same value as before; nothing restarted.
    Unchanged,
    /// New secret accepted; the caller should tick right away.
    Started,
    /// New secret rejected.
    Failed(Frame),
}

/// A code on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeFrame {
    pub revision: u64,
    pub generated: GeneratedCode,
    /// Code split into two groups, e.g. `"287 082"`.
    pub display: String,
    pub urgent: bool,
}

/// One render-worthy update.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Code(CodeFrame),
    Error { revision: u64, message: String },
}

impl Frame {
    pub fn revision(&self) -> u64 {
        match self {
            Frame::Code(c) => c.revision,
            Frame::Error { revision, .. } => *revision,
        }
    }
}

enum State {
    Idle,
    Running { key: Secret },
    Failed,
}

pub struct Shell<S: Signer = HmacSha1> {
    engine: TotpEngine<S>,
    state: State,
    /// Whitespace-stripped input last acted upon.
    input: String,
    /// Bumped on every accepted input change.
    revision: u64,
    last: Option<(String, u32)>,
}

impl<S: Signer> Shell<S> {
    pub fn new(engine: TotpEngine<S>) -> Self {
        Self {
            engine,
            state: State::Idle,
            input: String::new(),
            revision: 0,
            last: None,
        }
    }

    pub fn engine(&self) -> &TotpEngine<S> {
        &self.engine
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }

    /// Whether `frame` was produced for the input currently in effect.
    pub fn is_current(&self, frame: &Frame) -> bool {
        frame.revision() == self.revision
    }

    /// Apply new raw input (a pasted line, an edited field).
    pub fn on_input(&mut self, raw: &str) -> InputOutcome {
        let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

        if cleaned.is_empty() {
            if !self.input.is_empty() {
                debug!("input cleared");
            }
            self.stop();
            self.input.clear();
            self.revision += 1;
            return InputOutcome::Cleared;
        }
        if cleaned == self.input {
            return InputOutcome::Unchanged;
        }

        self.stop();
        self.input = cleaned;
        self.revision += 1;

        match self.engine.decode(&self.input) {
            Ok(key) => {
                info!(revision = self.revision, "secret accepted");
                self.state = State::Running { key };
                InputOutcome::Started
            }
            Err(e) => {
                warn!(revision = self.revision, error = %e, "secret rejected");
                self.state = State::Failed;
                InputOutcome::Failed(self.error_frame())
            }
        }
    }

    /// Poll at `unix_seconds`. Returns a frame only when the code or the
    /// countdown changed since the last one, or when generation failed.
    pub fn tick_at(&mut self, unix_seconds: u64) -> Option<Frame> {
        let State::Running { key } = &self.state else {
            return None;
        };

        match self.engine.generated_code_for_key_at(key, unix_seconds) {
            Ok(generated) => {
                let fingerprint = (generated.code.clone(), generated.remaining_seconds);
                if self.last.as_ref() == Some(&fingerprint) {
                    return None;
                }
                self.last = Some(fingerprint);
                Some(Frame::Code(CodeFrame {
                    revision: self.revision,
                    display: format_code_display(&generated.code),
                    urgent: generated.remaining_seconds <= URGENT_THRESHOLD_SECS,
                    generated,
                }))
            }
            Err(e) => {
                warn!(revision = self.revision, error = %e, "code generation failed");
                self.stop();
                self.state = State::Failed;
                Some(self.error_frame())
            }
        }
    }

    fn stop(&mut self) {
        self.state = State::Idle;
        self.last = None;
    }

    fn error_frame(&self) -> Frame {
        Frame::Error {
            revision: self.revision,
            message: ERROR_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfa_totp::totp::{TotpError, TotpParams};

    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    fn shell() -> Shell {
        Shell::new(TotpEngine::default())
    }

    fn code(frame: Option<Frame>) -> CodeFrame {
        match frame {
            Some(Frame::Code(c)) => c,
            other => panic!("expected a code frame, got {:?}", other),
        }
    }

    // ── Input handling ───────────────────────────────────────────

    #[test]
    fn whitespace_is_stripped_before_comparison() {
        let mut sh = shell();
        assert_eq!(sh.on_input("GEZD GNBV GY3T QOJQ"), InputOutcome::Started);
        assert_eq!(sh.on_input("  GEZDGNBVGY3TQOJQ\n"), InputOutcome::Unchanged);
    }

    #[test]
    fn empty_input_stops_and_clears() {
        let mut sh = shell();
        sh.on_input(RFC_SECRET);
        assert!(sh.is_running());
        assert_eq!(sh.on_input("   "), InputOutcome::Cleared);
        assert!(!sh.is_running());
        assert_eq!(sh.tick_at(59), None);
    }

    #[test]
    fn invalid_secret_reports_single_message() {
        let mut sh = shell();
        match sh.on_input("!!!") {
            InputOutcome::Failed(Frame::Error { message, .. }) => assert_eq!(message, ERROR_MESSAGE),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(!sh.is_running());
        assert_eq!(sh.tick_at(0), None);
    }

    #[test]
    fn same_bad_input_is_not_retried() {
        let mut sh = shell();
        sh.on_input("!!!");
        assert_eq!(sh.on_input("!!!"), InputOutcome::Unchanged);
    }

    #[test]
    fn correcting_input_recovers() {
        let mut sh = shell();
        sh.on_input("!!!");
        assert_eq!(sh.on_input(RFC_SECRET), InputOutcome::Started);
        assert_eq!(code(sh.tick_at(59)).generated.code, "287082");
    }

    // ── Ticking ──────────────────────────────────────────────────

    #[test]
    fn renders_only_on_change() {
        let mut sh = shell();
        sh.on_input(RFC_SECRET);
        let first = code(sh.tick_at(31));
        assert_eq!(first.display, "287 082");
        assert_eq!(first.generated.remaining_seconds, 29);
        // half-second polls land on the same second twice
        assert_eq!(sh.tick_at(31), None);
        let next = code(sh.tick_at(32));
        assert_eq!(next.generated.remaining_seconds, 28);
        assert_eq!(next.generated.code, first.generated.code);
    }

    #[test]
    fn window_rollover_changes_code() {
        let mut sh = shell();
        sh.on_input(RFC_SECRET);
        assert_eq!(code(sh.tick_at(29)).generated.code, "755224");
        let rolled = code(sh.tick_at(30));
        assert_eq!(rolled.generated.code, "287082");
        assert_eq!(rolled.generated.remaining_seconds, 30);
    }

    #[test]
    fn urgency_in_last_five_seconds() {
        let mut sh = shell();
        sh.on_input(RFC_SECRET);
        assert!(!code(sh.tick_at(54)).urgent);
        assert!(code(sh.tick_at(55)).urgent);
        assert!(code(sh.tick_at(59)).urgent);
    }

    #[test]
    fn restart_re_renders_even_if_code_matches() {
        let mut sh = shell();
        sh.on_input(RFC_SECRET);
        code(sh.tick_at(40));
        // padded form is a different input that decodes to the same key
        assert_eq!(
            sh.on_input("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ===="),
            InputOutcome::Started
        );
        assert_eq!(code(sh.tick_at(40)).generated.code, "287082");
    }

    #[test]
    fn stale_frames_are_detected() {
        let mut sh = shell();
        sh.on_input(RFC_SECRET);
        let frame = sh.tick_at(10).unwrap();
        assert!(sh.is_current(&frame));
        sh.on_input("JBSWY3DPEHPK3PXP");
        assert!(!sh.is_current(&frame));
        let fresh = sh.tick_at(10).unwrap();
        assert!(sh.is_current(&fresh));
    }

    #[test]
    fn signer_failure_stops_ticking() {
        use tfa_totp::totp::TotpErrorKind;

        struct Broken;
        impl Signer for Broken {
            fn sign(&self, _: &[u8], _: &[u8]) -> Result<Vec<u8>, TotpError> {
                Err(TotpError::generation_failed("no crypto"))
            }
        }

        let mut sh = Shell::new(TotpEngine::with_signer(TotpParams::default(), Broken));
        assert_eq!(sh.on_input(RFC_SECRET), InputOutcome::Started);
        match sh.tick_at(0) {
            Some(Frame::Error { message, .. }) => assert_eq!(message, ERROR_MESSAGE),
            other => panic!("unexpected frame {:?}", other),
        }
        assert!(!sh.is_running());
        assert_eq!(sh.tick_at(1), None);
        assert_eq!(
            sh.engine().generate_at(RFC_SECRET, 0).unwrap_err().kind,
            TotpErrorKind::GenerationFailed
        );
    }
}
