// src/exec/resolver.rs

//! Final exit-code resolution.
//!
//! Two modes:
//! - **OS exit status** (default): wait for the process and report its code.
//! - **Exit-status token** (legacy): some programs report their real exit
//!   code on stdout, e.g. `STOP 42`. With a token configured the last stdout
//!   line starting with it decides the code; a missing or malformed token
//!   line resolves to code 1 with a warning.
//!
//! A pending cancellation or timeout always takes precedence, including
//! while waiting for a process that closed stdout but is still running.

use std::io;
use std::process::{Child, ExitStatus};
use std::sync::LazyLock;
use std::thread;
use std::time::{Duration, Instant};

use regex::Regex;
use tracing::{debug, warn};

use crate::exec::cancel::CancelToken;
use crate::exec::outcome::{AMBIGUOUS_TOKEN_CODE, ExitOutcome, ExitSource};

static TRAILING_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-?\d+)\s*$").expect("trailing integer regex is valid"));

/// Something that can report whether a process has exited.
pub trait ExitStatusProbe {
    /// Non-blocking check; `Ok(None)` while the process is still running.
    fn try_exit_code(&mut self) -> io::Result<Option<i32>>;
}

impl ExitStatusProbe for Child {
    fn try_exit_code(&mut self) -> io::Result<Option<i32>> {
        match self.try_wait()? {
            None => Ok(None),
            Some(status) => exit_code_of(status).map(Some).ok_or_else(|| {
                io::Error::other(format!("exit status '{status}' carries no exit code"))
            }),
        }
    }
}

/// Map an [`ExitStatus`] to a single integer.
///
/// On Unix a signal-terminated process reports `128 + signal`, like a shell.
/// `None` when the status carries neither a code nor a signal.
pub fn exit_code_of(status: ExitStatus) -> Option<i32> {
    if let Some(code) = status.code() {
        return Some(code);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Some(128 + signal);
        }
    }

    None
}

/// Extract the trailing integer of a token line, e.g. `"STOP 42"` -> `42`.
///
/// Returns `None` if `line` does not start with `token` or carries no
/// trailing integer that fits an `i32`.
pub fn parse_token_line(token: &str, line: &str) -> Option<i32> {
    let rest = line.strip_prefix(token)?;
    let caps = TRAILING_INT.captures(rest)?;
    caps.get(1)?.as_str().parse().ok()
}

/// Computes the one authoritative [`ExitOutcome`] of a run.
///
/// Feed every stdout line through [`observe`](Self::observe) while the run
/// is in progress, then call [`resolve`](Self::resolve) once stdout is at
/// EOF.
#[derive(Debug, Clone)]
pub struct ExitOutcomeResolver {
    token: Option<String>,
    last_token_line: Option<String>,
    exit_wait: Duration,
    poll_interval: Duration,
}

impl ExitOutcomeResolver {
    pub fn new(token: Option<String>, exit_wait: Duration, poll_interval: Duration) -> Self {
        Self {
            token,
            last_token_line: None,
            exit_wait,
            poll_interval,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Record a stdout line; remembers the latest line starting with the token.
    pub fn observe(&mut self, line: &str) {
        if let Some(token) = &self.token {
            if line.starts_with(token.as_str()) {
                debug!(%token, %line, "exit-status token line seen");
                self.last_token_line = Some(line.to_string());
            }
        }
    }

    /// Decide the outcome once stdout is at EOF.
    ///
    /// `cancel` is re-checked while waiting for the process to exit.
    pub fn resolve(&self, probe: &mut dyn ExitStatusProbe, cancel: &CancelToken) -> ExitOutcome {
        if let Some(reason) = cancel.reason() {
            return ExitOutcome::from_cancel(reason);
        }
        match &self.token {
            Some(token) => self.resolve_from_token(token),
            None => self.resolve_from_os(probe, cancel),
        }
    }

    fn resolve_from_token(&self, token: &str) -> ExitOutcome {
        let Some(line) = &self.last_token_line else {
            warn!(
                %token,
                code = AMBIGUOUS_TOKEN_CODE,
                "exit-status token never appeared in output; defaulting exit code"
            );
            return ExitOutcome::new(
                AMBIGUOUS_TOKEN_CODE,
                format!("exit-status token '{token}' not found in output"),
                ExitSource::TokenMatch,
            );
        };

        match parse_token_line(token, line) {
            Some(code) => ExitOutcome::new(
                code,
                format!("exit status {code} reported by '{line}'"),
                ExitSource::TokenMatch,
            ),
            None => {
                warn!(
                    %token,
                    %line,
                    code = AMBIGUOUS_TOKEN_CODE,
                    "exit-status token line carries no integer; defaulting exit code"
                );
                ExitOutcome::new(
                    AMBIGUOUS_TOKEN_CODE,
                    format!("exit-status line '{line}' has no exit code"),
                    ExitSource::TokenMatch,
                )
            }
        }
    }

    /// Stdout EOF usually means the process is gone, but not always: it may
    /// close stdout and linger. Poll until `exit_wait` runs out.
    fn resolve_from_os(
        &self,
        probe: &mut dyn ExitStatusProbe,
        cancel: &CancelToken,
    ) -> ExitOutcome {
        let deadline = Instant::now() + self.exit_wait;

        loop {
            if let Some(reason) = cancel.reason() {
                debug!(?reason, "run stopped while waiting for process exit");
                return ExitOutcome::from_cancel(reason);
            }
            match probe.try_exit_code() {
                Ok(Some(code)) => return ExitOutcome::normal_exit(code),
                Ok(None) if Instant::now() >= deadline => {
                    warn!(
                        exit_wait = ?self.exit_wait,
                        "stdout closed but process did not exit in time"
                    );
                    return ExitOutcome::read_failure(format!(
                        "process closed stdout but did not exit within {:?}",
                        self.exit_wait
                    ));
                }
                Ok(None) => thread::sleep(self.poll_interval),
                Err(e) => {
                    warn!(error = %e, "failed to query process exit status");
                    return ExitOutcome::read_failure(format!(
                        "failed to query exit status: {e}"
                    ));
                }
            }
        }
    }
}
