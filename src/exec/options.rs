// src/exec/options.rs

use std::time::Duration;

use crate::config::{RunSection, parse_duration};
use crate::errors::{Result, RunctlError};

/// Default time to wait for the OS exit status after stdout EOF.
pub const DEFAULT_EXIT_WAIT: Duration = Duration::from_secs(5);
/// Default interval at which the loop re-checks the cancellation flag.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Per-run knobs for a [`ProcessController`](crate::exec::ProcessController).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Time the run out after this long.
    pub timeout: Option<Duration>,
    /// Legacy exit-status token (see [`ExitOutcomeResolver`](crate::exec::ExitOutcomeResolver)).
    pub exit_status_token: Option<String>,
    /// Keep stdout lines in memory.
    pub capture_output: bool,
    /// Keep stderr lines in memory.
    pub capture_stderr: bool,
    pub exit_wait: Duration,
    pub poll_interval: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            exit_status_token: None,
            capture_output: false,
            capture_stderr: false,
            exit_wait: DEFAULT_EXIT_WAIT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn exit_status_token(mut self, token: impl Into<String>) -> Self {
        self.exit_status_token = Some(token.into());
        self
    }

    pub fn capture_output(mut self, yes: bool) -> Self {
        self.capture_output = yes;
        self
    }

    pub fn capture_stderr(mut self, yes: bool) -> Self {
        self.capture_stderr = yes;
        self
    }

    pub fn exit_wait(mut self, wait: Duration) -> Self {
        self.exit_wait = wait;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Build options from a validated `[run]` section.
    pub fn from_config(run: &RunSection) -> Result<Self> {
        let parse = |key: &str, raw: &Option<String>| -> Result<Option<Duration>> {
            raw.as_deref()
                .map(|s| {
                    parse_duration(s)
                        .map_err(|e| RunctlError::ConfigError(format!("[run].{key}: {e}")))
                })
                .transpose()
        };

        let defaults = Self::default();
        Ok(Self {
            timeout: parse("timeout", &run.timeout)?,
            exit_status_token: run.exit_status_token.clone(),
            capture_output: run.capture_output,
            capture_stderr: run.capture_stderr,
            exit_wait: parse("exit_wait", &run.exit_wait)?.unwrap_or(defaults.exit_wait),
            poll_interval: parse("poll_interval", &run.poll_interval)?
                .unwrap_or(defaults.poll_interval),
        })
    }
}
