// src/exec/outcome.rs

use std::fmt;

use crate::errors::RunctlError;
use crate::exec::cancel::CancelReason;

/// Exit code reported when the caller cancelled the run.
pub const CANCELLED_CODE: i32 = 900;
/// Exit code reported when the run exceeded its timeout.
pub const TIMEOUT_CODE: i32 = 999;
/// Exit code reported when the process could not be spawned.
pub const SPAWN_FAILURE_CODE: i32 = -1;
/// Exit code reported when output or the exit status could not be read.
pub const READ_FAILURE_CODE: i32 = -2;
/// Exit code used when an exit-status token is configured but unusable.
pub const AMBIGUOUS_TOKEN_CODE: i32 = 1;

/// Lifecycle of a single controller.
///
/// Advances monotonically: `Created -> Running -> <terminal>` or
/// `Created -> <terminal>`. Terminal states never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Created,
    Running,
    Finished,
    Cancelled,
    TimedOut,
    SpawnError,
    ReadError,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunState::Created | RunState::Running)
    }
}

/// Where an [`ExitOutcome`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitSource {
    /// OS-reported exit status.
    NormalExit,
    /// Legacy exit-status token found (or missing) in stdout.
    TokenMatch,
    Cancelled,
    Timeout,
    SpawnFailure,
    ReadFailure,
}

impl ExitSource {
    /// Terminal state a run ends in when it resolves from this source.
    pub fn terminal_state(self) -> RunState {
        match self {
            ExitSource::NormalExit | ExitSource::TokenMatch => RunState::Finished,
            ExitSource::Cancelled => RunState::Cancelled,
            ExitSource::Timeout => RunState::TimedOut,
            ExitSource::SpawnFailure => RunState::SpawnError,
            ExitSource::ReadFailure => RunState::ReadError,
        }
    }
}

impl fmt::Display for ExitSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitSource::NormalExit => "normal-exit",
            ExitSource::TokenMatch => "token-match",
            ExitSource::Cancelled => "cancelled",
            ExitSource::Timeout => "timeout",
            ExitSource::SpawnFailure => "spawn-failure",
            ExitSource::ReadFailure => "read-failure",
        };
        f.write_str(s)
    }
}

/// Final, immutable result of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitOutcome {
    pub code: i32,
    pub message: String,
    pub source: ExitSource,
}

impl ExitOutcome {
    pub fn new(code: i32, message: impl Into<String>, source: ExitSource) -> Self {
        Self {
            code,
            message: message.into(),
            source,
        }
    }

    pub fn normal_exit(code: i32) -> Self {
        Self::new(code, format!("process exited with code {code}"), ExitSource::NormalExit)
    }

    pub fn cancelled() -> Self {
        Self::new(CANCELLED_CODE, "run cancelled by caller", ExitSource::Cancelled)
    }

    pub fn timed_out() -> Self {
        Self::new(TIMEOUT_CODE, "run exceeded its timeout", ExitSource::Timeout)
    }

    /// Outcome for a run stopped through its [`CancelToken`](crate::exec::CancelToken).
    pub fn from_cancel(reason: CancelReason) -> Self {
        match reason {
            CancelReason::Requested => Self::cancelled(),
            CancelReason::Timeout => Self::timed_out(),
        }
    }

    pub fn spawn_failure(err: &RunctlError) -> Self {
        Self::new(SPAWN_FAILURE_CODE, err.to_string(), ExitSource::SpawnFailure)
    }

    pub fn read_failure(message: impl Into<String>) -> Self {
        Self::new(READ_FAILURE_CODE, message, ExitSource::ReadFailure)
    }

    /// `true` only for a clean exit with code 0.
    pub fn is_success(&self) -> bool {
        self.code == 0 && matches!(self.source, ExitSource::NormalExit | ExitSource::TokenMatch)
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {}): {}", self.source, self.code, self.message)
    }
}
