#![allow(dead_code)]

use std::time::Duration;

use runctl::command::CommandSpec;
use runctl::exec::{ProcessController, RunOptions};

/// Builder for `ProcessController` with test-friendly defaults (fast polling,
/// short exit wait).
pub struct ControllerBuilder {
    spec: CommandSpec,
    options: RunOptions,
}

impl ControllerBuilder {
    /// A shell command line.
    pub fn shell(line: &str) -> Self {
        Self::from_spec(CommandSpec::line(line))
    }

    pub fn from_spec(spec: CommandSpec) -> Self {
        Self {
            spec,
            options: RunOptions::new()
                .poll_interval(Duration::from_millis(10))
                .exit_wait(Duration::from_secs(2)),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.timeout(timeout);
        self
    }

    pub fn token(mut self, token: &str) -> Self {
        self.options = self.options.exit_status_token(token);
        self
    }

    pub fn exit_wait(mut self, wait: Duration) -> Self {
        self.options = self.options.exit_wait(wait);
        self
    }

    pub fn capture(mut self) -> Self {
        self.options = self.options.capture_output(true);
        self
    }

    pub fn build(self) -> ProcessController {
        ProcessController::new(self.spec, self.options)
    }
}
