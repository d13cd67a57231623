// src/config/model.rs

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [run]
/// exit_status_token = "STOP"
/// timeout = "30s"
/// capture_output = true
/// interpreter = ["/bin/bash", "-c"]
/// ```
///
/// Every section and key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunConfig {
    /// Process control flags from `[run]`.
    #[serde(default)]
    pub run: RunSection,
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    /// Legacy exit-status token. When set, the exit code is read from the
    /// last stdout line starting with this token instead of from the OS.
    #[serde(default, alias = "ExitStatusTokens")]
    pub exit_status_token: Option<String>,

    /// Duration string (e.g. `"30s"`) after which the run is timed out.
    #[serde(default)]
    pub timeout: Option<String>,

    /// How long to wait for the OS exit status once stdout reached EOF.
    #[serde(default)]
    pub exit_wait: Option<String>,

    /// How often the controller checks for cancellation while waiting on
    /// stdout.
    #[serde(default)]
    pub poll_interval: Option<String>,

    /// Keep stdout lines in memory for later retrieval.
    #[serde(default)]
    pub capture_output: bool,

    /// Keep stderr lines in memory for later retrieval.
    #[serde(default)]
    pub capture_stderr: bool,

    /// Run command lines through a command interpreter.
    #[serde(default = "default_use_interpreter")]
    pub use_interpreter: bool,

    /// Explicit interpreter prefix, e.g. `["/bin/bash", "-c"]`.
    ///
    /// If `None`, the platform default is used.
    #[serde(default)]
    pub interpreter: Option<Vec<String>>,
}

fn default_use_interpreter() -> bool {
    true
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            exit_status_token: None,
            timeout: None,
            exit_wait: None,
            poll_interval: None,
            capture_output: false,
            capture_stderr: false,
            use_interpreter: default_use_interpreter(),
            interpreter: None,
        }
    }
}
