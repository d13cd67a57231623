// src/command/interpreter.rs

use tracing::debug;

use crate::command::{CommandSpec, Platform};
use crate::errors::{Result, RunctlError};

/// Turns a [`CommandSpec`] into the final argument vector to execute.
///
/// The platform is fixed at construction so the resolver can be exercised
/// for any OS family in tests.
#[derive(Debug, Clone, Copy)]
pub struct InterpreterResolver {
    platform: Platform,
}

impl InterpreterResolver {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    /// Resolver for the platform this binary runs on.
    pub fn for_current_platform() -> Self {
        Self::new(Platform::current())
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Build the argument vector (`argv[0]` is the program).
    ///
    /// Errors:
    /// - [`RunctlError::EmptyCommand`] if there is nothing to run,
    /// - [`RunctlError::UnknownPlatform`] if an interpreter is needed but the
    ///   platform could not be classified and no override was given.
    pub fn resolve(&self, spec: &CommandSpec) -> Result<Vec<String>> {
        let tokens = spec.token_list();
        if tokens.is_empty() || tokens.iter().all(|t| t.trim().is_empty()) {
            return Err(RunctlError::EmptyCommand(
                "command spec contains no tokens".to_string(),
            ));
        }

        if !spec.uses_interpreter() {
            return Ok(tokens.to_vec());
        }

        let mut argv: Vec<String> = match spec.interpreter_override() {
            Some([]) => {
                return Err(RunctlError::EmptyCommand(
                    "interpreter override is empty".to_string(),
                ));
            }
            Some(prefix) => prefix.to_vec(),
            None => self
                .platform
                .interpreter_prefix()
                .ok_or_else(|| RunctlError::UnknownPlatform(std::env::consts::OS.to_string()))?
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };

        argv.push(spec.command_line());

        debug!(platform = %self.platform, ?argv, "resolved command argv");
        Ok(argv)
    }
}

impl Default for InterpreterResolver {
    fn default() -> Self {
        Self::for_current_platform()
    }
}
