// src/command/spec.rs

/// Immutable description of what to run.
///
/// Two shapes are supported:
///
/// - [`CommandSpec::line`]: a single command line, handed to the platform
///   command interpreter (`/bin/sh -c`, `cmd.exe /C`, ...).
/// - [`CommandSpec::tokens`]: a program followed by its arguments, executed
///   directly without an interpreter.
///
/// Both can be adjusted with [`CommandSpec::with_interpreter`] and
/// [`CommandSpec::use_interpreter`] before being handed to a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    tokens: Vec<String>,
    interpreter_override: Option<Vec<String>>,
    use_interpreter: bool,
}

impl CommandSpec {
    /// A command line run through the command interpreter.
    pub fn line(command: impl Into<String>) -> Self {
        Self {
            tokens: vec![command.into()],
            interpreter_override: None,
            use_interpreter: true,
        }
    }

    /// A token array executed directly (no interpreter).
    pub fn tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
            interpreter_override: None,
            use_interpreter: false,
        }
    }

    /// Use an explicit interpreter prefix instead of the platform default.
    ///
    /// Implies `use_interpreter(true)`.
    pub fn with_interpreter<I, S>(mut self, prefix: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interpreter_override = Some(prefix.into_iter().map(Into::into).collect());
        self.use_interpreter = true;
        self
    }

    /// Toggle whether the command goes through an interpreter.
    pub fn use_interpreter(mut self, yes: bool) -> Self {
        self.use_interpreter = yes;
        self
    }

    pub fn token_list(&self) -> &[String] {
        &self.tokens
    }

    pub fn interpreter_override(&self) -> Option<&[String]> {
        self.interpreter_override.as_deref()
    }

    pub fn uses_interpreter(&self) -> bool {
        self.use_interpreter
    }

    /// The tokens joined into one command line, as the interpreter sees it.
    pub fn command_line(&self) -> String {
        self.tokens.join(" ")
    }
}
