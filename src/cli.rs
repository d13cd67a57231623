// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `runctl`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "runctl",
    version,
    about = "Run one command with timeout, cancellation and exit-status resolution.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// If omitted, `Runctl.toml` (or `$RUNCTL_CONFIG`) is used when it exists.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Time the command out after this long (e.g. `500ms`, `30s`, `2m`).
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Read the exit code from the last stdout line starting with TOKEN.
    #[arg(long, value_name = "TOKEN")]
    pub exit_token: Option<String>,

    /// Execute the command directly instead of through the shell.
    #[arg(long, conflicts_with = "shell")]
    pub no_shell: bool,

    /// Interpreter program to use instead of the platform default.
    #[arg(long, value_name = "PROG")]
    pub shell: Option<String>,

    /// Argument placed between the interpreter and the command line
    /// (repeatable), e.g. `--shell bash --shell-arg -c`.
    #[arg(long = "shell-arg", value_name = "ARG", allow_hyphen_values = true, requires = "shell")]
    pub shell_args: Vec<String>,

    /// Do not echo the command's stdout.
    #[arg(long, short)]
    pub quiet: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RUNCTL_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the resolved argument vector without running anything.
    #[arg(long)]
    pub dry_run: bool,

    /// The command. A single argument is a command line for the shell;
    /// several arguments are a program and its arguments.
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_command_line() {
        let args = CliArgs::try_parse_from(["runctl", "--timeout", "3s", "echo hi"]).unwrap();
        assert_eq!(args.command, vec!["echo hi"]);
        assert_eq!(args.timeout.as_deref(), Some("3s"));
        assert!(!args.no_shell);
    }

    #[test]
    fn token_command_after_separator() {
        let args =
            CliArgs::try_parse_from(["runctl", "--no-shell", "--", "ls", "-l", "/tmp"]).unwrap();
        assert!(args.no_shell);
        assert_eq!(args.command, vec!["ls", "-l", "/tmp"]);
    }

    #[test]
    fn shell_override_with_hyphen_args() {
        let args = CliArgs::try_parse_from([
            "runctl", "--shell", "bash", "--shell-arg", "-c", "echo hi",
        ])
        .unwrap();
        assert_eq!(args.shell.as_deref(), Some("bash"));
        assert_eq!(args.shell_args, vec!["-c"]);
        assert_eq!(args.command, vec!["echo hi"]);
    }

    #[test]
    fn command_is_required() {
        assert!(CliArgs::try_parse_from(["runctl"]).is_err());
    }

    #[test]
    fn no_shell_conflicts_with_shell() {
        assert!(
            CliArgs::try_parse_from(["runctl", "--no-shell", "--shell", "bash", "ls"]).is_err()
        );
    }
}
