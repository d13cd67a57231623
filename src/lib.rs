// src/lib.rs

pub mod cli;
pub mod command;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::command::{CommandSpec, InterpreterResolver};
use crate::config::{RunConfig, default_config_path, load_and_validate, parse_duration};
use crate::exec::{ExitOutcome, OutputListener, ProcessController, RunOptions};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the process controller
/// - stdout echoing
/// - Ctrl-C handling
///
/// Returns the exit code the binary should terminate with.
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = load_config(args.config.as_deref())?;
    let options = build_options(&args, &cfg)?;
    let spec = build_spec(&args, &cfg);

    if args.dry_run {
        print_dry_run(&spec, &options)?;
        return Ok(0);
    }

    let controller = Arc::new(ProcessController::new(spec, options));

    // The hub only holds a weak reference; keep the listener alive here.
    let echo: Arc<dyn OutputListener> = Arc::new(EchoListener { quiet: args.quiet });
    controller.add_listener(&echo);

    // Ctrl-C → cooperative cancellation.
    {
        let ctrl = Arc::clone(&controller);
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            ctrl.cancel();
        });
    }

    // The controller blocks on pipe reads, so keep it off the async workers.
    let worker = Arc::clone(&controller);
    let outcome = tokio::task::spawn_blocking(move || worker.start())
        .await
        .context("controller worker panicked")??;

    drop(echo);
    info!(code = outcome.code, source = %outcome.source, "command finished");
    Ok(outcome.code)
}

/// Load the explicit config file, or the default one when it exists.
fn load_config(explicit: Option<&str>) -> Result<RunConfig> {
    if let Some(path) = explicit {
        let path = PathBuf::from(path);
        return load_and_validate(&path)
            .with_context(|| format!("loading config from '{}'", path.display()));
    }

    let path = default_config_path();
    if path.is_file() {
        debug!(path = %path.display(), "using default config file");
        return load_and_validate(&path)
            .with_context(|| format!("loading config from '{}'", path.display()));
    }

    Ok(RunConfig::default())
}

/// Config values first, CLI flags on top.
pub fn build_options(args: &CliArgs, cfg: &RunConfig) -> Result<RunOptions> {
    let mut options = RunOptions::from_config(&cfg.run)?;

    if let Some(raw) = &args.timeout {
        let timeout = parse_duration(raw)
            .map_err(|e| anyhow::anyhow!("invalid --timeout '{raw}': {e}"))?;
        options = options.timeout(timeout);
    }
    if let Some(token) = &args.exit_token {
        // An empty token would prefix every line.
        if token.trim().is_empty() {
            anyhow::bail!("--exit-token must not be empty");
        }
        options = options.exit_status_token(token.clone());
    }

    Ok(options)
}

/// Turn the positional command into a [`CommandSpec`].
///
/// - one argument: a command line for the interpreter (unless `--no-shell`),
/// - several arguments: a token array executed directly (unless `--shell`).
pub fn build_spec(args: &CliArgs, cfg: &RunConfig) -> CommandSpec {
    let spec = if args.command.len() == 1 {
        CommandSpec::line(args.command[0].clone())
            .use_interpreter(!args.no_shell && cfg.run.use_interpreter)
    } else {
        CommandSpec::tokens(args.command.iter().cloned())
    };

    if let Some(shell) = &args.shell {
        let prefix = std::iter::once(shell.clone()).chain(args.shell_args.iter().cloned());
        return spec.with_interpreter(prefix);
    }

    match &cfg.run.interpreter {
        Some(prefix) if spec.uses_interpreter() => spec.with_interpreter(prefix.clone()),
        _ => spec,
    }
}

/// Dry-run output: the resolved argv and effective options.
fn print_dry_run(spec: &CommandSpec, options: &RunOptions) -> Result<()> {
    let argv = InterpreterResolver::for_current_platform().resolve(spec)?;

    println!("runctl dry-run");
    println!("  argv: {:?}", argv);
    if let Some(timeout) = options.timeout {
        println!("  timeout: {:?}", timeout);
    }
    if let Some(token) = &options.exit_status_token {
        println!("  exit_status_token: {token}");
    }
    println!("  exit_wait: {:?}", options.exit_wait);

    debug!("dry-run complete (no execution)");
    Ok(())
}

/// Echoes child stdout to our stdout.
struct EchoListener {
    quiet: bool,
}

impl OutputListener for EchoListener {
    fn on_output(&self, line: &str) {
        if self.quiet {
            return;
        }
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{line}") {
            warn!(error = %e, "failed to echo output line");
        }
    }

    fn on_completion(&self, outcome: &ExitOutcome) {
        if !outcome.is_success() {
            warn!(code = outcome.code, source = %outcome.source, "{}", outcome.message);
        }
    }

    fn name(&self) -> &str {
        "echo"
    }
}
