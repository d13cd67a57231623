// src/exec/controller.rs

//! Lifecycle owner for one external process.
//!
//! A [`ProcessController`] spawns its command once, pumps stdout through the
//! listener hub on the thread that called [`ProcessController::start`], and
//! ends in exactly one terminal [`RunState`] with exactly one
//! [`ExitOutcome`]. Helper threads:
//!
//! - stdout reader: reads lines and hands them to the loop over a channel,
//! - stderr drain: keeps the stderr pipe empty,
//! - timeout timer (optional): only flips the shared [`CancelToken`].
//!
//! Cancellation is cooperative. The loop waits at most `poll_interval` for
//! the next stdout line before re-checking the token, and keeps checking it
//! while waiting for the exit status after stdout closed. The process is
//! killed during cleanup, not by `cancel()` itself.

use std::io;
use std::process::{Child, ChildStderr, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info, warn};

use crate::command::{CommandSpec, InterpreterResolver, Platform};
use crate::errors::{Result, RunctlError};
use crate::exec::cancel::{CancelReason, CancelToken};
use crate::exec::drain::{StreamDrain, read_lines};
use crate::exec::listener::{ListenerHub, OutputListener};
use crate::exec::options::RunOptions;
use crate::exec::outcome::{ExitOutcome, RunState};
use crate::exec::resolver::ExitOutcomeResolver;
use crate::exec::timer::TimeoutTimer;

/// Stdout lines buffered between the reader thread and the loop. Once full
/// the reader blocks, the pipe fills up and the child waits on its writes.
const STDOUT_BACKLOG: usize = 1024;

/// What the stdout reader thread reports to the loop.
#[derive(Debug)]
enum StdoutEvent {
    Line(String),
    Eof,
    Failed(io::Error),
}

#[derive(Debug)]
struct RunRecord {
    state: RunState,
    outcome: Option<ExitOutcome>,
    pid: Option<u32>,
}

/// OS resources held while the process runs.
#[derive(Debug, Default)]
struct Resources {
    child: Option<Child>,
    stdout_reader: Option<JoinHandle<()>>,
    stderr_drain: Option<StreamDrain>,
    timer: Option<TimeoutTimer>,
}

pub struct ProcessController {
    spec: CommandSpec,
    options: RunOptions,
    resolver: InterpreterResolver,
    cancel: Arc<CancelToken>,
    hub: ListenerHub,
    run: Mutex<RunRecord>,
    resources: Mutex<Resources>,
    captured: Mutex<Vec<String>>,
    stderr_lines: Arc<Mutex<Vec<String>>>,
    released: AtomicBool,
}

impl ProcessController {
    pub fn new(spec: CommandSpec, options: RunOptions) -> Self {
        Self::with_platform(spec, options, Platform::current())
    }

    /// Like [`new`](Self::new) but with an explicit platform, which decides
    /// the default interpreter prefix.
    pub fn with_platform(spec: CommandSpec, options: RunOptions, platform: Platform) -> Self {
        Self {
            spec,
            options,
            resolver: InterpreterResolver::new(platform),
            cancel: Arc::new(CancelToken::new()),
            hub: ListenerHub::new(),
            run: Mutex::new(RunRecord {
                state: RunState::Created,
                outcome: None,
                pid: None,
            }),
            resources: Mutex::new(Resources::default()),
            captured: Mutex::new(Vec::new()),
            stderr_lines: Arc::new(Mutex::new(Vec::new())),
            released: AtomicBool::new(false),
        }
    }

    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Register a listener. Returns `false` if it was already registered.
    ///
    /// The controller only keeps a weak reference; keep the `Arc` alive for
    /// as long as notifications are wanted.
    pub fn add_listener(&self, listener: &Arc<dyn OutputListener>) -> bool {
        self.hub.add(listener)
    }

    pub fn remove_listener(&self, listener: &Arc<dyn OutputListener>) -> bool {
        self.hub.remove(listener)
    }

    pub fn state(&self) -> RunState {
        self.lock_run().state
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// The terminal outcome; `None` until [`is_finished`](Self::is_finished).
    pub fn exit_outcome(&self) -> Option<ExitOutcome> {
        self.lock_run().outcome.clone()
    }

    /// OS process id, once spawned.
    pub fn pid(&self) -> Option<u32> {
        self.lock_run().pid
    }

    /// Stdout lines seen so far (empty unless `capture_output` is set).
    pub fn captured_output(&self) -> Vec<String> {
        lock(&self.captured).clone()
    }

    /// Stderr lines seen so far (empty unless `capture_stderr` is set).
    pub fn captured_stderr(&self) -> Vec<String> {
        lock(self.stderr_lines.as_ref()).clone()
    }

    /// Ask the run to stop.
    ///
    /// Returns `true` if this call recorded the request. Returns `false` if
    /// the run already ended or a cancellation (or timeout) was already
    /// pending.
    pub fn cancel(&self) -> bool {
        if self.is_finished() {
            debug!("cancel requested after termination; ignoring");
            return false;
        }
        let recorded = self.cancel.request(CancelReason::Requested);
        if recorded {
            info!(pid = ?self.pid(), "cancellation requested");
        }
        recorded
    }

    /// Run `start()` on a dedicated thread.
    pub fn spawn(self: Arc<Self>) -> io::Result<JoinHandle<Result<ExitOutcome>>> {
        thread::Builder::new()
            .name("runctl-controller".to_string())
            .spawn(move || self.start())
    }

    /// Spawn the process and drive it to a terminal state on this thread.
    ///
    /// Only fails if the controller was already started. Every failure after
    /// that point (spawn errors included) is reported as an [`ExitOutcome`].
    pub fn start(&self) -> Result<ExitOutcome> {
        self.begin()?;

        if let Some(reason) = self.cancel.reason() {
            info!("cancelled before the process was spawned");
            return Ok(self.finish(ExitOutcome::from_cancel(reason)));
        }

        let argv = match self.resolver.resolve(&self.spec) {
            Ok(argv) => argv,
            Err(err) => {
                error!(
                    platform = %self.resolver.platform(),
                    error = %err,
                    "cannot build command line"
                );
                return Ok(self.finish(ExitOutcome::spawn_failure(&err)));
            }
        };

        let (stdout, stderr) = match self.spawn_process(&argv) {
            Ok(pipes) => pipes,
            Err(err) => {
                error!(program = %argv[0], error = %err, "failed to spawn process");
                return Ok(self.finish(ExitOutcome::spawn_failure(&err)));
            }
        };

        let (tx, rx) = mpsc::sync_channel::<StdoutEvent>(STDOUT_BACKLOG);
        if let Err(err) = self.start_helpers(stdout, stderr, tx) {
            error!(error = %err, "failed to start helper threads");
            return Ok(self.finish(ExitOutcome::read_failure(format!(
                "failed to start output readers: {err}"
            ))));
        }

        let outcome = self.poll_loop(rx);
        Ok(self.finish(outcome))
    }

    /// Release OS resources of a finished run. Idempotent.
    ///
    /// Teardown already happens as part of the terminal transition, so this
    /// is a no-op for runs that have not ended yet.
    pub fn cleanup(&self) {
        if !self.is_finished() {
            debug!("cleanup requested before termination; ignoring");
            return;
        }
        self.release_resources();
    }

    fn begin(&self) -> Result<()> {
        let mut run = self.lock_run();
        if run.state != RunState::Created {
            return Err(RunctlError::InvalidState(format!(
                "start() called in state {:?}",
                run.state
            )));
        }
        run.state = RunState::Running;
        Ok(())
    }

    fn spawn_process(&self, argv: &[String]) -> Result<(ChildStdout, ChildStderr)> {
        let program = &argv[0];
        let mut child = Command::new(program)
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunctlError::Spawn {
                program: program.clone(),
                source,
            })?;

        let pid = child.id();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        self.lock_run().pid = Some(pid);
        lock(&self.resources).child = Some(child);
        info!(pid, %program, args = ?&argv[1..], "process spawned");

        match (stdout, stderr) {
            (Some(out), Some(err)) => Ok((out, err)),
            _ => Err(RunctlError::Other(anyhow::anyhow!(
                "process {pid} was spawned without stdout/stderr pipes"
            ))),
        }
    }

    fn start_helpers(
        &self,
        stdout: ChildStdout,
        stderr: ChildStderr,
        tx: SyncSender<StdoutEvent>,
    ) -> io::Result<()> {
        let reader = thread::Builder::new()
            .name("runctl-stdout".to_string())
            .spawn(move || {
                let result = read_lines(stdout, |line| {
                    // Blocks while the backlog is full. Fails once the loop
                    // has stopped listening.
                    let _ = tx.send(StdoutEvent::Line(line));
                });
                let last = match result {
                    Ok(()) => StdoutEvent::Eof,
                    Err(e) => StdoutEvent::Failed(e),
                };
                let _ = tx.send(last);
            })?;
        lock(&self.resources).stdout_reader = Some(reader);

        let drain = if self.options.capture_stderr {
            let sink = Arc::clone(&self.stderr_lines);
            StreamDrain::forward(
                "stderr",
                stderr,
                Box::new(move |line| {
                    debug!("stderr: {}", line);
                    lock(sink.as_ref()).push(line);
                }),
            )?
        } else {
            StreamDrain::discard("stderr", stderr)?
        };
        lock(&self.resources).stderr_drain = Some(drain);

        if let Some(duration) = self.options.timeout {
            let token = Arc::clone(&self.cancel);
            let timer = TimeoutTimer::start(duration, move || {
                token.request(CancelReason::Timeout);
            })?;
            lock(&self.resources).timer = Some(timer);
            debug!(?duration, "timeout timer armed");
        }

        Ok(())
    }

    fn poll_loop(&self, rx: Receiver<StdoutEvent>) -> ExitOutcome {
        let mut resolver = ExitOutcomeResolver::new(
            self.options.exit_status_token.clone(),
            self.options.exit_wait,
            self.options.poll_interval,
        );
        let mut eof = false;

        loop {
            if !eof {
                match rx.recv_timeout(self.options.poll_interval) {
                    Ok(StdoutEvent::Line(line)) => {
                        resolver.observe(&line);
                        self.hub.notify_output(&line);
                        if self.options.capture_output {
                            lock(&self.captured).push(line);
                        }
                    }
                    Ok(StdoutEvent::Eof) => {
                        debug!("stdout reached EOF");
                        eof = true;
                    }
                    Ok(StdoutEvent::Failed(e)) => {
                        warn!(error = %e, "failed reading stdout");
                        return ExitOutcome::read_failure(format!("failed reading stdout: {e}"));
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => {
                        warn!("stdout reader stopped without reporting EOF");
                        return ExitOutcome::read_failure("stdout reader stopped unexpectedly");
                    }
                }
            }

            if let Some(reason) = self.cancel.reason() {
                return ExitOutcome::from_cancel(reason);
            }

            if eof {
                return self.resolve_exit(&resolver);
            }
        }
    }

    fn resolve_exit(&self, resolver: &ExitOutcomeResolver) -> ExitOutcome {
        let mut resources = lock(&self.resources);
        match resources.child.as_mut() {
            Some(child) => resolver.resolve(child, &self.cancel),
            None => ExitOutcome::read_failure("process handle already released"),
        }
    }

    /// Move to the terminal state, tear down, then notify. Only the first
    /// caller wins; later callers get the recorded outcome back.
    fn finish(&self, outcome: ExitOutcome) -> ExitOutcome {
        {
            let mut run = self.lock_run();
            if let Some(existing) = &run.outcome {
                return existing.clone();
            }
            run.state = outcome.source.terminal_state();
            run.outcome = Some(outcome.clone());
        }

        info!(
            code = outcome.code,
            source = %outcome.source,
            message = %outcome.message,
            "run finished"
        );

        self.release_resources();
        self.hub.notify_completion(&outcome);
        outcome
    }

    fn release_resources(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            debug!("resources already released");
            return;
        }

        let mut resources = lock(&self.resources);

        if let Some(mut timer) = resources.timer.take() {
            timer.stop();
        }

        if let Some(mut child) = resources.child.take() {
            match child.try_wait() {
                Ok(Some(_)) => {}
                Ok(None) => {
                    debug!(pid = child.id(), "killing process during cleanup");
                    if let Err(e) = child.kill() {
                        warn!(pid = child.id(), error = %e, "failed to kill process");
                    }
                    if let Err(e) = child.wait() {
                        warn!(pid = child.id(), error = %e, "failed to reap process");
                    }
                }
                Err(e) => warn!(pid = child.id(), error = %e, "failed to query process state"),
            }
        }

        // Readers end on their own once the pipes close; never block on them.
        if let Some(drain) = resources.stderr_drain.take() {
            debug!(stream = drain.label(), finished = drain.is_finished(), "detaching drain");
        }
        resources.stdout_reader.take();
    }

    fn lock_run(&self) -> MutexGuard<'_, RunRecord> {
        lock(&self.run)
    }
}

impl Drop for ProcessController {
    fn drop(&mut self) {
        self.release_resources();
    }
}

impl std::fmt::Debug for ProcessController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessController")
            .field("spec", &self.spec)
            .field("state", &self.state())
            .field("listeners", &self.hub.len())
            .finish()
    }
}

/// Lock ignoring poisoning; every critical section leaves its data consistent.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}
