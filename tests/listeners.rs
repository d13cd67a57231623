#![cfg(unix)]

use std::error::Error;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use runctl::command::CommandSpec;
use runctl::exec::{ExitOutcome, ExitSource, OutputListener};
use runctl_test_utils::builders::ControllerBuilder;
use runctl_test_utils::init_tracing;
use runctl_test_utils::listeners::{PanickingListener, RecordingListener};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn panicking_listener_does_not_disturb_others() -> TestResult {
    init_tracing();

    let ctrl = ControllerBuilder::shell("echo one; echo two").build();
    let bad: Arc<dyn OutputListener> = Arc::new(PanickingListener);
    let rec = RecordingListener::new();
    let good: Arc<dyn OutputListener> = rec.clone();
    ctrl.add_listener(&bad);
    ctrl.add_listener(&good);

    let outcome = ctrl.start()?;

    assert_eq!(outcome.source, ExitSource::NormalExit);
    assert_eq!(rec.lines(), vec!["one", "two"]);
    assert_eq!(rec.completions(), vec![outcome]);
    Ok(())
}

#[test]
fn removed_listener_sees_nothing() -> TestResult {
    init_tracing();

    let ctrl = ControllerBuilder::shell("echo hidden").build();
    let rec = RecordingListener::new();
    let listener: Arc<dyn OutputListener> = rec.clone();

    assert!(ctrl.add_listener(&listener));
    assert!(!ctrl.add_listener(&listener), "duplicate registration");
    assert!(ctrl.remove_listener(&listener));
    assert!(!ctrl.remove_listener(&listener));

    ctrl.start()?;
    assert!(rec.events().is_empty());
    Ok(())
}

#[test]
fn registration_does_not_keep_listeners_alive() -> TestResult {
    init_tracing();

    let ctrl = ControllerBuilder::shell("echo orphan").build();
    let rec = RecordingListener::new();
    let listener: Arc<dyn OutputListener> = rec.clone();
    ctrl.add_listener(&listener);

    drop(listener);
    // Only the test's own handle remains.
    assert_eq!(Arc::strong_count(&rec), 1);

    let outcome = ctrl.start()?;
    assert_eq!(outcome.source, ExitSource::NormalExit);
    assert!(rec.events().is_empty());
    Ok(())
}

/// Stalls on the first line, then notes whether the child already finished
/// writing (it creates `marker` after its last line).
struct StallingListener {
    marker: PathBuf,
    stall: Duration,
    lines: AtomicUsize,
    marker_during_stall: Mutex<Option<bool>>,
}

impl OutputListener for StallingListener {
    fn on_output(&self, _line: &str) {
        if self.lines.fetch_add(1, Ordering::SeqCst) == 0 {
            thread::sleep(self.stall);
            *self.marker_during_stall.lock().unwrap() = Some(self.marker.exists());
        }
    }

    fn on_completion(&self, _outcome: &ExitOutcome) {}
}

#[test]
fn slow_listener_holds_back_the_child() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let marker = dir.path().join("done");
    // Several megabytes, far beyond the pipe and the reader backlog.
    let script = format!("seq 1 300000; touch '{}'", marker.display());

    let ctrl = ControllerBuilder::from_spec(CommandSpec::line(script)).build();
    let stalling = Arc::new(StallingListener {
        marker,
        stall: Duration::from_millis(800),
        lines: AtomicUsize::new(0),
        marker_during_stall: Mutex::new(None),
    });
    let listener: Arc<dyn OutputListener> = stalling.clone();
    ctrl.add_listener(&listener);

    let outcome = ctrl.start()?;

    assert_eq!(outcome.source, ExitSource::NormalExit);
    assert_eq!(stalling.lines.load(Ordering::SeqCst), 300_000);
    assert_eq!(
        *stalling.marker_during_stall.lock().unwrap(),
        Some(false),
        "child finished its output while the listener was still on line 1"
    );
    Ok(())
}
