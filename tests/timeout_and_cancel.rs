#![cfg(unix)]

use std::error::Error;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use runctl::exec::outcome::{CANCELLED_CODE, TIMEOUT_CODE};
use runctl::exec::{ExitSource, OutputListener, RunState};
use runctl_test_utils::builders::ControllerBuilder;
use runctl_test_utils::init_tracing;
use runctl_test_utils::listeners::RecordingListener;

type TestResult = Result<(), Box<dyn Error>>;

/// The child would run for this long if left alone.
const NATURAL_RUNTIME: Duration = Duration::from_secs(5);

#[test]
fn timeout_ends_the_run_before_natural_completion() -> TestResult {
    init_tracing();

    for millis in [30u64, 100, 250] {
        let ctrl = ControllerBuilder::shell("exec sleep 5")
            .timeout(Duration::from_millis(millis))
            .build();

        let started = Instant::now();
        let outcome = ctrl.start()?;
        let elapsed = started.elapsed();

        assert_eq!(outcome.source, ExitSource::Timeout, "timeout {millis}ms");
        assert_eq!(outcome.code, TIMEOUT_CODE);
        assert_eq!(ctrl.state(), RunState::TimedOut);
        assert!(elapsed >= Duration::from_millis(millis));
        assert!(elapsed < NATURAL_RUNTIME, "took {elapsed:?}");
    }

    Ok(())
}

#[test]
fn timeout_applies_to_chatty_processes_too() -> TestResult {
    init_tracing();

    let ctrl = ControllerBuilder::shell("while true; do echo tick; sleep 0.01; done")
        .timeout(Duration::from_millis(200))
        .build();
    let rec = RecordingListener::new();
    let listener: Arc<dyn OutputListener> = rec.clone();
    ctrl.add_listener(&listener);

    let outcome = ctrl.start()?;

    assert_eq!(outcome.source, ExitSource::Timeout);
    assert!(!rec.lines().is_empty());
    assert_eq!(rec.completions(), vec![outcome]);
    Ok(())
}

#[test]
fn cancel_from_another_thread() -> TestResult {
    init_tracing();

    let ctrl = Arc::new(ControllerBuilder::shell("exec sleep 5").build());
    let started = Instant::now();
    let handle = Arc::clone(&ctrl).spawn()?;

    thread::sleep(Duration::from_millis(100));
    assert!(ctrl.cancel());
    // A second request is not recorded again.
    assert!(!ctrl.cancel());

    let outcome = handle.join().expect("controller thread panicked")?;
    assert_eq!(outcome.source, ExitSource::Cancelled);
    assert_eq!(outcome.code, CANCELLED_CODE);
    assert_eq!(ctrl.state(), RunState::Cancelled);
    assert!(started.elapsed() < NATURAL_RUNTIME);
    Ok(())
}

#[test]
fn cancel_races_only_produce_cancelled_or_natural_outcomes() -> TestResult {
    init_tracing();

    for i in 0..20u64 {
        let ctrl = Arc::new(ControllerBuilder::shell("echo quick").build());
        let handle = Arc::clone(&ctrl).spawn()?;
        thread::sleep(Duration::from_millis(i % 5));
        ctrl.cancel();

        let outcome = handle.join().expect("controller thread panicked")?;
        match outcome.source {
            ExitSource::Cancelled => assert_eq!(outcome.code, CANCELLED_CODE),
            ExitSource::NormalExit => assert_eq!(outcome.code, 0),
            other => panic!("unexpected outcome source {other:?} in iteration {i}"),
        }
    }

    Ok(())
}

#[test]
fn cancel_after_finish_is_a_no_op() -> TestResult {
    init_tracing();

    let ctrl = ControllerBuilder::shell("true").build();
    let outcome = ctrl.start()?;

    assert!(!ctrl.cancel());
    assert_eq!(ctrl.exit_outcome(), Some(outcome));
    assert_eq!(ctrl.state(), RunState::Finished);
    Ok(())
}

#[test]
fn timer_does_not_fire_after_normal_completion() -> TestResult {
    init_tracing();

    let ctrl = ControllerBuilder::shell("echo fast")
        .timeout(Duration::from_millis(150))
        .build();
    let rec = RecordingListener::new();
    let listener: Arc<dyn OutputListener> = rec.clone();
    ctrl.add_listener(&listener);

    let outcome = ctrl.start()?;
    thread::sleep(Duration::from_millis(300));

    assert_eq!(outcome.source, ExitSource::NormalExit);
    assert_eq!(ctrl.state(), RunState::Finished);
    assert_eq!(rec.completions().len(), 1);
    Ok(())
}

#[test]
fn timeout_applies_after_stdout_closes() -> TestResult {
    init_tracing();

    let ctrl = ControllerBuilder::shell("exec >&-; sleep 3; exit 0")
        .timeout(Duration::from_millis(200))
        .exit_wait(Duration::from_secs(5))
        .build();

    let started = Instant::now();
    let outcome = ctrl.start()?;
    let elapsed = started.elapsed();

    assert_eq!(outcome.source, ExitSource::Timeout);
    assert_eq!(outcome.code, TIMEOUT_CODE);
    assert_eq!(ctrl.state(), RunState::TimedOut);
    assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
    Ok(())
}

#[test]
fn cancel_applies_after_stdout_closes() -> TestResult {
    init_tracing();

    let ctrl = Arc::new(
        ControllerBuilder::shell("exec >&-; exec sleep 10")
            .exit_wait(Duration::from_secs(5))
            .build(),
    );
    let handle = Arc::clone(&ctrl).spawn()?;

    thread::sleep(Duration::from_millis(200));
    let cancelled_at = Instant::now();
    assert!(ctrl.cancel());

    let outcome = handle.join().expect("controller thread panicked")?;
    let latency = cancelled_at.elapsed();

    assert_eq!(outcome.source, ExitSource::Cancelled);
    assert_eq!(outcome.code, CANCELLED_CODE);
    assert!(latency < Duration::from_secs(1), "took {latency:?}");
    Ok(())
}
