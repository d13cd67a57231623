#![cfg(unix)]

use std::error::Error;
use std::sync::Arc;

use runctl::exec::outcome::AMBIGUOUS_TOKEN_CODE;
use runctl::exec::{ExitSource, OutputListener, RunState};
use runctl_test_utils::builders::ControllerBuilder;
use runctl_test_utils::init_tracing;
use runctl_test_utils::listeners::RecordingListener;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn token_line_supplies_the_exit_code() -> TestResult {
    init_tracing();

    let ctrl = ControllerBuilder::shell("echo working; echo STOP 42")
        .token("STOP")
        .build();
    let rec = RecordingListener::new();
    let listener: Arc<dyn OutputListener> = rec.clone();
    ctrl.add_listener(&listener);

    let outcome = ctrl.start()?;

    assert_eq!(outcome.code, 42);
    assert_eq!(outcome.source, ExitSource::TokenMatch);
    assert_eq!(ctrl.state(), RunState::Finished);
    // Token lines are still ordinary output.
    assert_eq!(rec.lines(), vec!["working", "STOP 42"]);
    Ok(())
}

#[test]
fn token_overrides_the_os_exit_status() -> TestResult {
    init_tracing();

    let ctrl = ControllerBuilder::shell("echo STOP 0; exit 5")
        .token("STOP")
        .build();
    let outcome = ctrl.start()?;

    assert_eq!(outcome.code, 0);
    assert_eq!(outcome.source, ExitSource::TokenMatch);
    assert!(outcome.is_success());
    Ok(())
}

#[test]
fn last_token_line_wins() -> TestResult {
    init_tracing();

    let ctrl = ControllerBuilder::shell("echo STOP 3; echo STOP 7; echo tail")
        .token("STOP")
        .build();
    let outcome = ctrl.start()?;

    assert_eq!(outcome.code, 7);
    Ok(())
}

#[test]
fn missing_token_is_ambiguous() -> TestResult {
    init_tracing();

    let ctrl = ControllerBuilder::shell("echo no marker here; exit 0")
        .token("STOP")
        .build();
    let outcome = ctrl.start()?;

    assert_eq!(outcome.code, AMBIGUOUS_TOKEN_CODE);
    assert_eq!(outcome.source, ExitSource::TokenMatch);
    assert!(outcome.message.contains("STOP"));
    Ok(())
}

#[test]
fn token_line_without_integer_is_ambiguous() -> TestResult {
    init_tracing();

    let ctrl = ControllerBuilder::shell("echo STOP now").token("STOP").build();
    let outcome = ctrl.start()?;

    assert_eq!(outcome.code, AMBIGUOUS_TOKEN_CODE);
    assert_eq!(outcome.source, ExitSource::TokenMatch);
    Ok(())
}
