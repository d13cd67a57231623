// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running one command with
//! `std::process::Command`, observing its output, and settling on a single
//! exit outcome.
//!
//! - [`controller`] owns the process lifecycle and the stdout polling loop.
//! - [`drain`] keeps pipes empty on background threads.
//! - [`timer`] implements the optional one-shot timeout.
//! - [`cancel`] is the shared cooperative cancellation flag.
//! - [`resolver`] decides the final exit code (OS status or legacy token).
//! - [`listener`] fans output and completion out to observers.
//! - [`outcome`] defines run states, outcomes and their sentinel codes.
//! - [`options`] holds per-run settings.

pub mod cancel;
pub mod controller;
pub mod drain;
pub mod listener;
pub mod options;
pub mod outcome;
pub mod resolver;
pub mod timer;

pub use cancel::{CancelReason, CancelToken};
pub use controller::ProcessController;
pub use drain::StreamDrain;
pub use listener::{ListenerHub, OutputListener};
pub use options::RunOptions;
pub use outcome::{ExitOutcome, ExitSource, RunState};
pub use resolver::ExitOutcomeResolver;
pub use timer::TimeoutTimer;
