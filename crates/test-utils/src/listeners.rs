#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use runctl::exec::{ExitOutcome, OutputListener};

/// One notification as seen by a listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Output(String),
    Completion(ExitOutcome),
}

/// Records every notification in arrival order.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<Event>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Output(line) => Some(line),
                Event::Completion(_) => None,
            })
            .collect()
    }

    pub fn completions(&self) -> Vec<ExitOutcome> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Completion(outcome) => Some(outcome),
                Event::Output(_) => None,
            })
            .collect()
    }
}

impl OutputListener for RecordingListener {
    fn on_output(&self, line: &str) {
        self.events.lock().unwrap().push(Event::Output(line.to_string()));
    }

    fn on_completion(&self, outcome: &ExitOutcome) {
        self.events.lock().unwrap().push(Event::Completion(outcome.clone()));
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Panics on every notification.
#[derive(Debug, Default)]
pub struct PanickingListener;

impl OutputListener for PanickingListener {
    fn on_output(&self, _line: &str) {
        panic!("listener failure on output");
    }

    fn on_completion(&self, _outcome: &ExitOutcome) {
        panic!("listener failure on completion");
    }

    fn name(&self) -> &str {
        "panicking"
    }
}
