// src/exec/timer.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

/// One-shot timer running a callback after `duration` unless stopped first.
///
/// The waiting thread blocks on a stop channel with `recv_timeout`, so
/// [`TimeoutTimer::stop`] wakes it immediately. Once `stop` returns the
/// callback can no longer run.
#[derive(Debug)]
pub struct TimeoutTimer {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    fired: Arc<AtomicBool>,
    duration: Duration,
}

impl TimeoutTimer {
    pub fn start<F>(duration: Duration, on_fire: F) -> std::io::Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let fired = Arc::new(AtomicBool::new(false));
        let thread_fired = Arc::clone(&fired);

        let handle = thread::Builder::new()
            .name("runctl-timeout".to_string())
            .spawn(move || match stop_rx.recv_timeout(duration) {
                Err(RecvTimeoutError::Timeout) => {
                    debug!(?duration, "timeout elapsed; requesting cancellation");
                    thread_fired.store(true, Ordering::Release);
                    on_fire();
                }
                // Explicit stop, or the timer handle was dropped.
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    debug!("timeout timer stopped before firing");
                }
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
            fired,
            duration,
        })
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Whether the callback has run.
    pub fn fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Stop the timer and wait for its thread. Idempotent.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            // The thread may already have fired and exited.
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() == thread::current().id() {
                // Stopped from inside the callback; the thread is exiting anyway.
                return;
            }
            if handle.join().is_err() {
                warn!("timeout timer thread panicked");
            }
        }
    }
}

impl Drop for TimeoutTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    #[test]
    fn fires_once_after_duration() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let started = Instant::now();
        let mut timer = TimeoutTimer::start(Duration::from_millis(30), move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        thread::sleep(Duration::from_millis(150));
        timer.stop();

        assert!(timer.fired());
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn stop_prevents_late_firing() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let mut timer = TimeoutTimer::start(Duration::from_millis(200), move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        timer.stop();
        timer.stop();
        thread::sleep(Duration::from_millis(300));

        assert!(!timer.fired());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stop_returns_promptly() {
        let mut timer = TimeoutTimer::start(Duration::from_secs(60), || {}).unwrap();
        let started = Instant::now();
        timer.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(timer.duration(), Duration::from_secs(60));
    }
}
