// src/exec/listener.rs

//! Observer fan-out for process output and completion.
//!
//! Listeners are registered by `Arc` but held as `Weak`: the hub never keeps
//! an observer alive. Registration is keyed on pointer identity, so adding
//! the same `Arc` twice is a no-op and removal works even for listeners that
//! compare equal by value.
//!
//! Dispatch iterates a snapshot taken under the lock, so listeners may add or
//! remove registrations (including themselves) from inside a callback. A
//! panicking listener is logged and skipped; it never reaches the
//! controller's loop.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, Weak};

use tracing::{debug, warn};

use crate::exec::outcome::ExitOutcome;

/// Receives output lines and the terminal outcome of a run.
pub trait OutputListener: Send + Sync {
    /// Called once per stdout line, in the order the child produced them.
    fn on_output(&self, line: &str);

    /// Called exactly once, after the last `on_output`.
    fn on_completion(&self, outcome: &ExitOutcome);

    /// Name used in log messages.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

#[derive(Default)]
pub struct ListenerHub {
    listeners: RwLock<Vec<Weak<dyn OutputListener>>>,
    completed: AtomicBool,
}

impl ListenerHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Returns `false` if it was already registered.
    pub fn add(&self, listener: &Arc<dyn OutputListener>) -> bool {
        let mut guard = self.write();
        guard.retain(|w| w.strong_count() > 0);
        if guard.iter().any(|w| same_listener(w, listener)) {
            return false;
        }
        guard.push(Arc::downgrade(listener));
        true
    }

    /// Unregister a listener by identity. Returns `false` if it was not
    /// registered.
    pub fn remove(&self, listener: &Arc<dyn OutputListener>) -> bool {
        let mut guard = self.write();
        let present = guard.iter().any(|w| same_listener(w, listener));
        guard.retain(|w| w.strong_count() > 0 && !same_listener(w, listener));
        present
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.read().iter().filter(|w| w.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forward one stdout line to every live listener.
    pub fn notify_output(&self, line: &str) {
        for listener in self.snapshot() {
            let result = panic::catch_unwind(AssertUnwindSafe(|| listener.on_output(line)));
            if result.is_err() {
                warn!(listener = listener.name(), "listener panicked in on_output; skipping");
            }
        }
    }

    /// Deliver the terminal outcome. Only the first call has any effect.
    ///
    /// Returns `true` if this call delivered the notification.
    pub fn notify_completion(&self, outcome: &ExitOutcome) -> bool {
        if self.completed.swap(true, Ordering::AcqRel) {
            debug!("completion already delivered; ignoring repeat");
            return false;
        }

        for listener in self.snapshot() {
            let result =
                panic::catch_unwind(AssertUnwindSafe(|| listener.on_completion(outcome)));
            if result.is_err() {
                warn!(
                    listener = listener.name(),
                    "listener panicked in on_completion; skipping"
                );
            }
        }
        true
    }

    pub fn completion_delivered(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    fn snapshot(&self) -> Vec<Arc<dyn OutputListener>> {
        self.read().iter().filter_map(Weak::upgrade).collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Weak<dyn OutputListener>>> {
        // A panic while holding the lock cannot leave the Vec half-updated.
        self.listeners.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Weak<dyn OutputListener>>> {
        self.listeners.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn same_listener(weak: &Weak<dyn OutputListener>, arc: &Arc<dyn OutputListener>) -> bool {
    // Compare data pointers only; vtable pointers may differ per codegen unit.
    std::ptr::addr_eq(weak.as_ptr(), Arc::as_ptr(arc))
}
