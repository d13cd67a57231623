// src/exec/cancel.rs

use std::sync::atomic::{AtomicU8, Ordering};

/// Why a run was asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// `cancel()` was called.
    Requested,
    /// The timeout timer fired.
    Timeout,
}

const NONE: u8 = 0;
const REQUESTED: u8 = 1;
const TIMEOUT: u8 = 2;

/// Shared cancellation flag.
///
/// Set from any thread (caller, timer); observed by the polling loop. The
/// first reason recorded wins, so a late timer cannot turn an explicit
/// cancellation into a timeout or vice versa.
#[derive(Debug, Default)]
pub struct CancelToken {
    reason: AtomicU8,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cancellation request. Returns `true` if this call set the
    /// flag, `false` if a reason was already recorded.
    pub fn request(&self, reason: CancelReason) -> bool {
        let value = match reason {
            CancelReason::Requested => REQUESTED,
            CancelReason::Timeout => TIMEOUT,
        };
        self.reason
            .compare_exchange(NONE, value, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn reason(&self) -> Option<CancelReason> {
        match self.reason.load(Ordering::Acquire) {
            REQUESTED => Some(CancelReason::Requested),
            TIMEOUT => Some(CancelReason::Timeout),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }
}
