// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot, cancelable delayed callbacks
//!
//! Timers back both the per-provider timeout guard and the sleep/wake timer.
//! A [`TimerHandle`] cancels its timer when dropped, so removing a handle from
//! a map is enough to disarm it.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

/// Work run when a timer fires
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

const PENDING: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

/// Produces one-shot delayed callbacks
pub trait TimerFacility: Send + Sync + 'static {
    /// Run `callback` once after `after` has elapsed, unless cancelled first
    fn schedule(&self, after: Duration, callback: TimerCallback) -> TimerHandle;
}

/// Handle to a scheduled timer
pub struct TimerHandle {
    status: Arc<AtomicU8>,
    abort: AbortHandle,
}

impl TimerHandle {
    fn new(status: Arc<AtomicU8>, abort: AbortHandle) -> Self {
        Self { status, abort }
    }

    /// Cancel the timer. Has no effect if it already fired.
    pub fn cancel(&self) {
        if self
            .status
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.abort.abort();
        }
    }

    /// True while the timer has neither fired nor been cancelled
    pub fn is_pending(&self) -> bool {
        self.status.load(Ordering::Acquire) == PENDING
    }

    pub fn is_cancelled(&self) -> bool {
        self.status.load(Ordering::Acquire) == CANCELLED
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.status.load(Ordering::Acquire) {
            PENDING => "pending",
            FIRED => "fired",
            _ => "cancelled",
        };
        f.debug_struct("TimerHandle").field("status", &status).finish()
    }
}

/// Claim the right to fire. Returns false if the timer was cancelled first.
fn claim_fire(status: &AtomicU8) -> bool {
    status
        .compare_exchange(PENDING, FIRED, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
}

/// Timers driven by a tokio runtime
#[derive(Clone, Debug)]
pub struct TokioTimers {
    handle: Handle,
}

impl TokioTimers {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Timers bound to the runtime of the calling context, if any
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl TimerFacility for TokioTimers {
    fn schedule(&self, after: Duration, callback: TimerCallback) -> TimerHandle {
        let status = Arc::new(AtomicU8::new(PENDING));
        let task_status = Arc::clone(&status);
        let task = self.handle.spawn(async move {
            tokio::time::sleep(after).await;
            if claim_fire(&task_status) {
                callback();
            }
        });
        TimerHandle::new(status, task.abort_handle())
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
