// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake wake registration for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{WakeError, WakeRegistrar, WakeTask};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Recorded wake registrar call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WakeCall {
    Submit { earliest: Instant },
    Cancel,
}

#[derive(Default)]
struct FakeWakeState {
    calls: Vec<WakeCall>,
    reject_with: Option<String>,
}

/// Fake registrar that records calls
#[derive(Clone, Default)]
pub struct FakeWakeRegistrar {
    inner: Arc<Mutex<FakeWakeState>>,
}

impl FakeWakeRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject all future submissions with this reason
    pub fn reject(&self, reason: impl Into<String>) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).reject_with = Some(reason.into());
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<WakeCall> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }

    /// Most recent accepted submission
    pub fn last_submitted(&self) -> Option<Instant> {
        self.calls().iter().rev().find_map(|call| match call {
            WakeCall::Submit { earliest } => Some(*earliest),
            WakeCall::Cancel => None,
        })
    }
}

impl WakeRegistrar for FakeWakeRegistrar {
    fn submit(&self, earliest: Instant) -> Result<(), WakeError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(reason) = &inner.reject_with {
            return Err(WakeError::Rejected(reason.clone()));
        }
        inner.calls.push(WakeCall::Submit { earliest });
        Ok(())
    }

    fn cancel(&self) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .push(WakeCall::Cancel);
    }
}

/// Fake wake window that records its completion
#[derive(Clone, Default)]
pub struct FakeWakeTask {
    completed: Arc<Mutex<Option<bool>>>,
}

impl FakeWakeTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Some(success)` once completed
    pub fn completion(&self) -> Option<bool> {
        *self.completed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl WakeTask for FakeWakeTask {
    fn complete(&self, success: bool) {
        *self.completed.lock().unwrap_or_else(|e| e.into_inner()) = Some(success);
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
