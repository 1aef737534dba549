// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake background extensions for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{BackgroundExtension, ExpiryCallback, ExtensionId};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Recorded extension call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionCall {
    Begin {
        provider: String,
        id: Option<ExtensionId>,
    },
    End {
        id: ExtensionId,
    },
}

struct Active {
    provider: String,
    on_expire: ExpiryCallback,
}

#[derive(Default)]
struct FakeExtensionsState {
    next_id: u64,
    declining: bool,
    active: BTreeMap<ExtensionId, Active>,
    calls: Vec<ExtensionCall>,
}

/// Fake extension host that records calls and lets tests trigger expiry
#[derive(Clone, Default)]
pub struct FakeExtensions {
    inner: Arc<Mutex<FakeExtensionsState>>,
}

impl FakeExtensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decline all future requests
    pub fn decline(&self) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).declining = true;
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ExtensionCall> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }

    /// Providers currently holding an extension
    pub fn active_providers(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .active
            .values()
            .map(|a| a.provider.clone())
            .collect()
    }

    /// Simulate the host running out of time for `provider`'s extension.
    /// Returns false if the provider holds no extension.
    pub fn expire(&self, provider: &str) -> bool {
        let expired = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            let id = inner
                .active
                .iter()
                .find(|(_, a)| a.provider == provider)
                .map(|(id, _)| *id);
            id.and_then(|id| inner.active.remove(&id))
        };

        match expired {
            Some(active) => {
                (active.on_expire)();
                true
            }
            None => false,
        }
    }
}

impl BackgroundExtension for FakeExtensions {
    fn begin(&self, provider: &str, on_expire: ExpiryCallback) -> Option<ExtensionId> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let id = if inner.declining {
            None
        } else {
            inner.next_id += 1;
            let id = ExtensionId(inner.next_id);
            inner.active.insert(
                id,
                Active {
                    provider: provider.to_string(),
                    on_expire,
                },
            );
            Some(id)
        };
        inner.calls.push(ExtensionCall::Begin {
            provider: provider.to_string(),
            id,
        });
        id
    }

    fn end(&self, id: ExtensionId) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.active.remove(&id);
        inner.calls.push(ExtensionCall::End { id });
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
