// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::extension::{BackgroundExtension, ExpiryCallback, ExtensionId};
use crate::host::{Budget, HostEnvironment};
use cadence_core::ConditionSnapshot;

/// Wrapper that adds tracing to any HostEnvironment
#[derive(Clone, Debug)]
pub struct TracedHost<H> {
    inner: H,
}

impl<H> TracedHost<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H: HostEnvironment> HostEnvironment for TracedHost<H> {
    fn remaining_budget(&self) -> Budget {
        let budget = self.inner.remaining_budget();
        match budget {
            Budget::Unbounded => tracing::trace!(budget = "unbounded", "host.budget"),
            Budget::Remaining(left) => tracing::debug!(
                remaining_budget_ms = left.as_millis() as u64,
                exhausted = budget.is_exhausted(),
                "host.budget"
            ),
        }
        budget
    }

    fn conditions(&self) -> ConditionSnapshot {
        let snapshot = self.inner.conditions();
        tracing::trace!(
            network = %snapshot.network,
            battery = ?snapshot.battery_level,
            "host.conditions"
        );
        snapshot
    }
}

/// Wrapper that adds tracing to any BackgroundExtension
#[derive(Clone, Debug)]
pub struct TracedExtensions<X> {
    inner: X,
}

impl<X> TracedExtensions<X> {
    pub fn new(inner: X) -> Self {
        Self { inner }
    }
}

impl<X: BackgroundExtension> BackgroundExtension for TracedExtensions<X> {
    fn begin(&self, provider: &str, on_expire: ExpiryCallback) -> Option<ExtensionId> {
        let span = tracing::info_span!("extension.begin", provider);
        let _guard = span.enter();

        let owner = provider.to_string();
        let on_expire: ExpiryCallback = Box::new(move || {
            tracing::warn!(provider = %owner, "background extension expired");
            on_expire();
        });

        let result = self.inner.begin(provider, on_expire);
        match result {
            Some(id) => tracing::debug!(%id, "extension granted"),
            None => tracing::debug!("extension declined"),
        }
        result
    }

    fn end(&self, id: ExtensionId) {
        tracing::debug!(%id, "extension.end");
        self.inner.end(id);
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
