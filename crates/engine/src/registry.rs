// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider registry and per-cycle selection
//!
//! Pure bookkeeping: no timers, no queue. Given a budget, a condition
//! snapshot and the set of providers still busy from an earlier cycle,
//! [`Registry::select`] decides who runs next and records that they did.

use cadence_adapters::Budget;
use cadence_core::{condition, Clock, ConditionSnapshot, EnqueueMode, SharedProvider};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Registered providers plus their scheduling history
pub struct Registry<C: Clock> {
    clock: C,
    providers: HashMap<String, SharedProvider>,
    last_scheduled: HashMap<String, Instant>,
    run_count: HashMap<String, u32>,
}

impl<C: Clock> Registry<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            providers: HashMap::new(),
            last_scheduled: HashMap::new(),
            run_count: HashMap::new(),
        }
    }

    /// Insert a provider according to `mode`
    ///
    /// Returns false when `Keep` left an existing registration untouched.
    pub fn insert(&mut self, provider: SharedProvider, mode: EnqueueMode) -> bool {
        let id = provider.identifier().to_string();
        if self.providers.contains_key(&id) {
            match mode {
                EnqueueMode::Keep => return false,
                EnqueueMode::Replace => {
                    self.remove(&id);
                }
            }
        }
        self.providers.insert(id, provider);
        true
    }

    /// Remove a provider and all of its history
    pub fn remove(&mut self, id: &str) -> Option<SharedProvider> {
        self.last_scheduled.remove(id);
        self.run_count.remove(id);
        self.providers.remove(id)
    }

    /// Whether `provider` is the instance currently registered under its identifier
    pub fn is_current(&self, provider: &SharedProvider) -> bool {
        self.providers
            .get(provider.identifier())
            .is_some_and(|current| Arc::ptr_eq(current, provider))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&SharedProvider> {
        self.providers.get(id)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Registered identifiers, sorted
    pub fn identifiers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.providers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn last_scheduled(&self, id: &str) -> Option<Instant> {
        self.last_scheduled.get(id).copied()
    }

    pub fn run_count(&self, id: &str) -> u32 {
        self.run_count.get(id).copied().unwrap_or(0)
    }

    /// Pick the providers for the next cycle and record their selection
    ///
    /// Filters, in order: due for a run, not busy, fairness order,
    /// conditions met, estimate fits the remaining budget.
    pub fn select(
        &mut self,
        mut budget: Budget,
        conditions: &ConditionSnapshot,
        busy: &HashSet<String>,
    ) -> Vec<SharedProvider> {
        if budget.is_exhausted() {
            tracing::debug!("budget exhausted, nothing eligible");
            return Vec::new();
        }

        let now = self.clock.now();
        let due = self.due(now, busy);
        let order = self.fairness_order(&due);

        let mut selected = Vec::new();
        for id in order {
            let Some(provider) = due.get(&id) else {
                continue;
            };

            let requirements = provider.conditions();
            if let Some(unmet) = condition::first_unmet(&requirements, conditions) {
                tracing::trace!(provider = %id, condition = %unmet, "condition not met");
                continue;
            }

            let estimate = provider.estimated_work_time();
            if !budget.fits(estimate) {
                tracing::trace!(
                    provider = %id,
                    estimate_ms = estimate.as_millis() as u64,
                    remaining = %budget,
                    "not enough budget"
                );
                continue;
            }

            budget.consume(estimate);
            self.last_scheduled.insert(id.clone(), now);
            *self.run_count.entry(id).or_insert(0) += 1;
            selected.push(Arc::clone(provider));
        }
        selected
    }

    /// Interval until the next wake, or `None` when nothing is registered
    ///
    /// A registered one-shot provider asks for an immediate wake; otherwise
    /// the smallest desired frequency wins.
    pub fn wake_interval(&self) -> Option<Duration> {
        if self.providers.values().any(|p| !p.should_repeat()) {
            return Some(Duration::ZERO);
        }
        self.providers
            .values()
            .map(|p| p.desired_frequency())
            .min()
    }

    fn due(&self, now: Instant, busy: &HashSet<String>) -> BTreeMap<String, SharedProvider> {
        self.providers
            .iter()
            .filter(|(id, _)| {
                if busy.contains(id.as_str()) {
                    tracing::trace!(provider = %id, "still running from an earlier cycle");
                    return false;
                }
                true
            })
            .filter(|(id, provider)| {
                if !provider.should_repeat() {
                    return true;
                }
                match self.last_scheduled.get(id.as_str()) {
                    None => true,
                    Some(last) => now.saturating_duration_since(*last) >= provider.desired_frequency(),
                }
            })
            .map(|(id, provider)| (id.clone(), Arc::clone(provider)))
            .collect()
    }

    /// Order candidates so the least-run go first, ties broken by identifier
    ///
    /// Counts reset once every tracked provider has run at least once.
    fn fairness_order(&mut self, candidates: &BTreeMap<String, SharedProvider>) -> Vec<String> {
        let providers = &self.providers;
        self.run_count.retain(|id, _| providers.contains_key(id));

        if !self.run_count.is_empty() && self.run_count.values().all(|count| *count > 0) {
            self.run_count.clear();
        }
        for id in candidates.keys() {
            self.run_count.entry(id.clone()).or_insert(0);
        }

        let mut order: Vec<(u32, String)> = candidates
            .keys()
            .map(|id| (self.run_count(id), id.clone()))
            .collect();
        order.sort();
        order.into_iter().map(|(_, id)| id).collect()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
