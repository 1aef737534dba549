// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work provider contract
//!
//! A provider describes a unit of schedulable work: who it is, how long it
//! expects to take, how often it wants to run, and what must hold for it to
//! run at all. Each cycle the scheduler calls [`WorkProvider::build_work`]
//! once for every provider it selects.

use crate::condition::Condition;
use crate::operation::Operation;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_ESTIMATED_WORK_TIME: Duration = Duration::from_secs(5);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_DESIRED_FREQUENCY: Duration = Duration::from_secs(60 * 60);

/// What `register` does when the identifier is already taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnqueueMode {
    /// Keep the provider already registered and ignore the new one
    #[default]
    Keep,
    /// Drop the existing provider and its bookkeeping, then register the new one
    Replace,
}

/// A named source of schedulable work
pub trait WorkProvider: Send + Sync + 'static {
    /// Stable key the provider is tracked under. Defaults to the type name.
    fn identifier(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Expected run time, checked against the host's remaining budget
    fn estimated_work_time(&self) -> Duration {
        DEFAULT_ESTIMATED_WORK_TIME
    }

    /// Operations still running after this long are cancelled
    fn timeout(&self) -> Duration {
        DEFAULT_TIMEOUT
    }

    /// Minimum gap between runs. Only consulted when `should_repeat` is true.
    fn desired_frequency(&self) -> Duration {
        DEFAULT_DESIRED_FREQUENCY
    }

    /// One-shot providers are deregistered after their first completed batch
    fn should_repeat(&self) -> bool;

    /// Whether the host should extend restricted execution time for this work
    fn can_run_in_background(&self) -> bool {
        true
    }

    /// All must hold for the provider to be scheduled
    fn conditions(&self) -> Vec<Condition> {
        Vec::new()
    }

    /// Materialize this cycle's work
    fn build_work(&self) -> Vec<Arc<dyn Operation>>;
}

/// Providers are shared between the registry and in-flight guards
pub type SharedProvider = Arc<dyn WorkProvider>;

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
