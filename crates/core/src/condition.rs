// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime conditions gating whether a provider may run
//!
//! Conditions are evaluated against a [`ConditionSnapshot`] read fresh from the
//! host at the start of every cycle. Nothing is cached between cycles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Network reachability as classified by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkStatus {
    Satisfied,
    Unsatisfied,
    RequiresConnection,
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkStatus::Satisfied => write!(f, "satisfied"),
            NetworkStatus::Unsatisfied => write!(f, "unsatisfied"),
            NetworkStatus::RequiresConnection => write!(f, "requires_connection"),
        }
    }
}

/// Live external signals at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConditionSnapshot {
    pub network: NetworkStatus,
    /// Battery charge in percent (0-100). `None` when the host cannot tell.
    pub battery_level: Option<f32>,
}

impl ConditionSnapshot {
    pub fn new(network: NetworkStatus, battery_level: Option<f32>) -> Self {
        Self {
            network,
            battery_level,
        }
    }
}

impl Default for ConditionSnapshot {
    fn default() -> Self {
        Self {
            network: NetworkStatus::RequiresConnection,
            battery_level: None,
        }
    }
}

type Check = Arc<dyn Fn(&ConditionSnapshot) -> bool + Send + Sync>;

/// A predicate that must hold for a provider to be scheduled
#[derive(Clone)]
pub enum Condition {
    /// The network must be in exactly this state
    NetworkStatus(NetworkStatus),
    /// Battery must be at or above this percentage
    MinimumBatteryLevel(f32),
    /// Host-specific predicate
    Custom { name: String, check: Check },
}

impl Condition {
    pub fn custom(
        name: impl Into<String>,
        check: impl Fn(&ConditionSnapshot) -> bool + Send + Sync + 'static,
    ) -> Self {
        Condition::Custom {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    pub fn is_met(&self, snapshot: &ConditionSnapshot) -> bool {
        match self {
            Condition::NetworkStatus(required) => snapshot.network == *required,
            Condition::MinimumBatteryLevel(required) => snapshot
                .battery_level
                .is_some_and(|level| level >= *required),
            Condition::Custom { check, .. } => check(snapshot),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::NetworkStatus(status) => {
                f.debug_tuple("NetworkStatus").field(status).finish()
            }
            Condition::MinimumBatteryLevel(level) => {
                f.debug_tuple("MinimumBatteryLevel").field(level).finish()
            }
            Condition::Custom { name, .. } => f.debug_struct("Custom").field("name", name).finish(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::NetworkStatus(status) => write!(f, "network={}", status),
            Condition::MinimumBatteryLevel(level) => write!(f, "battery>={}%", level),
            Condition::Custom { name, .. } => write!(f, "{}", name),
        }
    }
}

/// First condition that does not hold, if any. An empty list always passes.
pub fn first_unmet<'a>(
    conditions: &'a [Condition],
    snapshot: &ConditionSnapshot,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| !c.is_met(snapshot))
}

/// True when every condition holds
pub fn all_met(conditions: &[Condition], snapshot: &ConditionSnapshot) -> bool {
    first_unmet(conditions, snapshot).is_none()
}

#[cfg(test)]
#[path = "condition_tests.rs"]
mod tests;
