// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host with no execution restriction and fixed signals.

use super::{Budget, HostEnvironment};
use cadence_core::{ConditionSnapshot, NetworkStatus};

/// Host that never restricts execution.
///
/// Used for foreground-only embedders and environments without a battery or
/// network monitor. Reports a connected network and an unknown battery level
/// unless told otherwise.
#[derive(Clone, Copy, Debug)]
pub struct UnrestrictedHost {
    conditions: ConditionSnapshot,
}

impl UnrestrictedHost {
    pub fn new() -> Self {
        Self {
            conditions: ConditionSnapshot::new(NetworkStatus::Satisfied, None),
        }
    }

    pub fn with_conditions(conditions: ConditionSnapshot) -> Self {
        Self { conditions }
    }
}

impl Default for UnrestrictedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostEnvironment for UnrestrictedHost {
    fn remaining_budget(&self) -> Budget {
        Budget::Unbounded
    }

    fn conditions(&self) -> ConditionSnapshot {
        self.conditions
    }
}
