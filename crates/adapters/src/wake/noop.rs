// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op wake registrar for hosts that never suspend the process.

use super::{WakeError, WakeRegistrar};
use std::time::Instant;

/// Accepts and forgets every wake request.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpWakeRegistrar;

impl NoOpWakeRegistrar {
    pub fn new() -> Self {
        Self
    }
}

impl WakeRegistrar for NoOpWakeRegistrar {
    fn submit(&self, _earliest: Instant) -> Result<(), WakeError> {
        Ok(())
    }

    fn cancel(&self) {}
}
