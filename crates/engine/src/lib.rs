// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cadence scheduling engine

mod controller;
mod error;
mod queue;
mod registry;
mod scheduler;

pub use controller::HostController;
pub use error::SchedulerError;
pub use queue::{BarrierCallback, OperationQueue, Progress};
pub use registry::Registry;
pub use scheduler::{Scheduler, SchedulerDeps, SchedulerState};
