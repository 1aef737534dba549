// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cadence-core: building blocks for the cadence background-work scheduler
//!
//! This crate provides:
//! - Clock and timer abstractions
//! - The operation and work provider contracts
//! - Condition evaluation against host signals
//! - Lifecycle notifications and configuration

pub mod clock;
pub mod condition;
pub mod config;
pub mod events;
pub mod operation;
pub mod provider;
pub mod timer;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use condition::{Condition, ConditionSnapshot, NetworkStatus};
pub use config::{ConfigError, SchedulerConfig};
pub use events::{EventReceiver, ListenerBus, SchedulerEvent, SchedulerListener};
pub use operation::{
    from_fn, FnOperation, Operation, OperationHandle, OperationId, OperationState,
    SimpleOperation,
};
pub use provider::{EnqueueMode, SharedProvider, WorkProvider};
pub use timer::{TimerCallback, TimerFacility, TimerHandle, TokioTimers};
pub use tokio_util::sync::CancellationToken;
