// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler lifecycle notifications
//!
//! This module provides:
//! - `SchedulerEvent` - what happened (cycle complete, sleep, provider timeout)
//! - `SchedulerListener` - callback-style observers
//! - `ListenerBus` - multicast to listeners and channel subscribers

mod bus;

pub use bus::{EventReceiver, EventSender, ListenerBus, SchedulerEvent, SchedulerListener};
