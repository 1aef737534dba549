// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the scheduler engine

use cadence_core::ConfigError;
use thiserror::Error;

/// Errors that can occur constructing a scheduler
///
/// Once running, the scheduler contains every failure itself: provider
/// timeouts and misbehaving operations are logged, never returned.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler must be created inside a tokio runtime")]
    NoRuntime,
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
