// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancelable units of work
//!
//! An [`Operation`] is the work itself. An [`OperationHandle`] owns one while
//! it sits in the scheduler's queue and tracks its lifecycle:
//!
//! ```text
//! Idle ──execute──> Running ──(done | cancelled)──> Finished
//! ```
//!
//! Cancellation is cooperative. The token handed to [`Operation::run`] should
//! be checked at safe points; the runner also stops polling `run` once the
//! token fires. Blocking code inside `run` that never yields and never checks
//! the token cannot be interrupted.

use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Lifecycle of a queued operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Idle,
    Running,
    Finished,
}

/// A unit of work produced by a work provider
#[async_trait]
pub trait Operation: Send + Sync + 'static {
    /// Human readable name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Perform the work
    ///
    /// Must eventually return, and should return promptly once `cancel` fires.
    async fn run(&self, cancel: CancellationToken);

    /// Cleanup hook, invoked instead of the remainder of `run` on cancellation
    fn cancelled(&self) {}
}

/// Unique identifier of a queued operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(pub u64);

impl OperationId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

struct HandleInner {
    id: OperationId,
    operation: Arc<dyn Operation>,
    state: Mutex<OperationState>,
    token: CancellationToken,
}

/// Shared handle to an operation and its lifecycle state
#[derive(Clone)]
pub struct OperationHandle {
    inner: Arc<HandleInner>,
}

impl OperationHandle {
    pub fn new(operation: Arc<dyn Operation>) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id: OperationId::next(),
                operation,
                state: Mutex::new(OperationState::Idle),
                token: CancellationToken::new(),
            }),
        }
    }

    pub fn id(&self) -> OperationId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        self.inner.operation.name()
    }

    pub fn state(&self) -> OperationState {
        *self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_finished(&self) -> bool {
        self.state() == OperationState::Finished
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Request cancellation. The operation finishes the next time it is
    /// driven by [`OperationHandle::execute`] or when its body yields.
    pub fn cancel(&self) {
        self.inner.token.cancel();
    }

    /// Drive the operation to completion
    ///
    /// Runs at most once; later calls return immediately. A handle cancelled
    /// while idle skips the body and only runs the cancellation hook.
    pub async fn execute(&self) {
        if !self.transition(OperationState::Idle, OperationState::Running) {
            return;
        }

        let operation = &self.inner.operation;
        let token = &self.inner.token;
        if token.is_cancelled() {
            operation.cancelled();
        } else {
            tokio::select! {
                biased;
                _ = token.cancelled() => operation.cancelled(),
                _ = operation.run(token.clone()) => {}
            }
        }

        self.transition(OperationState::Running, OperationState::Finished);
    }

    fn transition(&self, from: OperationState, to: OperationState) -> bool {
        let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state != from {
            return false;
        }
        *state = to;
        true
    }
}

impl fmt::Debug for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationHandle")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("state", &self.state())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

type Handler = Arc<dyn Fn() + Send + Sync>;

/// Operation backed by a main closure and a cancel closure
///
/// Exactly one of the two runs: `main` when the operation executes normally,
/// `cancel` when it was cancelled first.
pub struct SimpleOperation {
    name: String,
    main: Option<Handler>,
    cancel: Option<Handler>,
}

impl SimpleOperation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            main: None,
            cancel: None,
        }
    }

    pub fn on_main(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.main = Some(Arc::new(handler));
        self
    }

    pub fn on_cancel(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.cancel = Some(Arc::new(handler));
        self
    }

    /// Run the same closure whether the operation completes or is cancelled
    pub fn on_either(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        let handler: Handler = Arc::new(handler);
        self.main = Some(Arc::clone(&handler));
        self.cancel = Some(handler);
        self
    }
}

#[async_trait]
impl Operation for SimpleOperation {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _cancel: CancellationToken) {
        if let Some(main) = &self.main {
            main();
        }
    }

    fn cancelled(&self) {
        if let Some(cancel) = &self.cancel {
            cancel();
        }
    }
}

/// Operation backed by an async closure
pub struct FnOperation<F> {
    name: String,
    body: F,
}

/// Build an operation from an async closure that receives the cancellation token
pub fn from_fn<F, Fut>(name: impl Into<String>, body: F) -> FnOperation<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    FnOperation {
        name: name.into(),
        body,
    }
}

#[async_trait]
impl<F, Fut> Operation for FnOperation<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, cancel: CancellationToken) {
        (self.body)(cancel).await
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
