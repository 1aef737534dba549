// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded worker pool for operation chains
//!
//! A chain is a short sequence of operations run back to back by a single
//! worker. The queue counts progress in operations, tracks which chains are
//! still in flight and fires a one-shot barrier once none are left.

use cadence_core::OperationHandle;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::{Notify, Semaphore};

/// Callback fired when the queue drains, given the progress at that moment
pub type BarrierCallback = Box<dyn FnOnce(Progress) + Send + 'static>;

/// Operation-level progress since the last batch began
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub total: u64,
    pub completed: u64,
}

impl Progress {
    pub fn is_finished(&self) -> bool {
        self.completed >= self.total
    }
}

#[derive(Default)]
struct QueueState {
    chains: HashMap<u64, Vec<OperationHandle>>,
    next_chain: u64,
    progress: Progress,
    barrier: Option<BarrierCallback>,
}

struct QueueInner {
    runtime: Handle,
    permits: Arc<Semaphore>,
    state: Mutex<QueueState>,
    idle: Notify,
}

/// Worker pool running at most `max_concurrent` chains at once
#[derive(Clone)]
pub struct OperationQueue {
    inner: Arc<QueueInner>,
}

impl OperationQueue {
    pub fn new(runtime: Handle, max_concurrent: usize) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                runtime,
                permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
                state: Mutex::new(QueueState::default()),
                idle: Notify::new(),
            }),
        }
    }

    /// Reset progress for a new batch
    ///
    /// Chains still in flight from an earlier batch stay counted so the
    /// totals line up when they finish.
    pub fn begin_batch(&self) {
        let mut state = self.inner.lock();
        let carried: usize = state.chains.values().map(Vec::len).sum();
        state.progress = Progress {
            total: carried as u64,
            completed: 0,
        };
    }

    /// Submit a chain; its operations run sequentially on one worker
    pub fn enqueue(&self, chain: Vec<OperationHandle>) {
        if chain.is_empty() {
            return;
        }

        let chain_id = {
            let mut state = self.inner.lock();
            let chain_id = state.next_chain;
            state.next_chain += 1;
            state.progress.total += chain.len() as u64;
            state.chains.insert(chain_id, chain.clone());
            chain_id
        };

        let inner = Arc::clone(&self.inner);
        self.inner.runtime.spawn(async move {
            // The semaphore is never closed, so acquire only fails if it is
            let permit = Arc::clone(&inner.permits).acquire_owned().await;

            let steps = chain.clone();
            let runner = inner.runtime.spawn(async move {
                for handle in &steps {
                    handle.execute().await;
                }
            });
            if let Err(e) = runner.await {
                if e.is_panic() {
                    let names: Vec<&str> = chain.iter().map(|h| h.name()).collect();
                    tracing::error!(chain = ?names, "operation panicked");
                }
            }

            drop(permit);
            inner.finish_chain(chain_id, &chain);
        });
    }

    /// Register a one-shot callback for when no chains remain in flight
    ///
    /// Replaces any barrier already waiting. Fires immediately, on the
    /// calling thread, when the queue is already idle.
    pub fn add_barrier(&self, callback: BarrierCallback) {
        let mut state = self.inner.lock();
        if state.chains.is_empty() {
            let progress = state.progress;
            drop(state);
            callback(progress);
        } else {
            state.barrier = Some(callback);
        }
    }

    /// Cancel every in-flight operation and discard the pending barrier
    ///
    /// Returns the number of chains that were signalled.
    pub fn cancel_all(&self) -> usize {
        let mut state = self.inner.lock();
        state.barrier = None;
        for handle in state.chains.values().flatten() {
            handle.cancel();
        }
        state.chains.len()
    }

    pub fn in_flight(&self) -> usize {
        self.inner.lock().chains.len()
    }

    pub fn progress(&self) -> Progress {
        self.inner.lock().progress
    }

    pub fn is_idle(&self) -> bool {
        self.inner.lock().chains.is_empty()
    }

    /// Wait until every chain has finished
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }
}

impl QueueInner {
    fn lock(&self) -> std::sync::MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn finish_chain(&self, chain_id: u64, chain: &[OperationHandle]) {
        let fired = {
            let mut state = self.lock();
            if state.chains.remove(&chain_id).is_none() {
                return;
            }
            state.progress.completed += chain.iter().filter(|h| h.is_finished()).count() as u64;

            if state.chains.is_empty() {
                self.idle.notify_waiters();
                let progress = state.progress;
                state.barrier.take().map(|barrier| (barrier, progress))
            } else {
                None
            }
        };

        if let Some((barrier, progress)) = fired {
            barrier(progress);
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
