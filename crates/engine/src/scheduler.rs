// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative background-work scheduler
//!
//! The scheduler alternates between two phases. While running it builds a
//! cycle: every eligible provider's operations are wrapped in start/end
//! guards and submitted to the worker pool, and a barrier waits for them to
//! drain. When no provider has obtainable work it sleeps, arming a single
//! wake timer for the earliest moment something becomes due again.
//!
//! All mutable state lives behind one lock. Timer, guard, barrier and
//! extension callbacks hold weak references and re-enter through that lock;
//! notifications are published only after it is released.

use crate::error::SchedulerError;
use crate::queue::{OperationQueue, Progress};
use crate::registry::Registry;
use cadence_adapters::{
    BackgroundExtension, Budget, ExtensionId, HostEnvironment, NoOpExtensions, UnrestrictedHost,
};
use cadence_core::{
    Clock, EnqueueMode, EventReceiver, ListenerBus, OperationHandle, OperationId,
    SchedulerConfig, SchedulerEvent, SchedulerListener, SharedProvider, SimpleOperation,
    SystemClock, TimerFacility, TimerHandle, TokioTimers,
};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Instant;
use tokio::runtime::Handle;

/// Lifecycle state of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
    Sleeping,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerState::Stopped => write!(f, "stopped"),
            SchedulerState::Running => write!(f, "running"),
            SchedulerState::Sleeping => write!(f, "sleeping"),
        }
    }
}

/// Host-facing dependencies of a scheduler
pub struct SchedulerDeps {
    pub host: Arc<dyn HostEnvironment>,
    pub extensions: Arc<dyn BackgroundExtension>,
    /// Defaults to tokio timers on the scheduler's runtime
    pub timers: Option<Arc<dyn TimerFacility>>,
}

impl SchedulerDeps {
    pub fn new(host: impl HostEnvironment) -> Self {
        Self {
            host: Arc::new(host),
            extensions: Arc::new(NoOpExtensions),
            timers: None,
        }
    }

    pub fn with_extensions(mut self, extensions: impl BackgroundExtension) -> Self {
        self.extensions = Arc::new(extensions);
        self
    }

    pub fn with_timers(mut self, timers: impl TimerFacility) -> Self {
        self.timers = Some(Arc::new(timers));
        self
    }
}

impl Default for SchedulerDeps {
    fn default() -> Self {
        Self::new(UnrestrictedHost::new())
    }
}

/// A provider's timeout guard. Dropping it disarms the timer.
struct Expiration {
    token: u64,
    _timer: TimerHandle,
}

struct Core<C: Clock> {
    state: SchedulerState,
    registry: Registry<C>,
    /// Operations not yet finished, keyed by provider
    enqueued: HashMap<String, Vec<OperationHandle>>,
    /// Armed once per provider per cycle by the first start guard
    expiration_timers: HashMap<String, Expiration>,
    /// Background extensions granted for this cycle
    granted: HashMap<String, ExtensionId>,
    sleep_timer: Option<TimerHandle>,
    next_run_date: Instant,
    /// Incremented every time a batch is submitted
    cycle: u64,
    /// Incremented every time a wake timer is armed
    wake_generation: u64,
    /// Source of expiration tokens
    armed: u64,
}

impl<C: Clock> Core<C> {
    fn has_wake_timer(&self) -> bool {
        self.sleep_timer.as_ref().is_some_and(TimerHandle::is_pending)
    }

    fn is_deep_sleep(&self) -> bool {
        self.state == SchedulerState::Sleeping && !self.has_wake_timer()
    }
}

struct Inner<C: Clock> {
    core: Mutex<Core<C>>,
    queue: OperationQueue,
    bus: ListenerBus,
    host: Arc<dyn HostEnvironment>,
    extensions: Arc<dyn BackgroundExtension>,
    timers: Arc<dyn TimerFacility>,
    clock: C,
    config: SchedulerConfig,
    runtime: Handle,
}

/// Handle to a running scheduler. Clones share the same instance.
pub struct Scheduler<C: Clock = SystemClock> {
    inner: Arc<Inner<C>>,
}

impl<C: Clock> Clone for Scheduler<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Scheduler<SystemClock> {
    /// Create a stopped scheduler bound to the current tokio runtime
    pub fn new(deps: SchedulerDeps, config: SchedulerConfig) -> Result<Self, SchedulerError> {
        Self::with_clock(deps, config, SystemClock)
    }
}

impl<C: Clock> Scheduler<C> {
    pub fn with_clock(
        deps: SchedulerDeps,
        config: SchedulerConfig,
        clock: C,
    ) -> Result<Self, SchedulerError> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
        let timers = deps
            .timers
            .unwrap_or_else(|| Arc::new(TokioTimers::new(runtime.clone())));

        let core = Core {
            state: SchedulerState::Stopped,
            registry: Registry::new(clock.clone()),
            enqueued: HashMap::new(),
            expiration_timers: HashMap::new(),
            granted: HashMap::new(),
            sleep_timer: None,
            next_run_date: clock.now(),
            cycle: 0,
            wake_generation: 0,
            armed: 0,
        };

        Ok(Self {
            inner: Arc::new(Inner {
                core: Mutex::new(core),
                queue: OperationQueue::new(runtime.clone(), config.max_concurrent_operations),
                bus: ListenerBus::new(),
                host: deps.host,
                extensions: deps.extensions,
                timers,
                clock,
                config,
                runtime,
            }),
        })
    }

    /// Enter the running state and build a cycle. No-op when already running.
    pub fn start(&self) {
        self.inner.start();
    }

    /// Cancel everything in flight and stop. Registrations are kept.
    pub fn stop(&self) {
        self.inner.stop();
    }

    pub fn register(&self, provider: SharedProvider, mode: EnqueueMode) {
        self.inner.register(provider, mode);
    }

    /// Remove a provider and its history. Its in-flight operations run on.
    pub fn unregister(&self, identifier: &str) -> bool {
        let mut core = self.inner.lock();
        self.inner.remove_provider(&mut core, identifier)
    }

    /// Returns false if this listener instance is already registered
    pub fn add_listener(&self, listener: Arc<dyn SchedulerListener>) -> bool {
        self.inner.bus.add_listener(listener)
    }

    pub fn remove_listener(&self, listener: &Arc<dyn SchedulerListener>) -> bool {
        self.inner.bus.remove_listener(listener)
    }

    /// Channel of every notification published from now on
    pub fn subscribe(&self) -> EventReceiver {
        self.inner.bus.subscribe()
    }

    pub fn state(&self) -> SchedulerState {
        self.inner.lock().state
    }

    /// When the current wake timer is due (or the last one was)
    pub fn next_run_date(&self) -> Instant {
        self.inner.lock().next_run_date
    }

    /// Registered provider identifiers, sorted
    pub fn registered(&self) -> Vec<String> {
        self.inner.lock().registry.identifiers()
    }

    /// Providers with operations not yet finished, sorted
    pub fn in_flight(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.lock().enqueued.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn has_wake_timer(&self) -> bool {
        self.inner.lock().has_wake_timer()
    }

    /// Sleeping with no wake timer; only a registration wakes the scheduler
    pub fn is_deep_sleep(&self) -> bool {
        self.inner.lock().is_deep_sleep()
    }

    pub fn last_scheduled(&self, identifier: &str) -> Option<Instant> {
        self.inner.lock().registry.last_scheduled(identifier)
    }

    pub fn run_count(&self, identifier: &str) -> u32 {
        self.inner.lock().registry.run_count(identifier)
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    /// Stop, cancel all timers and wait for in-flight operations to unwind
    pub async fn shutdown(&self) {
        {
            let mut core = self.inner.lock();
            core.state = SchedulerState::Stopped;
            core.sleep_timer = None;
            core.expiration_timers.clear();
            self.inner.queue.cancel_all();
        }

        self.inner.queue.wait_idle().await;

        {
            let mut core = self.inner.lock();
            core.enqueued.clear();
            for (_, id) in core.granted.drain() {
                self.inner.extensions.end(id);
            }
        }
        tracing::info!("scheduler shut down");
    }

    pub(crate) fn downgrade(&self) -> WeakScheduler<C> {
        WeakScheduler {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

/// Non-owning scheduler handle for observers the scheduler itself holds
pub(crate) struct WeakScheduler<C: Clock> {
    inner: Weak<Inner<C>>,
}

impl<C: Clock> WeakScheduler<C> {
    pub(crate) fn upgrade(&self) -> Option<Scheduler<C>> {
        self.inner.upgrade().map(|inner| Scheduler { inner })
    }
}

impl<C: Clock> Inner<C> {
    fn lock(&self) -> MutexGuard<'_, Core<C>> {
        self.core.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, events: Vec<SchedulerEvent>) {
        for event in events {
            self.bus.publish(event);
        }
    }

    fn start(self: &Arc<Self>) {
        let events = {
            let mut core = self.lock();
            self.start_locked(&mut core)
        };
        self.publish(events);
    }

    fn start_locked(self: &Arc<Self>, core: &mut Core<C>) -> Vec<SchedulerEvent> {
        if core.state == SchedulerState::Running {
            return Vec::new();
        }
        tracing::info!(from = %core.state, "scheduler starting");
        core.state = SchedulerState::Running;
        core.sleep_timer = None;
        self.build_queue(core)
    }

    fn stop(&self) {
        let mut core = self.lock();
        core.state = SchedulerState::Stopped;
        core.sleep_timer = None;
        let cancelled = self.queue.cancel_all();
        tracing::info!(cancelled_chains = cancelled, "scheduler stopped");
    }

    fn sleep_locked(self: &Arc<Self>, core: &mut Core<C>) -> Vec<SchedulerEvent> {
        core.state = SchedulerState::Sleeping;
        let cancelled = self.queue.cancel_all();
        if cancelled > 0 {
            tracing::debug!(cancelled_chains = cancelled, "emptied operation queue");
        }
        self.update_sleep_timer(core);
        vec![SchedulerEvent::Sleep]
    }

    /// Re-arm the wake timer, never moving an armed wake later
    fn update_sleep_timer(self: &Arc<Self>, core: &mut Core<C>) {
        if core.state != SchedulerState::Sleeping {
            return;
        }

        let Some(interval) = core.registry.wake_interval() else {
            if core.sleep_timer.take().is_some() {
                tracing::debug!("no providers registered, entering deep sleep");
            }
            return;
        };
        let interval = interval.max(self.config.minimum_sleep);
        let now = self.clock.now();
        let proposed = now + interval;

        if core.has_wake_timer() && core.next_run_date > now && proposed > core.next_run_date {
            tracing::trace!("keeping earlier wake");
            return;
        }

        core.next_run_date = proposed;
        core.wake_generation += 1;
        let generation = core.wake_generation;
        let weak = Arc::downgrade(self);
        core.sleep_timer = Some(self.timers.schedule(
            interval,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.wake(generation);
                }
            }),
        ));
        tracing::debug!(wake_in_ms = interval.as_millis() as u64, "scheduler sleeping");
    }

    /// Wake timer callback. Only the latest timer may wake a sleeping scheduler.
    fn wake(self: &Arc<Self>, generation: u64) {
        let events = {
            let mut core = self.lock();
            if core.state != SchedulerState::Sleeping || core.wake_generation != generation {
                tracing::trace!(generation, state = %core.state, "ignoring superseded wake");
                return;
            }
            tracing::debug!("wake timer fired");
            self.start_locked(&mut core)
        };
        self.publish(events);
    }

    fn register(self: &Arc<Self>, provider: SharedProvider, mode: EnqueueMode) {
        let id = provider.identifier().to_string();
        let events = {
            let mut core = self.lock();
            if !core.registry.insert(provider, mode) {
                tracing::debug!(provider = %id, "already registered, keeping existing");
                return;
            }
            tracing::info!(provider = %id, ?mode, "registered provider");

            if core.is_deep_sleep() {
                self.start_locked(&mut core)
            } else {
                self.update_sleep_timer(&mut core);
                Vec::new()
            }
        };
        self.publish(events);
    }

    fn remove_provider(&self, core: &mut Core<C>, id: &str) -> bool {
        if core.registry.remove(id).is_none() {
            return false;
        }
        tracing::info!(provider = id, "unregistered provider");

        if core.state == SchedulerState::Sleeping
            && core.registry.is_empty()
            && core.sleep_timer.take().is_some()
        {
            tracing::debug!("no providers registered, entering deep sleep");
        }
        true
    }

    fn effective_budget(&self) -> Budget {
        match (self.host.remaining_budget(), self.config.fallback_budget) {
            (Budget::Unbounded, Some(fallback)) => Budget::Remaining(fallback),
            (budget, _) => budget,
        }
    }

    fn build_queue(self: &Arc<Self>, core: &mut Core<C>) -> Vec<SchedulerEvent> {
        if core.state != SchedulerState::Running {
            return Vec::new();
        }

        let budget = self.effective_budget();
        let conditions = self.host.conditions();
        let busy: HashSet<String> = core.enqueued.keys().cloned().collect();
        let selected = core.registry.select(budget, &conditions, &busy);

        if selected.is_empty() {
            tracing::debug!(remaining_budget = %budget, "no provider has work to do");
            return self.sleep_locked(core);
        }

        core.cycle += 1;
        let generation = core.cycle;
        let span = tracing::debug_span!("cycle", generation);
        let _guard = span.enter();

        self.queue.begin_batch();
        let mut submitted = false;
        for provider in &selected {
            submitted |= self.enqueue_provider(core, provider);
        }
        if !submitted {
            tracing::debug!("selected providers produced no operations");
            return self.sleep_locked(core);
        }

        let names: Vec<&str> = selected.iter().map(|p| p.identifier()).collect();
        tracing::info!(providers = ?names, remaining_budget = %budget, "cycle started");

        let weak = Arc::downgrade(self);
        self.queue.add_barrier(Box::new(move |progress| {
            if let Some(inner) = weak.upgrade() {
                let runtime = inner.runtime.clone();
                runtime.spawn(async move { inner.complete_cycle(generation, progress) });
            }
        }));
        Vec::new()
    }

    /// Returns false if the provider produced no operations
    fn enqueue_provider(self: &Arc<Self>, core: &mut Core<C>, provider: &SharedProvider) -> bool {
        let id = provider.identifier().to_string();
        let operations: Vec<OperationHandle> = provider
            .build_work()
            .into_iter()
            .map(OperationHandle::new)
            .collect();

        if operations.is_empty() {
            tracing::debug!(provider = %id, "provider produced no operations");
            self.finish_provider(core, provider);
            return false;
        }

        if provider.can_run_in_background() {
            let weak = Arc::downgrade(self);
            let owner = id.clone();
            let granted = self.extensions.begin(
                &id,
                Box::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        let runtime = inner.runtime.clone();
                        runtime.spawn(async move { inner.extension_expired(&owner) });
                    }
                }),
            );
            if let Some(extension) = granted {
                core.granted.insert(id.clone(), extension);
            }
        }

        tracing::trace!(provider = %id, operations = operations.len(), "enqueued operations");
        core.enqueued.insert(id, operations.clone());
        for operation in operations {
            let start = self.start_guard(provider);
            let end = self.end_guard(provider, operation.id());
            self.queue.enqueue(vec![start, operation, end]);
        }
        true
    }

    fn start_guard(self: &Arc<Self>, provider: &SharedProvider) -> OperationHandle {
        let weak = Arc::downgrade(self);
        let provider = Arc::clone(provider);
        let guard = SimpleOperation::new(format!("{}:start", provider.identifier())).on_main(
            move || {
                if let Some(inner) = weak.upgrade() {
                    inner.arm_expiration(&provider);
                }
            },
        );
        OperationHandle::new(Arc::new(guard))
    }

    fn end_guard(self: &Arc<Self>, provider: &SharedProvider, operation: OperationId) -> OperationHandle {
        let weak = Arc::downgrade(self);
        let provider = Arc::clone(provider);
        let guard = SimpleOperation::new(format!("{}:end", provider.identifier())).on_either(
            move || {
                if let Some(inner) = weak.upgrade() {
                    inner.operation_ended(&provider, operation);
                }
            },
        );
        OperationHandle::new(Arc::new(guard))
    }

    fn arm_expiration(self: &Arc<Self>, provider: &SharedProvider) {
        let id = provider.identifier();
        let mut core = self.lock();
        if core.expiration_timers.contains_key(id) || !core.enqueued.contains_key(id) {
            return;
        }

        core.armed += 1;
        let token = core.armed;
        let timeout = provider.timeout();
        let weak = Arc::downgrade(self);
        let owner = id.to_string();
        let timer = self.timers.schedule(
            timeout,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.expire_provider(&owner, token);
                }
            }),
        );
        core.expiration_timers.insert(
            id.to_string(),
            Expiration {
                token,
                _timer: timer,
            },
        );
        tracing::trace!(provider = id, timeout_ms = timeout.as_millis() as u64, "timeout armed");
    }

    /// Timeout callback for the guard armed with `token`
    fn expire_provider(&self, id: &str, token: u64) {
        {
            let core = self.lock();
            let current = core
                .expiration_timers
                .get(id)
                .is_some_and(|armed| armed.token == token);
            let Some(operations) = core.enqueued.get(id).filter(|_| current) else {
                tracing::trace!(provider = id, token, "ignoring stale timeout");
                return;
            };
            tracing::error!(
                provider = id,
                unfinished = operations.len(),
                "provider did not finish in time, cancelling its operations"
            );
            for operation in operations {
                operation.cancel();
            }
        }
        self.publish(vec![SchedulerEvent::ProviderTimedOut {
            identifier: id.to_string(),
        }]);
    }

    fn operation_ended(&self, provider: &SharedProvider, operation: OperationId) {
        let id = provider.identifier();
        let mut core = self.lock();
        let Some(remaining) = core.enqueued.get_mut(id) else {
            return;
        };
        remaining.retain(|handle| handle.id() != operation);
        tracing::trace!(provider = id, %operation, left = remaining.len(), "operation finished");

        if remaining.is_empty() {
            core.enqueued.remove(id);
            self.finish_provider(&mut core, provider);
        }
    }

    /// Release everything a provider held for this cycle
    fn finish_provider(&self, core: &mut Core<C>, provider: &SharedProvider) {
        let id = provider.identifier();
        core.expiration_timers.remove(id);
        if let Some(extension) = core.granted.remove(id) {
            self.extensions.end(extension);
        }
        let elapsed_ms = core
            .registry
            .last_scheduled(id)
            .map(|at| self.clock.now().saturating_duration_since(at).as_millis() as u64);
        tracing::debug!(provider = id, elapsed_ms, "provider work complete");

        if !provider.should_repeat() && core.registry.is_current(provider) {
            self.remove_provider(core, id);
        }
    }

    fn extension_expired(self: &Arc<Self>, id: &str) {
        let events = {
            let mut core = self.lock();
            if let Some(extension) = core.granted.remove(id) {
                self.extensions.end(extension);
            }
            if core.state != SchedulerState::Running {
                return;
            }
            tracing::warn!(provider = id, "background time expired, going to sleep");
            self.sleep_locked(&mut core)
        };
        self.publish(events);
    }

    fn complete_cycle(self: &Arc<Self>, generation: u64, progress: Progress) {
        {
            let mut core = self.lock();
            if core.cycle != generation {
                tracing::trace!(generation, "stale cycle barrier");
                return;
            }
            if !progress.is_finished() {
                tracing::error!(
                    completed = progress.completed,
                    total = progress.total,
                    "progress mismatch: operations left unfinished, \
                     make sure every operation returns once cancelled"
                );
            }
            core.expiration_timers.clear();
            core.enqueued.clear();
            for (_, extension) in core.granted.drain() {
                self.extensions.end(extension);
            }
            tracing::debug!(generation, "cycle complete");
        }
        self.publish(vec![SchedulerEvent::CycleComplete]);

        let events = {
            let mut core = self.lock();
            if core.cycle != generation {
                return;
            }
            self.build_queue(&mut core)
        };
        self.publish(events);
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
