// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multicast of scheduler notifications

use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

/// Notifications emitted by the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// Every operation of a cycle finished and bookkeeping was reset
    CycleComplete,
    /// No provider had obtainable work; the scheduler went to sleep
    Sleep,
    /// A provider's batch outlived its timeout and was cancelled
    ProviderTimedOut { identifier: String },
}

impl SchedulerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SchedulerEvent::CycleComplete => "cycle:complete",
            SchedulerEvent::Sleep => "scheduler:sleep",
            SchedulerEvent::ProviderTimedOut { .. } => "provider:timeout",
        }
    }
}

/// Observer of scheduler notifications
///
/// Callbacks run on whichever task produced the event, never while the
/// scheduler's internal lock is held, so they may call back into it.
pub trait SchedulerListener: Send + Sync {
    fn on_cycle_complete(&self) {}
    fn on_sleep(&self) {}
    fn on_provider_timeout(&self, _identifier: &str) {}
}

/// Sender for event delivery
pub type EventSender = mpsc::UnboundedSender<SchedulerEvent>;
/// Receiver for event delivery
pub type EventReceiver = mpsc::UnboundedReceiver<SchedulerEvent>;

/// Routes scheduler events to listeners and channel subscribers
pub struct ListenerBus {
    listeners: Arc<RwLock<Vec<Arc<dyn SchedulerListener>>>>,
    subscribers: Arc<RwLock<Vec<EventSender>>>,
}

impl ListenerBus {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(RwLock::new(Vec::new())),
            subscribers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register a listener. Returns false if this instance is already registered.
    pub fn add_listener(&self, listener: Arc<dyn SchedulerListener>) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        if listeners.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Remove a listener by identity. Returns false if it was not registered.
    pub fn remove_listener(&self, listener: &Arc<dyn SchedulerListener>) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        let before = listeners.len();
        listeners.retain(|l| !same_listener(l, listener));
        listeners.len() != before
    }

    /// Receive every event published from now on
    pub fn subscribe(&self) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }

    /// Deliver an event to all listeners and subscribers
    pub fn publish(&self, event: SchedulerEvent) {
        tracing::trace!(event = event.name(), "publishing");

        // Snapshot so callbacks can add or remove listeners
        let listeners: Vec<_> = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for listener in &listeners {
            match &event {
                SchedulerEvent::CycleComplete => listener.on_cycle_complete(),
                SchedulerEvent::Sleep => listener.on_sleep(),
                SchedulerEvent::ProviderTimedOut { identifier } => {
                    listener.on_provider_timeout(identifier)
                }
            }
        }

        let mut subscribers = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Get count of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Get count of live channel subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }
}

fn same_listener(a: &Arc<dyn SchedulerListener>, b: &Arc<dyn SchedulerListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl Default for ListenerBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ListenerBus {
    fn clone(&self) -> Self {
        Self {
            listeners: Arc::clone(&self.listeners),
            subscribers: Arc::clone(&self.subscribers),
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
