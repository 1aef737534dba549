// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bridge between host lifecycle signals and the scheduler
//!
//! Going to the background submits a wake request for the scheduler's next
//! run date. When the host wakes the process, the scheduler is started and
//! the host's wake task is completed as soon as the scheduler sleeps again.

use crate::scheduler::{Scheduler, WeakScheduler};
use cadence_adapters::{WakeError, WakeRegistrar, WakeTask};
use cadence_core::{Clock, SchedulerListener, SystemClock};
use std::sync::{Arc, Mutex};

type ActiveTask = Arc<Mutex<Option<Box<dyn WakeTask>>>>;

struct WakeBridge<C: Clock> {
    scheduler: WeakScheduler<C>,
    registrar: Arc<dyn WakeRegistrar>,
    active: ActiveTask,
}

impl<C: Clock> SchedulerListener for WakeBridge<C> {
    fn on_sleep(&self) {
        let task = self.active.lock().unwrap_or_else(|e| e.into_inner()).take();
        let Some(task) = task else {
            return;
        };

        tracing::info!("scheduler asleep, completing wake task");
        task.complete(true);

        let Some(scheduler) = self.scheduler.upgrade() else {
            return;
        };
        if let Err(e) = submit(self.registrar.as_ref(), &scheduler) {
            tracing::error!(error = %e, "could not request the next wake after sleeping");
        }
    }

    fn on_provider_timeout(&self, identifier: &str) {
        tracing::warn!(provider = identifier, "provider timed out during wake");
    }
}

fn submit<C: Clock>(
    registrar: &dyn WakeRegistrar,
    scheduler: &Scheduler<C>,
) -> Result<(), WakeError> {
    registrar.submit(scheduler.next_run_date())?;
    tracing::debug!("wake request submitted");
    Ok(())
}

/// Drives a scheduler from host foreground/background transitions
pub struct HostController<C: Clock = SystemClock> {
    scheduler: Scheduler<C>,
    registrar: Arc<dyn WakeRegistrar>,
    active: ActiveTask,
    listener: Arc<dyn SchedulerListener>,
}

impl<C: Clock> HostController<C> {
    pub fn new(scheduler: Scheduler<C>, registrar: Arc<dyn WakeRegistrar>) -> Self {
        let active: ActiveTask = Arc::new(Mutex::new(None));
        let listener: Arc<dyn SchedulerListener> = Arc::new(WakeBridge {
            scheduler: scheduler.downgrade(),
            registrar: Arc::clone(&registrar),
            active: Arc::clone(&active),
        });
        scheduler.add_listener(Arc::clone(&listener));

        Self {
            scheduler,
            registrar,
            active,
            listener,
        }
    }

    pub fn scheduler(&self) -> &Scheduler<C> {
        &self.scheduler
    }

    /// Ask the host to wake the process at the scheduler's next run date
    pub fn enter_background(&self) -> Result<(), WakeError> {
        tracing::info!("entering background");
        submit(self.registrar.as_ref(), &self.scheduler).inspect_err(|e| {
            tracing::error!(error = %e, "could not submit wake request");
        })
    }

    /// Pending wake requests are pointless while in the foreground
    pub fn enter_foreground(&self) {
        tracing::info!("entering foreground");
        self.registrar.cancel();
    }

    /// The host woke the process; run until the scheduler sleeps
    pub fn handle_wake(&self, task: Box<dyn WakeTask>) {
        tracing::info!("handling wake");
        let previous = self
            .active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(task);
        if let Some(previous) = previous {
            previous.complete(false);
        }
        self.scheduler.start();
    }

    /// The host revoked the wake window
    pub fn handle_expiration(&self) {
        tracing::warn!("wake window expired, stopping scheduler");
        self.scheduler.stop();
        let task = self.active.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(task) = task {
            task.complete(false);
        }
    }

    pub fn has_active_task(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

impl<C: Clock> Drop for HostController<C> {
    fn drop(&mut self) {
        self.scheduler.remove_listener(&self.listener);
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
