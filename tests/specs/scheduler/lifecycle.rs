//! Start, stop, and deep sleep

use crate::prelude::*;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn start_while_running_keeps_history() {
    let op = Arc::new(Stuck::default());
    let scheduler = scheduler();
    scheduler.register(Provider::stuck("sync", &op).shared(), EnqueueMode::Keep);

    scheduler.start();
    eventually(|| op.started.load(Ordering::SeqCst) == 1).await;
    let scheduled = scheduler.last_scheduled("sync");

    tokio::time::advance(Duration::from_secs(1)).await;
    scheduler.start();
    tokio::task::yield_now().await;

    assert_eq!(scheduler.state(), SchedulerState::Running);
    assert_eq!(scheduler.last_scheduled("sync"), scheduled);
    assert_eq!(scheduler.run_count("sync"), 1);
    assert_eq!(scheduler.in_flight(), vec!["sync"]);
    assert_eq!(op.started.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn empty_scheduler_settles_in_deep_sleep() {
    let scheduler = scheduler();

    scheduler.start();

    assert_eq!(scheduler.state(), SchedulerState::Sleeping);
    assert!(!scheduler.has_wake_timer());
    assert!(scheduler.is_deep_sleep());
}

#[tokio::test(start_paused = true)]
async fn registration_wakes_deep_sleep_immediately() {
    let log = RunLog::new();
    let scheduler = scheduler();
    scheduler.start();
    assert!(scheduler.is_deep_sleep());

    scheduler.register(Provider::recording("new", &log).shared(), EnqueueMode::Keep);

    assert_eq!(scheduler.state(), SchedulerState::Running);
    eventually(|| log.count("new") == 1).await;
}

#[tokio::test(start_paused = true)]
async fn stop_keeps_registrations_for_a_later_start() {
    let log = RunLog::new();
    let scheduler = scheduler();
    let mut rx = scheduler.subscribe();
    scheduler.register(
        Provider::recording("daily", &log)
            .every(Duration::from_secs(10))
            .shared(),
        EnqueueMode::Keep,
    );
    scheduler.start();
    wait_for(&mut rx, SchedulerEvent::Sleep).await;

    scheduler.stop();
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    assert!(!scheduler.has_wake_timer());

    // No wake while stopped
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(log.count("daily"), 1);

    scheduler.start();
    wait_for(&mut rx, SchedulerEvent::CycleComplete).await;
    assert_eq!(log.count("daily"), 2);
    assert_eq!(scheduler.registered(), vec!["daily"]);
}

#[tokio::test(start_paused = true)]
async fn shutdown_leaves_nothing_running() {
    let op = Arc::new(Stuck::default());
    let scheduler = scheduler();
    scheduler.register(Provider::stuck("stuck", &op).shared(), EnqueueMode::Keep);
    scheduler.start();
    eventually(|| op.started.load(Ordering::SeqCst) == 1).await;

    scheduler.shutdown().await;

    assert_eq!(op.cancelled.load(Ordering::SeqCst), 1);
    assert!(scheduler.in_flight().is_empty());
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
}
