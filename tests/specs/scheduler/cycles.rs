//! Cycle construction: one-shot, repeating and overlapping work

use crate::prelude::*;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn one_shot_provider_runs_exactly_once() {
    let log = RunLog::new();
    let scheduler = scheduler();
    let mut rx = scheduler.subscribe();
    scheduler.register(Provider::recording("once", &log).once().shared(), EnqueueMode::Keep);
    scheduler.register(
        Provider::recording("tick", &log)
            .every(Duration::from_secs(2))
            .shared(),
        EnqueueMode::Keep,
    );

    scheduler.start();
    for _ in 0..5 {
        wait_for(&mut rx, SchedulerEvent::CycleComplete).await;
    }

    assert_eq!(log.count("once"), 1);
    assert!(log.count("tick") >= 5);
    assert_eq!(scheduler.registered(), vec!["tick"]);
}

#[tokio::test(start_paused = true)]
async fn repeating_provider_honors_its_frequency() {
    let log = RunLog::new();
    let scheduler = scheduler();
    let mut rx = scheduler.subscribe();
    scheduler.register(
        Provider::recording("sync", &log)
            .every(Duration::from_secs(2))
            .shared(),
        EnqueueMode::Keep,
    );
    let began = tokio::time::Instant::now();

    scheduler.start();
    wait_for(&mut rx, SchedulerEvent::CycleComplete).await;
    assert_eq!(log.count("sync"), 1);

    tokio::time::advance(Duration::from_millis(1900)).await;
    tokio::task::yield_now().await;
    assert_eq!(log.count("sync"), 1);

    wait_for(&mut rx, SchedulerEvent::CycleComplete).await;
    let times = log.times("sync");
    assert_eq!(times.len(), 2);
    assert_eq!(times[0], began);
    assert!(times[1] - times[0] >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn provider_is_never_in_flight_twice() {
    let op = Arc::new(Stuck::default());
    let scheduler = scheduler();
    scheduler.register(
        Provider::stuck("slow", &op).every(Duration::ZERO).shared(),
        EnqueueMode::Keep,
    );
    scheduler.start();
    eventually(|| op.started.load(Ordering::SeqCst) == 1).await;

    // Re-registration and restarts while the batch is still in flight
    scheduler.register(
        Provider::stuck("slow", &op).every(Duration::ZERO).shared(),
        EnqueueMode::Replace,
    );
    scheduler.stop();
    scheduler.start();
    scheduler.start();

    assert_eq!(op.started.load(Ordering::SeqCst), 1);
    assert!(scheduler.in_flight().len() <= 1);
    eventually(|| scheduler.in_flight().is_empty()).await;
    assert_eq!(op.started.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn new_cycle_waits_for_the_previous_batch() {
    let log = RunLog::new();
    let op = Arc::new(Stuck::default());
    let scheduler = scheduler();
    let mut rx = scheduler.subscribe();
    scheduler.register(
        Provider::stuck("slow", &op)
            .timeout(Duration::from_secs(5))
            .shared(),
        EnqueueMode::Keep,
    );
    scheduler.register(
        Provider::recording("fast", &log)
            .every(Duration::ZERO)
            .shared(),
        EnqueueMode::Keep,
    );

    scheduler.start();
    tokio::time::sleep(Duration::from_secs(4)).await;
    // "fast" is always due but its next cycle waits on "slow"
    assert_eq!(log.count("fast"), 1);

    wait_for(&mut rx, SchedulerEvent::CycleComplete).await;
    eventually(|| log.count("fast") == 2).await;
}
