//! Per-provider timeouts

use crate::prelude::*;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn stuck_work_is_cancelled_at_its_timeout() {
    let op = Arc::new(Stuck::default());
    let log = RunLog::new();
    let scheduler = scheduler();
    let mut rx = scheduler.subscribe();
    scheduler.register(
        Provider::stuck("stuck", &op)
            .timeout(Duration::from_secs(2))
            .shared(),
        EnqueueMode::Keep,
    );
    scheduler.register(Provider::recording("other", &log).shared(), EnqueueMode::Keep);
    let began = tokio::time::Instant::now();

    scheduler.start();
    wait_for(
        &mut rx,
        SchedulerEvent::ProviderTimedOut {
            identifier: "stuck".to_string(),
        },
    )
    .await;
    let elapsed = began.elapsed();
    assert!(elapsed >= Duration::from_secs(2));
    assert!(elapsed < Duration::from_millis(2100));

    wait_for(&mut rx, SchedulerEvent::CycleComplete).await;
    assert_eq!(op.cancelled.load(Ordering::SeqCst), 1);
    assert_eq!(log.count("other"), 1);
    assert!(scheduler.in_flight().is_empty());
}

#[tokio::test(start_paused = true)]
async fn timeout_only_cancels_the_late_provider() {
    let slow = Arc::new(Stuck::default());
    let slower = Arc::new(Stuck::default());
    let scheduler = scheduler();
    let mut rx = scheduler.subscribe();
    scheduler.register(
        Provider::stuck("slow", &slow)
            .timeout(Duration::from_secs(1))
            .shared(),
        EnqueueMode::Keep,
    );
    scheduler.register(
        Provider::stuck("slower", &slower)
            .timeout(Duration::from_secs(30))
            .shared(),
        EnqueueMode::Keep,
    );

    scheduler.start();
    wait_for(
        &mut rx,
        SchedulerEvent::ProviderTimedOut {
            identifier: "slow".to_string(),
        },
    )
    .await;
    eventually(|| slow.cancelled.load(Ordering::SeqCst) == 1).await;

    assert_eq!(slower.cancelled.load(Ordering::SeqCst), 0);
    assert_eq!(scheduler.in_flight(), vec!["slower"]);
}

#[tokio::test(start_paused = true)]
async fn one_shot_provider_is_removed_even_when_killed() {
    let op = Arc::new(Stuck::default());
    let scheduler = scheduler();
    let mut rx = scheduler.subscribe();
    scheduler.register(
        Provider::stuck("once", &op)
            .once()
            .timeout(Duration::from_secs(1))
            .shared(),
        EnqueueMode::Keep,
    );

    scheduler.start();
    wait_for(&mut rx, SchedulerEvent::CycleComplete).await;

    assert!(scheduler.registered().is_empty());
    assert_eq!(op.started.load(Ordering::SeqCst), 1);
}
