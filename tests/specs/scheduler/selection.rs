//! Eligibility: fairness, budget and conditions

use crate::prelude::*;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn constrained_budget_rotates_providers() {
    let host = FakeHost::new();
    host.set_remaining(Duration::from_secs(4));
    let log = RunLog::new();
    let scheduler = scheduler_with_host(&host);
    let mut rx = scheduler.subscribe();
    for id in ["alpha", "bravo", "charlie"] {
        scheduler.register(
            Provider::recording(id, &log)
                .estimate(Duration::from_secs(3))
                .every(Duration::ZERO)
                .shared(),
            EnqueueMode::Keep,
        );
    }

    scheduler.start();
    for _ in 0..6 {
        wait_for(&mut rx, SchedulerEvent::CycleComplete).await;
    }
    scheduler.stop();

    let order = log.order();
    assert_eq!(
        &order[..6],
        &["alpha", "bravo", "charlie", "alpha", "bravo", "charlie"]
    );
}

#[tokio::test(start_paused = true)]
async fn exhausted_budget_puts_scheduler_to_sleep() {
    let host = FakeHost::new();
    host.set_remaining(Duration::ZERO);
    let log = RunLog::new();
    let scheduler = scheduler_with_host(&host);
    let mut rx = scheduler.subscribe();
    scheduler.register(
        Provider::recording("tiny", &log)
            .estimate(Duration::ZERO)
            .shared(),
        EnqueueMode::Keep,
    );

    scheduler.start();
    wait_for(&mut rx, SchedulerEvent::Sleep).await;

    assert_eq!(log.count("tiny"), 0);
    assert_eq!(scheduler.state(), SchedulerState::Sleeping);
}

#[tokio::test(start_paused = true)]
async fn unmet_condition_skips_provider_without_recording_it() {
    let host = FakeHost::new();
    host.set_network(NetworkStatus::Unsatisfied);
    let log = RunLog::new();
    let scheduler = scheduler_with_host(&host);
    let mut rx = scheduler.subscribe();
    scheduler.register(
        Provider::recording("upload", &log)
            .requires(Condition::NetworkStatus(NetworkStatus::Satisfied))
            .shared(),
        EnqueueMode::Keep,
    );
    scheduler.register(Provider::recording("local", &log).shared(), EnqueueMode::Keep);

    scheduler.start();
    wait_for(&mut rx, SchedulerEvent::CycleComplete).await;

    assert_eq!(log.count("local"), 1);
    assert_eq!(log.count("upload"), 0);
    assert_eq!(scheduler.last_scheduled("upload"), None);
    assert!(scheduler.last_scheduled("local").is_some());
}

#[tokio::test(start_paused = true)]
async fn battery_condition_uses_fresh_readings() {
    let host = FakeHost::new();
    host.set_battery(Some(10.0));
    let log = RunLog::new();
    let scheduler = scheduler_with_host(&host);
    let mut rx = scheduler.subscribe();
    scheduler.register(
        Provider::recording("backup", &log)
            .requires(Condition::MinimumBatteryLevel(50.0))
            .every(Duration::from_secs(60))
            .shared(),
        EnqueueMode::Keep,
    );

    scheduler.start();
    wait_for(&mut rx, SchedulerEvent::Sleep).await;
    assert_eq!(log.count("backup"), 0);

    host.set_battery(Some(75.0));
    wait_for(&mut rx, SchedulerEvent::CycleComplete).await;
    assert_eq!(log.count("backup"), 1);
}
