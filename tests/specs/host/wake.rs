//! Host integration: wake requests, extensions and configuration

use crate::prelude::*;
use cadence_adapters::{
    ExtensionCall, FakeWakeRegistrar, FakeWakeTask, TracedExtensions, TracedHost, WakeCall,
};
use cadence_engine::HostController;
use std::sync::Arc;
use std::time::Duration;

const CONFIG: &str = r#"
max_concurrent_operations = 2
minimum_sleep = "2s"
"#;

fn traced_scheduler(host: &FakeHost, extensions: &FakeExtensions) -> Scheduler {
    let config = SchedulerConfig::from_toml_str(CONFIG).unwrap();
    let deps = SchedulerDeps::new(TracedHost::new(host.clone()))
        .with_extensions(TracedExtensions::new(extensions.clone()));
    Scheduler::new(deps, config).unwrap()
}

#[tokio::test(start_paused = true)]
async fn background_wake_runs_due_work_and_reschedules() {
    let host = FakeHost::new();
    host.set_remaining(Duration::from_secs(30));
    let extensions = FakeExtensions::new();
    let log = RunLog::new();
    let scheduler = traced_scheduler(&host, &extensions);
    scheduler.register(
        Provider::recording("refresh", &log)
            .every(Duration::from_secs(900))
            .shared(),
        EnqueueMode::Keep,
    );

    let registrar = FakeWakeRegistrar::new();
    let controller = HostController::new(scheduler.clone(), Arc::new(registrar.clone()));
    let mut rx = scheduler.subscribe();

    controller.enter_background().unwrap();
    let task = FakeWakeTask::new();
    controller.handle_wake(Box::new(task.clone()));
    wait_for(&mut rx, SchedulerEvent::Sleep).await;

    assert_eq!(log.count("refresh"), 1);
    assert_eq!(task.completion(), Some(true));
    assert_eq!(
        registrar.last_submitted(),
        Some(scheduler.next_run_date())
    );
    assert!(matches!(
        extensions.calls().as_slice(),
        [ExtensionCall::Begin { id: Some(_), .. }, ExtensionCall::End { .. }]
    ));

    controller.enter_foreground();
    assert_eq!(registrar.calls().last(), Some(&WakeCall::Cancel));
}

#[tokio::test(start_paused = true)]
async fn revoked_wake_window_stops_the_scheduler() {
    let host = FakeHost::new();
    let extensions = FakeExtensions::new();
    let op = Arc::new(Stuck::default());
    let scheduler = traced_scheduler(&host, &extensions);
    scheduler.register(Provider::stuck("sync", &op).shared(), EnqueueMode::Keep);
    let controller = HostController::new(scheduler.clone(), Arc::new(FakeWakeRegistrar::new()));

    let task = FakeWakeTask::new();
    controller.handle_wake(Box::new(task.clone()));
    eventually(|| op.started.load(std::sync::atomic::Ordering::SeqCst) == 1).await;
    controller.handle_expiration();

    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    assert_eq!(task.completion(), Some(false));
    eventually(|| extensions.active_providers().is_empty()).await;
}

#[tokio::test(start_paused = true)]
async fn configured_minimum_sleep_bounds_wake_interval() {
    let host = FakeHost::new();
    let extensions = FakeExtensions::new();
    let scheduler = traced_scheduler(&host, &extensions);
    let mut rx = scheduler.subscribe();
    let log = RunLog::new();
    scheduler.register(
        Provider::recording("eager", &log)
            .every(Duration::ZERO)
            .requires(Condition::custom("never", |_| false))
            .shared(),
        EnqueueMode::Keep,
    );
    let began = tokio::time::Instant::now();

    scheduler.start();
    wait_for(&mut rx, SchedulerEvent::Sleep).await;
    wait_for(&mut rx, SchedulerEvent::Sleep).await;

    assert_eq!(scheduler.config().minimum_sleep, Duration::from_secs(2));
    assert!(began.elapsed() >= Duration::from_secs(2));
    assert_eq!(log.count("eager"), 0);
}
