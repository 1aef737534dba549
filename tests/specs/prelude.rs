//! Shared helpers for scheduler specs

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub use cadence_adapters::{FakeExtensions, FakeHost};
pub use cadence_core::{
    Condition, EnqueueMode, EventReceiver, NetworkStatus, Operation, SchedulerConfig,
    SchedulerEvent, SharedProvider, WorkProvider,
};
pub use cadence_engine::{Scheduler, SchedulerDeps, SchedulerState};

/// Generous upper bound for anything awaited on the paused clock
const PATIENCE: Duration = Duration::from_secs(24 * 3600);

/// Shared record of which provider ran, and when
#[derive(Clone, Default)]
pub struct RunLog {
    entries: Arc<Mutex<Vec<(String, Instant)>>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, id: &str) {
        self.entries
            .lock()
            .unwrap()
            .push((id.to_string(), Instant::now()));
    }

    pub fn order(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn times(&self, id: &str) -> Vec<Instant> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(who, _)| who == id)
            .map(|(_, at)| *at)
            .collect()
    }

    pub fn count(&self, id: &str) -> usize {
        self.times(id).len()
    }
}

/// Operation that records itself in a [`RunLog`] and finishes at once
struct Record {
    id: String,
    log: RunLog,
}

#[async_trait]
impl Operation for Record {
    async fn run(&self, _cancel: CancellationToken) {
        self.log.record(&self.id);
    }
}

/// Operation that never finishes unless cancelled
#[derive(Default)]
pub struct Stuck {
    pub started: AtomicUsize,
    pub cancelled: AtomicUsize,
}

#[async_trait]
impl Operation for Stuck {
    async fn run(&self, _cancel: CancellationToken) {
        self.started.fetch_add(1, Ordering::SeqCst);
        std::future::pending::<()>().await;
    }

    fn cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
    }
}

enum Work {
    Record(RunLog),
    Stuck(Arc<Stuck>),
}

/// Configurable provider used across specs
pub struct Provider {
    id: String,
    estimate: Duration,
    timeout: Duration,
    frequency: Duration,
    repeat: bool,
    conditions: Vec<Condition>,
    work: Work,
}

impl Provider {
    pub fn recording(id: &str, log: &RunLog) -> Self {
        Self::with_work(id, Work::Record(log.clone()))
    }

    pub fn stuck(id: &str, op: &Arc<Stuck>) -> Self {
        Self::with_work(id, Work::Stuck(Arc::clone(op)))
    }

    fn with_work(id: &str, work: Work) -> Self {
        Self {
            id: id.to_string(),
            estimate: Duration::from_secs(1),
            timeout: Duration::from_secs(60),
            frequency: Duration::from_secs(3600),
            repeat: true,
            conditions: Vec::new(),
            work,
        }
    }

    pub fn estimate(mut self, estimate: Duration) -> Self {
        self.estimate = estimate;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn every(mut self, frequency: Duration) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn once(mut self) -> Self {
        self.repeat = false;
        self
    }

    pub fn requires(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn shared(self) -> SharedProvider {
        Arc::new(self)
    }
}

impl WorkProvider for Provider {
    fn identifier(&self) -> &str {
        &self.id
    }

    fn estimated_work_time(&self) -> Duration {
        self.estimate
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn desired_frequency(&self) -> Duration {
        self.frequency
    }

    fn should_repeat(&self) -> bool {
        self.repeat
    }

    fn conditions(&self) -> Vec<Condition> {
        self.conditions.clone()
    }

    fn build_work(&self) -> Vec<Arc<dyn Operation>> {
        let op: Arc<dyn Operation> = match &self.work {
            Work::Record(log) => Arc::new(Record {
                id: self.id.clone(),
                log: log.clone(),
            }),
            Work::Stuck(op) => Arc::clone(op) as Arc<dyn Operation>,
        };
        vec![op]
    }
}

pub fn scheduler() -> Scheduler {
    Scheduler::new(SchedulerDeps::default(), SchedulerConfig::default()).unwrap()
}

pub fn scheduler_with_host(host: &FakeHost) -> Scheduler {
    Scheduler::new(SchedulerDeps::new(host.clone()), SchedulerConfig::default()).unwrap()
}

/// Wait for a specific notification, skipping others
pub async fn wait_for(rx: &mut EventReceiver, want: SchedulerEvent) {
    tokio::time::timeout(PATIENCE, async {
        while let Some(event) = rx.recv().await {
            if event == want {
                return;
            }
        }
        panic!("event channel closed");
    })
    .await
    .expect("timed out waiting for event");
}

/// Poll a condition, letting spawned work progress between checks
pub async fn eventually(mut check: impl FnMut() -> bool) {
    for _ in 0..100 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition never held");
}
