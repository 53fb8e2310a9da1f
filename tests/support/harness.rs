//! A scheduler wired to scripted collaborators and a real batch directory.

use std::sync::Arc;
use std::time::Duration;

use bankwatch::adapter::outbound::store::JsonBatchStore;
use bankwatch::application::{
    DedupSettings, DedupStore, Forwarder, ForwarderSettings, Scheduler, SchedulerSettings,
    SessionHandle, SessionSettings,
};
use bankwatch::domain::order::{DEFAULT_ORDER_DIGITS, DEFAULT_ORDER_PREFIX};
use bankwatch::domain::{BusinessTime, OrderReferencePattern};
use bankwatch::port::{BatchStore, OrderGateway};
use bankwatch::testkit::clock::FakeClock;
use bankwatch::testkit::domain::{business_instant, credentials};
use bankwatch::testkit::fetcher::ScriptedFetcher;
use bankwatch::testkit::notifier::RecordingNotifier;
use bankwatch::testkit::order::RecordingOrders;
use bankwatch::testkit::portal::{FixedSolver, ScriptedDriver};
use tempfile::TempDir;

pub struct Harness {
    pub dir: TempDir,
    pub clock: Arc<FakeClock>,
    pub driver: Arc<ScriptedDriver>,
    pub fetcher: Arc<ScriptedFetcher>,
    pub notifier: Arc<RecordingNotifier>,
    pub orders: Arc<RecordingOrders>,
    pub store: Arc<JsonBatchStore>,
}

impl Harness {
    /// Collaborators starting at 09:00 business time.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = Arc::new(JsonBatchStore::open(dir.path(), "transactions").expect("store"));
        Self {
            dir,
            clock: Arc::new(FakeClock::new(business_instant("2025-06-05 09:00:00"))),
            driver: Arc::new(ScriptedDriver::new()),
            fetcher: Arc::new(ScriptedFetcher::new()),
            notifier: Arc::new(RecordingNotifier::new()),
            orders: Arc::new(RecordingOrders::new()),
            store,
        }
    }

    pub fn dedup(&self) -> DedupStore {
        let store: Arc<dyn BatchStore> = self.store.clone();
        DedupStore::new(store, BusinessTime::default(), DedupSettings::default())
    }

    pub fn scheduler(&self, with_orders: bool) -> Scheduler {
        let session = SessionHandle::new(
            self.driver.clone(),
            Arc::new(FixedSolver::new("ABC12")),
            self.clock.clone(),
            SessionSettings::default(),
        );
        let orders: Option<Arc<dyn OrderGateway>> = if with_orders {
            Some(self.orders.clone())
        } else {
            None
        };
        let forwarder = Forwarder::new(
            self.notifier.clone(),
            orders,
            OrderReferencePattern::new(DEFAULT_ORDER_PREFIX, DEFAULT_ORDER_DIGITS)
                .expect("pattern"),
            self.clock.clone(),
            ForwarderSettings::default(),
        );
        Scheduler::new(
            session,
            self.fetcher.clone(),
            self.dedup(),
            forwarder,
            self.clock.clone(),
            credentials(),
            SchedulerSettings::default(),
        )
    }

    /// Batch files currently on disk.
    pub fn batch_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir.path())
            .expect("read dir")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".json"))
            .collect();
        names.sort();
        names
    }

    pub fn advance_secs(&self, secs: u64) {
        self.clock.advance(Duration::from_secs(secs));
    }
}
