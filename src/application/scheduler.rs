//! Top-level polling loop.
//!
//! ```text
//! Running ──fetch due──▶ fetch → record → compare → forward → prune ──▶ Running
//! Running ──health dead / session expired / loop error──▶ AwaitingRecovery
//! AwaitingRecovery ──cooldown elapsed──▶ one restart ──▶ Running | Fatal
//! Running ──restart interval──▶ restart ──▶ Running | Fatal
//! ```
//!
//! Each call to [`Scheduler::tick`] runs one iteration and reports what it
//! did as a [`TickOutcome`]. [`Scheduler::run`] drives ticks until shutdown
//! or a fatal outcome, and always tears the session down on the way out.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::domain::{BatchStatus, NewBatch};
use crate::error::{Error, LoginFailure, Result};
use crate::port::{Clock, Credentials, FetchResult, FetchStatus, TransactionFetcher};

use super::dedup::DedupStore;
use super::forwarder::Forwarder;
use super::session::{SessionHandle, SessionHealth};

/// Loop cadence.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Minimum time between two fetch cycles.
    pub fetch_interval: Duration,
    /// Delay before retrying after a failed fetch.
    pub fetch_retry: Duration,
    /// Proactive session restart period.
    pub restart_interval: Duration,
    /// Time between health checks.
    pub health_interval: Duration,
    /// Mandatory wait before the single recovery attempt.
    pub recovery_cooldown: Duration,
    /// Settle time after a successful recovery.
    pub post_recovery_pause: Duration,
    /// Sleep between loop iterations.
    pub poll_interval: Duration,
    /// Time between "still running" log lines.
    pub heartbeat_interval: Duration,
    /// Page limit passed to the fetcher.
    pub max_pages: u32,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            fetch_interval: Duration::from_secs(20),
            fetch_retry: Duration::from_secs(5),
            restart_interval: Duration::from_secs(10 * 60),
            health_interval: Duration::from_secs(10),
            recovery_cooldown: Duration::from_secs(180),
            post_recovery_pause: Duration::from_secs(10),
            poll_interval: Duration::from_millis(500),
            heartbeat_interval: Duration::from_secs(5 * 60),
            max_pages: 5,
        }
    }
}

/// Why the loop is waiting to recover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryCause {
    /// Health check found the session logged out.
    SessionDead,
    /// The fetcher reported an expired session.
    SessionExpired,
    /// A loop iteration failed unexpectedly.
    LoopError(String),
}

impl fmt::Display for RecoveryCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionDead => write!(f, "session health check failed"),
            Self::SessionExpired => write!(f, "session expired during fetch"),
            Self::LoopError(detail) => write!(f, "loop error: {detail}"),
        }
    }
}

/// Which path ended the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalKind {
    InitialLogin,
    Restart,
    Recovery,
}

impl fmt::Display for FatalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitialLogin => write!(f, "initial login"),
            Self::Restart => write!(f, "scheduled restart"),
            Self::Recovery => write!(f, "session recovery"),
        }
    }
}

/// A failure that stops the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalError {
    pub kind: FatalKind,
    /// Login reason code, when a login failure caused it.
    pub reason_code: Option<&'static str>,
    pub detail: String,
}

impl FatalError {
    fn login(kind: FatalKind, failure: &LoginFailure) -> Self {
        Self {
            kind,
            reason_code: Some(failure.reason_code()),
            detail: failure.to_string(),
        }
    }
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason_code {
            Some(code) => write!(f, "{} failed ({code}): {}", self.kind, self.detail),
            None => write!(f, "{} failed: {}", self.kind, self.detail),
        }
    }
}

/// Loop phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Running,
    AwaitingRecovery {
        since: DateTime<Utc>,
        cause: RecoveryCause,
    },
    Fatal(FatalError),
}

/// Mutable loop state, owned by one [`Scheduler`].
#[derive(Debug, Clone)]
pub struct SchedulerState {
    pub phase: Phase,
    pub started_at: DateTime<Utc>,
    pub session_started_at: Option<DateTime<Utc>>,
    pub last_fetch: Option<DateTime<Utc>>,
    /// The last fetch failed; the next one uses the retry delay.
    pub last_fetch_failed: bool,
    pub last_health: Option<DateTime<Utc>>,
    pub last_heartbeat: DateTime<Utc>,
    /// Set while a fetch cycle runs.
    pub fetch_in_flight: bool,
    pub cycles: u64,
    pub forwarded: u64,
    pub restarts: u64,
    pub recoveries: u64,
}

impl SchedulerState {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            phase: Phase::Running,
            started_at: now,
            session_started_at: None,
            last_fetch: None,
            last_fetch_failed: false,
            last_health: None,
            last_heartbeat: now,
            fetch_in_flight: false,
            cycles: 0,
            forwarded: 0,
            restarts: 0,
            recoveries: 0,
        }
    }
}

/// What one iteration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing was due.
    Idle,
    Fetched { new: usize, notified: usize },
    /// Fetch failed; a marker batch was recorded and a retry is scheduled.
    FetchFailed { message: String },
    Restarted,
    RecoveryScheduled { cause: RecoveryCause },
    CoolingDown { remaining: Duration },
    /// Session is back; the loop settles for `pause` before the next tick.
    Recovered { pause: Duration },
    Fatal(FatalError),
}

/// How [`Scheduler::run`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitStatus {
    /// Stopped by a shutdown signal.
    Graceful,
    Fatal(FatalError),
}

impl ExitStatus {
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::Graceful => 0,
            Self::Fatal(_) => 1,
        }
    }
}

/// Drives session lifecycle, fetching, deduplication and forwarding.
pub struct Scheduler {
    session: SessionHandle,
    fetcher: Arc<dyn TransactionFetcher>,
    dedup: DedupStore,
    forwarder: Forwarder,
    clock: Arc<dyn Clock>,
    credentials: Credentials,
    settings: SchedulerSettings,
    state: SchedulerState,
}

impl Scheduler {
    #[must_use]
    pub fn new(
        session: SessionHandle,
        fetcher: Arc<dyn TransactionFetcher>,
        dedup: DedupStore,
        forwarder: Forwarder,
        clock: Arc<dyn Clock>,
        credentials: Credentials,
        settings: SchedulerSettings,
    ) -> Self {
        let state = SchedulerState::new(clock.now());
        Self {
            session,
            fetcher,
            dedup,
            forwarder,
            clock,
            credentials,
            settings,
            state,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &SchedulerState {
        &self.state
    }

    #[must_use]
    pub const fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Log in for the first time.
    ///
    /// # Errors
    ///
    /// Returns a [`FatalError`] after alerting when the login fails.
    pub async fn start(&mut self) -> std::result::Result<(), FatalError> {
        let now = self.clock.now();
        self.state = SchedulerState::new(now);
        info!(
            fetch_interval_secs = self.settings.fetch_interval.as_secs(),
            restart_interval_secs = self.settings.restart_interval.as_secs(),
            health_interval_secs = self.settings.health_interval.as_secs(),
            "Starting scheduler"
        );

        match self.session.login(&self.credentials).await {
            Ok(()) => {
                let now = self.clock.now();
                self.state.session_started_at = Some(now);
                self.state.last_health = Some(now);
                Ok(())
            }
            Err(failure) => Err(self.fail(FatalError::login(FatalKind::InitialLogin, &failure)).await),
        }
    }

    /// Run one loop iteration.
    pub async fn tick(&mut self) -> TickOutcome {
        let now = self.clock.now();
        self.heartbeat(now);

        match self.state.phase.clone() {
            Phase::Fatal(fatal) => TickOutcome::Fatal(fatal),
            Phase::AwaitingRecovery { since, cause } => {
                let waited = elapsed(now, since);
                if waited < self.settings.recovery_cooldown {
                    return TickOutcome::CoolingDown {
                        remaining: self.settings.recovery_cooldown - waited,
                    };
                }
                self.recover(cause).await
            }
            Phase::Running => self.tick_running(now).await,
        }
    }

    async fn tick_running(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if self.restart_due(now) {
            return self.scheduled_restart().await;
        }

        if self.health_due(now) {
            self.state.last_health = Some(now);
            if self.session.health_check().await == SessionHealth::Dead {
                return self.await_recovery(now, RecoveryCause::SessionDead);
            }
        }

        if !self.fetch_due(now) {
            return TickOutcome::Idle;
        }

        self.state.fetch_in_flight = true;
        let result = self.fetch_cycle(now).await;
        self.state.fetch_in_flight = false;

        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Fetch cycle failed");
                self.await_recovery(self.clock.now(), RecoveryCause::LoopError(e.to_string()))
            }
        }
    }

    /// Run until `shutdown` resolves or a fatal outcome, then tear down.
    ///
    /// A running fetch or login is never interrupted; the shutdown signal
    /// is observed between iterations and during waits.
    pub async fn run<F>(&mut self, shutdown: F) -> ExitStatus
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);

        let status = match self.start().await {
            Ok(()) => self.run_loop(shutdown).await,
            Err(fatal) => ExitStatus::Fatal(fatal),
        };

        self.session.teardown().await;
        match &status {
            ExitStatus::Graceful => info!("Scheduler stopped"),
            ExitStatus::Fatal(fatal) => error!(kind = %fatal.kind, error = %fatal, "Scheduler stopped on fatal error"),
        }
        status
    }

    async fn run_loop<F>(&mut self, mut shutdown: std::pin::Pin<&mut F>) -> ExitStatus
    where
        F: Future<Output = ()> + Send,
    {
        let clock = Arc::clone(&self.clock);
        loop {
            let pause = match self.tick().await {
                TickOutcome::Fatal(fatal) => return ExitStatus::Fatal(fatal),
                TickOutcome::CoolingDown { remaining } => {
                    info!(remaining_secs = remaining.as_secs(), "Waiting before recovery");
                    remaining
                }
                TickOutcome::RecoveryScheduled { .. } => self.settings.recovery_cooldown,
                TickOutcome::Recovered { pause } => pause.max(self.settings.poll_interval),
                _ => self.settings.poll_interval,
            };

            tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!("Shutdown requested");
                    return ExitStatus::Graceful;
                }
                () = clock.sleep(pause) => {}
            }
        }
    }

    async fn fetch_cycle(&mut self, now: DateTime<Utc>) -> Result<TickOutcome> {
        let Some(session) = self.session.session_id().cloned() else {
            return Err(Error::Portal("no active session".into()));
        };
        let watermark = self.dedup.compute_watermark(now)?;
        info!(from = %watermark, max_pages = self.settings.max_pages, "Fetching transactions");

        let result: FetchResult = self
            .fetcher
            .fetch(&session, watermark, self.settings.max_pages)
            .await;
        let fetched_at = self.dedup.business_time().to_local(self.clock.now());
        self.state.last_fetch = Some(now);
        self.state.cycles += 1;

        match result.status {
            FetchStatus::Success => {
                self.state.last_fetch_failed = false;
                let batch =
                    NewBatch::fetched(fetched_at, watermark, result.account, result.transactions);
                self.dedup.record_batch(batch)?;

                let Some(new) = self.dedup.find_new_transactions()? else {
                    return Ok(TickOutcome::Fetched { new: 0, notified: 0 });
                };
                let report = self.forwarder.forward(new.transactions()).await;
                if !report.is_success() {
                    warn!(
                        new = new.len(),
                        "No notification delivered for new transactions"
                    );
                }
                self.dedup.prune(&new)?;
                self.state.forwarded += new.len() as u64;

                Ok(TickOutcome::Fetched {
                    new: new.len(),
                    notified: report.notified(),
                })
            }
            FetchStatus::SessionExpired => {
                warn!(message = %result.message, "Fetch found the session expired");
                self.dedup.record_batch(NewBatch::failed(
                    fetched_at,
                    watermark,
                    BatchStatus::SessionExpired,
                    result.message,
                ))?;
                Ok(self.await_recovery(now, RecoveryCause::SessionExpired))
            }
            FetchStatus::Error => {
                warn!(
                    message = %result.message,
                    retry_secs = self.settings.fetch_retry.as_secs(),
                    "Fetch failed, will retry"
                );
                self.state.last_fetch_failed = true;
                self.dedup.record_batch(NewBatch::failed(
                    fetched_at,
                    watermark,
                    BatchStatus::Error,
                    result.message.clone(),
                ))?;
                Ok(TickOutcome::FetchFailed {
                    message: result.message,
                })
            }
        }
    }

    async fn scheduled_restart(&mut self) -> TickOutcome {
        info!(
            session_age_secs = self
                .state
                .session_started_at
                .map_or(0, |at| elapsed(self.clock.now(), at).as_secs()),
            "Scheduled session restart"
        );
        match self.session.restart(&self.credentials).await {
            Ok(()) => {
                let now = self.clock.now();
                self.state.session_started_at = Some(now);
                self.state.last_health = Some(now);
                self.state.restarts += 1;
                TickOutcome::Restarted
            }
            Err(failure) => {
                TickOutcome::Fatal(self.fail(FatalError::login(FatalKind::Restart, &failure)).await)
            }
        }
    }

    fn await_recovery(&mut self, now: DateTime<Utc>, cause: RecoveryCause) -> TickOutcome {
        warn!(
            cause = %cause,
            cooldown_secs = self.settings.recovery_cooldown.as_secs(),
            "Entering recovery cooldown"
        );
        self.state.phase = Phase::AwaitingRecovery {
            since: now,
            cause: cause.clone(),
        };
        TickOutcome::RecoveryScheduled { cause }
    }

    async fn recover(&mut self, cause: RecoveryCause) -> TickOutcome {
        info!(cause = %cause, "Cooldown elapsed, attempting recovery");
        match self.session.restart(&self.credentials).await {
            Ok(()) => {
                let now = self.clock.now();
                self.state.phase = Phase::Running;
                self.state.session_started_at = Some(now);
                self.state.last_health = Some(now);
                self.state.last_fetch_failed = false;
                self.state.recoveries += 1;
                info!(attempts = self.session.last_attempts(), "Session recovered");
                TickOutcome::Recovered {
                    pause: self.settings.post_recovery_pause,
                }
            }
            Err(failure) => {
                let mut fatal = FatalError::login(FatalKind::Recovery, &failure);
                fatal.detail = format!("{} after {cause}", fatal.detail);
                TickOutcome::Fatal(self.fail(fatal).await)
            }
        }
    }

    /// Enter the fatal phase and push an alert.
    async fn fail(&mut self, fatal: FatalError) -> FatalError {
        error!(
            kind = %fatal.kind,
            code = fatal.reason_code.unwrap_or("none"),
            detail = %fatal.detail,
            "Fatal error, stopping"
        );
        let local = self.dedup.business_time().to_local(self.clock.now());
        let alert = format!(
            "Bank watcher stopped at {}: {fatal}",
            local.format("%d/%m/%Y %H:%M:%S")
        );
        self.forwarder.alert(&alert).await;
        self.state.phase = Phase::Fatal(fatal.clone());
        fatal
    }

    fn restart_due(&self, now: DateTime<Utc>) -> bool {
        self.state
            .session_started_at
            .is_some_and(|at| elapsed(now, at) >= self.settings.restart_interval)
    }

    fn health_due(&self, now: DateTime<Utc>) -> bool {
        self.state
            .last_health
            .map_or(true, |at| elapsed(now, at) >= self.settings.health_interval)
    }

    fn fetch_due(&self, now: DateTime<Utc>) -> bool {
        if self.state.fetch_in_flight || !self.session.is_active() {
            return false;
        }
        let interval = if self.state.last_fetch_failed {
            self.settings.fetch_retry
        } else {
            self.settings.fetch_interval
        };
        self.state
            .last_fetch
            .map_or(true, |at| elapsed(now, at) >= interval)
    }

    fn heartbeat(&mut self, now: DateTime<Utc>) {
        if elapsed(now, self.state.last_heartbeat) < self.settings.heartbeat_interval {
            return;
        }
        self.state.last_heartbeat = now;
        info!(
            uptime_secs = elapsed(now, self.state.started_at).as_secs(),
            cycles = self.state.cycles,
            forwarded = self.state.forwarded,
            restarts = self.state.restarts,
            recoveries = self.state.recoveries,
            phase = ?self.state.phase,
            "Heartbeat"
        );
    }
}

/// Time from `since` to `now`, zero if the clock went backwards.
fn elapsed(now: DateTime<Utc>, since: DateTime<Utc>) -> Duration {
    (now - since).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::store::MemoryBatchStore;
    use crate::application::dedup::DedupSettings;
    use crate::application::forwarder::ForwarderSettings;
    use crate::application::session::SessionSettings;
    use crate::domain::order::{DEFAULT_ORDER_DIGITS, DEFAULT_ORDER_PREFIX};
    use crate::domain::{BusinessTime, OrderReferencePattern};
    use crate::port::{BatchStore, LoginResponse};
    use crate::testkit::clock::FakeClock;
    use crate::testkit::domain::{business_instant, credentials, credit, local};
    use crate::testkit::fetcher::ScriptedFetcher;
    use crate::testkit::notifier::RecordingNotifier;
    use crate::testkit::portal::{FixedSolver, ScriptedDriver};

    struct Fixture {
        clock: Arc<FakeClock>,
        driver: Arc<ScriptedDriver>,
        fetcher: Arc<ScriptedFetcher>,
        notifier: Arc<RecordingNotifier>,
        store: Arc<MemoryBatchStore>,
        scheduler: Scheduler,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(FakeClock::new(business_instant("2025-06-05 09:00:00")));
        let driver = Arc::new(ScriptedDriver::new());
        let fetcher = Arc::new(ScriptedFetcher::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let store = Arc::new(MemoryBatchStore::new());

        let session = SessionHandle::new(
            driver.clone(),
            Arc::new(FixedSolver::new("ABC12")),
            clock.clone(),
            SessionSettings::default(),
        );
        let dedup = DedupStore::new(store.clone(), BusinessTime::default(), DedupSettings::default());
        let forwarder = Forwarder::new(
            notifier.clone(),
            None,
            OrderReferencePattern::new(DEFAULT_ORDER_PREFIX, DEFAULT_ORDER_DIGITS).unwrap(),
            clock.clone(),
            ForwarderSettings {
                spacing: Duration::ZERO,
                ..ForwarderSettings::default()
            },
        );
        let scheduler = Scheduler::new(
            session,
            fetcher.clone(),
            dedup,
            forwarder,
            clock.clone(),
            credentials(),
            SchedulerSettings::default(),
        );
        Fixture {
            clock,
            driver,
            fetcher,
            notifier,
            store,
            scheduler,
        }
    }

    #[tokio::test]
    async fn first_tick_fetches_and_forwards() {
        let mut f = fixture();
        f.fetcher.push_transactions(vec![
            credit("FT0000000002", 200, "2025-06-05 08:59:00"),
            credit("FT0000000001", 100, "2025-06-05 08:58:00"),
        ]);
        f.scheduler.start().await.unwrap();

        let outcome = f.scheduler.tick().await;

        assert_eq!(outcome, TickOutcome::Fetched { new: 2, notified: 2 });
        assert_eq!(f.notifier.sent().len(), 2);
        assert_eq!(f.fetcher.calls()[0].from, local("2025-06-05 00:00:00"));
        assert_eq!(f.fetcher.calls()[0].max_pages, 5);
        assert_eq!(f.store.len(), 1);
    }

    #[tokio::test]
    async fn fetch_waits_for_the_interval() {
        let mut f = fixture();
        f.scheduler.start().await.unwrap();
        f.scheduler.tick().await;

        f.clock.advance(Duration::from_secs(19));
        assert_eq!(f.scheduler.tick().await, TickOutcome::Idle);

        f.clock.advance(Duration::from_secs(1));
        assert!(matches!(f.scheduler.tick().await, TickOutcome::Fetched { .. }));
        assert_eq!(f.fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn overlapping_fetch_forwards_only_new_and_prunes() {
        let mut f = fixture();
        f.fetcher.push_transactions(vec![credit("FT0000000001", 100, "2025-06-05 08:58:00")]);
        f.fetcher.push_transactions(vec![
            credit("FT0000000002", 200, "2025-06-05 09:00:10"),
            credit("FT0000000001", 100, "2025-06-05 08:58:00"),
        ]);
        f.scheduler.start().await.unwrap();
        f.scheduler.tick().await;
        f.clock.advance(Duration::from_secs(20));

        let outcome = f.scheduler.tick().await;

        assert_eq!(outcome, TickOutcome::Fetched { new: 1, notified: 1 });
        assert_eq!(f.fetcher.calls()[1].from, local("2025-06-05 08:56:00"));
        assert!(f.notifier.sent()[1].contains("FT0000000002"));
        let retained = f.store.load_all().unwrap();
        assert_eq!(retained.len(), 1);
        assert_eq!(retained[0].count, 2);
    }

    #[tokio::test]
    async fn failed_fetch_retries_sooner() {
        let mut f = fixture();
        f.fetcher.push(FetchResult::error("table did not load"));
        f.scheduler.start().await.unwrap();

        assert!(matches!(f.scheduler.tick().await, TickOutcome::FetchFailed { .. }));
        assert_eq!(f.store.load_all().unwrap()[0].status, BatchStatus::Error);

        f.clock.advance(Duration::from_secs(4));
        assert_eq!(f.scheduler.tick().await, TickOutcome::Idle);
        f.clock.advance(Duration::from_secs(1));
        assert!(matches!(f.scheduler.tick().await, TickOutcome::Fetched { .. }));
    }

    #[tokio::test]
    async fn dead_session_waits_full_cooldown_then_recovers_once() {
        let mut f = fixture();
        f.scheduler.start().await.unwrap();
        f.scheduler.tick().await;
        f.driver.set_location("https://portal.example/login");
        f.clock.advance(Duration::from_secs(10));

        assert_eq!(
            f.scheduler.tick().await,
            TickOutcome::RecoveryScheduled {
                cause: RecoveryCause::SessionDead
            }
        );
        let checks_at_failure = f.driver.locations();

        // Inside the cooldown nothing happens, however often the loop ticks.
        for _ in 0..5 {
            f.clock.advance(Duration::from_secs(30));
            assert!(matches!(
                f.scheduler.tick().await,
                TickOutcome::CoolingDown { .. }
            ));
        }
        assert_eq!(f.driver.opened(), 1);
        assert_eq!(f.driver.locations(), checks_at_failure);

        f.clock.advance(Duration::from_secs(29));
        assert_eq!(
            f.scheduler.tick().await,
            TickOutcome::CoolingDown {
                remaining: Duration::from_secs(1)
            }
        );

        f.clock.advance(Duration::from_secs(1));
        assert_eq!(
            f.scheduler.tick().await,
            TickOutcome::Recovered {
                pause: Duration::from_secs(10)
            }
        );
        assert_eq!(f.driver.opened(), 2);
        assert_eq!(f.scheduler.state().phase, Phase::Running);
        // The settle pause belongs to the run loop, not the tick.
        assert!(f.clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn failed_recovery_is_fatal_and_alerts() {
        let mut f = fixture();
        f.scheduler.start().await.unwrap();
        f.driver.set_location("https://portal.example/login");
        f.clock.advance(Duration::from_secs(10));
        f.scheduler.tick().await;
        f.driver.push_login(LoginResponse::Rejected {
            code: None,
            message: "Invalid username or password".into(),
        });
        f.clock.advance(Duration::from_secs(180));

        let outcome = f.scheduler.tick().await;

        let TickOutcome::Fatal(fatal) = outcome else {
            panic!("expected fatal outcome, got {outcome:?}");
        };
        assert_eq!(fatal.kind, FatalKind::Recovery);
        assert_eq!(fatal.reason_code, Some("invalid_credentials"));
        assert_eq!(f.driver.submitted(), 2);
        assert!(f.notifier.sent()[0].contains("session recovery failed"));
        assert!(matches!(
            f.scheduler.tick().await,
            TickOutcome::Fatal(_)
        ));
        assert_eq!(f.driver.submitted(), 2);
    }

    #[tokio::test]
    async fn expired_fetch_routes_to_recovery() {
        let mut f = fixture();
        f.fetcher.push(FetchResult::session_expired("redirected to login"));
        f.scheduler.start().await.unwrap();

        assert_eq!(
            f.scheduler.tick().await,
            TickOutcome::RecoveryScheduled {
                cause: RecoveryCause::SessionExpired
            }
        );
        assert_eq!(
            f.store.load_all().unwrap()[0].status,
            BatchStatus::SessionExpired
        );
    }

    #[tokio::test]
    async fn scheduled_restart_replaces_the_session() {
        let mut f = fixture();
        f.scheduler.start().await.unwrap();
        f.clock.advance(Duration::from_secs(600));

        assert_eq!(f.scheduler.tick().await, TickOutcome::Restarted);
        assert_eq!(f.driver.opened(), 2);
        assert_eq!(f.driver.closed(), 1);
        assert_eq!(f.scheduler.state().restarts, 1);
    }

    #[tokio::test]
    async fn restart_failure_is_fatal() {
        let mut f = fixture();
        f.scheduler.start().await.unwrap();
        f.driver.push_login(LoginResponse::Rejected {
            code: Some("GW18".into()),
            message: "GW18 account locked".into(),
        });
        f.clock.advance(Duration::from_secs(600));

        let outcome = f.scheduler.tick().await;

        assert!(matches!(
            outcome,
            TickOutcome::Fatal(FatalError {
                kind: FatalKind::Restart,
                reason_code: Some("account_locked"),
                ..
            })
        ));
        assert_eq!(f.notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn initial_login_failure_alerts() {
        let mut f = fixture();
        f.driver.push_login(LoginResponse::Rejected {
            code: None,
            message: "Invalid username or password".into(),
        });

        let fatal = f.scheduler.start().await.unwrap_err();

        assert_eq!(fatal.kind, FatalKind::InitialLogin);
        assert!(f.notifier.sent()[0].contains("initial login failed"));
    }

    #[tokio::test]
    async fn run_exits_gracefully_on_shutdown_and_tears_down() {
        let mut f = fixture();
        let clock = f.clock.clone();
        let deadline = clock.now() + chrono::Duration::seconds(45);
        let shutdown = async move {
            while clock.now() < deadline {
                tokio::task::yield_now().await;
            }
        };

        let status = f.scheduler.run(shutdown).await;

        assert_eq!(status, ExitStatus::Graceful);
        assert_eq!(status.code(), 0);
        assert!(f.fetcher.calls().len() >= 3);
        assert_eq!(f.fetcher.max_concurrent(), 1);
        assert_eq!(f.driver.logouts(), 1);
        assert_eq!(f.driver.closed(), 1);
    }

    #[tokio::test]
    async fn run_exits_non_zero_when_login_fails() {
        let mut f = fixture();
        f.driver.push_login(LoginResponse::Rejected {
            code: Some("GW18".into()),
            message: "locked".into(),
        });

        let status = f.scheduler.run(std::future::pending()).await;

        assert_eq!(status.code(), 1);
        assert_eq!(f.driver.closed(), 1);
        assert!(f.fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn run_sleeps_through_the_cooldown() {
        let mut f = fixture();
        f.fetcher.push(FetchResult::session_expired("redirected to login"));
        f.driver.push_login(LoginResponse::Accepted);
        f.driver.push_login(LoginResponse::Rejected {
            code: None,
            message: "Invalid username or password".into(),
        });

        let status = f.scheduler.run(std::future::pending()).await;

        assert!(matches!(
            status,
            ExitStatus::Fatal(FatalError {
                kind: FatalKind::Recovery,
                ..
            })
        ));
        assert!(f.clock.sleeps().contains(&Duration::from_secs(180)));
        assert_eq!(f.driver.opened(), 2);
    }

    #[tokio::test]
    async fn shutdown_interrupts_the_post_recovery_pause() {
        let mut f = fixture();
        f.fetcher.push(FetchResult::session_expired("redirected to login"));
        let driver = f.driver.clone();
        let shutdown = async move {
            while driver.opened() < 2 {
                tokio::task::yield_now().await;
            }
        };

        let status = f.scheduler.run(shutdown).await;

        assert_eq!(status, ExitStatus::Graceful);
        assert_eq!(f.scheduler.state().recoveries, 1);
        assert!(f.clock.sleeps().contains(&Duration::from_secs(180)));
        assert!(!f.clock.sleeps().contains(&Duration::from_secs(10)));
    }
}
