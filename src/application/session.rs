//! Authenticated portal session lifecycle.
//!
//! ```text
//! Uninitialized ──login──▶ LoggingIn ──▶ Active ──health_check──▶ Expired
//!       ▲                      │                                     │
//!       │                      └──▶ LoginFailed (terminal)           │
//!       └──────────────────────── teardown ◀─────────────────────────┘
//! ```
//!
//! Login retries only transient failures (a misread challenge). Credential
//! and lockout failures end the call on the spot.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::error::LoginFailure;
use crate::port::{ChallengeSolver, Clock, Credentials, LoginResponse, PortalDriver, SessionId};

/// Default number of login attempts per call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Login and health-check tuning.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Attempts per `login` call, each with a fresh challenge.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub retry_delay: Duration,
    /// Error codes that mean "challenge misread, try again".
    pub transient_codes: Vec<String>,
    /// Error codes that mean the account is locked.
    pub lockout_codes: Vec<String>,
    /// Location fragments that indicate a logged-out page.
    pub expired_markers: Vec<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: Duration::from_secs(2),
            transient_codes: vec!["GW715".into()],
            lockout_codes: vec!["GW18".into()],
            expired_markers: vec!["login".into(), "session-expired".into()],
        }
    }
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    LoggingIn,
    Active,
    Expired,
    LoginFailed(LoginFailure),
}

/// Result of a health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionHealth {
    Alive,
    Dead,
}

/// How a single login attempt ended.
#[derive(Debug)]
enum Attempt {
    Accepted,
    Transient(String),
    Terminal(LoginFailure),
}

/// Owns the browser session and its state machine.
pub struct SessionHandle {
    driver: Arc<dyn PortalDriver>,
    solver: Arc<dyn ChallengeSolver>,
    clock: Arc<dyn Clock>,
    settings: SessionSettings,
    session: Option<SessionId>,
    state: SessionState,
    last_attempts: u32,
}

impl SessionHandle {
    #[must_use]
    pub fn new(
        driver: Arc<dyn PortalDriver>,
        solver: Arc<dyn ChallengeSolver>,
        clock: Arc<dyn Clock>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            driver,
            solver,
            clock,
            settings,
            session: None,
            state: SessionState::Uninitialized,
            last_attempts: 0,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Browser session identifier while one is open.
    #[must_use]
    pub const fn session_id(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    /// Attempts used by the most recent `login` call.
    #[must_use]
    pub const fn last_attempts(&self) -> u32 {
        self.last_attempts
    }

    /// Open a browser session and authenticate.
    ///
    /// Any existing session is torn down first.
    ///
    /// # Errors
    ///
    /// Returns the [`LoginFailure`] that ended the call. Terminal failures
    /// stop immediately, without using the remaining attempts.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<(), LoginFailure> {
        if self.session.is_some() {
            self.teardown().await;
        }

        self.state = SessionState::LoggingIn;
        self.last_attempts = 0;

        let session = match self.driver.open().await {
            Ok(session) => session,
            Err(e) => {
                let failure = LoginFailure::SessionUnavailable(e.to_string());
                error!(error = %e, "Failed to open browser session");
                self.state = SessionState::LoginFailed(failure.clone());
                return Err(failure);
            }
        };
        debug!(session = %session, "Browser session opened");
        self.session = Some(session.clone());

        let max_attempts = self.settings.max_attempts.max(1);
        info!(max_attempts, "Starting login");

        let mut last_error = String::new();
        for attempt in 1..=max_attempts {
            if attempt > 1 {
                self.clock.sleep(self.settings.retry_delay).await;
            }
            self.last_attempts = attempt;

            match self.attempt(&session, credentials).await {
                Attempt::Accepted => {
                    info!(attempt, max_attempts, "Login succeeded");
                    self.state = SessionState::Active;
                    return Ok(());
                }
                Attempt::Transient(reason) => {
                    warn!(attempt, max_attempts, reason = %reason, "Login attempt failed, will retry");
                    last_error = reason;
                }
                Attempt::Terminal(failure) => {
                    error!(
                        attempt,
                        code = failure.reason_code(),
                        error = %failure,
                        "Login refused, stopping all attempts"
                    );
                    self.state = SessionState::LoginFailed(failure.clone());
                    return Err(failure);
                }
            }
        }

        let failure = LoginFailure::AttemptsExhausted {
            attempts: max_attempts,
            last_error,
        };
        error!(attempts = max_attempts, "All login attempts failed");
        self.state = SessionState::LoginFailed(failure.clone());
        Err(failure)
    }

    async fn attempt(&self, session: &SessionId, credentials: &Credentials) -> Attempt {
        let challenge = match self.driver.challenge(session).await {
            Ok(challenge) => challenge,
            Err(e) => return Attempt::Transient(format!("challenge unavailable: {e}")),
        };
        let answer = match self.solver.solve(&challenge).await {
            Ok(answer) => answer.replace(' ', ""),
            Err(e) => return Attempt::Transient(format!("challenge unreadable: {e}")),
        };
        debug!(answer_len = answer.len(), "Challenge solved");

        match self
            .driver
            .submit_login(session, credentials, &answer)
            .await
        {
            Ok(LoginResponse::Accepted) => Attempt::Accepted,
            Ok(LoginResponse::Rejected { code, message }) => {
                self.classify(code.as_deref(), &message)
            }
            Err(e) => Attempt::Transient(format!("login submit failed: {e}")),
        }
    }

    fn classify(&self, code: Option<&str>, message: &str) -> Attempt {
        let matches = |codes: &[String]| {
            codes
                .iter()
                .find(|c| code == Some(c.as_str()) || message.contains(c.as_str()))
                .cloned()
        };

        if let Some(code) = matches(&self.settings.transient_codes) {
            return Attempt::Transient(format!("challenge rejected ({code})"));
        }
        if let Some(code) = matches(&self.settings.lockout_codes) {
            return Attempt::Terminal(LoginFailure::AccountLocked {
                code,
                message: message.to_string(),
            });
        }
        if message.trim().is_empty() {
            return Attempt::Transient(match code {
                Some(code) => format!("rejected with {code}"),
                None => "no error detected".into(),
            });
        }
        Attempt::Terminal(LoginFailure::InvalidCredentials {
            message: message.to_string(),
        })
    }

    /// Check whether the session is still authenticated.
    ///
    /// Only reads the current location; a logged-out or expired page marks
    /// the session [`SessionState::Expired`].
    pub async fn health_check(&mut self) -> SessionHealth {
        let Some(session) = self.session.clone() else {
            return SessionHealth::Dead;
        };
        if self.state != SessionState::Active {
            return SessionHealth::Dead;
        }

        match self.driver.location(&session).await {
            Ok(location) => {
                let lower = location.to_lowercase();
                if self
                    .settings
                    .expired_markers
                    .iter()
                    .any(|marker| lower.contains(&marker.to_lowercase()))
                {
                    warn!(location = %location, "Session appears logged out or expired");
                    self.state = SessionState::Expired;
                    SessionHealth::Dead
                } else {
                    SessionHealth::Alive
                }
            }
            Err(e) => {
                warn!(error = %e, "Session location unavailable");
                self.state = SessionState::Expired;
                SessionHealth::Dead
            }
        }
    }

    /// Sign out. Failures are logged, never returned.
    pub async fn logout(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        match self.driver.logout(session).await {
            Ok(()) => info!("Logged out"),
            Err(e) => warn!(error = %e, "Logout failed"),
        }
    }

    /// Log out and close the browser session, returning to `Uninitialized`.
    pub async fn teardown(&mut self) {
        self.logout().await;
        if let Some(session) = self.session.take() {
            match self.driver.close(&session).await {
                Ok(()) => debug!(session = %session, "Browser session closed"),
                Err(e) => warn!(error = %e, "Failed to close browser session"),
            }
        }
        self.state = SessionState::Uninitialized;
    }

    /// Tear down and log in again on a fresh browser session.
    ///
    /// # Errors
    ///
    /// Returns the login failure of the new session.
    pub async fn restart(&mut self, credentials: &Credentials) -> Result<(), LoginFailure> {
        info!("Restarting session");
        self.teardown().await;
        self.login(credentials).await
    }
}
