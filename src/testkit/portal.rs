//! Scripted portal driver and challenge solver.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::port::{
    Challenge, ChallengeSolver, Credentials, LoginResponse, PortalDriver, SessionId,
};

/// Location reported by an authenticated session.
pub const ACTIVE_LOCATION: &str = "https://portal.example/cp/account-info";

#[derive(Default)]
struct DriverState {
    logins: VecDeque<Result<LoginResponse>>,
    location: Option<String>,
    fail_open: bool,
    fail_logout: bool,
    opened: u32,
    challenges: u32,
    submitted: u32,
    locations: u32,
    logouts: u32,
    closed: u32,
    calls: Vec<&'static str>,
}

/// A [`PortalDriver`] with pre-loaded login responses and call counters.
///
/// Each `submit_login` pops the next scripted response and defaults to
/// [`LoginResponse::Accepted`] once the queue is empty.
#[derive(Default)]
pub struct ScriptedDriver {
    state: Mutex<DriverState>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_login(&self, response: LoginResponse) {
        self.state.lock().logins.push_back(Ok(response));
    }

    pub fn push_login_error(&self, message: &str) {
        self.state
            .lock()
            .logins
            .push_back(Err(Error::Portal(message.to_string())));
    }

    /// Location returned by every later `location` call.
    pub fn set_location(&self, location: &str) {
        self.state.lock().location = Some(location.to_string());
    }

    pub fn fail_open(&self) {
        self.state.lock().fail_open = true;
    }

    pub fn fail_logout(&self) {
        self.state.lock().fail_logout = true;
    }

    pub fn opened(&self) -> u32 {
        self.state.lock().opened
    }

    pub fn challenges(&self) -> u32 {
        self.state.lock().challenges
    }

    pub fn submitted(&self) -> u32 {
        self.state.lock().submitted
    }

    pub fn locations(&self) -> u32 {
        self.state.lock().locations
    }

    pub fn logouts(&self) -> u32 {
        self.state.lock().logouts
    }

    pub fn closed(&self) -> u32 {
        self.state.lock().closed
    }

    /// Names of driver calls in order (`open`, `submit`, `logout`, ...).
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().calls.clone()
    }
}

#[async_trait]
impl PortalDriver for ScriptedDriver {
    async fn open(&self) -> Result<SessionId> {
        let mut state = self.state.lock();
        state.calls.push("open");
        if state.fail_open {
            return Err(Error::Portal("browser unavailable".into()));
        }
        state.opened += 1;
        // A fresh session lands on an authenticated page once logged in.
        state.location = None;
        Ok(SessionId::new(format!("session-{}", state.opened)))
    }

    async fn challenge(&self, _session: &SessionId) -> Result<Challenge> {
        let mut state = self.state.lock();
        state.calls.push("challenge");
        state.challenges += 1;
        Ok(Challenge {
            image: vec![0x89, 0x50, 0x4e, 0x47],
        })
    }

    async fn submit_login(
        &self,
        _session: &SessionId,
        _credentials: &Credentials,
        _answer: &str,
    ) -> Result<LoginResponse> {
        let mut state = self.state.lock();
        state.calls.push("submit");
        state.submitted += 1;
        state
            .logins
            .pop_front()
            .unwrap_or(Ok(LoginResponse::Accepted))
    }

    async fn location(&self, _session: &SessionId) -> Result<String> {
        let mut state = self.state.lock();
        state.calls.push("location");
        state.locations += 1;
        Ok(state
            .location
            .clone()
            .unwrap_or_else(|| ACTIVE_LOCATION.to_string()))
    }

    async fn logout(&self, _session: &SessionId) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push("logout");
        state.logouts += 1;
        if state.fail_logout {
            return Err(Error::Portal("logout button missing".into()));
        }
        Ok(())
    }

    async fn close(&self, _session: &SessionId) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push("close");
        state.closed += 1;
        Ok(())
    }
}

/// A solver that always answers with the same text.
pub struct FixedSolver {
    answer: String,
}

impl FixedSolver {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
        }
    }
}

#[async_trait]
impl ChallengeSolver for FixedSolver {
    async fn solve(&self, _challenge: &Challenge) -> Result<String> {
        Ok(self.answer.clone())
    }
}
