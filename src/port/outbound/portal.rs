//! Banking portal ports: browser session driver and challenge solver.
//!
//! The driver stands for the browser automation that actually clicks through
//! the portal. It reports what happened; deciding whether to retry belongs to
//! the application layer.

use std::fmt;

use async_trait::async_trait;

use crate::error::Result;

/// Opaque identifier of a live browser session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Portal login credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub corp_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("corp_id", &self.corp_id)
            .finish()
    }
}

/// A one-time login challenge image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub image: Vec<u8>,
}

/// What the portal showed after a login form was submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginResponse {
    /// Landed on an authenticated page.
    Accepted,
    /// An error dialog (or nothing recognizable) was shown instead.
    Rejected {
        /// Portal error code when one could be read (e.g. `GW715`).
        code: Option<String>,
        /// Dialog text, empty when no dialog was found.
        message: String,
    },
}

/// Drives one browser session against the portal.
#[async_trait]
pub trait PortalDriver: Send + Sync {
    /// Start a fresh browser session on the login page.
    async fn open(&self) -> Result<SessionId>;

    /// Load a fresh challenge image for the login form.
    async fn challenge(&self, session: &SessionId) -> Result<Challenge>;

    /// Fill in and submit the login form.
    async fn submit_login(
        &self,
        session: &SessionId,
        credentials: &Credentials,
        answer: &str,
    ) -> Result<LoginResponse>;

    /// Location of the currently loaded page. Must not trigger navigation.
    async fn location(&self, session: &SessionId) -> Result<String>;

    /// Sign out of the portal.
    async fn logout(&self, session: &SessionId) -> Result<()>;

    /// Dispose of the browser session.
    async fn close(&self, session: &SessionId) -> Result<()>;
}

/// Reads a challenge image into text.
#[async_trait]
pub trait ChallengeSolver: Send + Sync {
    async fn solve(&self, challenge: &Challenge) -> Result<String>;
}
