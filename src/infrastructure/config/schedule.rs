//! Scheduler and session timing configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::application::session::DEFAULT_MAX_ATTEMPTS;
use crate::application::{SchedulerSettings, SessionSettings};

/// `[scheduler]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between fetch cycles.
    #[serde(default = "default_fetch_interval_secs")]
    pub fetch_interval_secs: u64,
    /// Seconds before retrying a failed fetch.
    #[serde(default = "default_fetch_retry_secs")]
    pub fetch_retry_secs: u64,
    /// Minutes between proactive session restarts.
    #[serde(default = "default_restart_interval_minutes")]
    pub restart_interval_minutes: u64,
    #[serde(default = "default_health_interval_secs")]
    pub health_interval_secs: u64,
    /// Mandatory wait before the single recovery attempt.
    #[serde(default = "default_recovery_cooldown_secs")]
    pub recovery_cooldown_secs: u64,
    #[serde(default = "default_post_recovery_pause_secs")]
    pub post_recovery_pause_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
    /// Result pages to read per fetch.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

const fn default_fetch_interval_secs() -> u64 {
    20
}

const fn default_fetch_retry_secs() -> u64 {
    5
}

const fn default_restart_interval_minutes() -> u64 {
    10
}

const fn default_health_interval_secs() -> u64 {
    10
}

const fn default_recovery_cooldown_secs() -> u64 {
    180
}

const fn default_post_recovery_pause_secs() -> u64 {
    10
}

const fn default_poll_interval_ms() -> u64 {
    500
}

const fn default_heartbeat_interval_secs() -> u64 {
    300
}

const fn default_max_pages() -> u32 {
    5
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            fetch_interval_secs: default_fetch_interval_secs(),
            fetch_retry_secs: default_fetch_retry_secs(),
            restart_interval_minutes: default_restart_interval_minutes(),
            health_interval_secs: default_health_interval_secs(),
            recovery_cooldown_secs: default_recovery_cooldown_secs(),
            post_recovery_pause_secs: default_post_recovery_pause_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            max_pages: default_max_pages(),
        }
    }
}

impl SchedulerConfig {
    #[must_use]
    pub const fn settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            fetch_interval: Duration::from_secs(self.fetch_interval_secs),
            fetch_retry: Duration::from_secs(self.fetch_retry_secs),
            restart_interval: Duration::from_secs(self.restart_interval_minutes * 60),
            health_interval: Duration::from_secs(self.health_interval_secs),
            recovery_cooldown: Duration::from_secs(self.recovery_cooldown_secs),
            post_recovery_pause: Duration::from_secs(self.post_recovery_pause_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            heartbeat_interval: Duration::from_secs(self.heartbeat_interval_secs),
            max_pages: self.max_pages,
        }
    }
}

/// `[session]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    /// Rejection codes meaning "challenge misread".
    #[serde(default = "default_transient_codes")]
    pub transient_codes: Vec<String>,
    /// Rejection codes meaning "account locked".
    #[serde(default = "default_lockout_codes")]
    pub lockout_codes: Vec<String>,
    /// Location fragments of logged-out pages.
    #[serde(default = "default_expired_markers")]
    pub expired_markers: Vec<String>,
}

const fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

const fn default_retry_delay_secs() -> u64 {
    2
}

fn default_transient_codes() -> Vec<String> {
    vec!["GW715".into()]
}

fn default_lockout_codes() -> Vec<String> {
    vec!["GW18".into()]
}

fn default_expired_markers() -> Vec<String> {
    vec!["login".into(), "session-expired".into()]
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
            transient_codes: default_transient_codes(),
            lockout_codes: default_lockout_codes(),
            expired_markers: default_expired_markers(),
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn settings(&self) -> SessionSettings {
        SessionSettings {
            max_attempts: self.max_attempts,
            retry_delay: Duration::from_secs(self.retry_delay_secs),
            transient_codes: self.transient_codes.clone(),
            lockout_codes: self.lockout_codes.clone(),
            expired_markers: self.expired_markers.clone(),
        }
    }
}
