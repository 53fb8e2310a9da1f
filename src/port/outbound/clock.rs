//! Clock port.
//!
//! Every suspension point in the scheduler (poll sleep, login retry delay,
//! recovery cooldown, notification spacing) goes through this trait so a
//! test clock can drive the loop without wall-clock waits.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Source of the current instant and of timed suspension.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Suspend the caller for `duration`.
    async fn sleep(&self, duration: Duration);
}
