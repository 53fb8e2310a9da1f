//! Notification adapters.
//!
//! Implements the `port::Notifier` trait for the chat channel and a
//! log-only fallback.

pub mod lark;

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::port::Notifier;

pub use lark::LarkNotifier;

/// Writes every message to the log instead of a chat channel.
///
/// Used when chat notifications are disabled.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, message: &str) -> Result<()> {
        info!(message = %message, "Notification");
        Ok(())
    }
}
