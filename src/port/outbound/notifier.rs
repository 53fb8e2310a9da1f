//! Notifier port for chat messages.

use async_trait::async_trait;

use crate::error::Result;

/// Sends a text message to the notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Deliver one message. `Ok` means the channel accepted it.
    async fn send(&self, message: &str) -> Result<()>;
}
