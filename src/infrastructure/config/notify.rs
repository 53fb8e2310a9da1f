//! Notification configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::adapter::outbound::notifier::lark::DEFAULT_BASE_URL;
use crate::application::{ForwarderSettings, MessageLabels};

const fn default_true() -> bool {
    true
}

/// `[notify]` section: message content and pacing.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Pause between two messages (milliseconds).
    #[serde(default = "default_spacing_ms")]
    pub spacing_ms: u64,
    /// Account number shown in messages.
    #[serde(default)]
    pub account_label: String,
    /// Bank name shown in messages.
    #[serde(default)]
    pub bank_label: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

const fn default_spacing_ms() -> u64 {
    500
}

fn default_currency() -> String {
    "VND".into()
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            spacing_ms: default_spacing_ms(),
            account_label: String::new(),
            bank_label: String::new(),
            currency: default_currency(),
        }
    }
}

impl NotifyConfig {
    #[must_use]
    pub fn settings(&self) -> ForwarderSettings {
        ForwarderSettings {
            spacing: Duration::from_millis(self.spacing_ms),
            labels: MessageLabels {
                account: self.account_label.clone(),
                bank: self.bank_label.clone(),
                currency: self.currency.clone(),
            },
        }
    }
}

/// `[lark]` section. App id and secret come from the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct LarkConfig {
    /// Send messages to Lark; when off, messages are only logged.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_lark_base_url")]
    pub base_url: String,
    /// Target group chat.
    #[serde(default)]
    pub chat_id: String,
    #[serde(default = "default_lark_timeout_secs")]
    pub timeout_secs: u64,
    /// Loaded from `LARK_APP_ID`.
    #[serde(skip)]
    pub app_id: Option<String>,
    /// Loaded from `LARK_APP_SECRET`.
    #[serde(skip)]
    pub app_secret: Option<String>,
}

fn default_lark_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

const fn default_lark_timeout_secs() -> u64 {
    10
}

impl Default for LarkConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            base_url: default_lark_base_url(),
            chat_id: String::new(),
            timeout_secs: default_lark_timeout_secs(),
            app_id: None,
            app_secret: None,
        }
    }
}
