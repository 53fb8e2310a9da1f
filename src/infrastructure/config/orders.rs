//! Order system configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::adapter::outbound::order::WooSettings;
use crate::domain::order::{DEFAULT_ORDER_DIGITS, DEFAULT_ORDER_PREFIX};

/// `[orders]` section. Keys and token come from the environment.
///
/// Order forwarding is active only when it is enabled, a store URL is set,
/// and both consumer keys are present.
#[derive(Debug, Clone, Deserialize)]
pub struct OrdersConfig {
    #[serde(default)]
    pub enabled: bool,
    /// WooCommerce site root.
    #[serde(default)]
    pub base_url: String,
    /// Payment webhook, called with the `Secure-Token` header.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Account identifier reported to the webhook.
    #[serde(default)]
    pub sub_account: String,
    /// Order reference prefix in transfer descriptions.
    #[serde(default = "default_reference_prefix")]
    pub reference_prefix: String,
    /// Digits following the prefix.
    #[serde(default = "default_reference_digits")]
    pub reference_digits: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Loaded from `WOO_CONSUMER_KEY`.
    #[serde(skip)]
    pub consumer_key: Option<String>,
    /// Loaded from `WOO_CONSUMER_SECRET`.
    #[serde(skip)]
    pub consumer_secret: Option<String>,
    /// Loaded from `WOO_SECURE_TOKEN`.
    #[serde(skip)]
    pub secure_token: Option<String>,
}

fn default_reference_prefix() -> String {
    DEFAULT_ORDER_PREFIX.into()
}

const fn default_reference_digits() -> usize {
    DEFAULT_ORDER_DIGITS
}

const fn default_timeout_secs() -> u64 {
    15
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: String::new(),
            webhook_url: None,
            sub_account: String::new(),
            reference_prefix: default_reference_prefix(),
            reference_digits: default_reference_digits(),
            timeout_secs: default_timeout_secs(),
            consumer_key: None,
            consumer_secret: None,
            secure_token: None,
        }
    }
}

impl OrdersConfig {
    /// Gateway settings, or `None` when order forwarding is off.
    #[must_use]
    pub fn woo_settings(&self) -> Option<WooSettings> {
        if !self.enabled || self.base_url.is_empty() {
            return None;
        }
        let (Some(key), Some(secret)) = (&self.consumer_key, &self.consumer_secret) else {
            return None;
        };
        Some(WooSettings {
            base_url: self.base_url.clone(),
            consumer_key: key.clone(),
            consumer_secret: secret.clone(),
            webhook_url: self.webhook_url.clone(),
            secure_token: self.secure_token.clone(),
            sub_account: self.sub_account.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}
