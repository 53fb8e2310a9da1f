//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file; secrets and a few operational
//! knobs come from the environment.
//!
//! # Example
//!
//! ```no_run
//! use bankwatch::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::logging::LoggingConfig;
use super::notify::{LarkConfig, NotifyConfig};
use super::orders::OrdersConfig;
use super::portal::{CaptchaConfig, PortalConfig};
use super::schedule::{SchedulerConfig, SessionConfig};
use super::store::{DedupConfig, StoreConfig};
use crate::domain::{BusinessTime, OrderReferencePattern};
use crate::error::{ConfigError, Result};
use crate::port::Credentials;

pub const ENV_USERNAME: &str = "BANK_USERNAME";
pub const ENV_PASSWORD: &str = "BANK_PASSWORD";
pub const ENV_CORP_ID: &str = "BANK_CORP_ID";
pub const ENV_LARK_APP_ID: &str = "LARK_APP_ID";
pub const ENV_LARK_APP_SECRET: &str = "LARK_APP_SECRET";
pub const ENV_WOO_KEY: &str = "WOO_CONSUMER_KEY";
pub const ENV_WOO_SECRET: &str = "WOO_CONSUMER_SECRET";
pub const ENV_WOO_TOKEN: &str = "WOO_SECURE_TOKEN";
pub const ENV_FETCH_INTERVAL: &str = "FETCH_INTERVAL_SECS";
pub const ENV_RESTART_MINUTES: &str = "SESSION_RESTART_MINUTES";
pub const ENV_MAX_ATTEMPTS: &str = "LOGIN_MAX_ATTEMPTS";

/// Portal login secrets, read from the environment only.
#[derive(Clone, Default)]
struct BankSecrets {
    username: Option<String>,
    password: Option<String>,
    corp_id: Option<String>,
}

impl std::fmt::Debug for BankSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BankSecrets")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("corp_id", &self.corp_id)
            .finish()
    }
}

/// Main application configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Poll cadence, restarts and recovery timing.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Login retry policy and rejection classification.
    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub portal: PortalConfig,

    #[serde(default)]
    pub captcha: CaptchaConfig,

    /// Where fetch batches are kept.
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub dedup: DedupConfig,

    /// Message content and pacing.
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Lark chat delivery.
    #[serde(default)]
    pub lark: LarkConfig,

    /// Optional WooCommerce order forwarding.
    #[serde(default)]
    pub orders: OrdersConfig,

    #[serde(skip)]
    bank: BankSecrets,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_override<T: std::str::FromStr>(field: &'static str, raw: Option<String>) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match non_empty(raw) {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|e: T::Err| {
            ConfigError::InvalidValue {
                field,
                reason: format!("{raw:?}: {e}"),
            }
            .into()
        }),
    }
}

impl Config {
    /// Parse configuration from TOML content, reading secrets from the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed, an override is not
    /// a number, or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        Self::parse_toml_with_env(content, |key| std::env::var(key).ok())
    }

    /// Parse configuration from TOML content with an explicit environment.
    ///
    /// # Errors
    ///
    /// Same as [`Config::parse_toml`].
    #[allow(clippy::result_large_err)]
    pub fn parse_toml_with_env<F>(content: &str, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.apply_env(&env)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsing fails.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    fn apply_env<F>(&mut self, env: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Secrets never come from the config file.
        self.bank = BankSecrets {
            username: non_empty(env(ENV_USERNAME)),
            password: env(ENV_PASSWORD).filter(|p| !p.is_empty()),
            corp_id: non_empty(env(ENV_CORP_ID)),
        };
        self.lark.app_id = non_empty(env(ENV_LARK_APP_ID));
        self.lark.app_secret = non_empty(env(ENV_LARK_APP_SECRET));
        self.orders.consumer_key = non_empty(env(ENV_WOO_KEY));
        self.orders.consumer_secret = non_empty(env(ENV_WOO_SECRET));
        self.orders.secure_token = non_empty(env(ENV_WOO_TOKEN));

        if let Some(secs) = parse_override(ENV_FETCH_INTERVAL, env(ENV_FETCH_INTERVAL))? {
            self.scheduler.fetch_interval_secs = secs;
        }
        if let Some(minutes) = parse_override(ENV_RESTART_MINUTES, env(ENV_RESTART_MINUTES))? {
            self.scheduler.restart_interval_minutes = minutes;
        }
        if let Some(attempts) = parse_override(ENV_MAX_ATTEMPTS, env(ENV_MAX_ATTEMPTS))? {
            self.session.max_attempts = attempts;
        }
        Ok(())
    }

    /// Validate configuration values.
    ///
    /// Credentials are not checked here; `status` works without them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for the first offending field.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("scheduler.fetch_interval_secs", self.scheduler.fetch_interval_secs),
            ("scheduler.fetch_retry_secs", self.scheduler.fetch_retry_secs),
            (
                "scheduler.restart_interval_minutes",
                self.scheduler.restart_interval_minutes,
            ),
            ("scheduler.health_interval_secs", self.scheduler.health_interval_secs),
            ("scheduler.poll_interval_ms", self.scheduler.poll_interval_ms),
            ("portal.timeout_secs", self.portal.timeout_secs),
            ("captcha.timeout_secs", self.captcha.timeout_secs),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than 0".into(),
                }
                .into());
            }
        }

        if self.scheduler.max_pages == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scheduler.max_pages",
                reason: "must be greater than 0".into(),
            }
            .into());
        }

        if self.session.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.max_attempts",
                reason: "must be at least 1".into(),
            }
            .into());
        }

        BusinessTime::from_name(&self.portal.timezone).map_err(|e| ConfigError::InvalidValue {
            field: "portal.timezone",
            reason: e.to_string(),
        })?;

        if self.store.prefix.is_empty() || self.store.prefix.contains(['/', '\\']) {
            return Err(ConfigError::InvalidValue {
                field: "store.prefix",
                reason: "must be a plain, non-empty file name prefix".into(),
            }
            .into());
        }

        if self.lark.enabled && self.lark.chat_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "lark.chat_id",
                reason: "required when lark is enabled".into(),
            }
            .into());
        }

        self.order_pattern()?;

        Ok(())
    }

    /// Portal login credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] naming the first unset variable.
    #[allow(clippy::result_large_err)]
    pub fn credentials(&self) -> Result<Credentials> {
        let username = self.bank.username.clone().ok_or(ConfigError::MissingField {
            field: ENV_USERNAME,
        })?;
        let password = self.bank.password.clone().ok_or(ConfigError::MissingField {
            field: ENV_PASSWORD,
        })?;
        let corp_id = self.bank.corp_id.clone().ok_or(ConfigError::MissingField {
            field: ENV_CORP_ID,
        })?;
        Ok(Credentials {
            username,
            password,
            corp_id,
        })
    }

    /// Business timezone configured for the portal.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown zone name.
    pub fn business_time(&self) -> Result<BusinessTime> {
        BusinessTime::from_name(&self.portal.timezone)
    }

    /// Order reference matcher built from `[orders]`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a zero digit count.
    #[allow(clippy::result_large_err)]
    pub fn order_pattern(&self) -> Result<OrderReferencePattern> {
        OrderReferencePattern::new(&self.orders.reference_prefix, self.orders.reference_digits)
            .map_err(|e| {
                ConfigError::InvalidValue {
                    field: "orders.reference_digits",
                    reason: e.to_string(),
                }
                .into()
            })
    }

    /// Lark app id and secret, when chat delivery is on and both are set.
    #[must_use]
    pub fn lark_app(&self) -> Option<(&str, &str)> {
        if !self.lark.enabled {
            return None;
        }
        match (&self.lark.app_id, &self.lark.app_secret) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.as_str())),
            _ => None,
        }
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self) {
        let tz = self.business_time().unwrap_or_default().tz();
        self.logging.init(tz);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const MINIMAL: &str = r#"
[lark]
chat_id = "oc_chat"
"#;

    #[test]
    fn defaults_apply_to_minimal_file() {
        let config = Config::parse_toml_with_env(MINIMAL, env_of(&[])).unwrap();

        let scheduler = config.scheduler.settings();
        assert_eq!(scheduler.fetch_interval, Duration::from_secs(20));
        assert_eq!(scheduler.restart_interval, Duration::from_secs(600));
        assert_eq!(scheduler.health_interval, Duration::from_secs(10));
        assert_eq!(scheduler.recovery_cooldown, Duration::from_secs(180));
        assert_eq!(config.session.max_attempts, 3);
        assert_eq!(config.portal.timezone, "Asia/Ho_Chi_Minh");
        assert_eq!(config.store.prefix, "transactions");
        assert_eq!(config.dedup.settings().watermark_buffer, Duration::from_secs(120));
        assert_eq!(config.logging.format, "pretty");
        assert!(config.orders.woo_settings().is_none());
    }

    #[test]
    fn env_overrides_and_secrets() {
        let env = env_of(&[
            (ENV_USERNAME, "operator"),
            (ENV_PASSWORD, "secret"),
            (ENV_CORP_ID, "CORP01"),
            (ENV_FETCH_INTERVAL, "45"),
            (ENV_RESTART_MINUTES, "15"),
            (ENV_MAX_ATTEMPTS, "5"),
        ]);
        let config = Config::parse_toml_with_env(MINIMAL, env).unwrap();

        assert_eq!(config.scheduler.fetch_interval_secs, 45);
        assert_eq!(
            config.scheduler.settings().restart_interval,
            Duration::from_secs(900)
        );
        assert_eq!(config.session.settings().max_attempts, 5);

        let credentials = config.credentials().unwrap();
        assert_eq!(credentials.username, "operator");
        assert_eq!(credentials.corp_id, "CORP01");
    }

    #[test]
    fn missing_credentials_name_the_variable() {
        let env = env_of(&[(ENV_USERNAME, "operator"), (ENV_CORP_ID, "CORP01")]);
        let config = Config::parse_toml_with_env(MINIMAL, env).unwrap();

        let err = config.credentials().unwrap_err();
        assert!(err.to_string().contains(ENV_PASSWORD));
    }

    #[test]
    fn malformed_override_is_rejected() {
        let err =
            Config::parse_toml_with_env(MINIMAL, env_of(&[(ENV_FETCH_INTERVAL, "soon")]))
                .unwrap_err();
        assert!(err.to_string().contains(ENV_FETCH_INTERVAL));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let cases = [
            "[scheduler]\nfetch_interval_secs = 0\n[lark]\nchat_id = \"c\"",
            "[session]\nmax_attempts = 0\n[lark]\nchat_id = \"c\"",
            "[portal]\ntimezone = \"Mars/Olympus\"\n[lark]\nchat_id = \"c\"",
            "[orders]\nreference_digits = 0\n[lark]\nchat_id = \"c\"",
            "[store]\nprefix = \"a/b\"\n[lark]\nchat_id = \"c\"",
            "[lark]\nenabled = true",
        ];
        for toml in cases {
            assert!(
                Config::parse_toml_with_env(toml, env_of(&[])).is_err(),
                "expected rejection for {toml:?}"
            );
        }
    }

    #[test]
    fn orders_need_keys_to_activate() {
        let toml = r#"
[lark]
enabled = false

[orders]
enabled = true
base_url = "https://shop.example.com"
webhook_url = "https://hooks.example.com/pay"
"#;
        let without_keys = Config::parse_toml_with_env(toml, env_of(&[])).unwrap();
        assert!(without_keys.orders.woo_settings().is_none());

        let env = env_of(&[(ENV_WOO_KEY, "ck_1"), (ENV_WOO_SECRET, "cs_1"), (ENV_WOO_TOKEN, "tok")]);
        let with_keys = Config::parse_toml_with_env(toml, env).unwrap();
        let woo = with_keys.orders.woo_settings().unwrap();
        assert_eq!(woo.consumer_key, "ck_1");
        assert_eq!(woo.secure_token.as_deref(), Some("tok"));
        assert!(with_keys.lark_app().is_none());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = Config::parse_toml_with_env("[scheduler\n", env_of(&[])).unwrap_err();
        assert!(err.to_string().contains("parse"));
    }
}
