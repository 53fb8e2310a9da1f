//! Portal sidecar and challenge solver configuration.

use serde::Deserialize;

use crate::domain::time::DEFAULT_TIMEZONE;

/// `[portal]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    /// Browser-automation sidecar address.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout. Scraping several pages is slow.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// IANA zone the portal reports times in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8800".into()
}

const fn default_timeout_secs() -> u64 {
    120
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.into()
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            timezone: default_timezone(),
        }
    }
}

/// `[captcha]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptchaConfig {
    /// OCR endpoint receiving the raw challenge image.
    #[serde(default = "default_captcha_url")]
    pub url: String,
    #[serde(default = "default_captcha_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_captcha_url() -> String {
    "http://127.0.0.1:8801/solve".into()
}

const fn default_captcha_timeout_secs() -> u64 {
    30
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            url: default_captcha_url(),
            timeout_secs: default_captcha_timeout_secs(),
        }
    }
}
