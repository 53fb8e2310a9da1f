//! Batch storage and dedup configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::adapter::outbound::store::json::DEFAULT_PREFIX;
use crate::application::DedupSettings;
use crate::domain::policy::DEFAULT_MIN_REFERENCE_LEN;
use crate::domain::ReferencePolicy;

/// `[store]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one JSON file per batch.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            prefix: default_prefix(),
        }
    }
}

/// `[dedup]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DedupConfig {
    /// Subtracted from the newest transaction time to get the watermark.
    #[serde(default = "default_watermark_buffer_secs")]
    pub watermark_buffer_secs: u64,
    #[serde(default = "default_min_reference_len")]
    pub min_reference_len: usize,
    /// Also require a counterparty or a non-zero amount.
    #[serde(default)]
    pub require_counterparty_or_amount: bool,
}

const fn default_watermark_buffer_secs() -> u64 {
    120
}

const fn default_min_reference_len() -> usize {
    DEFAULT_MIN_REFERENCE_LEN
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            watermark_buffer_secs: default_watermark_buffer_secs(),
            min_reference_len: default_min_reference_len(),
            require_counterparty_or_amount: false,
        }
    }
}

impl DedupConfig {
    #[must_use]
    pub const fn settings(&self) -> DedupSettings {
        DedupSettings {
            watermark_buffer: Duration::from_secs(self.watermark_buffer_secs),
            policy: ReferencePolicy {
                min_reference_len: self.min_reference_len,
                require_counterparty_or_amount: self.require_counterparty_or_amount,
            },
        }
    }
}
