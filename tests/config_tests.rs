use std::fs;

use bankwatch::error::{ConfigError, Error};
use bankwatch::infrastructure::config::settings::Config;

const FULL: &str = r#"
[logging]
level = "debug"
format = "json"

[scheduler]
fetch_interval_secs = 30
restart_interval_minutes = 15

[session]
max_attempts = 4
lockout_codes = ["GW18", "GW21"]

[portal]
base_url = "http://sidecar:8800"
timezone = "Asia/Bangkok"

[store]
data_dir = "/var/lib/bankwatch"

[dedup]
min_reference_len = 8
require_counterparty_or_amount = true

[notify]
account_label = "0123456789"
bank_label = "Example Bank"

[lark]
chat_id = "oc_ops"

[orders]
enabled = true
base_url = "https://shop.example.com"
reference_prefix = "DH"
reference_digits = 5
"#;

#[test]
fn loads_every_section_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, FULL).unwrap();

    let config = Config::load(&path).unwrap();

    assert_eq!(config.logging.format, "json");
    assert_eq!(config.session.settings().lockout_codes, vec!["GW18", "GW21"]);
    assert_eq!(config.portal.base_url, "http://sidecar:8800");
    assert_eq!(config.business_time().unwrap().name(), "Asia/Bangkok");
    assert!(config.dedup.settings().policy.require_counterparty_or_amount);
    assert_eq!(config.notify.settings().labels.bank, "Example Bank");
    assert_eq!(
        config.order_pattern().unwrap().detect("thanh toan DH12345"),
        Some("DH12345")
    );
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();

    let err = Config::load(dir.path().join("absent.toml")).unwrap_err();

    assert!(matches!(err, Error::Config(ConfigError::ReadFile(_))));
}

#[test]
fn unknown_timezone_names_the_field() {
    let toml = "[portal]\ntimezone = \"Nowhere/City\"\n[lark]\nenabled = false\n";

    let err = Config::parse_toml_with_env(toml, |_| None).unwrap_err();

    match err {
        Error::Config(ConfigError::InvalidValue { field, .. }) => {
            assert_eq!(field, "portal.timezone");
        }
        other => panic!("unexpected error {other:?}"),
    }
}
