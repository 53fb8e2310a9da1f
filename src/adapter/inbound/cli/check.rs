//! Handler for the `check` command.

use std::path::Path;

use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Validate the configuration file and the environment secrets.
///
/// # Errors
///
/// Returns the first configuration problem found.
pub fn execute(config_path: &Path) -> Result<()> {
    output::header(env!("CARGO_PKG_VERSION"));

    let config = Config::load(config_path)?;
    output::success(&format!("Configuration valid ({})", config_path.display()));

    let credentials = config.credentials()?;
    output::success(&format!(
        "Credentials present for {} / {}",
        credentials.username, credentials.corp_id
    ));

    let scheduler = config.scheduler.settings();
    output::section("Schedule");
    output::field("Fetch", format!("every {}s", scheduler.fetch_interval.as_secs()));
    output::field("Restart", format!("every {}m", scheduler.restart_interval.as_secs() / 60));
    output::field("Health", format!("every {}s", scheduler.health_interval.as_secs()));
    output::field("Cooldown", format!("{}s", scheduler.recovery_cooldown.as_secs()));
    output::field("Login tries", config.session.max_attempts);
    output::field("Timezone", &config.portal.timezone);

    output::section("Delivery");
    output::field("Portal", &config.portal.base_url);
    output::field("Data dir", config.store.data_dir.display());
    match config.lark_app() {
        Some(_) => output::field("Chat", format!("lark ({})", config.lark.chat_id)),
        None => {
            output::field("Chat", "log only");
            if config.lark.enabled {
                output::warning("LARK_APP_ID or LARK_APP_SECRET not set");
            }
        }
    }
    match config.orders.woo_settings() {
        Some(woo) => output::field("Orders", woo.base_url),
        None => output::field("Orders", "disabled"),
    }

    Ok(())
}
