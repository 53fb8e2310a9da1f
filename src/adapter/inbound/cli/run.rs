//! Handler for the `run` command.

use std::path::Path;

use tracing::info;

use crate::application::ExitStatus;
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;

/// Load configuration, start logging and run the scheduler to completion.
///
/// # Errors
///
/// Returns configuration and wiring errors; runtime failures come back as
/// [`ExitStatus::Fatal`].
pub async fn execute(config_path: &Path) -> Result<ExitStatus> {
    let config = Config::load(config_path)?;
    // Fail on missing credentials before logging is installed.
    config.credentials()?;
    config.init_logging();
    info!(config = %config_path.display(), "Configuration loaded");

    bootstrap::run(&config).await
}
