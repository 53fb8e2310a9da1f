//! Composition root: configuration to a running scheduler.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::adapter::outbound::notifier::lark::LarkNotifier;
use crate::adapter::outbound::notifier::LogNotifier;
use crate::adapter::outbound::order::WooCommerceGateway;
use crate::adapter::outbound::portal::{HttpChallengeSolver, HttpPortal};
use crate::adapter::outbound::store::JsonBatchStore;
use crate::application::{DedupStore, ExitStatus, Forwarder, Scheduler, SessionHandle};
use crate::error::Result;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::config::settings::Config;
use crate::port::{BatchStore, Clock, Notifier, OrderGateway};

/// Chat notifier from configuration, falling back to logging.
pub(crate) fn build_notifier(config: &Config) -> Result<Arc<dyn Notifier>> {
    if let Some((app_id, app_secret)) = config.lark_app() {
        let notifier = LarkNotifier::new(
            &config.lark.base_url,
            app_id,
            app_secret,
            &config.lark.chat_id,
            Duration::from_secs(config.lark.timeout_secs),
        )?;
        info!(chat_id = %config.lark.chat_id, "Lark notifier enabled");
        return Ok(Arc::new(notifier));
    }
    if config.lark.enabled {
        warn!("Lark enabled but LARK_APP_ID or LARK_APP_SECRET not set; logging messages only");
    }
    Ok(Arc::new(LogNotifier))
}

/// Order gateway, or `None` when order forwarding is disabled.
pub(crate) fn build_orders(config: &Config) -> Result<Option<Arc<dyn OrderGateway>>> {
    match config.orders.woo_settings() {
        Some(settings) => {
            info!(base_url = %settings.base_url, "Order forwarding enabled");
            Ok(Some(Arc::new(WooCommerceGateway::new(settings)?)))
        }
        None => {
            if config.orders.enabled {
                warn!("Orders enabled but WOO_CONSUMER_KEY or WOO_CONSUMER_SECRET not set; order forwarding disabled");
            }
            Ok(None)
        }
    }
}

/// Dedup store over the configured data directory.
pub fn build_dedup(config: &Config) -> Result<DedupStore> {
    let store: Arc<dyn BatchStore> =
        Arc::new(JsonBatchStore::open(&config.store.data_dir, &config.store.prefix)?);
    Ok(DedupStore::new(
        store,
        config.business_time()?,
        config.dedup.settings(),
    ))
}

/// Wire every adapter into a scheduler.
///
/// # Errors
///
/// Returns an error for missing credentials or an adapter that cannot be
/// built.
pub fn build_scheduler(config: &Config, clock: Arc<dyn Clock>) -> Result<Scheduler> {
    let credentials = config.credentials()?;

    let portal = Arc::new(HttpPortal::new(
        &config.portal.base_url,
        Duration::from_secs(config.portal.timeout_secs),
    )?);
    let solver = Arc::new(HttpChallengeSolver::new(
        &config.captcha.url,
        Duration::from_secs(config.captcha.timeout_secs),
    )?);

    let session = SessionHandle::new(
        portal.clone(),
        solver,
        Arc::clone(&clock),
        config.session.settings(),
    );
    let forwarder = Forwarder::new(
        build_notifier(config)?,
        build_orders(config)?,
        config.order_pattern()?,
        Arc::clone(&clock),
        config.notify.settings(),
    );

    Ok(Scheduler::new(
        session,
        portal,
        build_dedup(config)?,
        forwarder,
        clock,
        credentials,
        config.scheduler.settings(),
    ))
}

/// Resolves on SIGINT, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Interrupt received, shutting down"),
        () = terminate => info!("Terminate received, shutting down"),
    }
}

/// Build the scheduler and run it until a signal or a fatal outcome.
///
/// # Errors
///
/// Returns an error only when wiring fails; runtime failures are reported
/// through the returned [`ExitStatus`].
pub async fn run(config: &Config) -> Result<ExitStatus> {
    let mut scheduler = build_scheduler(config, Arc::new(SystemClock))?;
    info!(
        data_dir = %config.store.data_dir.display(),
        timezone = %config.portal.timezone,
        fetch_interval_secs = config.scheduler.fetch_interval_secs,
        restart_interval_minutes = config.scheduler.restart_interval_minutes,
        "bankwatch starting"
    );
    Ok(scheduler.run(shutdown_signal()).await)
}
