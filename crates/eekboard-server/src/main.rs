//! eekboard-server entry point.
//!
//! Loads the configuration, connects to the bus and runs the service loop
//! until a client calls `Destroy` or the process receives Ctrl-C.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()
//!  └─ TomlLayoutLoader + HeadlessViewFactory → StandardContextFactory
//!  └─ ServiceRuntime::start()   -- exports the service object, claims the name
//!  └─ run_until(ctrl_c)         -- single task owning all context state
//! ```

use std::sync::Arc;

use anyhow::Context as _;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use zbus::Connection;

use eekboard_server::application::{RepeatSettings, StandardContextFactory};
use eekboard_server::infrastructure::dbus::ServiceRuntime;
use eekboard_server::infrastructure::layouts::TomlLayoutLoader;
use eekboard_server::infrastructure::storage::config::{config_file_path, load_config, AppConfig};
use eekboard_server::infrastructure::view::HeadlessViewFactory;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging can only start after the config names a level, so a config
    // error is reported once the subscriber exists.
    let loaded = load_config();
    let level = loaded
        .as_ref()
        .map(|cfg| cfg.log.level.clone())
        .unwrap_or_else(|_| "info".to_string());

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    let config = match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("failed to load config, using defaults: {e}");
            AppConfig::default()
        }
    };
    info!(config = ?config_file_path().ok(), "eekboard-server starting");

    let conn = if config.bus.session {
        Connection::session().await
    } else {
        Connection::system().await
    }
    .context("cannot connect to the message bus")?;

    let (view_tx, view_rx) = mpsc::unbounded_channel();
    let factory = StandardContextFactory::new(
        Arc::new(TomlLayoutLoader::new(&config.layouts.directory)),
        Arc::new(HeadlessViewFactory::new(view_tx)),
        RepeatSettings::from(&config.repeat),
    );

    let runtime = ServiceRuntime::start(
        conn,
        &config.bus.name,
        &config.bus.path,
        Arc::new(factory),
        view_rx,
    )
    .await
    .context("cannot register the keyboard service")?;

    info!("eekboard-server ready.  Press Ctrl-C to exit.");
    runtime
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("cannot listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    info!("eekboard-server stopped");
    Ok(())
}
