mod app;
mod browser;
mod clipboard;
mod config;
mod cue;
mod dispatch;
mod error;
mod form;
mod instance;
mod movie;
mod ui;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::app::App;
use crate::clipboard::SystemClipboard;
use crate::config::{APP_NAME, APP_TITLE, Config};
use crate::error::Result;
use crate::instance::{InstanceCoordinator, Role};
use crate::movie::omdb::OmdbClient;

const MAX_LOG_FILES: usize = 10;

fn rolling_appender(dir: &Path) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(dir)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(format!("{}.log", APP_NAME))
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
        .map_err(|e| std::io::Error::other(e).into())
}

fn setup_logging() -> Result<()> {
    // Fall back to the home directory when the data directory is unusable
    let file_appender = match config::log_dir().and_then(|dir| rolling_appender(&dir)) {
        Ok(appender) => appender,
        Err(e) => {
            let home = config::home_dir().ok_or(e)?;
            rolling_appender(&home)?
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}=debug", APP_NAME)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(file_appender).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Log to a file, the terminal belongs to the TUI
    if let Err(e) = setup_logging() {
        eprintln!("Warning: Could not set up logging: {}", e);
    }

    info!("Starting {} {}", APP_NAME, env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!("Loaded config");

    let primary = if config.instance.enabled {
        let endpoint = config::instance_endpoint()?;
        let coordinator = InstanceCoordinator::new(
            endpoint,
            Duration::from_millis(config.instance.connect_timeout_ms),
        );

        let role = coordinator.start().await;
        info!(role = role.name(), endpoint = %coordinator.endpoint().display(), "Instance role decided");

        match role {
            Role::Secondary { delivered } => {
                warn!(delivered, "{} is already running, exiting", APP_TITLE);
                println!("{} is already running", APP_TITLE);
                return Ok(());
            }
            Role::Primary(primary) => Some(primary),
            Role::Standalone => {
                warn!("Running without single-instance coordination");
                None
            }
        }
    } else {
        None
    };

    let backend = OmdbClient::new(&config.lookup);
    if !backend.has_api_key() {
        warn!("No OMDb API key configured, lookups will fail");
    }

    let clipboard = SystemClipboard::open();

    let mut app = App::new(config, Arc::new(backend), clipboard);
    let server = primary.map(|p| p.serve(app.activator()));

    let mut terminal = app::init_terminal()?;
    let result = app.run(&mut terminal).await;
    app::restore_terminal()?;

    if let Some(server) = server {
        server.shutdown().await;
    }

    info!("Exiting");
    result
}
