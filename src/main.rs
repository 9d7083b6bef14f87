//! Entry point and runtime setup.

use anyhow::Result;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

mod api;
mod app;
mod config;
mod dates;
mod decode;
mod draft;
mod events;
mod input;
mod layout;
mod scan;
mod session;
mod shortcuts;
mod submit;
mod tasks;
mod ui;
mod validation;
mod worker;

use config::Config;

/// Log to a file so the TUI owns stdout; the guard keeps the writer alive.
fn init_logging(log_file: &str) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::never(".", log_file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to init logging: {e}"))?;
    tracing::info!("logging to {log_file}");
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::load_or_default(Path::new("config.toml"))?;
    let _log_guard = init_logging(&cfg.app.log_file)?;
    tracing::info!("app starting, backend {}", cfg.api.base_url);

    let mut terminal = ui::init_terminal()?;
    let res = app::run_app(&mut terminal, cfg).await;
    ui::restore_terminal()?;

    if let Err(ref e) = res {
        tracing::error!("app error: {e}");
    }
    tracing::info!("app exiting");
    res
}
