//! Clockwork daemon
//!
//! Owns every clock, alarm and timer and serves them over a Unix socket.

use anyhow::Result;
use clap::Parser;
use clockwork_core::storage::init_data_dir;
use clockwork_daemon::{ConfigManager, Daemon, DesktopNotifier, IpcServer, SystemClock};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "clockworkd")]
#[command(about = "Clockwork daemon - world clocks, alarms and timers", long_about = None)]
struct Args {
    /// Socket path for IPC (defaults to the configured path)
    #[arg(short, long)]
    socket: Option<String>,

    /// Log level (defaults to the configured level)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Alternate config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_manager = Arc::new(match &args.config {
        Some(path) => ConfigManager::from_path(path.clone())?,
        None => ConfigManager::new()?,
    });
    let config = config_manager.get().await;

    let socket_path = args.socket.unwrap_or(config.daemon.socket_path.clone());
    let log_level = args.log_level.unwrap_or(config.daemon.log_level.clone());

    let data_dir = init_data_dir()?;
    let log_file_path = data_dir.join("daemon.log");
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    use tracing_subscriber::fmt::writer::MakeWriterExt;
    let stdout_writer = std::io::stdout.with_max_level(tracing::Level::INFO);
    let file_writer = log_file.with_max_level(tracing::Level::DEBUG);

    tracing_subscriber::fmt()
        .with_writer(stdout_writer.and(file_writer))
        .with_env_filter(&log_level)
        .with_ansi(false)
        .init();

    tracing::info!("Clockwork daemon starting...");
    tracing::info!("Socket path: {}", socket_path);
    tracing::info!("Log file: {}", log_file_path.display());
    if let Some(path) = config_manager.path() {
        tracing::info!("Config file: {}", path.display());
    }

    let notifier = Arc::new(DesktopNotifier::new(&config.notifications));
    let daemon = Daemon::assemble(config_manager, Arc::new(SystemClock), notifier).await?;

    let scheduler_handle = tokio::spawn(daemon.scheduler.clone().run());

    let ipc_server = Arc::new(IpcServer::new(socket_path.clone(), daemon.api_handler.clone()));
    let server_handle = {
        let server = ipc_server.clone();
        tokio::spawn(async move {
            if let Err(e) = server.start().await {
                tracing::error!("IPC server error: {}", e);
            }
        })
    };

    tracing::info!("Daemon ready and listening");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    server_handle.abort();
    scheduler_handle.abort();
    if let Err(e) = fs::remove_file(&socket_path) {
        tracing::debug!("Socket cleanup: {}", e);
    }

    Ok(())
}
