//! parkspot - command-line client for browsing and booking parking and
//! EV-charging spots.
//!
//! Sessions are kept in the OS keychain when logged in with `--remember`,
//! otherwise only for the lifetime of the process.

mod commands;

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use parkspot_core::auth::{KeyringStore, MemoryStore, SecureStorage};
use parkspot_core::config::Config;
use parkspot_core::{ApiClient, AuthClient, AuthError, Session};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{Cli, Context as CommandContext};

/// Rolling log file name inside the cache directory
const LOG_FILE_NAME: &str = "parkspot.log";

/// Initialize the tracing subscriber for logging.
///
/// The returned guard flushes the file writer and must be kept alive.
fn init_tracing(log_to_file: bool) -> Result<Option<WorkerGuard>> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = if log_to_file {
        let dir = Config::cache_dir()?;
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE_NAME));
        (
            Some(fmt::layer().with_writer(writer).with_ansi(false)),
            Some(guard),
        )
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_file)?;

    let config = Config::load().context("Failed to load configuration")?;
    info!(api = %config.api_base_url, "parkspot starting");

    let storage: Arc<dyn SecureStorage> = if cli.memory_store {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(KeyringStore::with_service(config.keyring_service.clone()))
    };
    let session = Arc::new(Session::new(storage));
    let auth = Arc::new(
        AuthClient::new(&config, session.clone()).context("Failed to build HTTP client")?,
    );
    let api = ApiClient::new(auth.clone());

    let mut ctx = CommandContext {
        config,
        session,
        auth,
        api,
    };

    if let Err(e) = commands::run(cli.command, &mut ctx).await {
        if let Some(auth_err) = e.downcast_ref::<AuthError>() {
            if auth_err.is_session_expired() {
                eprintln!("Your session has expired. Please log in again.");
            } else if auth_err.is_network_error() {
                eprintln!("Could not reach the server. Check your connection and try again.");
            }
        }
        return Err(e);
    }
    Ok(())
}
