//! dazeus-karma - karma counting plugin for the DaZeus IRC bot.
//!
//! Connects to a running DaZeus core, subscribes to chat messages and keeps
//! score of `object++` / `object--` votes.
//!
//! # Usage
//!
//! ```text
//! dazeus-karma unix:/var/run/dazeus/dazeus.sock
//! dazeus-karma tcp:localhost:1234 --config karma.toml
//! ```
//!
//! # Configuration
//!
//! - `KARMA_CONFIG` - Optional config file (.toml, .json or .yaml)
//! - `KARMA_STORE_BACKEND` - `dazeus` (default), `sqlite` or `memory`
//! - `KARMA_LOG_FORMAT` - `text` (default) or `json`
//! - `RUST_LOG` - Log filter

mod bot;
mod factory;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use karma_core::{EventResponder, KarmaConfig, LogFormat};
use karma_dazeus::{DaZeusClient, Endpoint, PRIVMSG};
use tokio::signal;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "dazeus-karma", version)]
#[command(about = "Karma counting plugin for the DaZeus IRC bot")]
struct Cli {
    /// DaZeus socket: `unix:/path/to/socket`, `tcp:host:port` or a socket path
    endpoint: Endpoint,

    /// Configuration file
    #[arg(short, long, env = "KARMA_CONFIG")]
    config: Option<PathBuf>,
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn load_config(path: Option<&Path>) -> Result<KarmaConfig> {
    let config = match path {
        Some(path) => KarmaConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?
            .with_env_overrides(),
        None => KarmaConfig::from_env(),
    };
    config.validate()?;
    Ok(config)
}

fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(Level::INFO.into())
        .add_directive("dazeus_karma=debug".parse()?);

    // stdout is left alone; everything goes to stderr
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
    Ok(())
}

async fn run(endpoint: &Endpoint, config: KarmaConfig) -> Result<()> {
    let client = Arc::new(DaZeusClient::connect(endpoint).await?);
    client
        .handshake(
            &config.plugin_name,
            &config.plugin_version,
            config.config_group.as_deref(),
        )
        .await?;
    client.subscribe(&[PRIVMSG]).await?;
    info!(%endpoint, backend = ?config.store.backend, "Connected to DaZeus");

    let store = factory::create_store(&config, client.clone())?;
    let responder = EventResponder::new(store, &config);

    let result = bot::run_event_loop(&client, &responder, shutdown_signal()).await;
    if let Err(e) = client.close().await {
        warn!("Failed to close DaZeus connection: {}", e);
    }
    result.context("lost connection to DaZeus")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not failures
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("dazeus-karma: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(config.log_format) {
        eprintln!("dazeus-karma: failed to initialise logging: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(&cli.endpoint, config).await {
        Ok(()) => {
            info!("dazeus-karma stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
