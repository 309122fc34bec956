use std::future::IntoFuture;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::Notify;
use tracing::{info, warn};

use restvoice_server::api::{AppState, UseCases};
use restvoice_server::config::RestvoiceConfig;
use restvoice_state_memory::MemoryRepository;

/// Restvoice invoicing HTTP server.
#[derive(Parser, Debug)]
#[command(name = "restvoice-server", about = "Standalone HTTP server for Restvoice")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "restvoice.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut config = RestvoiceConfig::load(Path::new(&cli.config))?;
    config.apply_env_overrides(|key| std::env::var(key).ok());

    let repository = Arc::new(MemoryRepository::new());
    let state = AppState::from_config(&config.auth, UseCases::new(&repository))?;

    if !config.auth.enabled {
        warn!("authentication disabled, every request runs with all roles");
    }
    info!(mode = ?config.auth.mode, issuer = %config.auth.issuer, "token verification configured");

    // Warm the key cache; an unreachable identity provider is not fatal
    // because unknown keys trigger a refresh on demand.
    if let Some(keys) = &state.keys {
        match keys.refresh().await {
            Ok(count) => info!(keys = count, "signing keys loaded"),
            Err(e) => warn!(error = %e, "signing keys not loaded at startup"),
        }
    }

    let app = restvoice_server::api::router(state);

    // Resolve the bind address (CLI overrides take precedence).
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "restvoice-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM. In-flight requests
    // get `shutdown_timeout_seconds` to finish.
    let stopping = Arc::new(Notify::new());
    let trigger = Arc::clone(&stopping);
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        trigger.notify_one();
    });
    let drain_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    tokio::select! {
        result = server.into_future() => result?,
        () = async {
            stopping.notified().await;
            tokio::time::sleep(drain_timeout).await;
        } => {
            warn!(
                timeout_secs = config.server.shutdown_timeout_seconds,
                "shutdown timeout exceeded, dropping open connections"
            );
        }
    }

    info!("restvoice-server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
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
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
