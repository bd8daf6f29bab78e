//! Webhook Dispatcher - routes GitHub webhooks to downstream services.
//!
//! This binary:
//! - Receives GitHub webhooks and verifies their signature
//! - Looks up the target for the repository in the route file
//! - Forwards the raw payload in the background and returns 200 OK

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use webhook_dispatcher::config::load_env_file;
use webhook_dispatcher::web::is_signature_verification_enabled;
use webhook_dispatcher::{create_router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration first: debug mode decides the default log level.
    let env_file = load_env_file(None);
    let config = Config::from_env().context("Failed to load configuration")?;

    let default_level = if config.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("webhook_dispatcher_starting");

    if let Some(path) = &env_file {
        info!(path = %path.display(), "env_file_loaded");
    }

    let signature_enabled = is_signature_verification_enabled(&config.webhook_secret);
    info!(
        port = config.port,
        route_file = %config.route_file.display(),
        debug = config.debug,
        signature_verification = signature_enabled,
        forward_timeout_ms = config.forward_timeout_ms,
        "config_loaded"
    );

    if !signature_enabled {
        warn!("webhook_secret_not_configured_requests_are_unauthenticated");
    }

    let port = config.port;
    let state = AppState::new(config).context("Failed to create HTTP client")?;
    let app = create_router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "webhook_dispatcher_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("webhook_dispatcher_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "ctrl_c_handler_unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "sigterm_handler_unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("webhook_dispatcher_shutting_down");
}
