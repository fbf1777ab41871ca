//! Delta Stream server binary.
//!
//! Loads configuration, wires the service context, and serves the HTTP and
//! WebSocket endpoints until ctrl-c. On shutdown the dispatch worker drains
//! the outbox before the process exits.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use delta_stream::adapters::auth::JwtTokenValidator;
use delta_stream::adapters::broker::RedisBroker;
use delta_stream::application::ServiceContext;
use delta_stream::config::AppConfig;
use delta_stream::domain::foundation::ServerId;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let server_id = ServerId::from_env();
    let broker = Arc::new(RedisBroker::new(&config.broker)?);
    let validator = Arc::new(JwtTokenValidator::new(&config.auth));
    let context = ServiceContext::build(&config, server_id, broker, validator)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker = {
        let worker = context.worker().clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { worker.run(shutdown).await })
    };
    let relay = context.relay().cloned().map(|relay| {
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { relay.run(shutdown).await })
    });

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, server_id = %context.server_id(), "delta stream listening");

    axum::serve(listener, context.router())
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutdown requested");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    if let Err(e) = worker.await {
        tracing::error!(error = %e, "dispatch worker task failed");
    }
    if let Some(relay) = relay {
        if let Err(e) = relay.await {
            tracing::error!(error = %e, "broker relay task failed");
        }
    }

    tracing::info!(dropped = context.outbox().dropped(), "delta stream stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
