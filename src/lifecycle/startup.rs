//! Startup orchestration.
//!
//! # Responsibilities
//! - Check the agent socket and assemble the dispatcher
//! - Bind the listener only once everything else succeeded
//! - Serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::error::StartupError;
use crate::gateway::Gateway;
use crate::http::{tls, HttpServer};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

/// Bind the configured address.
pub async fn bind(address: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.to_string(),
            source,
        })
}

/// Build, bind and serve `config` until `shutdown` fires.
pub async fn serve(config: GatewayConfig, shutdown: &Shutdown) -> Result<(), StartupError> {
    let stop = shutdown.subscribe();
    let gateway = Gateway::builder(config.clone())
        .tls(config.listener.tls.is_some())
        .build()?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let tls = match &config.listener.tls {
        Some(tls_config) => Some(
            tls::load_tls_config(tls_config)
                .await
                .map_err(StartupError::Tls)?,
        ),
        None => None,
    };

    let listener = bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %config.listener.bind_address,
        tls = tls.is_some(),
        agent = %gateway.agent().socket_path().display(),
        "Gateway listening"
    );

    let server = HttpServer::new(gateway.into_router());
    match tls {
        Some(tls) => {
            let listener = listener.into_std()?;
            server.run_tls(listener, tls, stop).await?
        }
        None => server.run(listener, stop).await?,
    }
    Ok(())
}
