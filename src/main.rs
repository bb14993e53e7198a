//! panel-gateway
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                  PANEL GATEWAY                   │
//!                      │                                                  │
//!   Browser / API      │  ┌────────┐   ┌──────────────┐                   │
//!   ───────────────────┼─▶│ server │──▶│ global chain │                   │
//!                      │  └────────┘   │ audit→demo→  │                   │
//!                      │               │ locale       │                   │
//!                      │               └──────┬───────┘                   │
//!                      │        ┌──────────┬──┴───────┬──────────┐       │
//!                      │        ▼          ▼          ▼          ▼       │
//!                      │    /health     static    private     unmatched  │
//!                      │                bundle     chain     ┌────┴────┐  │
//!                      │                           + group   ▼         ▼  │
//!                      │                                 agent      SPA  │
//!                      │                                 bridge    index │
//!                      │                                   │              │
//!                      └───────────────────────────────────┼──────────────┘
//!                                                          ▼
//!                                                /tmp/agent.sock (agent)
//! ```

use std::path::PathBuf;

use clap::Parser;

use panel_gateway::config::{load_config, validation::validate_config, ConfigError};
use panel_gateway::lifecycle::{self, signals, Shutdown};
use panel_gateway::observability::logging;
use panel_gateway::{GatewayConfig, StartupError};

#[derive(Parser)]
#[command(name = "panel-gateway")]
#[command(about = "HTTP gateway for the server-management dashboard", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override `agent.socket_path`.
    #[arg(long)]
    agent_socket: Option<PathBuf>,

    /// Run as a read-only demo deployment.
    #[arg(long)]
    demo: bool,
}

impl Cli {
    fn load(&self) -> Result<GatewayConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => GatewayConfig::default(),
        };
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(socket) = &self.agent_socket {
            config.agent.socket_path = socket.clone();
        }
        if self.demo {
            config.system.is_demo = true;
        }
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.load().map_err(StartupError::from)?;

    logging::init_tracing(&config.observability)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        agent_socket = %config.agent.socket_path.display(),
        demo = config.system.is_demo,
        "panel-gateway starting"
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    if let Err(e) = lifecycle::serve(config, &shutdown).await {
        tracing::error!(error = %e, "Gateway failed");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
