//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Where and how to reach the agent.
    pub agent: AgentConfig,

    /// Deployment-wide switches (demo mode, locale, static content).
    pub system: SystemConfig,

    /// Private-group access checks.
    pub security: SecurityConfig,

    /// Global loading guard.
    pub loading: LoadingConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:9999").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9999".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    pub key_path: PathBuf,
}

/// Agent connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Unix socket the agent listens on. Must exist before startup.
    pub socket_path: PathBuf,

    /// Unmatched requests under this prefix are forwarded to the agent.
    pub forward_prefix: String,

    /// Maximum wait for the agent's response head, in seconds.
    pub response_timeout_secs: u64,

    /// How long an idle pooled connection is kept, in seconds.
    pub pool_idle_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/tmp/agent.sock"),
            forward_prefix: "/api".to_string(),
            response_timeout_secs: 300,
            pool_idle_timeout_secs: 90,
        }
    }
}

/// Deployment-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Demo deployments reject mutating operations.
    pub is_demo: bool,

    /// Mutating paths still accepted in demo mode.
    pub demo_allow_paths: Vec<String>,

    /// Locale used when the client sends no usable `Accept-Language`.
    pub default_locale: String,

    /// Directory served under `/api/v1/images`.
    pub uploads_dir: PathBuf,

    /// `max-age` applied to `/assets/*`, in seconds.
    pub assets_max_age_secs: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            is_demo: false,
            demo_allow_paths: vec![
                "/api/v1/auth/login".to_string(),
                "/api/v1/auth/logout".to_string(),
            ],
            default_locale: "zh".to_string(),
            uploads_dir: PathBuf::from("./uploads"),
            assets_max_age_secs: 3600,
        }
    }
}

/// Access checks applied to the private route group.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Allowed client IPs or CIDR ranges. Empty allows everyone.
    pub allow_ips: Vec<String>,

    /// Only this host may reach the private API. `None` disables the check.
    pub bind_domain: Option<String>,

    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`.
    pub trust_forwarded_headers: bool,

    /// Maximum body size for locally handled private routes, in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allow_ips: Vec::new(),
            bind_domain: None,
            trust_forwarded_headers: false,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Global loading guard.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoadingConfig {
    /// Maximum private requests handled at once.
    pub max_concurrent: usize,
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self { max_concurrent: 256 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Address the Prometheus exporter listens on.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "panel_gateway=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9898".to_string(),
        }
    }
}
