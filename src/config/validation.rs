//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check allow-list entries and locale tags up front
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::http::middleware::locale::Locale;
use crate::security::ip_matcher::IpMatcher;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("agent.forward_prefix {0:?} must start with '/' and not end with '/'")]
    ForwardPrefix(String),

    #[error("agent.response_timeout_secs must be greater than zero")]
    ResponseTimeout,

    #[error("loading.max_concurrent must be greater than zero")]
    MaxConcurrent,

    #[error("security.allow_ips: {0}")]
    AllowList(String),

    #[error("security.bind_domain must not be empty")]
    BindDomain,

    #[error("system.default_locale {0:?} is not supported")]
    DefaultLocale(String),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let prefix = &config.agent.forward_prefix;
    if !prefix.starts_with('/') || (prefix.len() > 1 && prefix.ends_with('/')) {
        errors.push(ValidationError::ForwardPrefix(prefix.clone()));
    }

    if config.agent.response_timeout_secs == 0 {
        errors.push(ValidationError::ResponseTimeout);
    }

    if config.loading.max_concurrent == 0 {
        errors.push(ValidationError::MaxConcurrent);
    }

    if let Err(e) = IpMatcher::new(&config.security.allow_ips) {
        errors.push(ValidationError::AllowList(e));
    }

    if matches!(&config.security.bind_domain, Some(d) if d.trim().is_empty()) {
        errors.push(ValidationError::BindDomain);
    }

    if Locale::from_tag(&config.system.default_locale).is_none() {
        errors.push(ValidationError::DefaultLocale(
            config.system.default_locale.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
