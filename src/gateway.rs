//! Gateway assembly.
//!
//! [`Gateway::builder`] turns a validated config plus the route groups
//! supplied by the embedding application into the one immutable router the
//! serving loop runs. Nothing here is global: two gateways built from two
//! configs are fully independent.

use std::sync::Arc;

use axum::Router;

use crate::agent::{AgentBridge, AgentTarget};
use crate::config::GatewayConfig;
use crate::error::StartupError;
use crate::http::middleware::{
    audit::OperationLog,
    demo::DemoGuard,
    domain::DomainBinding,
    loading::{LoadingGuard, LoadingState},
    locale::{Locale, LocaleResolver},
    whitelist::IpWhitelist,
    Interceptor, Pipeline,
};
use crate::routing::{CoreGroup, DispatchParts, RouteGroup};
use crate::security::ip_matcher::IpMatcher;

/// A built gateway: the dispatcher plus handles to its shared state.
pub struct Gateway {
    router: Router,
    loading: LoadingState,
    target: AgentTarget,
}

impl Gateway {
    pub fn builder(config: GatewayConfig) -> GatewayBuilder {
        GatewayBuilder {
            config,
            public_groups: Vec::new(),
            private_groups: Vec::new(),
            private_interceptors: Vec::new(),
            scheme: "http",
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn into_router(self) -> Router {
        self.router
    }

    /// Handle for flipping the global loading flag during maintenance.
    pub fn loading(&self) -> &LoadingState {
        &self.loading
    }

    pub fn agent(&self) -> &AgentTarget {
        &self.target
    }
}

pub struct GatewayBuilder {
    config: GatewayConfig,
    public_groups: Vec<Arc<dyn RouteGroup>>,
    private_groups: Vec<Arc<dyn RouteGroup>>,
    private_interceptors: Vec<Arc<dyn Interceptor>>,
    scheme: &'static str,
}

impl GatewayBuilder {
    /// Entries reachable without the private chain.
    pub fn public_group(mut self, group: impl RouteGroup + 'static) -> Self {
        self.public_groups.push(Arc::new(group));
        self
    }

    /// Entries behind whitelist, domain binding and loading guard.
    pub fn private_group(mut self, group: impl RouteGroup + 'static) -> Self {
        self.private_groups.push(Arc::new(group));
        self
    }

    /// Appended to the private chain after the loading guard, in call order.
    /// This is where an authentication collaborator plugs in.
    pub fn private_interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.private_interceptors.push(Arc::new(interceptor));
        self
    }

    /// Mark the listener as TLS so the agent sees `X-Forwarded-Proto: https`.
    pub fn tls(mut self, enabled: bool) -> Self {
        self.scheme = if enabled { "https" } else { "http" };
        self
    }

    /// Verify the agent socket and assemble the dispatcher. A missing
    /// socket fails here, before anything is bound.
    pub fn build(self) -> Result<Gateway, StartupError> {
        let config = self.config;
        let target = AgentTarget::verify(&config.agent.socket_path)?;
        let allow_list = IpMatcher::new(&config.security.allow_ips).map_err(StartupError::AllowList)?;
        let locale = Locale::from_tag(&config.system.default_locale).unwrap_or_else(|| {
            tracing::warn!(
                configured = %config.system.default_locale,
                "Unsupported default locale, using zh"
            );
            Locale::default()
        });

        let mut global = Pipeline::new("global").with(OperationLog::new());
        if config.system.is_demo {
            global = global.with(DemoGuard::new(&config.system.demo_allow_paths));
        }
        let global = global.with(LocaleResolver::new(locale));

        let loading = LoadingState::new(config.loading.max_concurrent);
        let mut private = Pipeline::new("private")
            .with(IpWhitelist::new(
                allow_list,
                config.security.trust_forwarded_headers,
            ))
            .with(DomainBinding::new(config.security.bind_domain.as_deref()))
            .with(LoadingGuard::new(loading.clone()));
        for interceptor in self.private_interceptors {
            private.push(interceptor);
        }

        let mut private_groups: Vec<Arc<dyn RouteGroup>> = vec![Arc::new(CoreGroup::new(
            loading.clone(),
            config.system.is_demo,
        ))];
        private_groups.extend(self.private_groups);

        tracing::info!(
            global = ?global.names(),
            private = ?private.names(),
            public_groups = self.public_groups.len(),
            private_groups = private_groups.len(),
            forward_prefix = %config.agent.forward_prefix,
            "Dispatcher assembled"
        );

        let bridge = Arc::new(AgentBridge::new(target.clone(), &config.agent, self.scheme));
        let router = DispatchParts {
            global,
            private,
            public_groups: self.public_groups,
            private_groups,
            bridge,
            uploads_dir: config.system.uploads_dir.clone(),
            assets_max_age_secs: config.system.assets_max_age_secs,
            max_body_size: config.security.max_body_size,
        }
        .into_router();

        Ok(Gateway {
            router,
            loading,
            target,
        })
    }
}
