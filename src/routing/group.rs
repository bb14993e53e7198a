//! Route groups: named sets of API entries mounted under `/api/v1`.
//!
//! Business endpoints live outside the gateway and are supplied as
//! [`RouteGroup`] implementations at startup. Paths are absolute, so a
//! group registers `/api/v1/...` itself (see [`API_PREFIX`]).

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Serialize;

use crate::http::middleware::loading::LoadingState;
use crate::http::middleware::locale::Locale;
use crate::http::middleware::Interceptor;
use crate::routing::API_PREFIX;

pub trait RouteGroup: Send + Sync {
    fn name(&self) -> &'static str;

    /// Entries of this group. Must hold at least one route and must not
    /// overlap with other groups.
    fn routes(&self) -> Router;

    /// Interceptors that run after the shared chain, for this group only.
    fn interceptors(&self) -> Vec<Arc<dyn Interceptor>> {
        Vec::new()
    }
}

/// Built-in private group reporting gateway state to the dashboard.
#[derive(Clone)]
pub struct CoreGroup {
    loading: LoadingState,
    demo: bool,
    started: Instant,
}

impl CoreGroup {
    pub fn new(loading: LoadingState, demo: bool) -> Self {
        Self {
            loading,
            demo,
            started: Instant::now(),
        }
    }
}

impl RouteGroup for CoreGroup {
    fn name(&self) -> &'static str {
        "core"
    }

    fn routes(&self) -> Router {
        Router::new()
            .route(&format!("{}/core/status", API_PREFIX), get(status))
            .with_state(self.clone())
    }
}

#[derive(Debug, Serialize)]
struct StatusBody {
    version: &'static str,
    demo: bool,
    locale: &'static str,
    uptime_secs: u64,
    loading: LoadingBody,
}

#[derive(Debug, Serialize)]
struct LoadingBody {
    busy: bool,
    in_flight: usize,
    capacity: usize,
}

async fn status(
    State(core): State<CoreGroup>,
    locale: Option<Extension<Locale>>,
) -> Json<StatusBody> {
    Json(StatusBody {
        version: env!("CARGO_PKG_VERSION"),
        demo: core.demo,
        locale: locale.map(|Extension(l)| l.as_str()).unwrap_or("zh"),
        uptime_secs: core.started.elapsed().as_secs(),
        loading: LoadingBody {
            busy: core.loading.is_busy(),
            in_flight: core.loading.in_flight(),
            capacity: core.loading.capacity(),
        },
    })
}
