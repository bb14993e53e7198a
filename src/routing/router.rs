//! Request dispatcher.
//!
//! Builds the single axum [`Router`] that classifies every request:
//!
//! 1. `/health`
//! 2. static bundle and uploaded images
//! 3. API route groups (private ones behind the private chain)
//! 4. unmatched paths under the forward prefix → agent bridge
//! 5. anything else → SPA index
//!
//! The global chain wraps all five. A request whose method does not fit a
//! registered path matched no entry, so it goes down branches 4 and 5 too.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Request},
    http::{header, HeaderValue},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, get_service},
    Json, Router,
};
use tower_http::{
    compression::CompressionLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::agent::AgentBridge;
use crate::http::middleware::{self as pipeline, Pipeline};
use crate::http::request::{request_span, UuidRequestId, X_REQUEST_ID};
use crate::http::static_files;
use crate::routing::{RouteGroup, RouteKind};

/// Prefix of every API route group entry.
pub const API_PREFIX: &str = "/api/v1";

/// Everything the dispatcher is assembled from.
pub struct DispatchParts {
    pub global: Pipeline,
    pub private: Pipeline,
    pub public_groups: Vec<Arc<dyn RouteGroup>>,
    pub private_groups: Vec<Arc<dyn RouteGroup>>,
    pub bridge: Arc<AgentBridge>,
    pub uploads_dir: PathBuf,
    pub assets_max_age_secs: u64,
    pub max_body_size: usize,
}

impl DispatchParts {
    pub fn into_router(self) -> Router {
        let unmatched = Unmatched {
            bridge: self.bridge.clone(),
        };
        let unmatched = move |request: Request| unmatched.clone().handle(request);

        let cache = HeaderValue::from_str(&format!(
            "private, max-age={}",
            self.assets_max_age_secs
        ))
        .unwrap_or_else(|_| HeaderValue::from_static("private, max-age=3600"));

        let static_routes = Router::new()
            .route("/", get(static_files::index))
            .route(
                "/assets/{*path}",
                get(static_files::asset)
                    .layer(SetResponseHeaderLayer::overriding(header::CACHE_CONTROL, cache)),
            )
            .route("/public/{*path}", get(static_files::public))
            .layer(middleware::map_response(tag_static))
            .layer(CompressionLayer::new());

        // Kept out of the compressed bundle: non-GET requests here fall
        // through to the agent, whose responses pass unmodified.
        let uploads = Router::new()
            .nest_service(
                &format!("{}/images", API_PREFIX),
                get_service(ServeDir::new(&self.uploads_dir)).fallback(unmatched.clone()),
            )
            .layer(middleware::map_response(tag_static));

        let mut private = Router::new();
        for group in &self.private_groups {
            tracing::debug!(group = group.name(), "Mounting private route group");
            private = private.merge(scoped(group.as_ref(), RouteKind::Private));
        }
        if !self.private_groups.is_empty() {
            private = private
                .route_layer(RequestBodyLimitLayer::new(self.max_body_size))
                .route_layer(middleware::from_fn_with_state(
                    Arc::new(self.private.tagging(RouteKind::Private)),
                    pipeline::run,
                ));
        }

        let mut api = Router::new();
        for group in &self.public_groups {
            tracing::debug!(group = group.name(), "Mounting public route group");
            api = api.merge(scoped(group.as_ref(), RouteKind::Public));
        }
        if !self.public_groups.is_empty() {
            api = api.route_layer(middleware::map_response(tag_public));
        }

        Router::new()
            .route("/health", get(health))
            .merge(static_routes)
            .merge(uploads)
            .merge(api)
            .merge(private)
            .method_not_allowed_fallback(unmatched.clone())
            .fallback(unmatched)
            .layer(middleware::from_fn_with_state(
                Arc::new(self.global),
                pipeline::run,
            ))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID.clone()))
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID.clone(), UuidRequestId))
    }
}

/// Apply a group's own interceptors to its entries only.
fn scoped(group: &dyn RouteGroup, route: RouteKind) -> Router {
    let routes = group.routes();
    let extra = group.interceptors();
    if extra.is_empty() {
        return routes;
    }

    let mut chain = Pipeline::new(group.name()).tagging(route);
    for interceptor in extra {
        chain.push(interceptor);
    }
    routes.route_layer(middleware::from_fn_with_state(Arc::new(chain), pipeline::run))
}

async fn health() -> Response {
    let mut response = Json("ok").into_response();
    response.extensions_mut().insert(RouteKind::Health);
    response
}

async fn tag_static(mut response: Response) -> Response {
    if response.extensions().get::<RouteKind>().is_none() {
        response.extensions_mut().insert(RouteKind::Static);
    }
    response
}

async fn tag_public(mut response: Response) -> Response {
    if response.extensions().get::<RouteKind>().is_none() {
        response.extensions_mut().insert(RouteKind::Public);
    }
    response
}

/// Branches 4 and 5 of the decision tree.
#[derive(Clone)]
struct Unmatched {
    bridge: Arc<AgentBridge>,
}

impl Unmatched {
    async fn handle(self, mut request: Request) -> Response {
        // Nested services see a stripped path; the agent needs the original.
        if let Some(OriginalUri(uri)) = request.extensions().get::<OriginalUri>().cloned() {
            *request.uri_mut() = uri;
        }

        if self.bridge.claims(request.uri().path()) {
            self.bridge.forward(request).await
        } else {
            static_files::index_document(RouteKind::Spa)
        }
    }
}
