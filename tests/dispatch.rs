//! Decision-tree tests against a real listener and a mock agent.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde_json::Value;

use panel_gateway::http::middleware::{Flow, Identity, Interceptor, RequestContext};
use panel_gateway::routing::{RouteGroup, API_PREFIX};
use panel_gateway::Gateway;

mod common;

#[tokio::test]
async fn health_is_ok() {
    let dir = tempfile::tempdir().unwrap();
    let agent = common::start_echo_agent(dir.path()).await;
    let gw = common::start_gateway(common::config_for(&agent.socket, dir.path())).await;

    let res = reqwest::get(gw.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "\"ok\"");
    assert_eq!(agent.hits(), 0);
}

#[tokio::test]
async fn health_ignores_private_chain() {
    let dir = tempfile::tempdir().unwrap();
    let agent = common::start_echo_agent(dir.path()).await;
    let mut config = common::config_for(&agent.socket, dir.path());
    config.security.allow_ips = vec!["10.0.0.0/8".into()];
    config.security.bind_domain = Some("panel.example.com".into());
    config.system.is_demo = true;
    let gw = common::start_gateway(config).await;

    let res = reqwest::get(gw.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_client_route_serves_index() {
    let dir = tempfile::tempdir().unwrap();
    let agent = common::start_echo_agent(dir.path()).await;
    let gw = common::start_gateway(common::config_for(&agent.socket, dir.path())).await;

    let res = reqwest::get(gw.url("/dashboard/settings/xyz")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["cache-control"], "no-cache");
    assert!(res.text().await.unwrap().contains("<div id=\"app\"></div>"));
    assert_eq!(agent.hits(), 0);
}

#[tokio::test]
async fn static_assets_compress_and_cache() {
    let dir = tempfile::tempdir().unwrap();
    let agent = common::start_echo_agent(dir.path()).await;
    let gw = common::start_gateway(common::config_for(&agent.socket, dir.path())).await;
    let client = reqwest::Client::new();

    let res = client
        .get(gw.url("/assets/app.css"))
        .header("accept-encoding", "gzip")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-encoding"], "gzip");
    assert_eq!(res.headers()["cache-control"], "private, max-age=3600");

    let missing = client.get(gw.url("/assets/nope.js")).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let favicon = client.get(gw.url("/public/favicon.svg")).send().await.unwrap();
    assert_eq!(favicon.status(), StatusCode::OK);
    assert_eq!(favicon.headers()["content-type"], "image/svg+xml");
    assert_eq!(agent.hits(), 0);
}

#[tokio::test]
async fn uploaded_images_served_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let agent = common::start_echo_agent(dir.path()).await;
    std::fs::create_dir_all(dir.path().join("uploads")).unwrap();
    std::fs::write(dir.path().join("uploads/logo.png"), b"\x89PNG fake").unwrap();
    let gw = common::start_gateway(common::config_for(&agent.socket, dir.path())).await;

    let res = reqwest::get(gw.url("/api/v1/images/logo.png")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert_eq!(res.bytes().await.unwrap().as_ref(), b"\x89PNG fake");
    assert_eq!(agent.hits(), 0);
}

#[tokio::test]
async fn private_match_is_never_forwarded() {
    let dir = tempfile::tempdir().unwrap();
    let agent = common::start_echo_agent(dir.path()).await;
    let gw = common::start_gateway(common::config_for(&agent.socket, dir.path())).await;

    let res = reqwest::get(gw.url("/api/v1/core/status")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["demo"], false);
    assert_eq!(agent.hits(), 0);
}

#[tokio::test]
async fn wrong_method_on_private_path_goes_to_agent() {
    let dir = tempfile::tempdir().unwrap();
    let agent = common::start_echo_agent(dir.path()).await;
    let gw = common::start_gateway(common::config_for(&agent.socket, dir.path())).await;

    let res = reqwest::Client::new()
        .post(gw.url("/api/v1/core/status"))
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["method"], "POST");
    assert_eq!(body["uri"], "/api/v1/core/status");
    assert_eq!(agent.hits(), 1);
}

#[tokio::test]
async fn whitelist_rejects_before_domain_check() {
    let dir = tempfile::tempdir().unwrap();
    let agent = common::start_echo_agent(dir.path()).await;
    let mut config = common::config_for(&agent.socket, dir.path());
    config.security.allow_ips = vec!["10.0.0.0/8".into()];
    config.security.bind_domain = Some("panel.example.com".into());
    let gw = common::start_gateway(config).await;

    let res = reqwest::get(gw.url("/api/v1/core/status")).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "ip_not_allowed");
}

#[tokio::test]
async fn domain_binding_rejects_other_hosts() {
    let dir = tempfile::tempdir().unwrap();
    let agent = common::start_echo_agent(dir.path()).await;
    let mut config = common::config_for(&agent.socket, dir.path());
    config.security.allow_ips = vec!["127.0.0.1".into()];
    config.security.bind_domain = Some("panel.example.com".into());
    let gw = common::start_gateway(config).await;
    let client = reqwest::Client::new();

    let res = client.get(gw.url("/api/v1/core/status")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::MISDIRECTED_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "domain_not_bound");

    let res = client
        .get(gw.url("/api/v1/core/status"))
        .header("host", "panel.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn busy_flag_turns_private_api_away() {
    let dir = tempfile::tempdir().unwrap();
    let agent = common::start_echo_agent(dir.path()).await;
    let gw = common::start_gateway(common::config_for(&agent.socket, dir.path())).await;

    gw.loading.set_busy(true);
    let res = reqwest::get(gw.url("/api/v1/core/status")).await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "global_loading");

    gw.loading.set_busy(false);
    let res = reqwest::get(gw.url("/api/v1/core/status")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn demo_mode_blocks_mutations_but_allows_search() {
    let dir = tempfile::tempdir().unwrap();
    let agent = common::start_echo_agent(dir.path()).await;
    let mut config = common::config_for(&agent.socket, dir.path());
    config.system.is_demo = true;
    let gw = common::start_gateway(config).await;
    let client = reqwest::Client::new();

    let res = client
        .delete(gw.url("/api/v1/websites/3"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "demo_mode");

    let res = client
        .post(gw.url("/api/v1/websites/search"))
        .body("{\"page\":1}")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(agent.hits(), 1);
}

/// Token check standing in for the real auth collaborator.
struct BearerAuth {
    seen: Arc<AtomicUsize>,
}

#[async_trait]
impl Interceptor for BearerAuth {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn intercept(&self, ctx: &mut RequestContext) -> Flow {
        self.seen.fetch_add(1, Ordering::SeqCst);
        match ctx.headers().get("authorization").and_then(|v| v.to_str().ok()) {
            Some("Bearer admin") => {
                ctx.set_identity(Identity("admin".into()));
                Flow::Continue
            }
            _ => Flow::Abort(StatusCode::UNAUTHORIZED.into_response()),
        }
    }
}

struct Whoami;

impl RouteGroup for Whoami {
    fn name(&self) -> &'static str {
        "whoami"
    }

    fn routes(&self) -> Router {
        Router::new().route(
            &format!("{}/whoami", API_PREFIX),
            get(|identity: axum::Extension<Identity>| async move { identity.0 .0 }),
        )
    }
}

#[tokio::test]
async fn extra_private_interceptors_run_after_builtin_chain() {
    let dir = tempfile::tempdir().unwrap();
    let agent = common::start_echo_agent(dir.path()).await;
    let mut config = common::config_for(&agent.socket, dir.path());
    config.security.allow_ips = vec!["10.0.0.0/8".into()];
    let seen = Arc::new(AtomicUsize::new(0));

    let builder = Gateway::builder(config)
        .private_group(Whoami)
        .private_interceptor(BearerAuth { seen: seen.clone() });
    let gw = common::start_with(builder).await;

    // Whitelist aborts first, so auth never runs.
    let res = reqwest::get(gw.url("/api/v1/whoami")).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(seen.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn identity_reaches_private_handler() {
    let dir = tempfile::tempdir().unwrap();
    let agent = common::start_echo_agent(dir.path()).await;
    let seen = Arc::new(AtomicUsize::new(0));

    let builder = Gateway::builder(common::config_for(&agent.socket, dir.path()))
        .private_group(Whoami)
        .private_interceptor(BearerAuth { seen: seen.clone() });
    let gw = common::start_with(builder).await;
    let client = reqwest::Client::new();

    let denied = client.get(gw.url("/api/v1/whoami")).send().await.unwrap();
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(gw.url("/api/v1/whoami"))
        .header("authorization", "Bearer admin")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "admin");
    assert_eq!(seen.load(Ordering::SeqCst), 2);
    assert_eq!(agent.hits(), 0);
}
