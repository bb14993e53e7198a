//! Shared utilities for integration tests: a mock agent on a real unix
//! socket and a gateway bound to an ephemeral port.

#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::{Bytes, Frame, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::json;
use tokio::net::UnixListener;

use panel_gateway::lifecycle::{self, Shutdown};
use panel_gateway::{Gateway, GatewayBuilder, GatewayConfig, HttpServer};

/// A running mock agent. Counts every request it answers.
pub struct MockAgent {
    pub socket: PathBuf,
    hits: Arc<AtomicUsize>,
}

impl MockAgent {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Agent that echoes the request back as JSON and accepts WebSocket-style
/// upgrades by echoing raw bytes.
pub async fn start_echo_agent(dir: &Path) -> MockAgent {
    let socket = dir.join("agent.sock");
    let listener = UnixListener::bind(&socket).unwrap();
    let hits = Arc::new(AtomicUsize::new(0));

    let counter = hits.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let counter = counter.clone();
            tokio::spawn(async move {
                let service = service_fn(move |request| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    echo(request)
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .with_upgrades()
                    .await;
            });
        }
    });

    MockAgent { socket, hits }
}

async fn echo(mut request: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    if request.headers().contains_key("upgrade") {
        let upgrade = hyper::upgrade::on(&mut request);
        tokio::spawn(async move {
            if let Ok(upgraded) = upgrade.await {
                let (mut reader, mut writer) = tokio::io::split(TokioIo::new(upgraded));
                let _ = tokio::io::copy(&mut reader, &mut writer).await;
            }
        });
        let response = Response::builder()
            .status(StatusCode::SWITCHING_PROTOCOLS)
            .header("connection", "upgrade")
            .header("upgrade", "websocket")
            .body(Full::new(Bytes::new()))
            .unwrap();
        return Ok(response);
    }

    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let mut summary = json!({
        "method": request.method().as_str(),
        "uri": request.uri().to_string(),
        "host": header("host"),
        "x_forwarded_for": header("x-forwarded-for"),
        "x_forwarded_host": header("x-forwarded-host"),
        "x_forwarded_proto": header("x-forwarded-proto"),
        "x_request_id": header("x-request-id"),
        "connection": header("connection"),
        "authorization": header("authorization"),
    });

    let (parts, body) = request.into_parts();
    let body = body.collect().await.map(|b| b.to_bytes()).unwrap_or_default();
    summary["body"] = json!(String::from_utf8_lossy(&body));
    summary["version"] = json!(format!("{:?}", parts.version));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/json")
        .header("x-agent", "mock")
        .header("keep-alive", "timeout=5")
        .body(Full::new(Bytes::from(summary.to_string())))
        .unwrap();
    Ok(response)
}

/// A running agent that streams its response body in timed chunks.
pub struct StreamingAgent {
    pub socket: PathBuf,
    released: Arc<AtomicBool>,
}

impl StreamingAgent {
    /// True once the agent has let go of a response body, either because
    /// it finished or because the connection under it went away.
    pub fn released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

struct ReleaseFlag(Arc<AtomicBool>);

impl Drop for ReleaseFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Agent answering every request with `chunks` lines (`chunk0\n`, ...),
/// the first one immediately and the rest `interval` apart.
pub async fn start_streaming_agent(
    dir: &Path,
    chunks: usize,
    interval: Duration,
) -> StreamingAgent {
    let socket = dir.join("stream.sock");
    let listener = UnixListener::bind(&socket).unwrap();
    let released = Arc::new(AtomicBool::new(false));

    let flag = released.clone();
    tokio::spawn(async move {
        while let Ok((conn, _)) = listener.accept().await {
            let flag = flag.clone();
            tokio::spawn(async move {
                let service = service_fn(move |_request: Request<Incoming>| {
                    let guard = ReleaseFlag(flag.clone());
                    async move {
                        let frames = stream::unfold((0usize, guard), move |(sent, guard)| async move {
                            if sent == chunks {
                                return None;
                            }
                            if sent > 0 {
                                tokio::time::sleep(interval).await;
                            }
                            let frame = Frame::data(Bytes::from(format!("chunk{}\n", sent)));
                            Some((Ok::<_, Infallible>(frame), (sent + 1, guard)))
                        });
                        Ok::<_, Infallible>(Response::new(StreamBody::new(frames)))
                    }
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(conn), service)
                    .await;
            });
        }
    });

    StreamingAgent { socket, released }
}

/// Agent that accepts connections and never answers.
pub async fn start_hung_agent(dir: &Path) -> PathBuf {
    let socket = dir.join("hung.sock");
    let listener = UnixListener::bind(&socket).unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    socket
}

/// A socket file nobody accepts on.
pub fn dead_agent(dir: &Path) -> PathBuf {
    let socket = dir.join("dead.sock");
    drop(std::os::unix::net::UnixListener::bind(&socket).unwrap());
    socket
}

pub fn config_for(socket: &Path, dir: &Path) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.agent.socket_path = socket.to_path_buf();
    config.system.uploads_dir = dir.join("uploads");
    config
}

/// A gateway serving on an ephemeral port. Shuts down on drop.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub loading: panel_gateway::http::middleware::loading::LoadingState,
    shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    start_with(Gateway::builder(config)).await
}

pub async fn start_with(builder: GatewayBuilder) -> TestGateway {
    let gateway: Gateway = builder.build().unwrap();
    let listener = lifecycle::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();
    let loading = gateway.loading().clone();

    tokio::spawn(async move {
        HttpServer::new(gateway.into_router())
            .run(listener, stop)
            .await
            .unwrap();
    });

    TestGateway {
        addr,
        loading,
        shutdown,
    }
}
