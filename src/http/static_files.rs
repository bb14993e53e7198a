//! Embedded front-end bundle and the SPA fallback document.
//!
//! Everything under `web/` is compiled into the binary. Lookups never touch
//! the filesystem, and paths that try to leave the bundle simply miss.

use axum::{
    body::Body,
    extract::Path,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::Embed;

use crate::routing::RouteKind;

#[derive(Embed)]
#[folder = "web/"]
struct WebAssets;

const INDEX: &str = "index.html";

/// The index document served for `/` and every unmatched client route.
pub fn index_document(route: RouteKind) -> Response {
    let mut response = match lookup(INDEX) {
        Some(response) => response,
        None => {
            tracing::error!("Embedded bundle has no index.html");
            StatusCode::NOT_FOUND.into_response()
        }
    };
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response.extensions_mut().insert(route);
    response
}

pub async fn index() -> Response {
    index_document(RouteKind::Static)
}

pub async fn asset(Path(path): Path<String>) -> Response {
    embedded(&format!("assets/{}", path))
}

pub async fn public(Path(path): Path<String>) -> Response {
    embedded(&format!("public/{}", path))
}

fn embedded(path: &str) -> Response {
    lookup(path).unwrap_or_else(|| StatusCode::NOT_FOUND.into_response())
}

fn lookup(path: &str) -> Option<Response> {
    let file = WebAssets::get(path)?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let content_type = HeaderValue::from_str(mime.as_ref())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    let mut response = Response::new(Body::from(file.data.into_owned()));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, content_type);
    Some(response)
}
