//! Request matching primitives.
//!
//! # Responsibilities
//! - Match the Host header (exact match, case-insensitive, port ignored)
//! - Match a path prefix on segment boundaries (case-sensitive)
//!
//! # Design Decisions
//! - Host matching is case-insensitive (RFC 9110)
//! - Path matching is case-sensitive
//! - No regex to guarantee O(n) matching

use axum::http::{header, HeaderMap, Uri};

/// Matches the Host header (or the URI authority for HTTP/2).
#[derive(Debug, Clone)]
pub struct HostMatcher {
    expected_host: String,
}

impl HostMatcher {
    /// The host is normalized to lowercase for case-insensitive matching.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            expected_host: host.into().trim().to_lowercase(),
        }
    }

    pub fn expected(&self) -> &str {
        &self.expected_host
    }

    pub fn matches(&self, headers: &HeaderMap, uri: &Uri) -> bool {
        request_host(headers, uri)
            .map(|h| strip_port(&h).eq_ignore_ascii_case(&self.expected_host))
            .unwrap_or(false)
    }
}

/// Host the client addressed, from `Host` or the URI authority.
pub fn request_host(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|a| a.as_str().to_string()))
}

/// `example.com:443` → `example.com`, `[::1]:80` → `::1`.
fn strip_port(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

/// Matches a path prefix on whole segments: `/api` matches `/api` and
/// `/api/v1/x` but not `/apiary`.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        if self.prefix == "/" {
            return true;
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}
