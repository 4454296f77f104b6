//! Request inspection helpers.
//!
//! # Responsibilities
//! - Resolve the client IP from proxy headers or the connection peer
//!
//! # Design Decisions
//! - Header priority: `Forwarded`, `X-Forwarded-For`, `X-Real-Ip`, peer address
//! - Only the first (client-most) hop of a list header is considered
//! - Ports are stripped; anything that is not an IP becomes `"N/A"`

use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, Request};
use axum::http::HeaderMap;

/// Placeholder logged when no usable client address exists.
pub const NOT_AVAILABLE: &str = "N/A";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Extract the `for=` node of the first element of a `Forwarded` header.
fn forwarded_for(value: &str) -> Option<&str> {
    let first = value.split(',').next()?;
    first.split(';').find_map(|pair| {
        let (key, node) = pair.trim().split_once('=')?;
        key.trim().eq_ignore_ascii_case("for").then(|| node.trim())
    })
}

/// Parse an address that may carry quotes, brackets or a port.
fn parse_ip(candidate: &str) -> Option<IpAddr> {
    let candidate = candidate.trim().trim_matches('"');
    if let Ok(addr) = candidate.parse::<SocketAddr>() {
        return Some(addr.ip());
    }
    if let Ok(ip) = candidate.parse::<IpAddr>() {
        return Some(ip);
    }
    candidate
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .and_then(|inner| inner.parse::<IpAddr>().ok())
}

/// Resolve the client IP from proxy headers, falling back to `peer`.
pub fn resolve_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let candidate = if let Some(forwarded) = header(headers, "forwarded") {
        forwarded_for(forwarded)
    } else if let Some(xff) = header(headers, "x-forwarded-for") {
        xff.split(',').next()
    } else if let Some(real_ip) = header(headers, "x-real-ip") {
        Some(real_ip)
    } else {
        return peer
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    };

    candidate
        .and_then(parse_ip)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Client IP of a request served by this crate's HTTP server.
pub fn client_ip(request: &Request) -> String {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    resolve_ip(request.headers(), peer)
}
