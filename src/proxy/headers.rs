//! Header manipulation for forwarded requests and relayed responses.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Add Origin, X-Forwarded-Host, X-Forwarded-Proto describing the caller
//! - Relay every upstream Set-Cookie as its own header

use axum::http::{
    header::{HeaderName, HeaderValue, HOST, ORIGIN, SET_COOKIE},
    HeaderMap, Uri,
};

pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Headers that describe a single connection and are never forwarded.
pub const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
    "host",
];

/// Header names are stored lowercase, so this is case-insensitive on the wire.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Where the caller believes it is talking to: scheme and host of the edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    pub scheme: String,
    pub host: String,
}

impl RequestOrigin {
    /// Derive the caller's origin from the inbound request.
    pub fn from_request(headers: &HeaderMap, uri: &Uri, trust_forwarded_proto: bool) -> Self {
        let forwarded = trust_forwarded_proto
            .then(|| headers.get(&X_FORWARDED_PROTO))
            .flatten()
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().trim_end_matches(':').to_ascii_lowercase())
            .filter(|v| !v.is_empty());

        let scheme = forwarded
            .or_else(|| uri.scheme_str().map(str::to_string))
            .unwrap_or_else(|| "http".to_string());

        let host = headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| uri.authority().map(|a| a.to_string()))
            .unwrap_or_else(|| "localhost".to_string());

        Self { scheme, host }
    }

    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }
}

/// Build the header set sent upstream.
pub fn forward_request_headers(inbound: &HeaderMap, caller: &RequestOrigin) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len() + 3);
    for (name, value) in inbound.iter() {
        if !is_hop_by_hop(name) {
            headers.append(name.clone(), value.clone());
        }
    }

    let injected = [
        (ORIGIN, caller.origin()),
        (X_FORWARDED_HOST, caller.host.clone()),
        (X_FORWARDED_PROTO, caller.scheme.clone()),
    ];
    for (name, value) in injected {
        match HeaderValue::from_str(&value) {
            Ok(value) => {
                headers.insert(name, value);
            }
            Err(_) => tracing::warn!(header = %name, value = %value, "Skipping unrepresentable forwarding header"),
        }
    }

    headers
}

/// Build the header set relayed to the caller.
pub fn relay_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream.iter() {
        if !is_hop_by_hop(name) && name != SET_COOKIE {
            headers.append(name.clone(), value.clone());
        }
    }
    relay_set_cookies(upstream, &mut headers);
    headers
}

/// Append each upstream cookie as a separate `set-cookie` header.
///
/// Folding cookies into one header would corrupt them (`Expires` contains
/// commas), so values are never joined. Returns the number relayed.
pub fn relay_set_cookies(upstream: &HeaderMap, out: &mut HeaderMap) -> usize {
    let mut count = 0;
    for cookie in upstream.get_all(SET_COOKIE) {
        out.append(SET_COOKIE, cookie.clone());
        count += 1;
    }
    count
}
