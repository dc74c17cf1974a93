//! Header filtering for forwarded requests and responses.

use axum::http::{HeaderMap, HeaderName};

/// Connection-scoped headers plus the framing headers the next hop recomputes.
fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
            | "host"
            | "content-length"
    )
}

/// Headers that select a partial or conditional representation.
fn is_representation_selector(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "range"
            | "if-range"
            | "if-match"
            | "if-none-match"
            | "if-modified-since"
            | "if-unmodified-since"
    )
}

/// Copies every end-to-end header.
pub fn forwardable(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !is_hop_by_hop(name) {
            forwarded.append(name.clone(), value.clone());
        }
    }
    forwarded
}

/// Headers for the fetch whose body gets stored and shared with every
/// waiter on the key: the full representation is always requested.
pub fn shared_fetch_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = forwardable(headers);
    let selectors: Vec<HeaderName> = forwarded
        .keys()
        .filter(|name| is_representation_selector(name))
        .cloned()
        .collect();
    for name in selectors {
        forwarded.remove(name);
    }
    forwarded
}
