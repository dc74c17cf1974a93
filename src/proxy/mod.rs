//! Proxy Module
//!
//! The per-request pipeline and the upstream transport it drives.

mod handler;
mod headers;
mod transport;

pub use handler::{CacheStatus, MediaCache, Served};
pub use headers::{forwardable, shared_fetch_headers};
pub use transport::{ReqwestTransport, Transport, UpstreamRequest};
