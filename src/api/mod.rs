//! API Module
//!
//! HTTP handlers and routing for the caching proxy.
//!
//! # Endpoints
//! - `ANY /media?url=...` - Intercept a request for an upstream resource
//! - `POST /messages` - Message protocol (`GET_CACHE_STATS`)
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
