//! Request and Response models for the proxy API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP query strings and message bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{ClientMessage, MediaQuery};
pub use responses::{HealthResponse, StatsPayload, WorkerMessage};
