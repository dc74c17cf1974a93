//! Media Cache - A caching proxy for media segments
//!
//! Deduplicates concurrent segment fetches, keeps cacheable media in a blob
//! store, and evicts oldest insertions first to stay within a byte budget.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod proxy;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use proxy::MediaCache;
pub use tasks::spawn_stats_log_task;
