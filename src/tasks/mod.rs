//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Usage log: Logs the cache usage snapshot at a fixed interval

mod stats_log;

pub use stats_log::spawn_stats_log_task;
