//! Cache Module
//!
//! The caching engine: admission, blob storage, in-flight dedup,
//! FIFO byte-budget eviction and usage statistics.

mod admission;
mod disk;
mod entry;
mod inflight;
mod ledger;
mod stats;
mod store;


// Re-export public types
pub use admission::AdmissionFilter;
pub use disk::DiskBlobStore;
pub use entry::{current_timestamp_ms, CacheEntry, MediaResponse, ResponseMetadata};
pub use inflight::{Completer, FetchOutcome, InFlightHandle, InFlightRegistry, Registration};
pub use ledger::{Budget, EvictionLedger};
pub use stats::{CacheStats, StatsReporter};
pub use store::{BlobStore, MemoryBlobStore, StoreResult};
