//! In-Flight Registry Module
//!
//! Collapses concurrent fetches of the same key into one shared outcome.
//! The registry is a plain map; callers guard it with the cache mutex and
//! never hold that lock while awaiting a handle.

use std::collections::HashMap;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::oneshot;

use crate::cache::entry::MediaResponse;
use crate::error::FetchError;

/// Result every waiter on a key receives.
pub type FetchOutcome = std::result::Result<MediaResponse, FetchError>;

/// Awaitable outcome of one in-flight fetch. Cloning attaches another waiter.
pub type InFlightHandle = Shared<BoxFuture<'static, FetchOutcome>>;

// == Completer ==
/// Publishes the outcome of a fetch to every attached waiter.
///
/// Dropping it without calling [`Completer::complete`] resolves waiters
/// with [`FetchError::Abandoned`].
#[derive(Debug)]
pub struct Completer {
    sender: oneshot::Sender<FetchOutcome>,
}

impl Completer {
    pub fn complete(self, outcome: FetchOutcome) {
        // No receiver left means every waiter went away, nothing to deliver
        let _ = self.sender.send(outcome);
    }
}

// == Registration ==
/// Result of [`InFlightRegistry::register`].
pub enum Registration {
    /// First request for the key: the caller must fetch, settle, then complete.
    New {
        handle: InFlightHandle,
        completer: Completer,
    },
    /// A fetch is already running: await the shared handle.
    Existing { handle: InFlightHandle },
}

impl Registration {
    pub fn is_new(&self) -> bool {
        matches!(self, Registration::New { .. })
    }

    pub fn handle(&self) -> &InFlightHandle {
        match self {
            Registration::New { handle, .. } | Registration::Existing { handle } => handle,
        }
    }
}

// == In-Flight Registry ==
/// Map of currently-executing fetches keyed by canonical request identity.
#[derive(Default)]
pub struct InFlightRegistry {
    pending: HashMap<String, InFlightHandle>,
}

impl InFlightRegistry {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Register ==
    /// Returns the existing handle for `key`, or installs a new one.
    pub fn register(&mut self, key: &str) -> Registration {
        if let Some(handle) = self.pending.get(key) {
            return Registration::Existing {
                handle: handle.clone(),
            };
        }

        let (sender, receiver) = oneshot::channel();
        let abandoned_key = key.to_string();
        let handle = async move {
            receiver
                .await
                .unwrap_or_else(|_| Err(FetchError::Abandoned(abandoned_key)))
        }
        .boxed()
        .shared();

        self.pending.insert(key.to_string(), handle.clone());

        Registration::New {
            handle,
            completer: Completer { sender },
        }
    }

    // == Settle ==
    /// Removes the handle for `key`. Returns false if none was registered.
    pub fn settle(&mut self, key: &str) -> bool {
        self.pending.remove(key).is_some()
    }

    // == Accessors ==
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &'static [u8]) -> MediaResponse {
        MediaResponse::new("https://cdn.example/seg.m4s", 200, None, body)
    }

    #[test]
    fn test_register_new_then_existing() {
        let mut registry = InFlightRegistry::new();

        let first = registry.register("k");
        let second = registry.register("k");

        assert!(first.is_new());
        assert!(!second.is_new());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_settle_removes_once() {
        let mut registry = InFlightRegistry::new();
        let _registration = registry.register("k");

        assert!(registry.settle("k"));
        assert!(!registry.settle("k"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_after_settle_is_new() {
        let mut registry = InFlightRegistry::new();
        let _first = registry.register("k");
        registry.settle("k");

        assert!(registry.register("k").is_new());
    }

    #[tokio::test]
    async fn test_all_waiters_receive_outcome() {
        let mut registry = InFlightRegistry::new();
        let Registration::New { handle, completer } = registry.register("k") else {
            panic!("first registration must be new");
        };
        let follower = registry.register("k").handle().clone();

        completer.complete(Ok(response(b"segment")));

        let (a, b) = tokio::join!(handle, follower);
        assert_eq!(a.unwrap().body.as_ref(), b"segment");
        assert_eq!(b.unwrap().body.as_ref(), b"segment");
    }

    #[tokio::test]
    async fn test_failure_reaches_every_waiter() {
        let mut registry = InFlightRegistry::new();
        let Registration::New { handle, completer } = registry.register("k") else {
            panic!("first registration must be new");
        };
        let follower = registry.register("k").handle().clone();

        let err = FetchError::request("k", "connection refused");
        completer.complete(Err(err.clone()));

        assert_eq!(handle.await, Err(err.clone()));
        assert_eq!(follower.await, Err(err));
    }

    #[tokio::test]
    async fn test_dropped_completer_resolves_abandoned() {
        let mut registry = InFlightRegistry::new();
        let Registration::New { handle, completer } = registry.register("k") else {
            panic!("first registration must be new");
        };
        drop(completer);

        assert_eq!(handle.await, Err(FetchError::Abandoned("k".to_string())));
    }
}
