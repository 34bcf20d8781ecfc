//! Durable keyed storage for decorated streams.
//!
//! The vault outlives owner instances: it sits at process or application
//! scope and maps `(OwnerKey, StreamKey)` to the decorated stream handle,
//! so a recreated owner can find and reattach to streams its previous
//! incarnation started.

use crate::consumer::Consumer;
use crate::types::{OwnerKey, StreamKey, SubscriptionHandle};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// A stored stream that a consumer can be attached to.
///
/// Implemented by [`ForwardingBridge`] (drop and cache policies) and
/// [`ReplayStream`] (replay-all).
///
/// [`ForwardingBridge`]: crate::bridge::ForwardingBridge
/// [`ReplayStream`]: crate::bridge::ReplayStream
pub trait ResumableStream<T>: Send + Sync {
    /// Attach a consumer, replacing any previous attachment's view.
    ///
    /// The caller is responsible for unsubscribing the previous consumer
    /// first; attaching does not run the old handle's detach side
    /// effects.
    fn attach(&self, consumer: Box<dyn Consumer<T>>) -> SubscriptionHandle;
}

/// Process-wide storage mapping `(OwnerKey, StreamKey)` to a stream.
///
/// At most one live entry per pair: a later `put` for the same pair
/// overwrites the former, whose state is silently orphaned. All
/// operations serialize on a single lock, so `put`/`remove`/
/// `snapshot_for` are linearizable with respect to each other.
///
/// Per-owner sub-maps are created lazily and never deleted. Owners are
/// finite, long-lived slots at process scope, so the empty maps left
/// behind are bounded by the number of distinct owner identities.
pub struct StreamVault<T> {
    entries: Mutex<HashMap<OwnerKey, HashMap<StreamKey, Arc<dyn ResumableStream<T>>>>>,
}

impl<T> StreamVault<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Store a stream under `(owner, key)`, returning the previous entry
    /// if one existed. Overwriting never runs eviction on the previous
    /// stream; its buffered state is simply orphaned.
    pub fn put(
        &self,
        owner: OwnerKey,
        key: StreamKey,
        stream: Arc<dyn ResumableStream<T>>,
    ) -> Option<Arc<dyn ResumableStream<T>>> {
        let mut entries = self.entries.lock();
        let previous = entries.entry(owner).or_default().insert(key, stream);
        if previous.is_some() {
            trace!(%owner, %key, "vault entry overwritten, previous stream orphaned");
        }
        previous
    }

    /// Remove and return the entry for `(owner, key)`. Removing an
    /// absent key is a no-op, not an error.
    pub fn remove(
        &self,
        owner: OwnerKey,
        key: StreamKey,
    ) -> Option<Arc<dyn ResumableStream<T>>> {
        self.entries
            .lock()
            .get_mut(&owner)
            .and_then(|streams| streams.remove(&key))
    }

    /// An owned copy of every `(key, stream)` pair stored for `owner`.
    ///
    /// Never exposes the live internal map, so callers can iterate while
    /// producers keep mutating the vault.
    pub fn snapshot_for(&self, owner: OwnerKey) -> Vec<(StreamKey, Arc<dyn ResumableStream<T>>)> {
        self.entries
            .lock()
            .get(&owner)
            .map(|streams| {
                streams
                    .iter()
                    .map(|(key, stream)| (*key, Arc::clone(stream)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn contains(&self, owner: OwnerKey, key: StreamKey) -> bool {
        self.entries
            .lock()
            .get(&owner)
            .is_some_and(|streams| streams.contains_key(&key))
    }

    /// Number of entries stored for `owner`.
    pub fn len_for(&self, owner: OwnerKey) -> usize {
        self.entries
            .lock()
            .get(&owner)
            .map_or(0, |streams| streams.len())
    }
}

impl<T> Default for StreamVault<T> {
    fn default() -> Self {
        Self::new()
    }
}
