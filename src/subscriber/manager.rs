//! Resumable subscription manager.

use crate::bridge::{EvictionListener, ForwardingBridge, ReplayStream};
use crate::consumer::{ConsumerFactory, OwnerIdentity, ResumableConsumer, Source};
use crate::error::Result;
use crate::types::{ForwardPolicy, OwnerKey, StreamKey, SubscriptionHandle};
use crate::vault::{ResumableStream, StreamVault};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Coordinates attach and detach of consumers against the streams stored
/// in the vault for one owner slot.
///
/// One instance per owner lifetime: the owner creates a fresh manager on
/// each recreation, pointing at the same vault with the same `OwnerKey`.
/// The manager never owns stream state; it only holds the transient
/// attachment handles of the currently-attached consumers, all of which
/// are released on [`pause`] so a destroyed owner instance is never kept
/// alive through a closure.
///
/// Callers must alternate `resume`/`pause`; a second `resume` without an
/// intervening `pause` attaches duplicate consumers.
///
/// [`pause`]: ResumableSubscriber::pause
pub struct ResumableSubscriber<T> {
    owner: OwnerKey,
    vault: Arc<StreamVault<T>>,
    factory: Arc<dyn ConsumerFactory<T>>,
    /// (stream key, live attachment handle) pairs currently attached.
    /// Duplicate keys are allowed here; only the vault is one-per-key.
    active: Mutex<Vec<(StreamKey, SubscriptionHandle)>>,
}

impl<T: Send + 'static> ResumableSubscriber<T> {
    pub fn new(
        owner: OwnerKey,
        factory: Arc<dyn ConsumerFactory<T>>,
        vault: Arc<StreamVault<T>>,
    ) -> Self {
        Self {
            owner,
            vault,
            factory,
            active: Mutex::new(Vec::new()),
        }
    }

    /// Construct for an owner exposing its identity capability.
    pub fn for_owner(
        owner: &dyn OwnerIdentity,
        factory: Arc<dyn ConsumerFactory<T>>,
        vault: Arc<StreamVault<T>>,
    ) -> Self {
        Self::new(owner.resumable_id(), factory, vault)
    }

    pub fn owner(&self) -> OwnerKey {
        self.owner
    }

    /// Recreate and reattach a consumer for every stream stored for this
    /// owner. Consumers come from the factory; streams come from the
    /// vault, so no new subscription to the original source is made.
    ///
    /// A factory error propagates immediately; consumers attached before
    /// the failing key stay attached.
    pub fn resume(&self) -> Result<()> {
        let stored = self.vault.snapshot_for(self.owner);
        debug!(owner = %self.owner, streams = stored.len(), "resuming stored subscriptions");
        for (key, stream) in stored {
            let consumer = self.factory.create_consumer(key)?;
            let handle = stream.attach(consumer);
            self.active.lock().push((key, handle));
        }
        Ok(())
    }

    /// Unsubscribe every attached consumer and clear the active list.
    /// The vault is untouched: buffered and pending state survives until
    /// the next [`resume`]. No-op when nothing is attached.
    ///
    /// [`resume`]: ResumableSubscriber::resume
    pub fn pause(&self) {
        let mut active = self.active.lock();
        if active.is_empty() {
            return;
        }
        debug!(owner = %self.owner, handles = active.len(), "pausing active subscriptions");
        for (_, handle) in active.drain(..) {
            handle.unsubscribe();
        }
    }

    /// Subscribe `consumer` to `source` under the given forwarding
    /// policy, storing the decorated stream in the vault so a recreated
    /// owner can reattach to it.
    ///
    /// For `Drop` and `CacheAndReplay` the source feeds a
    /// [`ForwardingBridge`] whose upstream subscription is intentionally
    /// not retained: the bridge must keep receiving while the consumer is
    /// detached. For `ReplayAll` the vault stores a [`ReplayStream`]
    /// decoration of the raw source instead.
    ///
    /// `T: Clone` is only needed here: replaying history hands each
    /// consumer its own copy of every event. The lifecycle methods work
    /// with any payload type.
    pub fn subscribe<C>(&self, source: &dyn Source<T>, consumer: C, policy: ForwardPolicy)
    where
        C: ResumableConsumer<T> + 'static,
        T: Clone,
    {
        let key = consumer.stream_key();
        let stream: Arc<dyn ResumableStream<T>> = match policy {
            ForwardPolicy::Drop => {
                let bridge = ForwardingBridge::dropping(self.evictor(key));
                let _upstream = source.subscribe(bridge.sink());
                Arc::new(bridge)
            }
            ForwardPolicy::CacheAndReplay => {
                let bridge = ForwardingBridge::caching(self.evictor(key));
                let _upstream = source.subscribe(bridge.sink());
                Arc::new(bridge)
            }
            ForwardPolicy::ReplayAll => Arc::new(ReplayStream::subscribe_to(source)),
        };

        self.vault.put(self.owner, key, Arc::clone(&stream));
        let handle = stream.attach(Box::new(consumer));
        self.active.lock().push((key, handle));
    }

    /// Unsubscribe every active consumer for `key` and remove the stored
    /// stream from the vault. The only explicit removal path besides
    /// natural completion.
    pub fn unsubscribe(&self, key: StreamKey) {
        let mut active = self.active.lock();
        active.retain(|(active_key, handle)| {
            if *active_key == key {
                handle.unsubscribe();
                false
            } else {
                true
            }
        });
        drop(active);
        self.vault.remove(self.owner, key);
    }

    /// Number of currently-attached consumers.
    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }

    /// Eviction callback removing `(owner, key)` once the stream's
    /// terminal event has been handled.
    fn evictor(&self, key: StreamKey) -> EvictionListener {
        let vault = Arc::clone(&self.vault);
        let owner = self.owner;
        Box::new(move || {
            debug!(%owner, %key, "stream finished, evicting vault entry");
            vault.remove(owner, key);
        })
    }
}
