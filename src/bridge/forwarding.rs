//! The forwarding bridge between a source and its (possibly absent)
//! consumer.

use super::policy::{Absorbed, PolicyState};
use crate::consumer::Consumer;
use crate::types::{SourceError, StreamEvent, SubscriptionHandle};
use crate::vault::ResumableStream;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

/// Callback invoked exactly once when the bridge's terminal event has
/// been handled: delivered to an attached consumer, or (drop policy)
/// discarded while detached. The subscription manager uses it to evict
/// the finished vault entry.
pub type EvictionListener = Box<dyn Fn() + Send + Sync>;

struct BridgeInner<T> {
    consumer: Option<Box<dyn Consumer<T>>>,
    policy: PolicyState<T>,
    /// Bumped on every attach so a stale detach handle cannot clear a
    /// newer consumer.
    epoch: u64,
    /// Terminal handled; nothing further is accepted or delivered.
    done: bool,
}

struct Shared<T> {
    inner: Mutex<BridgeInner<T>>,
    on_all_forwarded: EvictionListener,
}

/// Dual-role intermediary: looks like a consumer to the upstream source
/// (via [`sink`]) and like an attach point to the downstream side (via
/// [`ResumableStream::attach`]).
///
/// Every upstream event is delegated to the configured policy, never
/// acted on directly. One lock per bridge serializes event delivery,
/// attach-triggered buffer draining, and detach: an event racing an
/// attach is deterministically either delivered live or buffered before
/// the drain observes it.
///
/// [`sink`]: ForwardingBridge::sink
pub struct ForwardingBridge<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for ForwardingBridge<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Send + 'static> ForwardingBridge<T> {
    /// Bridge that discards events while detached.
    pub fn dropping(listener: EvictionListener) -> Self {
        Self::with_policy(PolicyState::Drop, listener)
    }

    /// Bridge that buffers events while detached and replays them FIFO
    /// on reattach.
    pub fn caching(listener: EvictionListener) -> Self {
        Self::with_policy(PolicyState::cache(), listener)
    }

    fn with_policy(policy: PolicyState<T>, listener: EvictionListener) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(BridgeInner {
                    consumer: None,
                    policy,
                    epoch: 0,
                    done: false,
                }),
                on_all_forwarded: listener,
            }),
        }
    }

    /// The upstream face handed to the source.
    pub fn sink(&self) -> Box<dyn Consumer<T>> {
        Box::new(BridgeSink {
            shared: Arc::clone(&self.shared),
        })
    }

    /// Whether a consumer is currently attached.
    pub fn has_consumer(&self) -> bool {
        self.shared.inner.lock().consumer.is_some()
    }

    /// Number of events currently buffered (always 0 for drop policy).
    pub fn buffered_len(&self) -> usize {
        self.shared.inner.lock().policy.buffered_len()
    }
}

impl<T: Send + 'static> Shared<T> {
    /// Route one upstream event: deliver live when attached, otherwise
    /// delegate to the policy.
    fn dispatch(&self, event: StreamEvent<T>) {
        let mut inner = self.inner.lock();
        if inner.done {
            return;
        }
        if inner.consumer.is_some() {
            self.deliver(&mut inner, event);
        } else {
            match inner.policy.absorb(event) {
                Absorbed::Buffered | Absorbed::Dropped => {}
                Absorbed::DroppedTerminal => {
                    // The terminal value is lost, but the stream is done:
                    // signal eviction so the vault never retains an entry
                    // with nothing left to deliver.
                    inner.done = true;
                    (self.on_all_forwarded)();
                }
            }
        }
    }

    /// Deliver an event to the attached consumer. For a terminal event
    /// the eviction listener fires first, so the vault entry is already
    /// gone by the time the consumer observes completion.
    fn deliver(&self, inner: &mut BridgeInner<T>, event: StreamEvent<T>) {
        if event.is_terminal() {
            inner.done = true;
            (self.on_all_forwarded)();
        }
        let consumer = inner
            .consumer
            .as_ref()
            .expect("deliver requires an attached consumer");
        match event {
            StreamEvent::Next(value) => consumer.on_next(value),
            StreamEvent::Completed => consumer.on_completed(),
            StreamEvent::Error(error) => consumer.on_error(error),
        }
    }

    fn attach(self: &Arc<Self>, consumer: Box<dyn Consumer<T>>) -> SubscriptionHandle {
        let mut inner = self.inner.lock();
        inner.consumer = Some(consumer);
        inner.epoch += 1;
        let epoch = inner.epoch;

        // Drain buffered events strictly FIFO before any live event can
        // be forwarded; live events queue behind the bridge lock.
        let buffered = inner.policy.buffered_len();
        if buffered > 0 {
            trace!(buffered, "replaying buffered events to reattached consumer");
        }
        while let Some(event) = inner.policy.next_buffered() {
            if inner.done {
                // Terminal already replayed; anything behind it was an
                // upstream contract violation.
                break;
            }
            self.deliver(&mut inner, event);
        }
        drop(inner);

        let shared = Arc::clone(self);
        SubscriptionHandle::new(move || shared.detach(epoch))
    }

    fn detach(&self, epoch: u64) {
        let mut inner = self.inner.lock();
        if inner.epoch == epoch {
            inner.consumer = None;
        }
    }
}

impl<T: Send + 'static> ResumableStream<T> for ForwardingBridge<T> {
    fn attach(&self, consumer: Box<dyn Consumer<T>>) -> SubscriptionHandle {
        self.shared.attach(consumer)
    }
}

/// Upstream face: forwards source events into the bridge.
struct BridgeSink<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + 'static> Consumer<T> for BridgeSink<T> {
    fn on_next(&self, value: T) {
        self.shared.dispatch(StreamEvent::Next(value));
    }

    fn on_completed(&self) {
        self.shared.dispatch(StreamEvent::Completed);
    }

    fn on_error(&self, error: SourceError) {
        self.shared.dispatch(StreamEvent::Error(error));
    }
}
