//! One-shot correlation between outgoing requests and inbound results.
//!
//! A sibling of the core subsystem: an external call is tagged on the way
//! out, and exactly one inbound result is delivered to whichever consumer
//! subscribed under that tag, as a one-shot terminal stream. The bridge
//! is an owned instance injected where needed, never a process-global
//! table.

use crate::consumer::{Consumer, Source};
use crate::error::StreamError;
use crate::types::{RequestTag, SubscriptionHandle};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Outcome of an external request.
#[derive(Debug)]
pub enum RequestOutcome<T> {
    /// The request succeeded with a payload.
    Ok(T),
    /// The request was cancelled before producing a result.
    Cancelled,
    /// The request ran and failed.
    Failed,
}

/// Maps each outstanding request tag to the one consumer awaiting its
/// result.
pub struct ResultBridge<T> {
    pending: Mutex<HashMap<RequestTag, Box<dyn Consumer<T>>>>,
}

impl<T: Send + 'static> ResultBridge<T> {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// A source for the result of the request identified by `tag`.
    ///
    /// Subscribing registers the consumer under `tag`, replacing any
    /// previous registration; the returned handle's unsubscribe
    /// deregisters it. Pair with a resumable subscription so the result
    /// survives the owner's teardown:
    ///
    /// ```ignore
    /// let pending = bridge.request(RequestTag(7));
    /// subscriber.subscribe(&pending, consumer, ForwardPolicy::CacheAndReplay);
    /// start_external_call(7);
    /// ```
    pub fn request(self: &Arc<Self>, tag: RequestTag) -> PendingRequest<T> {
        PendingRequest {
            bridge: Arc::clone(self),
            tag,
        }
    }

    /// Deliver an inbound result to the consumer registered under `tag`.
    ///
    /// Success becomes `on_next(payload)` followed by `on_completed()`;
    /// cancellation and failure become `on_error`. Every delivered
    /// outcome deregisters the tag: the correlation is one-shot.
    ///
    /// Returns `false` when no consumer is registered for `tag`, so the
    /// caller can fall back to its default handling.
    pub fn on_external_result(&self, tag: RequestTag, outcome: RequestOutcome<T>) -> bool {
        let Some(consumer) = self.pending.lock().remove(&tag) else {
            return false;
        };
        match outcome {
            RequestOutcome::Ok(payload) => {
                consumer.on_next(payload);
                consumer.on_completed();
            }
            RequestOutcome::Cancelled => {
                consumer.on_error(Arc::new(StreamError::RequestCancelled));
            }
            RequestOutcome::Failed => {
                consumer.on_error(Arc::new(StreamError::RequestFailed));
            }
        }
        true
    }

    /// Number of requests still awaiting a result.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

impl<T: Send + 'static> Default for ResultBridge<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The not-yet-delivered result of one tagged request, as a source.
pub struct PendingRequest<T> {
    bridge: Arc<ResultBridge<T>>,
    tag: RequestTag,
}

impl<T: Send + 'static> Source<T> for PendingRequest<T> {
    fn subscribe(&self, consumer: Box<dyn Consumer<T>>) -> SubscriptionHandle {
        let replaced = self.bridge.pending.lock().insert(self.tag, consumer);
        if replaced.is_some() {
            trace!(tag = %self.tag, "pending request consumer replaced");
        }
        let bridge = Arc::clone(&self.bridge);
        let tag = self.tag;
        SubscriptionHandle::new(move || {
            bridge.pending.lock().remove(&tag);
        })
    }
}
