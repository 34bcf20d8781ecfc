//! Core identifier and event types.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifies a logical owner slot.
///
/// Stable across an owner's destroy/recreate cycles: the key names the
/// slot, not a concrete instance. Supplied by the owner.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OwnerKey(pub u64);

impl fmt::Debug for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnerKey({})", self.0)
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one logical stream within an owner.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StreamKey(pub u64);

impl fmt::Debug for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StreamKey({})", self.0)
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Correlates an outgoing external request with its one-shot result.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestTag(pub u64);

impl fmt::Debug for RequestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestTag({})", self.0)
    }
}

impl fmt::Display for RequestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error payload carried by a stream's error event.
///
/// Error events are data, not faults of this crate: they are forwarded
/// (or buffered) verbatim, so the payload must be cheaply cloneable.
pub type SourceError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// A single event in a stream's lifecycle.
///
/// A stream emits any number of `Next` values followed by exactly one
/// terminal event, either `Completed` or `Error`.
#[derive(Clone, Debug)]
pub enum StreamEvent<T> {
    Next(T),
    Completed,
    Error(SourceError),
}

impl<T> StreamEvent<T> {
    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Next(_))
    }
}

/// What happens to events that arrive while no consumer is attached.
///
/// Selected once at subscribe time; the choice is fixed for the lifetime
/// of the stored stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForwardPolicy {
    /// Discard events emitted between detach and reattach. Only the
    /// live window is observed; its order is preserved.
    Drop,

    /// Buffer events in arrival order and replay them, FIFO, to the next
    /// attached consumer before any live event is forwarded.
    CacheAndReplay,

    /// Retain the entire history for the stream's lifetime and replay it
    /// (terminal event included) to every consumer that attaches.
    /// Unbounded retention; the vault entry is removed only by explicit
    /// unsubscribe.
    ReplayAll,
}

/// Handle for cancelling a live subscription.
///
/// Holds a one-shot cancel action. Dropping the handle does NOT
/// unsubscribe; detach must be explicit so a destroyed owner's consumers
/// are released deliberately, never by accident of drop order.
pub struct SubscriptionHandle {
    cancel: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl SubscriptionHandle {
    /// Wrap a cancel action.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Mutex::new(Some(Box::new(cancel))),
        }
    }

    /// Run the cancel action. Idempotent: later calls are no-ops.
    pub fn unsubscribe(&self) {
        if let Some(cancel) = self.cancel.lock().take() {
            cancel();
        }
    }

    pub fn is_unsubscribed(&self) -> bool {
        self.cancel.lock().is_none()
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("unsubscribed", &self.is_unsubscribed())
            .finish()
    }
}
