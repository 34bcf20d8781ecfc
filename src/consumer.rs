//! Consumer-side capability traits and adapters.
//!
//! These traits mark the seams between this crate and its collaborators:
//! the source stream it decorates, the consumers it attaches, and the
//! owner that recreates those consumers after teardown.

use crate::error::Result;
use crate::types::{OwnerKey, SourceError, StreamEvent, StreamKey, SubscriptionHandle};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

/// Receives events from a stream.
///
/// Callbacks run synchronously on the emitting thread, under the owning
/// bridge's lock where applicable, and must not re-enter that bridge.
pub trait Consumer<T>: Send {
    fn on_next(&self, value: T);
    fn on_completed(&self);
    fn on_error(&self, error: SourceError);
}

/// A consumer that names the logical stream it belongs to.
///
/// The key is how the vault stores the stream and how the owner's
/// factory knows which consumer to recreate on resume.
pub trait ResumableConsumer<T>: Consumer<T> {
    fn stream_key(&self) -> StreamKey;
}

/// Recreates consumers for stored stream keys on every resume.
///
/// An unrecognized key is a programming error (a vault/owner mismatch)
/// and must be reported via [`StreamError::UnknownStreamKey`], never
/// swallowed.
///
/// [`StreamError::UnknownStreamKey`]: crate::error::StreamError::UnknownStreamKey
pub trait ConsumerFactory<T>: Send + Sync {
    fn create_consumer(&self, key: StreamKey) -> Result<Box<dyn Consumer<T>>>;
}

/// Identifies an owner slot across its destroy/recreate cycles.
pub trait OwnerIdentity {
    fn resumable_id(&self) -> OwnerKey;
}

/// The upstream stream capability this crate consumes and decorates.
///
/// Implementations guarantee at most one terminal event and no events
/// after unsubscribe.
pub trait Source<T>: Send + Sync {
    fn subscribe(&self, consumer: Box<dyn Consumer<T>>) -> SubscriptionHandle;
}

/// A consumer that forwards every event into a crossbeam channel.
///
/// The receiving end outlives detach/reattach of the consumer itself,
/// which makes this the usual way to observe a stream from a thread that
/// is not the producer. With a bounded channel, events that arrive while
/// the buffer is full are dropped best-effort.
pub struct ChannelConsumer<T> {
    key: StreamKey,
    sender: Sender<StreamEvent<T>>,
}

impl<T: Send> ChannelConsumer<T> {
    /// Consumer backed by an unbounded channel.
    pub fn unbounded(key: StreamKey) -> (Self, Receiver<StreamEvent<T>>) {
        let (sender, receiver) = unbounded();
        (Self { key, sender }, receiver)
    }

    /// Consumer backed by a bounded channel of the given capacity.
    pub fn bounded(key: StreamKey, capacity: usize) -> (Self, Receiver<StreamEvent<T>>) {
        let (sender, receiver) = bounded(capacity);
        (Self { key, sender }, receiver)
    }

    fn forward(&self, event: StreamEvent<T>) {
        // Full or disconnected receivers lose the event, like any other
        // consumer that stopped listening.
        let _ = self.sender.try_send(event);
    }
}

impl<T: Send> Consumer<T> for ChannelConsumer<T> {
    fn on_next(&self, value: T) {
        self.forward(StreamEvent::Next(value));
    }

    fn on_completed(&self) {
        self.forward(StreamEvent::Completed);
    }

    fn on_error(&self, error: SourceError) {
        self.forward(StreamEvent::Error(error));
    }
}

impl<T: Send> ResumableConsumer<T> for ChannelConsumer<T> {
    fn stream_key(&self) -> StreamKey {
        self.key
    }
}
