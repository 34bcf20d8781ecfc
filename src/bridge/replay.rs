//! Replayable stream decoration for the replay-all policy.

use crate::consumer::{Consumer, Source};
use crate::types::{SourceError, StreamEvent, SubscriptionHandle};
use crate::vault::ResumableStream;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

struct ReplayInner<T> {
    /// Every event seen so far, terminal included. Unbounded retention
    /// for the stream's lifetime.
    history: Vec<StreamEvent<T>>,
    consumers: Vec<(u64, Box<dyn Consumer<T>>)>,
    /// Terminal recorded; later upstream events are ignored.
    done: bool,
}

struct Shared<T> {
    inner: Mutex<ReplayInner<T>>,
    next_id: AtomicU64,
}

/// A decoration of a raw source that replays its full history, terminal
/// event included, to every consumer that attaches, then keeps forwarding
/// live events.
///
/// Unlike the forwarding bridge there is no eviction signal: the entry
/// stays useful to late attachers for as long as it is stored, so only an
/// explicit unsubscribe removes it from the vault. Multiple consumers may
/// be attached at once.
pub struct ReplayStream<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for ReplayStream<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + 'static> ReplayStream<T> {
    /// Decorate `source`, subscribing to it immediately. The upstream
    /// subscription is intentionally retained for the stream's lifetime
    /// so history keeps accumulating while no consumer is attached.
    pub fn subscribe_to(source: &dyn Source<T>) -> Self {
        let stream = Self::new();
        let _upstream = source.subscribe(Box::new(ReplaySink {
            shared: Arc::clone(&stream.shared),
        }));
        stream
    }

    fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(ReplayInner {
                    history: Vec::new(),
                    consumers: Vec::new(),
                    done: false,
                }),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn consumer_count(&self) -> usize {
        self.shared.inner.lock().consumers.len()
    }

    /// Number of retained events.
    pub fn history_len(&self) -> usize {
        self.shared.inner.lock().history.len()
    }
}

impl<T: Clone + Send + 'static> ResumableStream<T> for ReplayStream<T> {
    fn attach(&self, consumer: Box<dyn Consumer<T>>) -> SubscriptionHandle {
        let id = self.shared.next_id.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.shared.inner.lock();
        for event in &inner.history {
            deliver(consumer.as_ref(), event.clone());
        }
        inner.consumers.push((id, consumer));
        drop(inner);

        let shared = Arc::clone(&self.shared);
        SubscriptionHandle::new(move || {
            shared
                .inner
                .lock()
                .consumers
                .retain(|(consumer_id, _)| *consumer_id != id);
        })
    }
}

fn deliver<T>(consumer: &dyn Consumer<T>, event: StreamEvent<T>) {
    match event {
        StreamEvent::Next(value) => consumer.on_next(value),
        StreamEvent::Completed => consumer.on_completed(),
        StreamEvent::Error(error) => consumer.on_error(error),
    }
}

struct ReplaySink<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Clone + Send + 'static> ReplaySink<T> {
    fn record(&self, event: StreamEvent<T>) {
        let mut inner = self.shared.inner.lock();
        if inner.done {
            return;
        }
        if event.is_terminal() {
            inner.done = true;
        }
        inner.history.push(event.clone());
        for (_, consumer) in &inner.consumers {
            deliver(consumer.as_ref(), event.clone());
        }
    }
}

impl<T: Clone + Send + 'static> Consumer<T> for ReplaySink<T> {
    fn on_next(&self, value: T) {
        self.record(StreamEvent::Next(value));
    }

    fn on_completed(&self) {
        self.record(StreamEvent::Completed);
    }

    fn on_error(&self, error: SourceError) {
        self.record(StreamEvent::Error(error));
    }
}
