//! Error handling and edge case tests.

use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use resumable::{
    ChannelConsumer, Consumer, ConsumerFactory, ForwardPolicy, OwnerKey, Result,
    ResumableSubscriber, Source, SourceError, StreamError, StreamEvent, StreamKey, StreamVault,
    SubscriptionHandle,
};
use std::sync::Arc;

struct Emitter {
    sinks: Mutex<Vec<Box<dyn Consumer<u32>>>>,
}

impl Emitter {
    fn new() -> Self {
        Self {
            sinks: Mutex::new(Vec::new()),
        }
    }

    fn emit(&self, value: u32) {
        for sink in self.sinks.lock().iter() {
            sink.on_next(value);
        }
    }

    fn fail(&self, message: &str) {
        let error: SourceError = Arc::new(std::io::Error::other(message.to_string()));
        for sink in self.sinks.lock().iter() {
            sink.on_error(Arc::clone(&error));
        }
    }
}

impl Source<u32> for Emitter {
    fn subscribe(&self, consumer: Box<dyn Consumer<u32>>) -> SubscriptionHandle {
        self.sinks.lock().push(consumer);
        SubscriptionHandle::new(|| {})
    }
}

struct ChannelFactory {
    known: Vec<StreamKey>,
    receivers: Mutex<Vec<(StreamKey, Receiver<StreamEvent<u32>>)>>,
}

impl ChannelFactory {
    fn new(known: Vec<StreamKey>) -> Arc<Self> {
        Arc::new(Self {
            known,
            receivers: Mutex::new(Vec::new()),
        })
    }

    fn take_receivers(&self) -> Vec<(StreamKey, Receiver<StreamEvent<u32>>)> {
        std::mem::take(&mut self.receivers.lock())
    }
}

impl ConsumerFactory<u32> for ChannelFactory {
    fn create_consumer(&self, key: StreamKey) -> Result<Box<dyn Consumer<u32>>> {
        if !self.known.contains(&key) {
            return Err(StreamError::UnknownStreamKey(key));
        }
        let (consumer, receiver) = ChannelConsumer::unbounded(key);
        self.receivers.lock().push((key, receiver));
        Ok(Box::new(consumer))
    }
}

fn subscriber_with(
    vault: &Arc<StreamVault<u32>>,
    factory: &Arc<ChannelFactory>,
) -> ResumableSubscriber<u32> {
    ResumableSubscriber::new(
        OwnerKey(1),
        Arc::clone(factory) as Arc<dyn ConsumerFactory<u32>>,
        Arc::clone(vault),
    )
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

// --- Factory errors ---

#[test]
fn test_unknown_stream_key_is_reported_not_swallowed() {
    init_tracing();
    let vault = Arc::new(StreamVault::new());
    let factory = ChannelFactory::new(vec![]);
    let source = Emitter::new();
    let subscriber = subscriber_with(&vault, &factory);

    let (consumer, _rx) = ChannelConsumer::unbounded(StreamKey(42));
    subscriber.subscribe(&source, consumer, ForwardPolicy::CacheAndReplay);
    subscriber.pause();

    let error = subscriber.resume().unwrap_err();
    assert!(matches!(error, StreamError::UnknownStreamKey(StreamKey(42))));
    assert_eq!(
        error.to_string(),
        "no consumer registered for stream key 42"
    );
}

// --- No-op edge cases ---

#[test]
fn test_pause_while_idle_is_a_no_op() {
    init_tracing();
    let vault = Arc::new(StreamVault::new());
    let factory = ChannelFactory::new(vec![]);
    let subscriber = subscriber_with(&vault, &factory);

    subscriber.pause();
    subscriber.pause();
    assert_eq!(subscriber.active_count(), 0);
}

#[test]
fn test_unsubscribe_absent_key_is_a_no_op() {
    init_tracing();
    let vault = Arc::new(StreamVault::new());
    let factory = ChannelFactory::new(vec![]);
    let source = Emitter::new();
    let subscriber = subscriber_with(&vault, &factory);

    subscriber.unsubscribe(StreamKey(1));

    let (consumer, _rx) = ChannelConsumer::unbounded(StreamKey(1));
    subscriber.subscribe(&source, consumer, ForwardPolicy::Drop);
    subscriber.unsubscribe(StreamKey(1));
    subscriber.unsubscribe(StreamKey(1));

    assert_eq!(subscriber.active_count(), 0);
    assert!(!vault.contains(OwnerKey(1), StreamKey(1)));
}

// --- Source errors are data ---

#[test]
fn test_source_error_buffered_and_replayed_verbatim() {
    init_tracing();
    let vault = Arc::new(StreamVault::new());
    let factory = ChannelFactory::new(vec![StreamKey(1)]);
    let source = Emitter::new();
    let subscriber = subscriber_with(&vault, &factory);

    let (consumer, _rx) = ChannelConsumer::unbounded(StreamKey(1));
    subscriber.subscribe(&source, consumer, ForwardPolicy::CacheAndReplay);
    subscriber.pause();

    source.emit(1);
    source.fail("backend unreachable");

    subscriber.resume().unwrap();
    let receivers = factory.take_receivers();
    let events: Vec<_> = receivers[0].1.try_iter().collect();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], StreamEvent::Next(1)));
    match &events[1] {
        StreamEvent::Error(error) => assert_eq!(error.to_string(), "backend unreachable"),
        other => panic!("expected error event, got {other:?}"),
    }

    // An error is terminal like completion: the entry is evicted.
    assert!(!vault.contains(OwnerKey(1), StreamKey(1)));
}

// --- Overwriting a live entry ---

#[test]
fn test_resubscribing_a_live_key_orphans_the_old_bridge() {
    init_tracing();
    let vault = Arc::new(StreamVault::new());
    let factory = ChannelFactory::new(vec![StreamKey(1)]);
    let source = Emitter::new();
    let subscriber = subscriber_with(&vault, &factory);

    let (first, first_rx) = ChannelConsumer::unbounded(StreamKey(1));
    subscriber.subscribe(&source, first, ForwardPolicy::CacheAndReplay);

    // Caller-discipline violation: same key, no unsubscribe first.
    let (second, second_rx) = ChannelConsumer::unbounded(StreamKey(1));
    subscriber.subscribe(&source, second, ForwardPolicy::CacheAndReplay);

    assert_eq!(vault.len_for(OwnerKey(1)), 1);
    assert_eq!(subscriber.active_count(), 2);

    // Both bridges are still fed; the attached consumer on the orphaned
    // bridge keeps working until its own unsubscribe.
    source.emit(7);
    assert!(matches!(first_rx.try_recv(), Ok(StreamEvent::Next(7))));
    assert!(matches!(second_rx.try_recv(), Ok(StreamEvent::Next(7))));

    // After a pause, only the surviving entry is found by resume.
    subscriber.pause();
    source.emit(8);
    subscriber.resume().unwrap();

    let receivers = factory.take_receivers();
    assert_eq!(receivers.len(), 1);
    assert_eq!(
        receivers[0]
            .1
            .try_iter()
            .filter(|event| matches!(event, StreamEvent::Next(8)))
            .count(),
        1
    );
    assert!(first_rx.try_recv().is_err());
}
