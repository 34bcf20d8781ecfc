//! Per-owner coordination of resumable subscriptions.
//!
//! A [`ResumableSubscriber`] is created once per owner lifetime and
//! drives the attach/detach cycle against the shared vault:
//!
//! ```ignore
//! let subscriber = ResumableSubscriber::new(owner_key, factory, vault);
//!
//! // First incarnation subscribes.
//! subscriber.subscribe(&source, consumer, ForwardPolicy::CacheAndReplay);
//!
//! // Teardown: consumers released, buffered state survives in the vault.
//! subscriber.pause();
//!
//! // Recreated incarnation reattaches factory-made consumers.
//! let subscriber = ResumableSubscriber::new(owner_key, factory, vault);
//! subscriber.resume()?;
//! ```

mod manager;

pub use manager::ResumableSubscriber;
