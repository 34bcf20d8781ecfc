//! # Resumable Stream Subscriptions
//!
//! Lets a long-lived event producer keep emitting while its consumer is
//! transiently destroyed and recreated (a UI component torn down and
//! rebuilt, a session reconnecting), without losing, duplicating, or
//! misordering events, and without leaking subscriptions.
//!
//! ## Core Concepts
//!
//! - **Vault**: process-scope storage mapping `(OwnerKey, StreamKey)` to
//!   a decorated stream, surviving the owner's destroy/recreate cycles
//! - **Subscriber**: per-owner-lifetime manager driving attach (`resume`)
//!   and detach (`pause`) against the vault
//! - **Bridge**: the forwarding intermediary between a source and its
//!   possibly-absent consumer, governed by a forwarding policy
//! - **Policies**: drop-while-detached, cache-and-replay-while-detached,
//!   or replay the full history to every attacher
//!
//! ## Example
//!
//! ```ignore
//! use resumable::{ForwardPolicy, OwnerKey, ResumableSubscriber, StreamVault};
//!
//! let vault = Arc::new(StreamVault::new());
//!
//! // First incarnation of the owner.
//! let subscriber = ResumableSubscriber::new(OwnerKey(1), factory.clone(), vault.clone());
//! subscriber.subscribe(&source, consumer, ForwardPolicy::CacheAndReplay);
//!
//! // Owner torn down: release consumers, keep buffered state.
//! subscriber.pause();
//!
//! // Recreated owner: factory-made consumers reattach to the same
//! // streams and buffered events replay in order.
//! let subscriber = ResumableSubscriber::new(OwnerKey(1), factory, vault);
//! subscriber.resume()?;
//! ```

pub mod bridge;
pub mod consumer;
pub mod error;
pub mod navigator;
pub mod subscriber;
pub mod types;
pub mod vault;

// Re-exports
pub use bridge::{EvictionListener, ForwardingBridge, ReplayStream};
pub use consumer::{
    ChannelConsumer, Consumer, ConsumerFactory, OwnerIdentity, ResumableConsumer, Source,
};
pub use error::{Result, StreamError};
pub use navigator::{PendingRequest, RequestOutcome, ResultBridge};
pub use subscriber::ResumableSubscriber;
pub use types::{
    ForwardPolicy, OwnerKey, RequestTag, SourceError, StreamEvent, StreamKey, SubscriptionHandle,
};
pub use vault::{ResumableStream, StreamVault};
