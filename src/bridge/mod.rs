//! Event forwarding between a source and its (possibly absent) consumer.
//!
//! The [`ForwardingBridge`] sits between an upstream source and the
//! downstream consumer slot. While a consumer is attached, events flow
//! through live; while detached, the bridge's policy decides whether
//! events are dropped or buffered for FIFO replay on reattach.
//! [`ReplayStream`] covers the third mode: retain everything, replay the
//! full history to each attacher.

mod forwarding;
mod policy;
mod replay;

pub use forwarding::{EvictionListener, ForwardingBridge};
pub use replay::ReplayStream;
