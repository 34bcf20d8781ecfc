//! Forwarding policies for events that arrive while detached.
//!
//! A closed set of tagged variants sharing one contract: absorb events
//! while no consumer is attached, hand back buffered events when one
//! attaches. Selected once at subscribe time.

use crate::types::StreamEvent;
use std::collections::VecDeque;

/// Per-bridge policy state.
pub(crate) enum PolicyState<T> {
    /// Discard events that arrive between detach and reattach.
    Drop,
    /// Buffer events in arrival order for FIFO replay on reattach.
    Cache { queue: VecDeque<StreamEvent<T>> },
}

/// What a policy did with an event absorbed while detached.
pub(crate) enum Absorbed {
    /// Retained for replay on the next attach.
    Buffered,
    /// Value discarded; the stream is still live.
    Dropped,
    /// Terminal discarded. The stream is finished and its vault entry
    /// has nothing left to deliver.
    DroppedTerminal,
}

impl<T> PolicyState<T> {
    pub(crate) fn cache() -> Self {
        PolicyState::Cache {
            queue: VecDeque::new(),
        }
    }

    /// Absorb an event that arrived with no consumer attached.
    pub(crate) fn absorb(&mut self, event: StreamEvent<T>) -> Absorbed {
        match self {
            PolicyState::Drop => {
                if event.is_terminal() {
                    Absorbed::DroppedTerminal
                } else {
                    Absorbed::Dropped
                }
            }
            PolicyState::Cache { queue } => {
                queue.push_back(event);
                Absorbed::Buffered
            }
        }
    }

    /// Next buffered event in arrival order, if any.
    pub(crate) fn next_buffered(&mut self) -> Option<StreamEvent<T>> {
        match self {
            PolicyState::Drop => None,
            PolicyState::Cache { queue } => queue.pop_front(),
        }
    }

    pub(crate) fn buffered_len(&self) -> usize {
        match self {
            PolicyState::Drop => 0,
            PolicyState::Cache { queue } => queue.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_discards_values() {
        let mut policy: PolicyState<u32> = PolicyState::Drop;

        assert!(matches!(
            policy.absorb(StreamEvent::Next(1)),
            Absorbed::Dropped
        ));
        assert!(matches!(
            policy.absorb(StreamEvent::Completed),
            Absorbed::DroppedTerminal
        ));
        assert!(policy.next_buffered().is_none());
        assert_eq!(policy.buffered_len(), 0);
    }

    #[test]
    fn test_cache_preserves_arrival_order() {
        let mut policy = PolicyState::cache();

        policy.absorb(StreamEvent::Next(1));
        policy.absorb(StreamEvent::Next(2));
        policy.absorb(StreamEvent::Completed);
        assert_eq!(policy.buffered_len(), 3);

        assert!(matches!(policy.next_buffered(), Some(StreamEvent::Next(1))));
        assert!(matches!(policy.next_buffered(), Some(StreamEvent::Next(2))));
        assert!(matches!(policy.next_buffered(), Some(StreamEvent::Completed)));
        assert!(policy.next_buffered().is_none());
    }
}
