//! Scoped publish/subscribe bus.
//!
//! A bus is created by whoever owns the session (usually the top-level game
//! state) and handed to the entities that publish or listen. Every subscriber
//! owns a mailbox; `emit` delivers into all live mailboxes before it returns.
//! A subscriber that is dropped disappears from the bus on the next emit, so
//! rebuilding a scene never leaves stale listeners behind.

use std::cell::RefCell;
use std::rc::Rc;

use crossbeam_channel::{Receiver, Sender, TryIter};

pub struct EventBus<E> {
    subscribers: Rc<RefCell<Vec<Sender<E>>>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Rc::clone(&self.subscribers),
        }
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            subscribers: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl<E: Clone> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new mailbox on this bus.
    pub fn subscribe(&self) -> Subscription<E> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.subscribers.borrow_mut().push(sender);
        Subscription { receiver }
    }

    /// Deliver `event` to every live subscriber. Returns how many received it.
    pub fn emit(&self, event: E) -> usize {
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.retain(|sender| sender.send(event.clone()).is_ok());
        subscribers.len()
    }

    /// Number of registered mailboxes, including ones whose owner was
    /// dropped since the last emit.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

/// Receiving end of an [`EventBus`] subscription.
#[derive(Debug)]
pub struct Subscription<E> {
    receiver: Receiver<E>,
}

impl<E> Subscription<E> {
    /// Iterate over every event delivered since the last call.
    pub fn drain(&self) -> TryIter<'_, E> {
        self.receiver.try_iter()
    }

    pub fn has_pending(&self) -> bool {
        !self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    enum Signal {
        Ping,
    }

    #[test]
    fn emit_reaches_every_subscriber() {
        let bus = EventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        assert_eq!(bus.emit(Signal::Ping), 2);
        assert_eq!(a.drain().collect::<Vec<_>>(), vec![Signal::Ping]);
        assert_eq!(b.drain().count(), 1);
        assert!(!a.has_pending());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let bus = EventBus::new();
        let keep = bus.subscribe();
        {
            let _gone = bus.subscribe();
        }
        assert_eq!(bus.subscriber_count(), 2);
        assert_eq!(bus.emit(Signal::Ping), 1);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(keep.drain().count(), 1);
    }
}
