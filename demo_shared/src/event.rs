//! Event queue.
//!
//! A small typed event bus drained once per frame. The shell queues
//! navigation requests and panel actions here so they are applied at frame
//! boundaries, never in the middle of a scene update.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
};

/// Typed event bus.
#[derive(Default)]
pub struct EventBus {
    queues: HashMap<TypeId, Box<dyn Any>>,
}

impl EventBus {
    /// Pushes an event into the queue.
    pub fn push<E: 'static>(&mut self, e: E) {
        let q = self
            .queues
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(Vec::<E>::new()));
        let q = q.downcast_mut::<Vec<E>>().expect("queue type mismatch");
        q.push(e);
    }

    /// Drains all queued events of a type, oldest first.
    pub fn drain<E: 'static>(&mut self) -> Vec<E> {
        self.queues
            .remove(&TypeId::of::<E>())
            .and_then(|boxed| boxed.downcast::<Vec<E>>().ok())
            .map(|boxed| *boxed)
            .unwrap_or_default()
    }

    /// Number of queued events of a type.
    pub fn pending<E: 'static>(&self) -> usize {
        self.queues
            .get(&TypeId::of::<E>())
            .and_then(|boxed| boxed.downcast_ref::<Vec<E>>())
            .map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Go(&'static str);

    #[test]
    fn drain_preserves_order_and_empties_queue() {
        let mut bus = EventBus::default();
        bus.push(Go("a"));
        bus.push(Go("b"));
        bus.push(7u32);
        assert_eq!(bus.pending::<Go>(), 2);
        assert_eq!(bus.drain::<Go>(), vec![Go("a"), Go("b")]);
        assert_eq!(bus.pending::<Go>(), 0);
        assert_eq!(bus.drain::<u32>(), vec![7]);
    }
}
