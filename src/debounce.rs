/// Single-slot scheduling: the newest request for a key wins
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::hash::Hash;

/// Proof of a scheduled request, checked once its delay has passed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket<K> {
    key: K,
    generation: u64,
}

/// Tracks at most one pending request per key.
///
/// Scheduling again for a key invalidates the previous ticket, so a caller
/// that slept on an old ticket finds it stale and drops out.
#[derive(Debug)]
pub struct Debouncer<K> {
    next_generation: Cell<u64>,
    pending: RefCell<HashMap<K, u64>>,
}

impl<K: Eq + Hash + Clone> Debouncer<K> {
    pub fn new() -> Self {
        Debouncer {
            next_generation: Cell::new(0),
            pending: RefCell::new(HashMap::new()),
        }
    }

    pub fn schedule(&self, key: K) -> Ticket<K> {
        let generation = self.next_generation.get() + 1;
        self.next_generation.set(generation);
        self.pending.borrow_mut().insert(key.clone(), generation);
        Ticket { key, generation }
    }

    pub fn is_current(&self, ticket: &Ticket<K>) -> bool {
        self.pending.borrow().get(&ticket.key) == Some(&ticket.generation)
    }

    /// Claim the slot; false when a newer request superseded this one
    pub fn fire(&self, ticket: Ticket<K>) -> bool {
        let mut pending = self.pending.borrow_mut();
        if pending.get(&ticket.key) == Some(&ticket.generation) {
            pending.remove(&ticket.key);
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.borrow().contains_key(key)
    }
}

impl<K: Eq + Hash + Clone> Default for Debouncer<K> {
    fn default() -> Self {
        Self::new()
    }
}
