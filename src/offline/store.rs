use std::collections::{HashMap, VecDeque};

use super::CachedResponse;

/// A bounded response store with FIFO eviction.
///
/// Eviction is by insertion order, not last access: the bookkeeping is a
/// single queue push per insert, and re-inserting a key refreshes its slot.
#[derive(Debug)]
pub(crate) struct CacheStore {
    max_size: usize,
    entries: HashMap<String, CachedResponse>,
    order: VecDeque<String>,
}

impl CacheStore {
    pub(crate) fn new(max_size: usize) -> Self {
        Self {
            max_size,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub(crate) fn get(&self, key: &str) -> Option<&CachedResponse> {
        self.entries.get(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Insert and trim back down to `max_size`, oldest-inserted first.
    pub(crate) fn insert(&mut self, key: String, response: CachedResponse) {
        if self.entries.insert(key.clone(), response).is_some() {
            self.order.retain(|k| k != &key);
        }
        self.order.push_back(key);

        while self.entries.len() > self.max_size {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }
}
