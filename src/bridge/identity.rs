//! Bidirectional id ↔ handle table.

use std::collections::HashMap;
use std::hash::Hash;

/// Maps host-visible integer ids to engine handles and back.
///
/// Ids are allocated from 0 upwards and never reused. Entries are only ever
/// added.
#[derive(Debug)]
pub struct IdentityMap<H> {
    next_id: i64,
    by_id: HashMap<i64, H>,
    by_handle: HashMap<H, i64>,
}

impl<H: Clone + Eq + Hash> IdentityMap<H> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            by_id: HashMap::new(),
            by_handle: HashMap::new(),
        }
    }

    /// Allocates the next id for a freshly created handle.
    ///
    /// A handle that is already mapped keeps its id.
    pub fn insert(&mut self, handle: H) -> i64 {
        if let Some(&id) = self.by_handle.get(&handle) {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.by_id.insert(id, handle.clone());
        self.by_handle.insert(handle, id);
        id
    }

    pub fn handle(&self, id: i64) -> Option<&H> {
        self.by_id.get(&id)
    }

    pub fn id_of(&self, handle: &H) -> Option<i64> {
        self.by_handle.get(handle).copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl<H: Clone + Eq + Hash> Default for IdentityMap<H> {
    fn default() -> Self {
        Self::new()
    }
}
