use std::collections::{HashSet, VecDeque};
use xbird_core::PostId;

/// Bounded, insertion-ordered set of post identifiers already handled.
///
/// When an insertion pushes the size past the capacity, the oldest half is evicted
/// in one batch.
#[derive(Debug, Clone)]
pub struct ProcessedSet {
    order: VecDeque<PostId>,
    members: HashSet<PostId>,
    capacity: usize,
}

impl ProcessedSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity + 1),
            members: HashSet::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn contains(&self, id: &PostId) -> bool {
        self.members.contains(id)
    }

    /// Records `id`. Returns `false` when it was already present.
    pub fn insert(&mut self, id: PostId) -> bool {
        if !self.members.insert(id.clone()) {
            return false;
        }
        self.order.push_back(id);

        if self.order.len() > self.capacity {
            let evict = self.capacity / 2;
            for old in self.order.drain(..evict) {
                self.members.remove(&old);
            }
            tracing::debug!(
                "Processed set exceeded {} entries, evicted {} oldest",
                self.capacity,
                evict
            );
        }
        true
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
