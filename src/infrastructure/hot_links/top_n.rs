//! Capacity-bounded popularity ranking on an indexed min-heap.
//!
//! The heap lives in a flat arena (`Vec`) with a slug -> slot index, so a
//! bump is `O(log n)` and the lowest score is always at slot 0. Growth is
//! allowed up to a high-water mark above the capacity; the bump that crosses
//! it prunes the lowest entries back down to capacity in one batch.

use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Slot {
    slug: String,
    score: u64,
}

/// Bounded top-N ranking.
#[derive(Debug)]
pub struct TopN {
    capacity: usize,
    high_water: usize,
    heap: Vec<Slot>,
    index: HashMap<String, usize>,
}

impl TopN {
    /// Creates a ranking holding at most `capacity` entries after pruning.
    ///
    /// The high-water mark is capacity + 10% (at least one extra slot).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            high_water: capacity + (capacity / 10).max(1),
            heap: Vec::with_capacity(capacity + 1),
            index: HashMap::with_capacity(capacity + 1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn score(&self, slug: &str) -> Option<u64> {
        self.index.get(slug).map(|&slot| self.heap[slot].score)
    }

    /// Adds one to `slug`'s score, inserting it when new.
    ///
    /// Returns the number of entries pruned by this bump.
    pub fn bump(&mut self, slug: &str) -> usize {
        match self.index.get(slug).copied() {
            Some(slot) => {
                self.heap[slot].score += 1;
                self.sift_down(slot);
            }
            None => {
                let slot = self.heap.len();
                self.heap.push(Slot {
                    slug: slug.to_string(),
                    score: 1,
                });
                self.index.insert(slug.to_string(), slot);
                self.sift_up(slot);
            }
        }

        if self.heap.len() > self.high_water {
            self.prune()
        } else {
            0
        }
    }

    /// Highest-scoring `n` entries, descending; ties ordered by slug.
    pub fn top(&self, n: usize) -> Vec<(String, u64)> {
        let mut entries: Vec<(String, u64)> = self
            .heap
            .iter()
            .map(|slot| (slot.slug.clone(), slot.score))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(n);
        entries
    }

    fn prune(&mut self) -> usize {
        let mut removed = 0;
        while self.heap.len() > self.capacity {
            self.pop_min();
            removed += 1;
        }
        removed
    }

    fn pop_min(&mut self) -> Option<Slot> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.swap(0, last);
        let min = self.heap.pop()?;
        self.index.remove(&min.slug);
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some(min)
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.heap.swap(a, b);
        self.index.insert(self.heap[a].slug.clone(), a);
        self.index.insert(self.heap[b].slug.clone(), b);
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if self.heap[slot].score >= self.heap[parent].score {
                break;
            }
            self.swap(slot, parent);
            slot = parent;
        }
    }

    fn sift_down(&mut self, mut slot: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * slot + 1;
            let right = left + 1;
            let mut smallest = slot;

            if left < len && self.heap[left].score < self.heap[smallest].score {
                smallest = left;
            }
            if right < len && self.heap[right].score < self.heap[smallest].score {
                smallest = right;
            }
            if smallest == slot {
                break;
            }
            self.swap(slot, smallest);
            slot = smallest;
        }
    }
}
