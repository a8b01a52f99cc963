//! Capacity-bounded list with oldest-first eviction.

use std::collections::VecDeque;

/// A list that never grows past its capacity. Appending to a full list
/// drops the oldest element.
///
/// Eviction is strictly FIFO. Thinning schemes that keep a spread of older
/// entries would plug in at [`ManagedArray::eviction_index`].
#[derive(Debug, Clone)]
pub struct ManagedArray<T> {
    capacity: usize,
    elements: VecDeque<T>,
    evictions: usize,
    modified: bool,
}

impl<T> ManagedArray<T> {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            elements: VecDeque::with_capacity(capacity),
            evictions: 0,
            modified: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.elements.get(index)
    }

    pub fn last(&self) -> Option<&T> {
        self.elements.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.elements.iter()
    }

    /// Total number of evictions since creation or the last clear.
    pub fn evictions(&self) -> usize {
        self.evictions
    }

    /// Whether the contents changed since the last clear or
    /// [`mark_clean`](Self::mark_clean).
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_clean(&mut self) {
        self.modified = false;
    }

    fn eviction_index(&self) -> usize {
        0
    }

    /// Append an element. Returns the evicted element if the list was full.
    pub fn push(&mut self, element: T) -> Option<T> {
        let evicted = if self.elements.len() >= self.capacity {
            self.evictions += 1;
            self.elements.remove(self.eviction_index())
        } else {
            None
        };
        self.elements.push_back(element);
        self.modified = true;
        evicted
    }

    pub fn remove(&mut self, index: usize) -> Option<T> {
        let removed = self.elements.remove(index);
        if removed.is_some() {
            self.modified = true;
        }
        removed
    }

    pub fn pop_last(&mut self) -> Option<T> {
        let popped = self.elements.pop_back();
        if popped.is_some() {
            self.modified = true;
        }
        popped
    }

    /// Swap two elements. Returns false if either index is out of range.
    pub fn swap(&mut self, i: usize, j: usize) -> bool {
        if i >= self.elements.len() || j >= self.elements.len() {
            return false;
        }
        self.elements.swap(i, j);
        self.modified = true;
        true
    }

    pub fn clear(&mut self) {
        self.elements.clear();
        self.evictions = 0;
        self.modified = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_at_capacity() {
        let mut list = ManagedArray::new(3);
        assert_eq!(list.push(1), None);
        assert_eq!(list.push(2), None);
        assert_eq!(list.push(3), None);
        assert_eq!(list.push(4), Some(1));
        assert_eq!(list.push(5), Some(2));
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), [3, 4, 5]);
        assert_eq!(list.len(), 3);
        assert_eq!(list.evictions(), 2);
        assert_eq!(list.last(), Some(&5));
    }

    #[test]
    fn zero_capacity_holds_one() {
        let mut list = ManagedArray::new(0);
        list.push('a');
        assert_eq!(list.push('b'), Some('a'));
        assert_eq!(list.capacity(), 1);
        assert_eq!(list.get(0), Some(&'b'));
    }

    #[test]
    fn modified_flag() {
        let mut list = ManagedArray::new(4);
        assert!(!list.is_modified());
        list.push(10);
        assert!(list.is_modified());
        list.mark_clean();
        assert!(!list.swap(0, 1));
        assert!(list.remove(7).is_none());
        assert!(!list.is_modified());
        list.push(20);
        list.mark_clean();
        assert!(list.swap(0, 1));
        assert!(list.is_modified());
        assert_eq!(list.get(0), Some(&20));
        list.clear();
        assert!(list.is_empty());
        assert!(!list.is_modified());
    }

    #[test]
    fn pop_and_remove() {
        let mut list = ManagedArray::new(4);
        for i in 0..4 {
            list.push(i);
        }
        assert_eq!(list.remove(1), Some(1));
        assert_eq!(list.pop_last(), Some(3));
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), [0, 2]);
    }
}
