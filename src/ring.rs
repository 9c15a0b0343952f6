use std::collections::VecDeque;
use std::fmt;

/// Fixed-capacity ring: pushing onto a full ring evicts the oldest entry.
pub struct Ring<T> {
    deque: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> Clone for Ring<T> {
    fn clone(&self) -> Self {
        Self {
            deque: self.deque.clone(),
            capacity: self.capacity,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Ring<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.deque.fmt(f)
    }
}

impl<T> Ring<T> {
    #[inline]
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            deque: VecDeque::with_capacity(cap),
            capacity: cap,
        }
    }

    /// Push the newest entry, returning the evicted oldest one when full.
    #[inline]
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.deque.len() == self.capacity {
            self.deque.pop_back()
        } else {
            None
        };

        self.deque.push_front(item);

        evicted
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.deque.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.deque.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.deque.clear()
    }

    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.deque.front()
    }

    /// Newest first.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &'_ T> {
        self.deque.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_when_full() {
        let mut ring = Ring::with_capacity(3);
        assert_eq!(ring.push(1), None);
        assert_eq!(ring.push(2), None);
        assert_eq!(ring.push(3), None);
        assert_eq!(ring.push(4), Some(1));
        assert_eq!(ring.len(), 3);

        let items: Vec<_> = ring.iter().copied().collect();
        assert_eq!(items, vec![4, 3, 2]);
    }

    #[test]
    fn front_is_newest() {
        let mut ring = Ring::with_capacity(2);
        ring.push("a");
        ring.push("b");
        assert_eq!(ring.front(), Some(&"b"));
    }
}
