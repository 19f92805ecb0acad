//! Bounded, append-only capture storage.
//!
//! [`CaptureBuffer`] is pre-allocated to its capacity and never grows, evicts
//! or overwrites: once full, the oldest data stays and every further append is
//! rejected with the item handed back.

use alloc::vec::Vec;
use core::fmt;

/// Rejected append: the buffer was full. Carries the rejected item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferFull<T>(pub T);

impl<T> BufferFull<T> {
    /// Recover the rejected item.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for BufferFull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("capture buffer full")
    }
}

/// Fixed-capacity, non-circular store of committed entries.
#[derive(Debug, Clone)]
pub struct CaptureBuffer<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> CaptureBuffer<T> {
    /// Create a buffer holding at most `capacity` entries.
    ///
    /// The storage is allocated up front.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry.
    ///
    /// Fails with [`BufferFull`] once `capacity` entries are stored; earlier
    /// entries are left untouched.
    pub fn try_append(&mut self, item: T) -> Result<(), BufferFull<T>> {
        if self.is_full() {
            return Err(BufferFull(item));
        }
        self.items.push(item);
        Ok(())
    }

    /// Remove every entry. Capacity is unchanged.
    pub fn reset(&mut self) {
        self.items.clear();
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of further entries that fit.
    pub fn remaining(&self) -> usize {
        self.capacity - self.items.len()
    }

    /// Check if the buffer has reached capacity.
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Entries in commit order.
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Entries in commit order, as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<'a, T> IntoIterator for &'a CaptureBuffer<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
