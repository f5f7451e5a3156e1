//! Append-only persistent list shared between builder generations.

use std::sync::Arc;

/// Singly linked list that grows at the end and never mutates existing links.
///
/// `push` returns a new chain sharing every earlier link with `self`, so two
/// builders branched from a common base share that base's entries.
pub(crate) struct Chain<T> {
    last: Option<Arc<Link<T>>>,
    len: usize,
}

struct Link<T> {
    value: T,
    prev: Option<Arc<Link<T>>>,
}

impl<T> Chain<T> {
    pub(crate) fn new() -> Self {
        Self { last: None, len: 0 }
    }

    pub(crate) fn push(&self, value: T) -> Self {
        Self {
            last: Some(Arc::new(Link {
                value,
                prev: self.last.clone(),
            })),
            len: self.len + 1,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Entries in insertion order.
    pub(crate) fn ordered(&self) -> Vec<&T> {
        let mut items = Vec::with_capacity(self.len);
        let mut cursor = self.last.as_deref();
        while let Some(link) = cursor {
            items.push(&link.value);
            cursor = link.prev.as_deref();
        }
        items.reverse();
        items
    }
}

impl<T> Default for Chain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Chain<T> {
    fn clone(&self) -> Self {
        Self {
            last: self.last.clone(),
            len: self.len,
        }
    }
}

impl<T> Drop for Chain<T> {
    // Unlink iteratively; the default drop recurses once per link.
    fn drop(&mut self) {
        let mut cursor = self.last.take();
        while let Some(link) = cursor {
            match Arc::try_unwrap(link) {
                Ok(mut link) => cursor = link.prev.take(),
                Err(_) => break,
            }
        }
    }
}
