//! # Batch Buffer
//!
//! Accumulates items until a fixed capacity is reached and hands back the
//! full batch so the caller can flush it.
//!
//! ```text
//!  push ──► [r1 r2 … r49]          → None
//!  push ──► [r1 r2 … r49 r50]      → Some(batch of 50), buffer empty
//!  take ──► [r1 … r37]             → Some(batch of 37)  (chunk boundary)
//!  take ──► []                     → None
//! ```

use crate::error::CoreError;

/// Fixed-capacity batch accumulator.
#[derive(Debug, Clone)]
pub struct BatchBuffer<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> BatchBuffer<T> {
    /// Creates an empty buffer that fills at `capacity` items.
    pub fn new(capacity: usize) -> Result<Self, CoreError> {
        if capacity == 0 {
            return Err(CoreError::InvalidBatchSize);
        }
        Ok(BatchBuffer {
            items: Vec::with_capacity(capacity),
            capacity,
        })
    }

    /// Appends an item. Returns the full batch once capacity is reached.
    pub fn push(&mut self, item: T) -> Option<Vec<T>> {
        self.items.push(item);
        if self.items.len() >= self.capacity {
            return Some(self.drain());
        }
        None
    }

    /// Takes whatever is buffered, if anything.
    pub fn take(&mut self) -> Option<Vec<T>> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.drain())
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn drain(&mut self) -> Vec<T> {
        std::mem::replace(&mut self.items, Vec::with_capacity(self.capacity))
    }
}
