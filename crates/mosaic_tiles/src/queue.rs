//! Fixed-capacity work queue.

/// Bounded ring-buffer queue owned by a single thread.
///
/// `try_push` hands the value back instead of growing when the queue is
/// full; the caller decides what overflow means. Capacity is exact, not
/// rounded, because admission control depends on it.
pub struct BoundedQueue<T> {
    buffer: Box<[Option<T>]>,
    head: usize,
    tail: usize,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a new bounded queue with the given capacity.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be at least 1");
        let buffer: Vec<_> = (0..capacity).map(|_| None).collect();
        Self {
            buffer: buffer.into_boxed_slice(),
            head: 0,
            tail: 0,
            capacity,
        }
    }

    /// Try to push a value. Returns it back if the queue is full.
    pub fn try_push(&mut self, value: T) -> Result<(), T> {
        if self.is_full() {
            return Err(value);
        }
        let index = self.tail % self.capacity;
        self.buffer[index] = Some(value);
        self.tail = self.tail.wrapping_add(1);
        Ok(())
    }

    /// Peek at the oldest value.
    pub fn front(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.buffer[self.head % self.capacity].as_ref()
    }

    /// Pop the oldest value.
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let index = self.head % self.capacity;
        let value = self.buffer[index].take();
        self.head = self.head.wrapping_add(1);
        value
    }

    pub fn len(&self) -> usize {
        self.tail.wrapping_sub(self.head)
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
