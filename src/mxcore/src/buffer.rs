//! Reference-counted, copy-on-write byte buffer.
//!
//! Mirrors the GWBUF growth algorithm from MaxScale's `buffer.cc`: a buffer
//! that is uniquely owned and has room at the tail is grown in place; a
//! uniquely owned buffer without tail room but with reclaimable room at the
//! front is compacted; anything else reallocates at `max(new_len, 2 *
//! old_capacity)`. A buffer with more than one live handle on its backing
//! storage (a `shallow_clone`) is never grown in place — a write always
//! forks a private copy first so sibling handles never observe it.

use std::sync::Arc;

/// A byte range view over a shared, reference-counted backing store.
#[derive(Clone)]
pub struct Buffer {
    inner: Arc<Vec<u8>>,
    start: usize,
    end: usize,
}

impl Buffer {
    pub fn new() -> Self {
        Buffer {
            inner: Arc::new(Vec::new()),
            start: 0,
            end: 0,
        }
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let data = bytes.into();
        let end = data.len();
        Buffer {
            inner: Arc::new(data),
            start: 0,
            end,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.inner[self.start..self.end]
    }

    /// Number of live handles sharing this buffer's backing storage,
    /// including this one.
    pub fn share_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// A cheap, reference-counted alias of this buffer. Mutating either
    /// handle forks a private copy first, so the other handle's view is
    /// never affected.
    pub fn shallow_clone(&self) -> Buffer {
        self.clone()
    }

    /// Split this buffer at `at` (relative to its own start), returning a
    /// new `Buffer` covering `[at, len)` while `self` is left covering
    /// `[0, at)`. Both views share the same backing storage.
    pub fn split_off(&mut self, at: usize) -> Buffer {
        assert!(at <= self.len(), "split_off index out of bounds");
        let mid = self.start + at;
        let tail = Buffer {
            inner: Arc::clone(&self.inner),
            start: mid,
            end: self.end,
        };
        self.end = mid;
        tail
    }

    /// Concatenate `other` onto the end of `self`. Because the two buffers
    /// are not guaranteed to be adjacent in a shared backing store, this
    /// always produces a buffer over freshly allocated storage.
    pub fn concat(mut self, other: &Buffer) -> Buffer {
        self.reserve_tail(other.len());
        let inner = Arc::get_mut(&mut self.inner).expect("reserve_tail guarantees unique storage");
        inner.truncate(self.end);
        inner.extend_from_slice(other.as_slice());
        self.end += other.len();
        self
    }

    /// Append raw bytes, applying the COW growth algorithm.
    pub fn append(&mut self, bytes: &[u8]) {
        self.reserve_tail(bytes.len());
        let inner =
            Arc::get_mut(&mut self.inner).expect("reserve_tail guarantees unique storage");
        inner.truncate(self.end);
        inner.extend_from_slice(bytes);
        self.end += bytes.len();
    }

    /// Ensure the backing storage is uniquely owned and has room for
    /// `extra` more bytes past `self.end`, growing or reallocating per the
    /// GWBUF algorithm.
    fn reserve_tail(&mut self, extra: usize) {
        let want = self.end + extra;
        let unique = Arc::strong_count(&self.inner) == 1;

        if unique {
            let cap = self.inner.capacity();
            if cap >= want {
                // Room already available at the tail: nothing to do.
                return;
            }
            if self.start > 0 && cap - self.len() >= extra {
                // Room can be reclaimed by compacting the unused head.
                let inner = Arc::get_mut(&mut self.inner).unwrap();
                inner.drain(0..self.start);
                self.end -= self.start;
                self.start = 0;
                if inner.capacity() >= self.end + extra {
                    return;
                }
            }
            let inner = Arc::get_mut(&mut self.inner).unwrap();
            let new_cap = std::cmp::max(want, inner.capacity() * 2);
            inner.reserve(new_cap.saturating_sub(inner.len()));
            return;
        }

        // Shared storage: always fork into a private copy.
        let new_cap = std::cmp::max(want, self.len() * 2);
        let mut fresh = Vec::with_capacity(new_cap);
        fresh.extend_from_slice(self.as_slice());
        self.inner = Arc::new(fresh);
        self.end -= self.start;
        self.start = 0;
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Buffer::new()
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(v: Vec<u8>) -> Self {
        Buffer::from_bytes(v)
    }
}

impl std::ops::Deref for Buffer {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_then_concat_round_trips() {
        let mut buf = Buffer::from_bytes(b"hello world".to_vec());
        let tail = buf.split_off(5);
        assert_eq!(buf.as_slice(), b"hello");
        assert_eq!(tail.as_slice(), b" world");
        let joined = buf.concat(&tail);
        assert_eq!(joined.as_slice(), b"hello world");
    }

    #[test]
    fn shallow_clone_is_isolated_from_mutation() {
        let mut buf = Buffer::from_bytes(b"abc".to_vec());
        let clone = buf.shallow_clone();
        assert_eq!(clone.share_count(), 2);
        buf.append(b"def");
        assert_eq!(buf.as_slice(), b"abcdef");
        assert_eq!(clone.as_slice(), b"abc");
    }

    #[test]
    fn unique_buffer_with_tail_room_grows_in_place() {
        let mut buf = Buffer::new();
        buf.append(b"0123456789");
        let ptr_before = buf.inner.as_ptr();
        buf.append(b"x");
        let ptr_after = buf.inner.as_ptr();
        assert_eq!(ptr_before, ptr_after);
    }
}
