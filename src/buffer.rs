//! Packet buffer with headroom and tailroom
//!
//! Wraps caller-owned storage. The logical packet lives in `[head, tail)`;
//! bytes before `head` are headroom and bytes after `tail` are tailroom.
//! Builders grow the packet with [`PacketBuffer::reserve_back`] (or
//! [`PacketBuffer::reserve_front`] for outer headers), parsers shrink it with
//! [`PacketBuffer::consume_front`].

use crate::{Error, Result};

/// Saved cursor positions, restored with [`PacketBuffer::reset`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    head: usize,
    tail: usize,
}

/// Bounds-checked cursors over a fixed-capacity byte region
#[derive(Debug)]
pub struct PacketBuffer<'a> {
    storage: &'a mut [u8],
    head: usize,
    tail: usize,
}

impl<'a> PacketBuffer<'a> {
    /// Create an empty packet with `headroom` bytes kept free in front
    pub fn new(storage: &'a mut [u8], headroom: usize) -> Result<Self> {
        if headroom > storage.len() {
            return Err(Error::BufferOverflow {
                needed: headroom,
                available: storage.len(),
            });
        }

        Ok(Self {
            storage,
            head: headroom,
            tail: headroom,
        })
    }

    /// Wrap storage that is entirely filled by one received packet
    pub fn from_packet(storage: &'a mut [u8]) -> Self {
        let tail = storage.len();
        Self {
            storage,
            head: 0,
            tail,
        }
    }

    /// Total size of the underlying storage
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Logical packet length
    pub fn len(&self) -> usize {
        self.tail - self.head
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Bytes still available in front of the packet
    pub fn headroom(&self) -> usize {
        self.head
    }

    /// Bytes still available behind the packet
    pub fn tailroom(&self) -> usize {
        self.storage.len() - self.tail
    }

    /// Current packet bytes
    pub fn data(&self) -> &[u8] {
        &self.storage[self.head..self.tail]
    }

    /// Current packet bytes (mutable)
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.storage[self.head..self.tail]
    }

    /// Grow the packet by `n` zeroed bytes in front of the current head
    pub fn reserve_front(&mut self, n: usize) -> Result<&mut [u8]> {
        if n > self.headroom() {
            return Err(Error::BufferOverflow {
                needed: n,
                available: self.headroom(),
            });
        }

        self.head -= n;
        let region = &mut self.storage[self.head..self.head + n];
        region.fill(0);
        Ok(region)
    }

    /// Grow the packet by `n` zeroed bytes at the tail
    pub fn reserve_back(&mut self, n: usize) -> Result<&mut [u8]> {
        if n > self.tailroom() {
            return Err(Error::BufferOverflow {
                needed: n,
                available: self.tailroom(),
            });
        }

        let start = self.tail;
        self.tail += n;
        let region = &mut self.storage[start..self.tail];
        region.fill(0);
        Ok(region)
    }

    /// Remove `n` bytes from the front of the packet and return them
    pub fn consume_front(&mut self, n: usize) -> Result<&[u8]> {
        if n > self.len() {
            return Err(Error::Underflow {
                needed: n,
                available: self.len(),
            });
        }

        let start = self.head;
        self.head += n;
        Ok(&self.storage[start..self.head])
    }

    /// Snapshot of both cursors
    pub fn mark(&self) -> Mark {
        Mark {
            head: self.head,
            tail: self.tail,
        }
    }

    /// Restore cursors saved by [`PacketBuffer::mark`] on this buffer
    pub fn reset(&mut self, mark: Mark) {
        debug_assert!(mark.head <= mark.tail && mark.tail <= self.storage.len());
        self.head = mark.head;
        self.tail = mark.tail;
    }

    /// Bytes appended at the tail since `mark` was taken
    pub fn appended_mut(&mut self, mark: Mark) -> &mut [u8] {
        let start = mark.tail.min(self.tail);
        &mut self.storage[start..self.tail]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_with_headroom() {
        let mut storage = [0u8; 64];
        let buf = PacketBuffer::new(&mut storage, 40).unwrap();

        assert_eq!(buf.capacity(), 64);
        assert_eq!(buf.headroom(), 40);
        assert_eq!(buf.tailroom(), 24);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_new_headroom_too_large() {
        let mut storage = [0u8; 8];
        assert!(matches!(
            PacketBuffer::new(&mut storage, 9),
            Err(Error::BufferOverflow {
                needed: 9,
                available: 8
            })
        ));
    }

    #[test]
    fn test_reserve_back_zeroes_and_grows() {
        let mut storage = [0xAAu8; 16];
        let mut buf = PacketBuffer::new(&mut storage, 4).unwrap();

        let region = buf.reserve_back(4).unwrap();
        assert_eq!(region, &[0, 0, 0, 0]);
        region[0] = 1;

        assert_eq!(buf.len(), 4);
        assert_eq!(buf.data(), &[1, 0, 0, 0]);
        assert_eq!(buf.tailroom(), 8);
    }

    #[test]
    fn test_reserve_back_overflow_leaves_cursors() {
        let mut storage = [0u8; 16];
        let mut buf = PacketBuffer::new(&mut storage, 8).unwrap();
        buf.reserve_back(4).unwrap();

        let before = buf.mark();
        assert!(matches!(
            buf.reserve_back(5),
            Err(Error::BufferOverflow {
                needed: 5,
                available: 4
            })
        ));
        assert_eq!(buf.mark(), before);
    }

    #[test]
    fn test_reserve_front() {
        let mut storage = [0u8; 16];
        let mut buf = PacketBuffer::new(&mut storage, 8).unwrap();
        buf.reserve_back(2).unwrap().copy_from_slice(&[3, 4]);
        buf.reserve_front(2).unwrap().copy_from_slice(&[1, 2]);

        assert_eq!(buf.data(), &[1, 2, 3, 4]);
        assert_eq!(buf.headroom(), 6);
        assert!(buf.reserve_front(7).is_err());
    }

    #[test]
    fn test_consume_front() {
        let mut storage = [1u8, 2, 3, 4, 5];
        let mut buf = PacketBuffer::from_packet(&mut storage);

        assert_eq!(buf.consume_front(2).unwrap(), &[1, 2]);
        assert_eq!(buf.data(), &[3, 4, 5]);
        assert!(matches!(
            buf.consume_front(4),
            Err(Error::Underflow {
                needed: 4,
                available: 3
            })
        ));
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_mark_reset_and_appended() {
        let mut storage = [0u8; 32];
        let mut buf = PacketBuffer::new(&mut storage, 0).unwrap();
        buf.reserve_back(4).unwrap();

        let mark = buf.mark();
        buf.reserve_back(6).unwrap().fill(7);
        assert_eq!(buf.appended_mut(mark), &[7; 6]);

        buf.reset(mark);
        assert_eq!(buf.len(), 4);
        assert!(buf.appended_mut(mark).is_empty());
    }
}
