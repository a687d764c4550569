//! Fixed-capacity cursor buffer.
//!
//! A [`CursorBuffer`] owns `capacity` bytes and tracks a `position` and a
//! `limit` over them, always keeping `position <= limit <= capacity`.
//! Integer accessors decode and encode using the buffer's [`ByteOrder`].
//!
//! Sequential accessors read or write at `position` and advance it;
//! the `_at` variants take an explicit offset and leave `position` alone.
//! Every accessor checks its width against the readable extent and
//! returns an error rather than touching bytes past `limit`.

use crate::{Error, Result};

/// Byte order used to encode multi-byte integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Most significant byte first (network order, used by MP4).
    #[default]
    BigEndian,
    /// Least significant byte first.
    LittleEndian,
}

mod sealed {
    pub trait Sealed {}
}

/// An unsigned integer that can be stored in a [`CursorBuffer`].
pub trait Word: sealed::Sealed + Copy {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Decode from the first `WIDTH` bytes of `bytes`.
    fn decode(bytes: &[u8], order: ByteOrder) -> Self;

    /// Encode into the first `WIDTH` bytes of `out`.
    fn encode(self, order: ByteOrder, out: &mut [u8]);
}

macro_rules! impl_word {
    ($($ty:ty),*) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Word for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                fn decode(bytes: &[u8], order: ByteOrder) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&bytes[..Self::WIDTH]);
                    match order {
                        ByteOrder::BigEndian => <$ty>::from_be_bytes(raw),
                        ByteOrder::LittleEndian => <$ty>::from_le_bytes(raw),
                    }
                }

                fn encode(self, order: ByteOrder, out: &mut [u8]) {
                    let raw = match order {
                        ByteOrder::BigEndian => self.to_be_bytes(),
                        ByteOrder::LittleEndian => self.to_le_bytes(),
                    };
                    out[..Self::WIDTH].copy_from_slice(&raw);
                }
            }
        )*
    };
}

impl_word!(u8, u16, u32, u64);

/// Fixed-capacity byte region with a position/limit cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CursorBuffer {
    data: Box<[u8]>,
    position: usize,
    limit: usize,
    order: ByteOrder,
}

impl CursorBuffer {
    /// Create a zeroed buffer of `capacity` bytes.
    ///
    /// Aborts on allocation failure like any `Vec`; use [`Self::try_new`]
    /// when the capacity comes from untrusted input.
    pub fn new(capacity: usize, order: ByteOrder) -> Self {
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            position: 0,
            limit: capacity,
            order,
        }
    }

    /// Create a zeroed buffer, reporting allocation failure as an error.
    pub fn try_new(capacity: usize, order: ByteOrder) -> Result<Self> {
        let mut data = Vec::<u8>::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| Error::AllocationFailure {
                requested: capacity as u64,
            })?;
        data.resize(capacity, 0);
        Ok(Self {
            data: data.into_boxed_slice(),
            position: 0,
            limit: capacity,
            order,
        })
    }

    /// Create a zero-capacity buffer.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap existing bytes; capacity and limit equal their length.
    pub fn from_vec(data: Vec<u8>, order: ByteOrder) -> Self {
        let limit = data.len();
        Self {
            data: data.into_boxed_slice(),
            position: 0,
            limit,
            order,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Bytes between `position` and `limit`.
    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    pub fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }

    /// Full backing storage, independent of position and limit.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Unread bytes in `[position, limit)`.
    pub fn chunk(&self) -> &[u8] {
        &self.data[self.position..self.limit]
    }

    /// Reset `position` to 0 and `limit` to capacity. Bytes are kept.
    pub fn clear(&mut self) {
        self.position = 0;
        self.limit = self.capacity();
    }

    /// Reset `position` to 0.
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Set the readable/writable extent. A position past the new limit is
    /// pulled back to it.
    pub fn set_limit(&mut self, limit: usize) -> Result<()> {
        if limit > self.capacity() {
            return Err(Error::BadLimit {
                limit: limit as u64,
                capacity: self.capacity() as u64,
            });
        }
        self.limit = limit;
        self.position = self.position.min(limit);
        Ok(())
    }

    pub fn set_position(&mut self, position: usize) -> Result<()> {
        if position > self.limit {
            return Err(Error::BadPosition {
                position: position as u64,
                size: self.limit as u64,
            });
        }
        self.position = position;
        Ok(())
    }

    /// Read a `T` at `position` and advance past it.
    pub fn get<T: Word>(&mut self) -> Result<T> {
        let value = self.get_at(self.position)?;
        self.position += T::WIDTH;
        Ok(value)
    }

    /// Read a `T` at `pos` without moving the cursor.
    pub fn get_at<T: Word>(&self, pos: usize) -> Result<T> {
        let have = self.limit.saturating_sub(pos);
        if T::WIDTH > have {
            return Err(Error::BufferUnderflow {
                need: T::WIDTH as u64,
                have: have as u64,
            });
        }
        Ok(T::decode(&self.data[pos..], self.order))
    }

    /// Write a `T` at `position` and advance past it.
    pub fn put<T: Word>(&mut self, value: T) -> Result<()> {
        self.put_at(self.position, value)?;
        self.position += T::WIDTH;
        Ok(())
    }

    /// Write a `T` at `pos` without moving the cursor.
    pub fn put_at<T: Word>(&mut self, pos: usize, value: T) -> Result<()> {
        let have = self.limit.saturating_sub(pos);
        if T::WIDTH > have {
            return Err(Error::BufferOverflow {
                need: T::WIDTH as u64,
                have: have as u64,
            });
        }
        value.encode(self.order, &mut self.data[pos..]);
        Ok(())
    }

    pub fn get_u8(&mut self) -> Result<u8> {
        self.get()
    }

    pub fn get_u16(&mut self) -> Result<u16> {
        self.get()
    }

    pub fn get_u32(&mut self) -> Result<u32> {
        self.get()
    }

    pub fn get_u64(&mut self) -> Result<u64> {
        self.get()
    }

    pub fn get_u8_at(&self, pos: usize) -> Result<u8> {
        self.get_at(pos)
    }

    pub fn get_u16_at(&self, pos: usize) -> Result<u16> {
        self.get_at(pos)
    }

    pub fn get_u32_at(&self, pos: usize) -> Result<u32> {
        self.get_at(pos)
    }

    pub fn get_u64_at(&self, pos: usize) -> Result<u64> {
        self.get_at(pos)
    }

    pub fn put_u8(&mut self, value: u8) -> Result<()> {
        self.put(value)
    }

    pub fn put_u16(&mut self, value: u16) -> Result<()> {
        self.put(value)
    }

    pub fn put_u32(&mut self, value: u32) -> Result<()> {
        self.put(value)
    }

    pub fn put_u64(&mut self, value: u64) -> Result<()> {
        self.put(value)
    }

    /// Copy `src` in at `position` and advance past it.
    pub fn put_slice(&mut self, src: &[u8]) -> Result<()> {
        self.put_slice_from(0, src)
    }

    /// Copy `src[offset..]` in at `position` and advance past the copied
    /// bytes. Room for all of `src` is required.
    pub fn put_slice_from(&mut self, offset: usize, src: &[u8]) -> Result<()> {
        if self.remaining() < src.len() {
            return Err(Error::BufferUnderflow {
                need: src.len() as u64,
                have: self.remaining() as u64,
            });
        }
        if offset > src.len() {
            return Err(Error::IndexOutOfBounds {
                index: offset as u64,
                length: src.len() as u64,
            });
        }
        let tail = &src[offset..];
        self.data[self.position..self.position + tail.len()].copy_from_slice(tail);
        self.position += tail.len();
        Ok(())
    }

    /// Move the unread remainder of `src` into this buffer, advancing both
    /// cursors.
    pub fn put_buffer(&mut self, src: &mut CursorBuffer) -> Result<()> {
        if src.remaining() > self.remaining() {
            return Err(Error::BufferOverflow {
                need: src.remaining() as u64,
                have: self.remaining() as u64,
            });
        }
        let count = src.remaining();
        self.data[self.position..self.position + count].copy_from_slice(src.chunk());
        self.position += count;
        src.position = src.limit;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_new_buffer_state() {
        let buf = CursorBuffer::new(16, ByteOrder::BigEndian);
        assert_eq!(buf.capacity(), 16);
        assert_eq!(buf.limit(), 16);
        assert_eq!(buf.position(), 0);
        assert_eq!(buf.remaining(), 16);
        assert!(buf.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_empty_buffer() {
        let mut buf = CursorBuffer::empty();
        assert_eq!(buf.capacity(), 0);
        assert!(!buf.has_remaining());
        assert_matches!(
            buf.get_u8(),
            Err(Error::BufferUnderflow { need: 1, have: 0 })
        );
    }

    #[test]
    fn test_big_endian_get() {
        let mut buf =
            CursorBuffer::from_vec(vec![0x00, 0x00, 0x01, 0x02, 0xAA, 0xBB], ByteOrder::BigEndian);
        assert_eq!(buf.get_u32().unwrap(), 0x0102);
        assert_eq!(buf.get_u16().unwrap(), 0xAABB);
        assert_eq!(buf.position(), 6);
    }

    #[test]
    fn test_little_endian_get() {
        let mut buf =
            CursorBuffer::from_vec(vec![0x02, 0x01, 0x00, 0x00], ByteOrder::LittleEndian);
        assert_eq!(buf.get_u32().unwrap(), 0x0102);
    }

    #[test]
    fn test_put_uses_configured_order() {
        let mut be = CursorBuffer::new(8, ByteOrder::BigEndian);
        be.put_u64(0x0102_0304_0506_0708).unwrap();
        assert_eq!(be.as_slice(), &[1, 2, 3, 4, 5, 6, 7, 8]);

        let mut le = CursorBuffer::new(8, ByteOrder::LittleEndian);
        le.put_u64(0x0102_0304_0506_0708).unwrap();
        assert_eq!(le.as_slice(), &[8, 7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_get_at_does_not_move_cursor() {
        let buf = CursorBuffer::from_vec(vec![0, 0, 0, 7, 0, 0, 0, 9], ByteOrder::BigEndian);
        assert_eq!(buf.get_u32_at(4).unwrap(), 9);
        assert_eq!(buf.get_u32_at(0).unwrap(), 7);
        assert_eq!(buf.position(), 0);
    }

    #[test]
    fn test_get_underflow_respects_limit() {
        let mut buf = CursorBuffer::new(8, ByteOrder::BigEndian);
        buf.set_limit(6).unwrap();
        buf.set_position(4).unwrap();
        assert_matches!(
            buf.get_u32(),
            Err(Error::BufferUnderflow { need: 4, have: 2 })
        );
        // Failed reads leave the cursor where it was
        assert_eq!(buf.position(), 4);
        assert_matches!(
            buf.get_u64_at(7),
            Err(Error::BufferUnderflow { need: 8, have: 0 })
        );
    }

    #[test]
    fn test_put_overflow() {
        let mut buf = CursorBuffer::new(6, ByteOrder::BigEndian);
        buf.put_u32(1).unwrap();
        assert_matches!(
            buf.put_u32(2),
            Err(Error::BufferOverflow { need: 4, have: 2 })
        );
        buf.put_u16(3).unwrap();
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn test_put_at_patches_in_place() {
        let mut buf = CursorBuffer::from_vec(vec![0; 8], ByteOrder::BigEndian);
        buf.set_position(2).unwrap();
        buf.put_at(4, 0xDEADBEEFu32).unwrap();
        assert_eq!(buf.position(), 2);
        assert_eq!(buf.get_u32_at(4).unwrap(), 0xDEADBEEF);
    }

    #[test]
    fn test_clear_and_rewind() {
        let mut buf = CursorBuffer::from_vec(vec![1, 2, 3, 4], ByteOrder::BigEndian);
        buf.set_limit(3).unwrap();
        buf.get_u16().unwrap();

        buf.rewind();
        assert_eq!(buf.position(), 0);
        assert_eq!(buf.limit(), 3);

        buf.get_u8().unwrap();
        buf.clear();
        assert_eq!(buf.position(), 0);
        assert_eq!(buf.limit(), 4);
        assert_eq!(buf.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_bad_limit_and_position() {
        let mut buf = CursorBuffer::new(4, ByteOrder::BigEndian);
        assert_matches!(
            buf.set_limit(5),
            Err(Error::BadLimit {
                limit: 5,
                capacity: 4
            })
        );
        buf.set_limit(2).unwrap();
        assert_matches!(
            buf.set_position(3),
            Err(Error::BadPosition {
                position: 3,
                size: 2
            })
        );
    }

    #[test]
    fn test_set_limit_pulls_position_back() {
        let mut buf = CursorBuffer::new(8, ByteOrder::BigEndian);
        buf.set_position(6).unwrap();
        buf.set_limit(4).unwrap();
        assert_eq!(buf.position(), 4);
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn test_put_slice() {
        let mut buf = CursorBuffer::new(4, ByteOrder::BigEndian);
        buf.put_slice(b"ab").unwrap();
        buf.put_slice(b"cd").unwrap();
        assert_eq!(buf.as_slice(), b"abcd");
        assert_matches!(
            buf.put_slice(b"e"),
            Err(Error::BufferUnderflow { need: 1, have: 0 })
        );
    }

    #[test]
    fn test_put_slice_from_offset() {
        let mut buf = CursorBuffer::new(4, ByteOrder::BigEndian);
        buf.put_slice_from(2, b"xyab").unwrap();
        assert_eq!(buf.position(), 2);
        assert_eq!(&buf.as_slice()[..2], b"ab");

        let mut buf = CursorBuffer::new(8, ByteOrder::BigEndian);
        assert_matches!(
            buf.put_slice_from(5, b"abc"),
            Err(Error::IndexOutOfBounds {
                index: 5,
                length: 3
            })
        );
    }

    #[test]
    fn test_put_buffer_advances_both() {
        let mut src = CursorBuffer::from_vec(b"moovdata".to_vec(), ByteOrder::BigEndian);
        src.set_position(4).unwrap();

        let mut dst = CursorBuffer::new(6, ByteOrder::BigEndian);
        dst.put_u16(0xFFFF).unwrap();
        dst.put_buffer(&mut src).unwrap();

        assert_eq!(src.remaining(), 0);
        assert_eq!(dst.position(), 6);
        assert_eq!(&dst.as_slice()[2..], b"data");
    }

    #[test]
    fn test_put_buffer_overflow() {
        let mut src = CursorBuffer::from_vec(vec![0; 8], ByteOrder::BigEndian);
        let mut dst = CursorBuffer::new(4, ByteOrder::BigEndian);
        assert_matches!(
            dst.put_buffer(&mut src),
            Err(Error::BufferOverflow { need: 8, have: 4 })
        );
        assert_eq!(src.position(), 0);
    }

    #[test]
    fn test_try_new() {
        let buf = CursorBuffer::try_new(32, ByteOrder::LittleEndian).unwrap();
        assert_eq!(buf.capacity(), 32);
        assert_eq!(buf.order(), ByteOrder::LittleEndian);
    }
}
