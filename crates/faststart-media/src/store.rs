//! Growable in-memory byte store standing in for a file.
//!
//! [`ByteStore`] keeps the whole content of a file plus a sequential read
//! position. Reads are clamped to the bytes actually present; writes grow
//! the storage as needed. Growth goes through `try_reserve`, so running out
//! of memory surfaces as [`Error::AllocationFailure`].

use crate::buffer::CursorBuffer;
use crate::{Error, Result};
use bytes::Bytes;

/// Growable, randomly addressable byte sequence with a read cursor.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ByteStore {
    data: Vec<u8>,
    position: u64,
}

impl ByteStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding a copy of `data`.
    pub fn from_slice(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
            position: 0,
        }
    }

    /// Total size in bytes.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Move the read cursor. Positions past the end are allowed; reads
    /// from there return nothing.
    pub fn set_position(&mut self, position: u64) {
        self.position = position;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.data)
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Bytes available starting at `pos`.
    fn available_from(&self, pos: u64) -> usize {
        self.len().saturating_sub(pos) as usize
    }

    fn check_position(&self, pos: u64) -> Result<()> {
        if pos > self.len() {
            return Err(Error::BadPosition {
                position: pos,
                size: self.len(),
            });
        }
        Ok(())
    }

    /// Copy up to `dest.len()` bytes from the cursor into `dest`.
    ///
    /// Returns the number of bytes copied and advances the cursor by it.
    pub fn read(&mut self, dest: &mut [u8]) -> usize {
        let count = dest.len().min(self.available_from(self.position));
        if count > 0 {
            let start = self.position as usize;
            dest[..count].copy_from_slice(&self.data[start..start + count]);
        }
        self.position += count as u64;
        count
    }

    /// Copy up to `dest.len()` bytes starting at `pos`; the cursor ends up
    /// just past the copied range.
    pub fn read_at(&mut self, pos: u64, dest: &mut [u8]) -> Result<usize> {
        self.check_position(pos)?;
        self.position = pos;
        Ok(self.read(dest))
    }

    /// Fill `buf` from the cursor, up to its remaining space.
    pub fn read_buffer(&mut self, buf: &mut CursorBuffer) -> Result<usize> {
        let count = buf.remaining().min(self.available_from(self.position));
        if count > 0 {
            let start = self.position as usize;
            buf.put_slice(&self.data[start..start + count])?;
        }
        self.position += count as u64;
        Ok(count)
    }

    /// Fill `buf` starting at `pos`, up to its remaining space.
    pub fn read_buffer_at(&mut self, pos: u64, buf: &mut CursorBuffer) -> Result<usize> {
        self.check_position(pos)?;
        self.position = pos;
        self.read_buffer(buf)
    }

    /// Clear `buf`, fill it from the cursor and flip it for reading: its
    /// limit becomes the number of bytes read and its position 0.
    pub fn read_and_fill(&mut self, buf: &mut CursorBuffer) -> Result<usize> {
        buf.clear();
        let count = self.read_buffer(buf)?;
        buf.set_limit(buf.position())?;
        buf.rewind();
        Ok(count)
    }

    /// Like [`Self::read_and_fill`], reading from `pos`.
    pub fn read_and_fill_at(&mut self, pos: u64, buf: &mut CursorBuffer) -> Result<usize> {
        buf.clear();
        let count = self.read_buffer_at(pos, buf)?;
        buf.set_limit(buf.position())?;
        buf.rewind();
        Ok(count)
    }

    /// Grow the storage to `new_len` bytes, zero-filling the new tail.
    fn grow_to(&mut self, new_len: u64) -> Result<()> {
        let current = self.data.len();
        let target = usize::try_from(new_len)
            .map_err(|_| Error::AllocationFailure { requested: new_len })?;
        if target <= current {
            return Ok(());
        }
        self.data
            .try_reserve(target - current)
            .map_err(|_| Error::AllocationFailure { requested: new_len })?;
        self.data.resize(target, 0);
        Ok(())
    }

    /// Append `src` at the end of the store. The cursor does not move.
    pub fn write(&mut self, src: &[u8]) -> Result<usize> {
        self.data
            .try_reserve(src.len())
            .map_err(|_| Error::AllocationFailure {
                requested: self.len() + src.len() as u64,
            })?;
        self.data.extend_from_slice(src);
        Ok(src.len())
    }

    /// Overwrite at `pos`, growing the store if the write runs past the
    /// end. A gap between the old end and `pos` is zero-filled.
    pub fn write_at(&mut self, pos: u64, src: &[u8]) -> Result<usize> {
        let end = pos
            .checked_add(src.len() as u64)
            .ok_or(Error::AllocationFailure { requested: u64::MAX })?;
        self.grow_to(end)?;
        let start = pos as usize;
        self.data[start..start + src.len()].copy_from_slice(src);
        Ok(src.len())
    }

    /// Append the full capacity of `buf`, ignoring its cursor.
    pub fn write_buffer(&mut self, buf: &CursorBuffer) -> Result<usize> {
        self.write(buf.as_slice())
    }

    /// Write the full capacity of `buf` at `pos`.
    pub fn write_buffer_at(&mut self, pos: u64, buf: &CursorBuffer) -> Result<usize> {
        self.write_at(pos, buf.as_slice())
    }

    /// Append up to `count` bytes starting at `pos` to `target`.
    ///
    /// Returns the number of bytes actually transferred, which is less than
    /// `count` when this store runs out first.
    pub fn transfer_to(&mut self, pos: u64, count: u64, target: &mut ByteStore) -> Result<u64> {
        self.check_position(pos)?;
        let actual = (self.available_from(pos) as u64).min(count) as usize;
        let start = pos as usize;
        target.write(&self.data[start..start + actual])?;
        self.position = pos + actual as u64;
        Ok(actual as u64)
    }
}

impl Clone for ByteStore {
    /// Deep copy with the cursor reset to 0.
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            position: 0,
        }
    }
}

impl From<Vec<u8>> for ByteStore {
    fn from(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }
}

impl From<&[u8]> for ByteStore {
    fn from(data: &[u8]) -> Self {
        Self::from_slice(data)
    }
}

impl From<Bytes> for ByteStore {
    fn from(data: Bytes) -> Self {
        Self::from(Vec::from(data))
    }
}

impl AsRef<[u8]> for ByteStore {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
