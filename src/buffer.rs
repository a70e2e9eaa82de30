//! Growable byte buffer, the sole allocation unit behind every Set section.
//!
//! `Vec<u8>` already gives us doubling-capacity growth; `ByteBuffer` exists
//! to make the "addressed by offset, not by pointer" contract explicit (see
//! design note on stable pointers into growable buffers) and to give the
//! string pool, the three record sections and the three reference pools a
//! single, uniform backing type whether they are being built up in memory or
//! about to be handed to the mmap reader as a plain byte slice.

use std::convert::TryInto;

/// A contiguous, append-only region of bytes. `push_*` never returns a
/// pointer or a slice — only the offset at which the pushed bytes start, so
/// callers cannot hold a derived reference across a later push that might
/// reallocate the backing storage.
#[derive(Clone, Debug, Default)]
pub struct ByteBuffer {
    data: Vec<u8>,
}

impl ByteBuffer {
    pub fn new() -> Self {
        ByteBuffer {
            data: Vec::with_capacity(16),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ByteBuffer {
            data: Vec::with_capacity(capacity.max(16)),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append `bytes`, returning the offset at which they start.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> usize {
        let offset = self.data.len();
        self.data.extend_from_slice(bytes);
        offset
    }

    /// Append a little-endian `u32`, returning the offset at which it starts.
    pub fn push_u32(&mut self, value: u32) -> usize {
        self.push_bytes(&value.to_le_bytes())
    }

    pub fn get_u32(&self, offset: usize) -> u32 {
        let bytes: [u8; 4] = self.data[offset..offset + 4].try_into().unwrap();
        u32::from_le_bytes(bytes)
    }

    pub fn set_u32(&mut self, offset: usize, value: u32) {
        self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Grow the buffer with zero bytes until its length is a multiple of
    /// `align`.
    pub fn pad_to(&mut self, align: usize) {
        let rem = self.data.len() % align;
        if rem != 0 {
            self.data.resize(self.data.len() + (align - rem), 0);
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(data: Vec<u8>) -> Self {
        ByteBuffer { data }
    }
}

/// Round `n` up to the next multiple of `align` (`align` a power of two).
pub fn align_up(n: u64, align: u64) -> u64 {
    (n + align - 1) & !(align - 1)
}

#[cfg(test)]
#[path = "buffer_test.rs"]
mod buffer_test;
