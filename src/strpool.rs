//! String pool and string-interning hash table.
//!
//! The pool is an append-only byte region of NUL-terminated strings,
//! addressed by the offset of their first byte. The table is keyed by those
//! offsets rather than by pointer, so both can be persisted as-is and
//! re-opened from an mmap: a bucket holds a pool offset, and key comparison
//! re-reads the pool through whatever reference the caller passes in for
//! that call, never a pointer squirreled away at insert time (design note on
//! the cyclic pool/table reference).

use crate::buffer::ByteBuffer;
use crate::err_at;
use crate::error::Result;
use crate::refword::MAX_PAYLOAD;

/// Append-only, NUL-terminated string storage. Offset 0 is reserved for
/// "absent string"; the empty string is interned eagerly so it never
/// collides with that sentinel.
#[derive(Clone, Debug)]
pub struct StringPool {
    buf: ByteBuffer,
}

impl StringPool {
    pub fn new() -> Self {
        let mut buf = ByteBuffer::new();
        buf.push_bytes(&[0]); // offset 0: reserved, absent-string sentinel
        StringPool { buf }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        StringPool {
            buf: ByteBuffer::from(bytes),
        }
    }

    /// Append `s` unconditionally, returning its starting offset. Callers
    /// that want de-duplication go through [`InternTable::tokenize`].
    pub fn append(&mut self, s: &str) -> Result<u32> {
        let offset = self.buf.len();
        if offset as u64 > MAX_PAYLOAD as u64 {
            return err_at!(CapacityExceeded, msg: "string pool offset {} exceeds 24-bit limit", offset);
        }
        self.buf.push_bytes(s.as_bytes());
        self.buf.push_bytes(&[0]);
        Ok(offset as u32)
    }

    pub fn get(&self, offset: u32) -> &str {
        get_str(self.buf.as_slice(), offset)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_slice()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }
}

impl Default for StringPool {
    fn default() -> Self {
        StringPool::new()
    }
}

/// Read a NUL-terminated string starting at `offset` out of raw pool bytes;
/// shared by the owned [`StringPool`] and the zero-copy mmap view in `set`.
pub fn get_str(pool_bytes: &[u8], offset: u32) -> &str {
    if offset as usize >= pool_bytes.len() {
        return "";
    }
    let rest = &pool_bytes[offset as usize..];
    let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
    std::str::from_utf8(&rest[..end]).unwrap_or("")
}

const INITIAL_BUCKETS: usize = 16;
const MAX_LOAD_PERCENT: usize = 75;

/// Open-addressed, linear-probed hash table keyed by pool offset.
///
/// Grows by doubling and rehashing past a load-factor threshold rather than
/// the fixed grow-by-four-words scheme some implementations use, since
/// power-of-two load-factor growth is the idiomatic shape for a Rust
/// open-addressing table; `tokenize`/`lookup` stay O(1) amortized and never
/// read through a stale pool reference.
pub struct InternTable {
    buckets: Vec<u32>,
    len: usize,
}

impl InternTable {
    pub fn new() -> Self {
        InternTable {
            buckets: vec![0u32; INITIAL_BUCKETS],
            len: 0,
        }
    }

    fn hash(s: &str) -> u64 {
        let mut h: u64 = 0;
        for c in s.bytes() {
            h = h.wrapping_mul(617) ^ u64::from(c);
        }
        h
    }

    /// Return `s`'s pool offset, or 0 ("absent") if it hasn't been interned.
    pub fn lookup(&self, pool: &StringPool, s: &str) -> u32 {
        lookup_in(&self.buckets, pool, s)
    }

    /// Return `s`'s pool offset, inserting it (via `pool.append`) if absent.
    pub fn tokenize(&mut self, pool: &mut StringPool, s: &str) -> Result<u32> {
        let existing = lookup_in(&self.buckets, pool, s);
        if existing != 0 {
            return Ok(existing);
        }

        self.maybe_grow(pool);

        let offset = pool.append(s)?;
        insert_offset(&mut self.buckets, pool, offset);
        self.len += 1;
        Ok(offset)
    }

    fn maybe_grow(&mut self, pool: &StringPool) {
        if (self.len + 1) * 100 <= self.buckets.len() * MAX_LOAD_PERCENT {
            return;
        }
        let mut grown = vec![0u32; self.buckets.len() * 2];
        for &offset in &self.buckets {
            if offset != 0 {
                insert_offset(&mut grown, pool, offset);
            }
        }
        self.buckets = grown;
    }
}

impl Default for InternTable {
    fn default() -> Self {
        InternTable::new()
    }
}

fn lookup_in(buckets: &[u32], pool: &StringPool, s: &str) -> u32 {
    let cap = buckets.len();
    let start = (InternTable::hash(s) as usize) % cap;
    for i in 0..cap {
        let idx = (start + i) % cap;
        let offset = buckets[idx];
        if offset == 0 {
            return 0;
        }
        if pool.get(offset) == s {
            return offset;
        }
    }
    0
}

fn insert_offset(buckets: &mut [u32], pool: &StringPool, offset: u32) {
    let cap = buckets.len();
    let s = pool.get(offset);
    let start = (InternTable::hash(s) as usize) % cap;
    for i in 0..cap {
        let idx = (start + i) % cap;
        if buckets[idx] == 0 {
            buckets[idx] = offset;
            return;
        }
    }
    unreachable!("intern table grown without free bucket");
}

#[cfg(test)]
#[path = "strpool_test.rs"]
mod strpool_test;
