//! Sectioned-file header codec.
//!
//! First 4096 bytes of a Set file: `magic: u32`, `version: u32`, then up to
//! seven `{type, offset, size}` 12-byte records in ascending `type` order,
//! terminated by a record whose `type == 0xFFFFFFFF`. Everything past the
//! records, up to the 4096-byte boundary, is zero padding.

use std::convert::TryInto;

use crate::buffer::{align_up, ByteBuffer};

pub const MAGIC: u32 = 0x7a7a_7a7a;
pub const FORMAT_VERSION: u32 = 1;
pub const PAGE_SIZE: u64 = 4096;
const TERMINATOR_TYPE: u32 = 0xFFFF_FFFF;
const RECORD_SIZE: usize = 12;

/// The seven sections, in their fixed on-disk order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u32)]
pub enum SectionType {
    StringPool = 0,
    Packages = 1,
    Properties = 2,
    Files = 3,
    PackagePool = 4,
    PropertyPool = 5,
    FilePool = 6,
}

pub const SECTION_ORDER: [SectionType; 7] = [
    SectionType::StringPool,
    SectionType::Packages,
    SectionType::Properties,
    SectionType::Files,
    SectionType::PackagePool,
    SectionType::PropertyPool,
    SectionType::FilePool,
];

impl SectionType {
    pub fn index(self) -> usize {
        self as u32 as usize
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SectionSlot {
    pub offset: u32,
    pub size: u32,
}

/// Build the 4096-byte header page plus the per-section layout (offset and
/// padded-size) for sections whose logical lengths are `sizes[section]`.
pub fn plan_layout(sizes: &[u32; 7]) -> ([SectionSlot; 7], Vec<u8>) {
    let mut slots = [SectionSlot::default(); 7];
    let mut offset = PAGE_SIZE;
    for (i, &size) in sizes.iter().enumerate() {
        slots[i] = SectionSlot {
            offset: offset as u32,
            size,
        };
        offset += align_up(u64::from(size), PAGE_SIZE);
    }

    let mut header = ByteBuffer::with_capacity(PAGE_SIZE as usize);
    header.push_u32(MAGIC);
    header.push_u32(FORMAT_VERSION);
    for (i, slot) in slots.iter().enumerate() {
        header.push_u32(SECTION_ORDER[i] as u32);
        header.push_u32(slot.offset);
        header.push_u32(slot.size);
    }
    header.push_u32(TERMINATOR_TYPE);
    header.push_u32(0);
    header.push_u32(0);
    header.pad_to(PAGE_SIZE as usize);

    (slots, header.into_vec())
}

/// Parse a header page. Returns `None` for magic/version mismatch — the
/// caller treats that as "no recognizable sections" rather than a hard
/// failure, so `open` still succeeds on a format mismatch.
pub fn parse_layout(page: &[u8]) -> Option<[SectionSlot; 7]> {
    if page.len() < 8 {
        return None;
    }
    let magic = read_u32(page, 0);
    let version = read_u32(page, 4);
    if magic != MAGIC || version != FORMAT_VERSION {
        return None;
    }

    let mut found = std::collections::HashMap::new();
    let mut pos = 8;
    while pos + RECORD_SIZE <= page.len() {
        let kind = read_u32(page, pos);
        if kind == TERMINATOR_TYPE {
            break;
        }
        let offset = read_u32(page, pos + 4);
        let size = read_u32(page, pos + 8);
        found.insert(kind, SectionSlot { offset, size });
        pos += RECORD_SIZE;
    }

    let mut slots = [SectionSlot::default(); 7];
    for (i, section) in SECTION_ORDER.iter().enumerate() {
        match found.get(&(*section as u32)) {
            Some(slot) => slots[i] = *slot,
            None => log::warn!("section {:?} missing from header, treated as empty", section),
        }
    }
    Some(slots)
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let bytes: [u8; 4] = buf[offset..offset + 4].try_into().unwrap();
    u32::from_le_bytes(bytes)
}

#[cfg(test)]
#[path = "header_test.rs"]
mod header_test;
