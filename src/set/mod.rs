//! The on-disk/mmap-able `Set`.
//!
//! A `Set` is either freshly built in memory (`Backing::Owned`, one `Vec<u8>`
//! per section) or opened from a file (`Backing::Mapped`, one `memmap2::Mmap`
//! sliced by the header's section table). `section_bytes` hides which one it
//! is behind a plain `&[u8]` borrowed from `&self`, so every reader downstream
//! (string pool, record decoders, reference-list walks) works unchanged
//! whether or not the bytes ever touched disk.

mod header;

pub use header::{SectionType, SECTION_ORDER};
use header::{parse_layout, plan_layout, SectionSlot, PAGE_SIZE};

use std::convert::TryFrom;
use std::fs::File;
use std::io::Write as _;
use std::path::Path;

use memmap2::Mmap;

use crate::err_at;
use crate::error::Result;
use crate::refword::{FileNameWord, PropNameWord, RefWord};
use crate::strpool::get_str;

const PACKAGE_RECORD_WORDS: usize = 4;
const PROPERTY_RECORD_WORDS: usize = 4;
const FILE_RECORD_WORDS: usize = 3;

/// A package: name/version string-pool offsets plus its properties and files
/// reference lists.
#[derive(Clone, Copy, Debug)]
pub struct PackageRecord {
    pub name: u32,
    pub version: u32,
    pub properties: RefWord,
    pub files: RefWord,
}

impl PackageRecord {
    pub const SIZE: usize = PACKAGE_RECORD_WORDS * 4;

    fn decode(bytes: &[u8], idx: u32) -> PackageRecord {
        let base = idx as usize * Self::SIZE;
        PackageRecord {
            name: read_u32(bytes, base),
            version: read_u32(bytes, base + 4),
            properties: RefWord::from_raw(read_u32(bytes, base + 8)),
            files: RefWord::from_raw(read_u32(bytes, base + 12)),
        }
    }

    fn encode(self, buf: &mut crate::buffer::ByteBuffer) {
        buf.push_u32(self.name);
        buf.push_u32(self.version);
        buf.push_u32(self.properties.raw());
        buf.push_u32(self.files.raw());
    }
}

/// A property: kind/relation-tagged name, version string, and the packages
/// that carry it. The fourth word is reserved padding, kept so every record
/// in the section has the same fixed stride.
#[derive(Clone, Copy, Debug)]
pub struct PropertyRecord {
    pub name: PropNameWord,
    pub version: u32,
    pub packages: RefWord,
}

impl PropertyRecord {
    pub const SIZE: usize = PROPERTY_RECORD_WORDS * 4;

    fn decode(bytes: &[u8], idx: u32) -> PropertyRecord {
        let base = idx as usize * Self::SIZE;
        PropertyRecord {
            name: PropNameWord::from_raw(read_u32(bytes, base)),
            version: read_u32(bytes, base + 4),
            packages: RefWord::from_raw(read_u32(bytes, base + 8)),
        }
    }

    fn encode(self, buf: &mut crate::buffer::ByteBuffer) {
        buf.push_u32(self.name.raw());
        buf.push_u32(self.version);
        buf.push_u32(self.packages.raw());
        buf.push_u32(0); // reserved
    }
}

/// A file-tree entry: name plus `LAST`-sibling bit, the index of its first
/// child in this same section (directories only), and the packages that
/// install it.
#[derive(Clone, Copy, Debug)]
pub struct FileEntryRecord {
    pub name: FileNameWord,
    pub first_child: u32,
    pub packages: RefWord,
}

impl FileEntryRecord {
    pub const SIZE: usize = FILE_RECORD_WORDS * 4;

    fn decode(bytes: &[u8], idx: u32) -> FileEntryRecord {
        let base = idx as usize * Self::SIZE;
        FileEntryRecord {
            name: FileNameWord::from_raw(read_u32(bytes, base)),
            first_child: read_u32(bytes, base + 4),
            packages: RefWord::from_raw(read_u32(bytes, base + 8)),
        }
    }

    fn encode(self, buf: &mut crate::buffer::ByteBuffer) {
        buf.push_u32(self.name.raw());
        buf.push_u32(self.first_child);
        buf.push_u32(self.packages.raw());
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    use std::convert::TryInto;
    if offset + 4 > bytes.len() {
        return 0;
    }
    let word: [u8; 4] = bytes[offset..offset + 4].try_into().unwrap();
    u32::from_le_bytes(word)
}

struct OwnedSections {
    sections: [Vec<u8>; 7],
}

struct MappedSections {
    mmap: Mmap,
    slots: [SectionSlot; 7],
}

enum Backing {
    Owned(OwnedSections),
    Mapped(MappedSections),
}

/// A fully built or freshly opened package-metadata set.
pub struct Set {
    backing: Backing,
}

impl Set {
    /// Wrap seven already-built section buffers (importer/finalizer/merger
    /// output) as an in-memory `Set`, ready to query or write out.
    pub fn from_sections(sections: [Vec<u8>; 7]) -> Set {
        Set {
            backing: Backing::Owned(OwnedSections { sections }),
        }
    }

    /// Open a Set file via mmap. Format mismatches (bad magic, bad version,
    /// a missing section slot) are never fatal: they are logged and the
    /// affected section reads back empty.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Set> {
        let path = path.as_ref();
        let file = err_at!(IOError, File::open(path), "opening {:?}", path)?;
        let mmap = err_at!(IOError, unsafe { Mmap::map(&file) }, "mmap {:?}", path)?;

        let slots = match parse_layout(&mmap) {
            Some(slots) => slots,
            None => {
                log::warn!("{:?}: bad magic/version, opening as an empty set", path);
                [SectionSlot::default(); 7]
            }
        };

        Ok(Set {
            backing: Backing::Mapped(MappedSections { mmap, slots }),
        })
    }

    /// Write this Set to `path` atomically: build the file in a temp path in
    /// the same directory, flush and sync it, then rename over `path` so a
    /// reader never observes a partially written file.
    pub fn write_atomic<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = path.parent().unwrap_or_else(|| Path::new("."));

        let lock_path = path.with_extension("lock");
        let lock_file = crate::util::create_file_w(lock_path.as_os_str())?;

        crate::util::with_exclusive_lock(&lock_file, || self.write_locked(path, dir))
    }

    fn write_locked(&self, path: &Path, dir: &Path) -> Result<()> {
        let mut tmp = err_at!(IOError, tempfile::NamedTempFile::new_in(dir), "creating temp file in {:?}", dir)?;

        let mut sizes = [0u32; 7];
        for t in &SECTION_ORDER {
            let len = self.section_bytes(*t).len();
            sizes[t.index()] = err_at!(FailConvert, u32::try_from(len), "section {:?} too large", t)?;
        }
        let (slots, header_page) = plan_layout(&sizes);

        err_at!(IOError, tmp.write_all(&header_page), "writing header")?;
        for (i, t) in SECTION_ORDER.iter().enumerate() {
            let bytes = self.section_bytes(*t);
            err_at!(IOError, tmp.write_all(bytes), "writing section {:?}", t)?;
            let padded = crate::buffer::align_up(slots[i].size as u64, PAGE_SIZE) as usize;
            if padded > bytes.len() {
                let pad = vec![0u8; padded - bytes.len()];
                err_at!(IOError, tmp.write_all(&pad), "padding section {:?}", t)?;
            }
        }
        err_at!(IOError, tmp.flush(), "flushing {:?}", path)?;
        err_at!(IOError, tmp.as_file().sync_all(), "syncing {:?}", path)?;
        err_at!(IOError, tmp.persist(path), "renaming into {:?}", path)?;
        Ok(())
    }

    pub fn section_bytes(&self, t: SectionType) -> &[u8] {
        match &self.backing {
            Backing::Owned(o) => &o.sections[t.index()],
            Backing::Mapped(m) => {
                let slot = m.slots[t.index()];
                let start = slot.offset as usize;
                let end = start + slot.size as usize;
                &m.mmap[start..end]
            }
        }
    }

    pub fn string(&self, offset: u32) -> &str {
        get_str(self.section_bytes(SectionType::StringPool), offset)
    }

    pub fn package_count(&self) -> usize {
        self.section_bytes(SectionType::Packages).len() / PackageRecord::SIZE
    }

    pub fn package(&self, idx: u32) -> PackageRecord {
        PackageRecord::decode(self.section_bytes(SectionType::Packages), idx)
    }

    pub fn property_count(&self) -> usize {
        self.section_bytes(SectionType::Properties).len() / PropertyRecord::SIZE
    }

    pub fn property(&self, idx: u32) -> PropertyRecord {
        PropertyRecord::decode(self.section_bytes(SectionType::Properties), idx)
    }

    pub fn file_count(&self) -> usize {
        self.section_bytes(SectionType::Files).len() / FileEntryRecord::SIZE
    }

    pub fn file_entry(&self, idx: u32) -> FileEntryRecord {
        FileEntryRecord::decode(self.section_bytes(SectionType::Files), idx)
    }

    /// Walk a reference list starting at `start` in `pool`, stopping after
    /// the entry whose `IMMEDIATE`/`LAST` bit is set. `RefWord::NONE` yields
    /// an empty list.
    pub fn ref_list(&self, pool: SectionType, start: RefWord) -> Vec<u32> {
        if start.is_none() {
            return Vec::new();
        }
        let bytes = self.section_bytes(pool);
        let mut out = Vec::new();
        let mut idx = start.payload() as usize;
        loop {
            let word = RefWord::from_raw(read_u32(bytes, idx * 4));
            out.push(word.payload());
            if word.is_immediate() {
                break;
            }
            idx += 1;
        }
        out
    }
}

pub fn encode_packages(records: &[PackageRecord]) -> Vec<u8> {
    let mut buf = crate::buffer::ByteBuffer::with_capacity(records.len() * PackageRecord::SIZE);
    for r in records {
        r.encode(&mut buf);
    }
    buf.into_vec()
}

pub fn encode_properties(records: &[PropertyRecord]) -> Vec<u8> {
    let mut buf = crate::buffer::ByteBuffer::with_capacity(records.len() * PropertyRecord::SIZE);
    for r in records {
        r.encode(&mut buf);
    }
    buf.into_vec()
}

pub fn encode_files(records: &[FileEntryRecord]) -> Vec<u8> {
    let mut buf = crate::buffer::ByteBuffer::with_capacity(records.len() * FileEntryRecord::SIZE);
    for r in records {
        r.encode(&mut buf);
    }
    buf.into_vec()
}

/// Encode a reference list as a pool fragment: one `RefWord` per entry, the
/// last one carrying the `IMMEDIATE` bit. Returns the fragment; the caller
/// appends it to the shared pool buffer and remembers the starting offset.
pub fn encode_ref_list(entries: &[u32]) -> Result<Vec<u8>> {
    let mut buf = crate::buffer::ByteBuffer::with_capacity(entries.len() * 4);
    match entries.split_last() {
        None => {}
        Some((last, rest)) => {
            for &e in rest {
                buf.push_u32(RefWord::offset(e)?.raw());
            }
            buf.push_u32(RefWord::with_immediate(*last)?.raw());
        }
    }
    Ok(buf.into_vec())
}

#[cfg(test)]
#[path = "set_test.rs"]
mod set_test;
