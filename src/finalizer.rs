//! Canonicalization: turn an importer's raw, ordered-by-arrival data into
//! the sorted, deduplicated, cross-referenced sections a `Set` expects. Six
//! passes over the raw data:
//!
//! 1. dedupe properties into one canonical list, remembering which original
//!    packages carried each one;
//! 2. sort that canonical property list by name then version;
//! 3. sort packages by name then version (`versioncmp`);
//! 4. build the installed-file tree from each package's flat path list,
//!    laid out breadth-first with `LAST`-sibling marking;
//! 5. invert the file tree's package associations into per-package file
//!    lists;
//! 6. remap every cross-reference (property→packages, package→properties,
//!    package→files, file→packages) from original indices to final ones.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::convert::TryFrom;

use crate::err_at;
use crate::error::Result;
use crate::importer::RawData;
use crate::refword::{FileNameWord, PropNameWord, RefWord};
use crate::set::{
    encode_files, encode_packages, encode_properties, encode_ref_list, FileEntryRecord,
    PackageRecord, PropertyRecord, Set, SectionType,
};
use crate::strpool::{InternTable, StringPool};
use crate::versioncmp::versioncmp;

/// Dedup key for pass 1. Kind is deliberately excluded: a run with equal
/// `(name, version, relation)` collapses to one entry regardless of which
/// kinds it was carried as, with the emitted record taking the smallest kind
/// seen (tracked alongside in `canonical_kind`, not in this key).
#[derive(Clone, PartialEq, Eq, Hash)]
struct PropertyKey {
    name: u32,
    version: u32,
    relation: u8,
}

struct Node {
    name: String,
    children: BTreeMap<String, usize>,
    packages: Vec<u32>,
}

pub fn finalize(raw: RawData) -> Result<Set> {
    let RawData {
        mut pool,
        mut table,
        packages,
    } = raw;

    // --- pass 1: dedupe properties ---
    let mut canonical: Vec<PropertyKey> = Vec::new();
    // canonical_property_idx -> smallest kind seen across the collapsed run
    let mut canonical_kind: Vec<u8> = Vec::new();
    let mut canonical_index: HashMap<PropertyKey, usize> = HashMap::new();
    // canonical_property_idx -> set of original package indices
    let mut property_owners: Vec<Vec<usize>> = Vec::new();
    // original_pkg_idx -> list of canonical property indices
    let mut pkg_property_canonical: Vec<Vec<usize>> = vec![Vec::new(); packages.len()];

    for (pkg_idx, pkg) in packages.iter().enumerate() {
        for prop in &pkg.properties {
            let key = PropertyKey {
                name: prop.name,
                version: prop.version,
                relation: prop.relation as u8,
            };
            let idx = match canonical_index.get(&key) {
                Some(&i) => {
                    if (prop.kind as u8) < canonical_kind[i] {
                        canonical_kind[i] = prop.kind as u8;
                    }
                    i
                }
                None => {
                    let i = canonical.len();
                    canonical.push(key.clone());
                    canonical_kind.push(prop.kind as u8);
                    property_owners.push(Vec::new());
                    canonical_index.insert(key, i);
                    i
                }
            };
            property_owners[idx].push(pkg_idx);
            pkg_property_canonical[pkg_idx].push(idx);
        }
    }

    // --- pass 2: sort canonical properties by name, then kind, then version ---
    let mut prop_order: Vec<usize> = (0..canonical.len()).collect();
    prop_order.sort_by(|&a, &b| compare_properties(&canonical, &canonical_kind, &pool, a, b));
    let mut canonical_to_sorted = vec![0usize; canonical.len()];
    for (sorted_idx, &canon_idx) in prop_order.iter().enumerate() {
        canonical_to_sorted[canon_idx] = sorted_idx;
    }

    // --- pass 3: sort packages by name, then version ---
    let mut pkg_order: Vec<usize> = (0..packages.len()).collect();
    pkg_order.sort_by(|&a, &b| compare_packages(&packages, &pool, a, b));
    let mut original_to_new_pkg = vec![0u32; packages.len()];
    for (new_idx, &orig_idx) in pkg_order.iter().enumerate() {
        original_to_new_pkg[orig_idx] = err_at!(FailConvert, u32::try_from(new_idx), "package index")?;
    }

    // --- pass 4 & 5: build the file tree, inverting file -> package as we go ---
    let mut arena: Vec<Node> = vec![Node {
        name: String::new(),
        children: BTreeMap::new(),
        packages: Vec::new(),
    }];
    for (new_idx, &orig_idx) in pkg_order.iter().enumerate() {
        let pkg = &packages[orig_idx];
        for path in &pkg.files {
            let mut cursor = 0usize;
            for segment in path.split('/').filter(|s| !s.is_empty()) {
                cursor = child_of(&mut arena, cursor, segment);
            }
            arena[cursor].packages.push(new_idx as u32);
        }
    }

    let (file_records, pool_file_refs, pkg_file_entries) = layout_tree(&arena, &mut pool, &mut table)?;

    // --- pass 6: remap cross-references and emit pool sections ---
    let mut package_pool_buf: Vec<u8> = Vec::new();
    let mut property_pool_buf: Vec<u8> = Vec::new();
    let mut file_pool_buf: Vec<u8> = Vec::new();

    // property -> packages (sorted, deduped, remapped to new package indices)
    let mut property_records = vec![
        PropertyRecord {
            name: PropNameWord::from_raw(0),
            version: 0,
            packages: RefWord::NONE,
        };
        canonical.len()
    ];
    for (canon_idx, key) in canonical.iter().enumerate() {
        let sorted_idx = canonical_to_sorted[canon_idx];
        let mut owners: Vec<u32> = property_owners[canon_idx]
            .iter()
            .map(|&orig| original_to_new_pkg[orig])
            .collect();
        owners.sort_unstable();
        owners.dedup();

        let packages_ref = if owners.is_empty() {
            RefWord::NONE
        } else {
            let start = (package_pool_buf.len() / 4) as u32;
            package_pool_buf.extend_from_slice(&encode_ref_list(&owners)?);
            RefWord::offset(start)?
        };

        let name_word = PropNameWord::new(key.name, kind_from_u8(canonical_kind[canon_idx]), relation_from_u8(key.relation))?;
        property_records[sorted_idx] = PropertyRecord {
            name: name_word,
            version: key.version,
            packages: packages_ref,
        };
    }

    // package -> properties (remapped to sorted property indices)
    let mut package_records = Vec::with_capacity(packages.len());
    for &orig_idx in &pkg_order {
        let pkg = &packages[orig_idx];
        let mut props: Vec<u32> = pkg_property_canonical[orig_idx]
            .iter()
            .map(|&c| canonical_to_sorted[c] as u32)
            .collect();
        props.sort_unstable();
        props.dedup();

        let properties_ref = if props.is_empty() {
            RefWord::NONE
        } else {
            let start = (property_pool_buf.len() / 4) as u32;
            property_pool_buf.extend_from_slice(&encode_ref_list(&props)?);
            RefWord::offset(start)?
        };

        let files_ref = match pkg_file_entries.get(&(original_to_new_pkg[orig_idx])) {
            Some(entries) if !entries.is_empty() => {
                let start = (file_pool_buf.len() / 4) as u32;
                file_pool_buf.extend_from_slice(&encode_ref_list(entries)?);
                RefWord::offset(start)?
            }
            _ => RefWord::NONE,
        };

        package_records.push(PackageRecord {
            name: pkg.name,
            version: pkg.version,
            properties: properties_ref,
            files: files_ref,
        });
    }

    // file entries already carry their per-node package ref word via
    // pool_file_refs, appended into package_pool_buf here.
    let mut file_records = file_records;
    for (entry_idx, owners) in pool_file_refs {
        let start = (package_pool_buf.len() / 4) as u32;
        package_pool_buf.extend_from_slice(&encode_ref_list(&owners)?);
        file_records[entry_idx].packages = RefWord::offset(start)?;
    }

    let sections: [Vec<u8>; 7] = {
        let mut s: [Vec<u8>; 7] = Default::default();
        s[SectionType::StringPool.index()] = pool.as_bytes().to_vec();
        s[SectionType::Packages.index()] = encode_packages(&package_records);
        s[SectionType::Properties.index()] = encode_properties(&property_records);
        s[SectionType::Files.index()] = encode_files(&file_records);
        s[SectionType::PackagePool.index()] = package_pool_buf;
        s[SectionType::PropertyPool.index()] = property_pool_buf;
        s[SectionType::FilePool.index()] = file_pool_buf;
        s
    };

    Ok(Set::from_sections(sections))
}

fn child_of(arena: &mut Vec<Node>, parent: usize, name: &str) -> usize {
    if let Some(&idx) = arena[parent].children.get(name) {
        return idx;
    }
    let idx = arena.len();
    arena.push(Node {
        name: name.to_string(),
        children: BTreeMap::new(),
        packages: Vec::new(),
    });
    arena[parent].children.insert(name.to_string(), idx);
    idx
}

const NO_CHILD: u32 = u32::MAX;

/// Breadth-first layout of the file tree arena into the final, contiguous
/// `FileEntryRecord` array. Returns the records, a list of (entry index,
/// owning-package list) pairs to encode into the package pool once its
/// offset table is known, and the per-new-package-index list of file
/// entries it owns.
fn layout_tree(
    arena: &[Node],
    pool: &mut StringPool,
    table: &mut InternTable,
) -> Result<(Vec<FileEntryRecord>, Vec<(usize, Vec<u32>)>, HashMap<u32, Vec<u32>>)> {
    let mut records: Vec<FileEntryRecord> = Vec::new();
    let mut arena_to_entry = vec![u32::MAX; arena.len()];
    let mut owners_by_entry: Vec<(usize, Vec<u32>)> = Vec::new();
    let mut pkg_files: HashMap<u32, Vec<u32>> = HashMap::new();
    let mut queue: std::collections::VecDeque<usize> = std::collections::VecDeque::new();

    let mut allocate = |arena: &[Node],
                         parent_children: &[usize],
                         pool: &mut StringPool,
                         table: &mut InternTable,
                         records: &mut Vec<FileEntryRecord>,
                         arena_to_entry: &mut Vec<u32>,
                         owners_by_entry: &mut Vec<(usize, Vec<u32>)>,
                         pkg_files: &mut HashMap<u32, Vec<u32>>|
     -> Result<()> {
        let n = parent_children.len();
        for (i, &child_idx) in parent_children.iter().enumerate() {
            let node = &arena[child_idx];
            let name_off = table.tokenize(pool, &node.name)?;
            let last = i == n - 1;
            let entry_idx = records.len() as u32;
            records.push(FileEntryRecord {
                name: FileNameWord::new(name_off, last)?,
                first_child: NO_CHILD,
                packages: RefWord::NONE,
            });
            arena_to_entry[child_idx] = entry_idx;
            if !node.packages.is_empty() {
                let mut owners = node.packages.clone();
                owners.sort_unstable();
                owners.dedup();
                for &p in &owners {
                    pkg_files.entry(p).or_insert_with(Vec::new).push(entry_idx);
                }
                owners_by_entry.push((entry_idx as usize, owners));
            }
        }
        Ok(())
    };

    let root_children: Vec<usize> = arena[0].children.values().cloned().collect();
    allocate(
        arena,
        &root_children,
        pool,
        table,
        &mut records,
        &mut arena_to_entry,
        &mut owners_by_entry,
        &mut pkg_files,
    )?;
    for c in root_children {
        queue.push_back(c);
    }

    while let Some(arena_idx) = queue.pop_front() {
        let children: Vec<usize> = arena[arena_idx].children.values().cloned().collect();
        if children.is_empty() {
            continue;
        }
        let start = records.len() as u32;
        allocate(
            arena,
            &children,
            pool,
            table,
            &mut records,
            &mut arena_to_entry,
            &mut owners_by_entry,
            &mut pkg_files,
        )?;
        let own_entry = arena_to_entry[arena_idx];
        records[own_entry as usize].first_child = start;
        for c in children {
            queue.push_back(c);
        }
    }

    Ok((records, owners_by_entry, pkg_files))
}

fn compare_properties(canonical: &[PropertyKey], canonical_kind: &[u8], pool: &StringPool, a: usize, b: usize) -> Ordering {
    let ka = &canonical[a];
    let kb = &canonical[b];
    pool.get(ka.name)
        .cmp(pool.get(kb.name))
        .then_with(|| canonical_kind[a].cmp(&canonical_kind[b]))
        .then_with(|| versioncmp(pool.get(ka.version), pool.get(kb.version)))
        .then_with(|| ka.relation.cmp(&kb.relation))
}

fn compare_packages(packages: &[crate::importer::RawPackage], pool: &StringPool, a: usize, b: usize) -> Ordering {
    let pa = &packages[a];
    let pb = &packages[b];
    pool.get(pa.name)
        .cmp(pool.get(pb.name))
        .then_with(|| versioncmp(pool.get(pa.version), pool.get(pb.version)))
}

fn kind_from_u8(v: u8) -> crate::refword::PropertyKind {
    use crate::refword::PropertyKind::*;
    match v {
        0 => Requires,
        1 => Provides,
        2 => Conflicts,
        _ => Obsoletes,
    }
}

fn relation_from_u8(v: u8) -> crate::refword::VersionRelation {
    use crate::refword::VersionRelation::*;
    match v {
        0 => Less,
        1 => LessOrEqual,
        2 => Equal,
        3 => GreaterOrEqual,
        _ => Greater,
    }
}

#[cfg(test)]
#[path = "finalizer_test.rs"]
mod finalizer_test;
