//! Merging two sets: build a third `Set` holding all of `a`'s packages plus
//! a caller-chosen subset of `b`'s packages, with `b` winning any name
//! collision — a package in `b_selected` replaces every package in `a` that
//! shares its name, regardless of version.
//!
//! Rather than hand-rolling a second property/file remapping pass next to
//! the one `finalizer` already does, a merge re-feeds the kept packages
//! (from both sources, reading each one's properties and file paths back
//! out through the query layer) through a fresh `Importer` and lets
//! `finalizer::finalize` do the canonicalization it already knows how to do
//! correctly — a two-way merge expressed by reusing the existing ingestion
//! pipeline instead of a bespoke pointer-walk.

use std::collections::HashSet;

use crate::error::Result;
use crate::finalizer::finalize;
use crate::importer::{Importer, ImporterConfig};
use crate::set::Set;

/// Merge `b_selected` (a subset of `b`'s package indices) into `a`, returning
/// a new, finalized `Set` containing every package from `a` plus those. Any
/// package in `a` whose name matches one of `b_selected` is dropped first:
/// `b` wins on name collision.
pub fn merge(a: &Set, b: &Set, b_selected: &[u32]) -> Result<Set> {
    let mut imp = Importer::new(ImporterConfig {
        expected_packages: a.package_count() + b_selected.len(),
    });

    let replaced_names: HashSet<&str> = b_selected
        .iter()
        .map(|&idx| b.string(b.package(idx).name))
        .collect();

    for idx in 0..a.package_count() as u32 {
        if replaced_names.contains(a.string(a.package(idx).name)) {
            continue;
        }
        import_package(a, idx, &mut imp)?;
    }
    for &idx in b_selected {
        import_package(b, idx, &mut imp)?;
    }

    finalize(imp.finish())
}

fn import_package(set: &Set, idx: u32, imp: &mut Importer) -> Result<()> {
    let pkg = set.package(idx);
    imp.begin_package(set.string(pkg.name), set.string(pkg.version))?;
    for prop_idx in set.package_properties(idx) {
        let prop = set.property(prop_idx);
        imp.add_property(
            prop.name.kind(),
            set.string(prop.name.payload()),
            set.string(prop.version),
            prop.name.relation(),
        )?;
    }
    for file_idx in set.package_files(idx) {
        if let Some(path) = set.entry_path(file_idx) {
            imp.add_file(&path)?;
        }
    }
    imp.finish_package()
}

#[cfg(test)]
#[path = "merge_test.rs"]
mod merge_test;
