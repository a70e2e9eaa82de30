//! Requirement validation and the dependency-resolution fixed point
//! grounded on `original_source/razor.c`'s `razor_transaction_resolve`:
//! repeatedly pull packages from a candidate pool into a target set until
//! every `Requires` is satisfied or no candidate package can satisfy what
//! remains.

use crate::error::Result;
use crate::merge::merge;
use crate::refword::PropertyKind;
use crate::set::Set;
use crate::versioncmp::versioncmp;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnsatisfiedRequirement {
    pub package: u32,
    pub property: u32,
}

/// Scan `set`'s sorted property list once, grouping by name (a contiguous
/// run, since packages and properties both sort by name first) so every
/// `Requires` in a group is checked only against that group's `Provides`.
pub fn validate(set: &Set) -> Vec<UnsatisfiedRequirement> {
    let mut out = Vec::new();
    let count = set.property_count() as u32;
    let mut i = 0u32;
    while i < count {
        let name = set.property(i).name.payload();
        let mut j = i;
        while j < count && set.property(j).name.payload() == name {
            j += 1;
        }

        let provides: Vec<u32> = (i..j)
            .filter(|&p| set.property(p).name.kind() == PropertyKind::Provides)
            .collect();

        for p in i..j {
            let prop = set.property(p);
            if prop.name.kind() != PropertyKind::Requires {
                continue;
            }
            if !satisfied_by(set, p, &provides) {
                for pkg in set.property_packages(p) {
                    out.push(UnsatisfiedRequirement { package: pkg, property: p });
                }
            }
        }
        i = j;
    }
    out
}

fn satisfied_by(set: &Set, requirement: u32, provides: &[u32]) -> bool {
    if provides.is_empty() {
        return false;
    }
    let req = set.property(requirement);
    let req_version = set.string(req.version);
    if req_version.is_empty() {
        return true; // unversioned requirement: any matching name satisfies it
    }
    provides.iter().any(|&pv| {
        let provided = set.property(pv);
        let ord = versioncmp(set.string(provided.version), req_version);
        req.name.relation().accepts(ord)
    })
}

/// Does `pool` contain a package that provides something satisfying
/// `requirement` (as evaluated against `pool`'s own property namespace,
/// matched by name and the requirement's relation)?
fn find_candidate(pool: &Set, target: &Set, requirement: u32) -> Option<u32> {
    let req = target.property(requirement);
    let name = target.string(req.name.payload());
    let req_version = target.string(req.version);

    for prop_idx in pool.find_properties(name) {
        let prop = pool.property(prop_idx);
        if prop.name.kind() != PropertyKind::Provides {
            continue;
        }
        let satisfied = req_version.is_empty()
            || req.name.relation().accepts(versioncmp(pool.string(prop.version), req_version));
        if satisfied {
            if let Some(&pkg) = pool.property_packages(prop_idx).first() {
                return Some(pkg);
            }
        }
    }
    None
}

/// Repeatedly merge candidate packages from `pool` into `target` to satisfy
/// outstanding `Requires`, stopping when nothing changes: either every
/// requirement is met, or what remains has no candidate in `pool`.
pub fn update(target: &Set, pool: &Set) -> Result<Set> {
    let mut current = merge(target, pool, &[])?;

    loop {
        let unsatisfied = validate(&current);
        if unsatisfied.is_empty() {
            return Ok(current);
        }

        let mut additions = Vec::new();
        for req in &unsatisfied {
            if let Some(candidate) = find_candidate(pool, &current, req.property) {
                if !additions.contains(&candidate) {
                    additions.push(candidate);
                }
            }
        }

        if additions.is_empty() {
            return Ok(current); // nothing left that `pool` can supply
        }

        let next = merge(&current, pool, &additions)?;
        if next.package_count() == current.package_count() {
            return Ok(next); // fixed point: no new packages actually got added
        }
        current = next;
    }
}

#[cfg(test)]
#[path = "resolve_test.rs"]
mod resolve_test;
