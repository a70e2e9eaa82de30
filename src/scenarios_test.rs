//! End-to-end scenarios spanning import, finalize, write/reopen, merge and
//! resolve — exercising the pipeline as a whole rather than one module at a
//! time.

use crate::finalizer::finalize;
use crate::importer::{Importer, ImporterConfig};
use crate::merge::merge;
use crate::refword::{PropertyKind, VersionRelation};
use crate::resolve::{update, validate};
use crate::set::Set;

#[test]
fn test_single_package_survives_a_write_and_reopen_round_trip() {
    let mut imp = Importer::new(ImporterConfig::default());
    imp.begin_package("hello", "2.10").unwrap();
    imp.add_property(PropertyKind::Provides, "hello", "2.10", VersionRelation::Equal)
        .unwrap();
    imp.add_file("usr/bin/hello").unwrap();
    imp.finish_package().unwrap();
    let set = finalize(imp.finish()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hello.set");
    set.write_atomic(&path).unwrap();

    let reopened = Set::open(&path).unwrap();
    assert_eq!(reopened.package_count(), 1);
    let pkg = reopened.package(0);
    assert_eq!(reopened.string(pkg.name), "hello");
    assert_eq!(reopened.string(pkg.version), "2.10");
    assert!(reopened.find_entry("usr/bin/hello").is_some());
}

#[test]
fn test_duplicate_property_across_many_packages_dedups_to_one_record() {
    let mut imp = Importer::new(ImporterConfig::default());
    for pkg in ["a", "b", "c"] {
        imp.begin_package(pkg, "1.0").unwrap();
        imp.add_property(PropertyKind::Requires, "libc", "2.0", VersionRelation::GreaterOrEqual)
            .unwrap();
        imp.finish_package().unwrap();
    }
    let set = finalize(imp.finish()).unwrap();

    assert_eq!(set.property_count(), 1);
    let prop = set.property(0);
    assert_eq!(set.property_packages(0).len(), 3);
    let _ = prop;
}

#[test]
fn test_version_sort_is_numeric_not_lexicographic() {
    let mut imp = Importer::new(ImporterConfig::default());
    for version in ["1.10", "1.2", "1.9"] {
        imp.begin_package("foo", version).unwrap();
        imp.finish_package().unwrap();
    }
    let set = finalize(imp.finish()).unwrap();

    let versions: Vec<String> = (0..3)
        .map(|i| set.string(set.package(i).version).to_string())
        .collect();
    assert_eq!(versions, vec!["1.2".to_string(), "1.9".to_string(), "1.10".to_string()]);
}

#[test]
fn test_merge_then_resolve_ends_satisfied() {
    let mut a_imp = Importer::new(ImporterConfig::default());
    a_imp.begin_package("app", "1.0").unwrap();
    a_imp
        .add_property(PropertyKind::Requires, "libfoo", "1.0", VersionRelation::GreaterOrEqual)
        .unwrap();
    a_imp.finish_package().unwrap();
    let a = finalize(a_imp.finish()).unwrap();

    let mut b_imp = Importer::new(ImporterConfig::default());
    b_imp.begin_package("libfoo", "1.2").unwrap();
    b_imp
        .add_property(PropertyKind::Provides, "libfoo", "1.2", VersionRelation::Equal)
        .unwrap();
    b_imp.finish_package().unwrap();
    let b = finalize(b_imp.finish()).unwrap();

    let merged = merge(&a, &b, &[]).unwrap();
    assert_eq!(merged.package_count(), 1);
    assert_eq!(validate(&merged).len(), 1);

    let resolved = update(&a, &b).unwrap();
    assert_eq!(resolved.package_count(), 2);
    assert!(validate(&resolved).is_empty());
}
