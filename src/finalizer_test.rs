use super::*;
use crate::importer::{Importer, ImporterConfig};
use crate::refword::{PropertyKind, VersionRelation};

#[test]
fn test_single_package_roundtrip() {
    let mut imp = Importer::new(ImporterConfig::default());
    imp.begin_package("foo", "1.0").unwrap();
    imp.add_property(PropertyKind::Provides, "foo", "1.0", VersionRelation::Equal)
        .unwrap();
    imp.add_file("usr/bin/foo").unwrap();
    imp.finish_package().unwrap();

    let set = finalize(imp.finish()).unwrap();
    assert_eq!(set.package_count(), 1);
    let pkg = set.package(0);
    assert_eq!(set.string(pkg.name), "foo");
    assert_eq!(set.file_count(), 3); // usr, bin, foo
}

#[test]
fn test_duplicate_properties_are_deduped() {
    let mut imp = Importer::new(ImporterConfig::default());
    imp.begin_package("a", "1.0").unwrap();
    imp.add_property(PropertyKind::Requires, "libc", "2.0", VersionRelation::GreaterOrEqual)
        .unwrap();
    imp.finish_package().unwrap();
    imp.begin_package("b", "1.0").unwrap();
    imp.add_property(PropertyKind::Requires, "libc", "2.0", VersionRelation::GreaterOrEqual)
        .unwrap();
    imp.finish_package().unwrap();

    let set = finalize(imp.finish()).unwrap();
    assert_eq!(set.property_count(), 1);
    let prop = set.property(0);
    let owners = set.ref_list(SectionType::PackagePool, prop.packages);
    assert_eq!(owners.len(), 2);
}

#[test]
fn test_properties_dedup_ignores_kind() {
    let mut imp = Importer::new(ImporterConfig::default());
    imp.begin_package("a", "1.0").unwrap();
    imp.add_property(PropertyKind::Requires, "foo", "1.0", VersionRelation::Equal)
        .unwrap();
    imp.finish_package().unwrap();
    imp.begin_package("b", "1.0").unwrap();
    imp.add_property(PropertyKind::Provides, "foo", "1.0", VersionRelation::Equal)
        .unwrap();
    imp.finish_package().unwrap();

    let set = finalize(imp.finish()).unwrap();
    assert_eq!(set.property_count(), 1);
    let prop = set.property(0);
    assert_eq!(prop.name.kind(), PropertyKind::Requires); // smallest kind wins
    assert_eq!(set.ref_list(SectionType::PackagePool, prop.packages).len(), 2);
}

#[test]
fn test_packages_sorted_by_name_then_version() {
    let mut imp = Importer::new(ImporterConfig::default());
    for (name, version) in [("foo", "1.10"), ("bar", "2.0"), ("foo", "1.2")] {
        imp.begin_package(name, version).unwrap();
        imp.finish_package().unwrap();
    }
    let set = finalize(imp.finish()).unwrap();
    assert_eq!(set.package_count(), 3);
    let names: Vec<String> = (0..3).map(|i| set.string(set.package(i).name).to_string()).collect();
    assert_eq!(names, vec!["bar", "foo", "foo"]);
    assert_eq!(set.string(set.package(1).version), "1.2");
    assert_eq!(set.string(set.package(2).version), "1.10");
}

#[test]
fn test_file_tree_last_sibling_marked() {
    let mut imp = Importer::new(ImporterConfig::default());
    imp.begin_package("foo", "1.0").unwrap();
    imp.add_file("usr/bin/a").unwrap();
    imp.add_file("usr/bin/b").unwrap();
    imp.finish_package().unwrap();

    let set = finalize(imp.finish()).unwrap();
    // root children: just "usr"
    let usr = set.file_entry(0);
    assert!(usr.name.is_last());
    assert_eq!(set.string(usr.name.payload()), "usr");

    let bin_idx = usr.first_child;
    let bin = set.file_entry(bin_idx);
    assert!(bin.name.is_last());

    let a_idx = bin.first_child;
    let a = set.file_entry(a_idx);
    let b = set.file_entry(a_idx + 1);
    assert!(!a.name.is_last());
    assert!(b.name.is_last());
}

#[test]
fn test_package_files_ref_list_points_at_owned_entries() {
    let mut imp = Importer::new(ImporterConfig::default());
    imp.begin_package("foo", "1.0").unwrap();
    imp.add_file("etc/foo.conf").unwrap();
    imp.finish_package().unwrap();

    let set = finalize(imp.finish()).unwrap();
    let pkg = set.package(0);
    let file_entries = set.ref_list(SectionType::FilePool, pkg.files);
    assert_eq!(file_entries.len(), 1);
    let entry = set.file_entry(file_entries[0]);
    assert_eq!(set.string(entry.name.payload()), "foo.conf");
}
