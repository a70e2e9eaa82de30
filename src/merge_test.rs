use super::*;
use crate::refword::{PropertyKind, VersionRelation};

fn one_package_set(name: &str, version: &str, file: &str) -> Set {
    let mut imp = Importer::new(ImporterConfig::default());
    imp.begin_package(name, version).unwrap();
    imp.add_property(PropertyKind::Provides, name, version, VersionRelation::Equal)
        .unwrap();
    imp.add_file(file).unwrap();
    imp.finish_package().unwrap();
    finalize(imp.finish()).unwrap()
}

#[test]
fn test_merge_keeps_a_and_selected_b() {
    let a = one_package_set("foo", "1.0", "usr/bin/foo");
    let b = one_package_set("bar", "2.0", "usr/bin/bar");

    let merged = merge(&a, &b, &[0]).unwrap();
    assert_eq!(merged.package_count(), 2);
    let names: Vec<String> = (0..2)
        .map(|i| merged.string(merged.package(i).name).to_string())
        .collect();
    assert_eq!(names, vec!["bar".to_string(), "foo".to_string()]);
}

#[test]
fn test_merge_excludes_unselected_b_packages() {
    let a = one_package_set("foo", "1.0", "usr/bin/foo");
    let b = one_package_set("bar", "2.0", "usr/bin/bar");

    let merged = merge(&a, &b, &[]).unwrap();
    assert_eq!(merged.package_count(), 1);
    assert_eq!(merged.string(merged.package(0).name), "foo");
}

#[test]
fn test_merge_b_wins_on_name_collision() {
    let a = one_package_set("foo", "1.0", "usr/bin/foo-old");
    let b = one_package_set("foo", "2.0", "usr/bin/foo-new");

    let merged = merge(&a, &b, &[0]).unwrap();
    assert_eq!(merged.package_count(), 1);
    let pkg = merged.package(0);
    assert_eq!(merged.string(pkg.version), "2.0");
    assert!(merged.find_entry("usr/bin/foo-new").is_some());
    assert!(merged.find_entry("usr/bin/foo-old").is_none());
}

#[test]
fn test_merge_preserves_properties_and_files() {
    let a = one_package_set("foo", "1.0", "usr/bin/foo");
    let b = one_package_set("bar", "2.0", "usr/bin/bar");

    let merged = merge(&a, &b, &[0]).unwrap();
    let bar_idx = merged.find_packages("bar")[0];
    let props = merged.package_properties(bar_idx);
    assert_eq!(props.len(), 1);
    assert_eq!(merged.string(merged.property(props[0]).name.payload()), "bar");

    let files = merged.package_files(bar_idx);
    assert_eq!(files.len(), 1);
    assert!(merged.find_entry("usr/bin/bar").is_some());
}
