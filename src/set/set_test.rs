use super::*;
use crate::refword::{PropertyKind, VersionRelation};

fn sample_sections() -> [Vec<u8>; 7] {
    let mut pool = crate::strpool::StringPool::new();
    let foo = pool.append("foo").unwrap();
    let ver = pool.append("1.0").unwrap();

    let pkg = PackageRecord {
        name: foo,
        version: ver,
        properties: RefWord::NONE,
        files: RefWord::NONE,
    };
    let packages = encode_packages(&[pkg]);

    let prop_name = PropNameWord::new(foo, PropertyKind::Provides, VersionRelation::Equal).unwrap();
    let prop = PropertyRecord {
        name: prop_name,
        version: ver,
        packages: RefWord::offset(0).unwrap(),
    };
    let properties = encode_properties(&[prop]);

    let package_pool = encode_ref_list(&[0]).unwrap();

    [
        pool.as_bytes().to_vec(),
        packages,
        properties,
        Vec::new(),
        package_pool,
        Vec::new(),
        Vec::new(),
    ]
}

#[test]
fn test_owned_roundtrip_queries() {
    let set = Set::from_sections(sample_sections());
    assert_eq!(set.package_count(), 1);
    let pkg = set.package(0);
    assert_eq!(set.string(pkg.name), "foo");
    assert_eq!(set.string(pkg.version), "1.0");

    assert_eq!(set.property_count(), 1);
    let prop = set.property(0);
    assert_eq!(prop.name.kind(), PropertyKind::Provides);
    assert_eq!(prop.name.relation(), VersionRelation::Equal);

    let pkgs = set.ref_list(SectionType::PackagePool, prop.packages);
    assert_eq!(pkgs, vec![0]);
}

#[test]
fn test_ref_list_none_is_empty() {
    let set = Set::from_sections(sample_sections());
    assert!(set.ref_list(SectionType::PackagePool, RefWord::NONE).is_empty());
}

#[test]
fn test_write_atomic_then_open_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.set");

    let set = Set::from_sections(sample_sections());
    set.write_atomic(&path).unwrap();

    let opened = Set::open(&path).unwrap();
    assert_eq!(opened.package_count(), 1);
    let pkg = opened.package(0);
    assert_eq!(opened.string(pkg.name), "foo");
    assert_eq!(opened.property_count(), 1);
    let prop = opened.property(0);
    assert_eq!(prop.name.kind(), PropertyKind::Provides);
}

#[test]
fn test_open_rejects_bad_magic_leniently() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.set");
    std::fs::write(&path, vec![0u8; PAGE_SIZE as usize]).unwrap();

    let opened = Set::open(&path).unwrap();
    assert_eq!(opened.package_count(), 0);
    assert_eq!(opened.property_count(), 0);
}
