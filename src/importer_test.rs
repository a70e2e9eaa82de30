use super::*;

#[test]
fn test_single_package_round_trip() {
    let mut imp = Importer::new(ImporterConfig::default());
    imp.begin_package("foo", "1.0").unwrap();
    imp.add_property(PropertyKind::Provides, "foo", "1.0", VersionRelation::Equal)
        .unwrap();
    imp.add_file("usr/bin/foo").unwrap();
    imp.finish_package().unwrap();

    let raw = imp.finish();
    assert_eq!(raw.packages.len(), 1);
    let pkg = &raw.packages[0];
    assert_eq!(raw.pool.get(pkg.name), "foo");
    assert_eq!(raw.pool.get(pkg.version), "1.0");
    assert_eq!(pkg.properties.len(), 1);
    assert_eq!(pkg.files, vec!["usr/bin/foo".to_string()]);
}

#[test]
fn test_add_property_without_begin_fails() {
    let mut imp = Importer::new(ImporterConfig::default());
    let err = imp
        .add_property(PropertyKind::Requires, "foo", "1.0", VersionRelation::GreaterOrEqual)
        .unwrap_err();
    assert!(err.to_string().contains("no package open"));
}

#[test]
fn test_finish_package_without_begin_fails() {
    let mut imp = Importer::new(ImporterConfig::default());
    assert!(imp.finish_package().is_err());
}

#[test]
fn test_leading_trailing_slashes_trimmed() {
    let mut imp = Importer::new(ImporterConfig::default());
    imp.begin_package("foo", "1.0").unwrap();
    imp.add_file("/usr/bin/foo/").unwrap();
    imp.finish_package().unwrap();
    let raw = imp.finish();
    assert_eq!(raw.packages[0].files, vec!["usr/bin/foo".to_string()]);
}

#[test]
fn test_multiple_packages_share_interned_strings() {
    let mut imp = Importer::new(ImporterConfig::default());
    imp.begin_package("foo", "1.0").unwrap();
    imp.finish_package().unwrap();
    imp.begin_package("bar", "1.0").unwrap();
    imp.finish_package().unwrap();

    let raw = imp.finish();
    assert_eq!(raw.packages[0].version, raw.packages[1].version);
}
