//! Tests for source loader module

use super::*;
use crate::config::DiscoveryConfig;
use crate::error::Error;
use crate::types::SourceKind;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

// ============================================================================
// Discovery Tests
// ============================================================================

#[test]
fn test_discover_maps_paths_to_dotted_names() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "acme/shop/Order.jschema", "{}");
    write(dir.path(), "acme/Customer.jschema", "{}");
    write(dir.path(), "acme/samples/Invoice.json", "{}");
    write(dir.path(), "acme/README.md", "ignored");

    let units = discover_sources(dir.path(), &DiscoveryConfig::default()).unwrap();
    let names: Vec<_> = units.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["acme.Customer", "acme.shop.Order", "acme.samples.Invoice"]);
    assert_eq!(units[2].kind, SourceKind::Json);
    assert!(matches!(units[0].source, ByteSource::File(_)));
}

#[test]
fn test_discover_lists_jschema_before_json() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a/A.json", "{}");
    write(dir.path(), "b/B.jschema", "{}");

    let units = discover_sources(dir.path(), &DiscoveryConfig::default()).unwrap();
    let kinds: Vec<_> = units.iter().map(|u| u.kind).collect();
    assert_eq!(kinds, vec![SourceKind::JSchema, SourceKind::Json]);
}

#[test]
fn test_discover_rejects_default_namespace() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Root.jschema", "{}");

    let err = discover_sources(dir.path(), &DiscoveryConfig::default()).unwrap_err();
    assert!(matches!(err, Error::DefaultNamespace { .. }));
}

#[test]
fn test_discover_skips_hidden() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), ".cache/x/Hidden.jschema", "{}");
    write(dir.path(), "ns/Visible.jschema", "{}");

    let units = discover_sources(dir.path(), &DiscoveryConfig::default()).unwrap();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].name, "ns.Visible");
}

#[test]
fn test_discover_custom_extensions() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "ns/Thing.schema", "{}");
    write(dir.path(), "ns/Other.jschema", "{}");

    let config = DiscoveryConfig {
        jschema_extension: "schema".to_string(),
        ..DiscoveryConfig::default()
    };
    let units = discover_sources(dir.path(), &config).unwrap();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].name, "ns.Thing");
}

#[test]
fn test_discover_missing_root() {
    let err = discover_sources(Path::new("/no/such/root"), &DiscoveryConfig::default())
        .unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}

#[test]
fn test_logical_name() {
    let root = Path::new("/schemas");
    assert_eq!(
        logical_name(root, Path::new("/schemas/a/b/C.jschema")).unwrap(),
        "a.b.C"
    );
    assert!(logical_name(root, Path::new("/schemas/C.jschema")).is_err());
}

// ============================================================================
// Source Unit Tests
// ============================================================================

#[test]
fn test_in_memory_source() {
    let unit = SourceUnit::jschema("acme.Widget", r#"{"name": "string"}"#);
    assert_eq!(unit.kind, SourceKind::JSchema);
    assert_eq!(unit.read_text().unwrap(), r#"{"name": "string"}"#);
}

#[cfg(unix)]
#[test]
fn test_discover_skips_symlinked_directories() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "acme/Order.jschema", "{}");
    std::os::unix::fs::symlink(dir.path(), dir.path().join("acme/loop")).unwrap();
    std::os::unix::fs::symlink(
        dir.path().join("acme/Order.jschema"),
        dir.path().join("acme/Alias.jschema"),
    )
    .unwrap();

    let units = discover_sources(dir.path(), &DiscoveryConfig::default()).unwrap();
    let names: Vec<&str> = units.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["acme.Alias", "acme.Order"]);
}

#[test]
fn test_file_source_read_lazily() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Late.jschema");
    let unit = SourceUnit::file("ns.Late", SourceKind::JSchema, &path);

    assert!(matches!(unit.read_text(), Err(Error::FileNotFound { .. })));
    fs::write(&path, "{}").unwrap();
    assert_eq!(unit.read_text().unwrap(), "{}");
}

#[test]
fn test_invalid_utf8() {
    let unit = SourceUnit::new(
        "ns.Bad",
        SourceKind::JSchema,
        ByteSource::Bytes(vec![0xff, 0xfe, 0x7b]),
    );
    let err = unit.read_text().unwrap_err();
    assert!(err.to_string().contains("not valid UTF-8"));
}
