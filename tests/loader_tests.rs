use dns_zone::config::ZoneOptions;
use dns_zone::error::LoadError;
use dns_zone::zone::{Dialect, load_file};
use std::fs;
use tempfile::TempDir;

const HEAD: &str = "$TTL 3600
@ IN SOA ns1 hostmaster 2024010101 16384 2048 604800 2560
@ IN NS ns1
ns1 IN A 192.0.2.53
";

fn owners(loaded: &dns_zone::LoadedZone) -> Vec<String> {
    loaded.records().map(|r| r.owner.clone()).collect()
}

#[test]
fn test_nested_includes_relative_to_including_file() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("parts")).unwrap();
    fs::write(dir.path().join("parts/hosts.db"), "web A 192.0.2.80\n$INCLUDE more.db\n").unwrap();
    fs::write(dir.path().join("parts/more.db"), "db A 192.0.2.81\n").unwrap();
    fs::write(
        dir.path().join("example.com"),
        format!("{}$INCLUDE parts/hosts.db\n", HEAD),
    )
    .unwrap();

    let loaded = load_file(dir.path().join("example.com"), Dialect::Bind, &ZoneOptions::default()).unwrap();
    let owners = owners(&loaded);
    assert!(owners.contains(&"web.example.com.".to_string()));
    assert!(owners.contains(&"db.example.com.".to_string()));
}

#[test]
fn test_origin_restored_after_include() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("lab.db"), "$ORIGIN lab\nbox A 192.0.2.90\n").unwrap();
    fs::write(
        dir.path().join("example.com"),
        format!("{}$INCLUDE lab.db\nafter A 192.0.2.91\n", HEAD),
    )
    .unwrap();

    let loaded = load_file(dir.path().join("example.com"), Dialect::Bind, &ZoneOptions::default()).unwrap();
    let owners = owners(&loaded);
    assert!(owners.contains(&"box.lab.example.com.".to_string()));
    assert!(owners.contains(&"after.example.com.".to_string()));
}

#[test]
fn test_configured_origin_wins_over_file_name() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db.zone");
    fs::write(&path, HEAD).unwrap();

    let mut options = ZoneOptions::default();
    options.set_origin("example.org");
    let loaded = load_file(&path, Dialect::Bind, &options).unwrap();
    assert_eq!(loaded.origin, "example.org.");
    assert_eq!(loaded.zone.soa().unwrap().owner, "example.org.");
}

#[test]
fn test_maradns_file_origin_from_name() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("example.net");
    fs::write(
        &path,
        "% SOA ns.% hostmaster@% 1 7200 3600 604800 1800 ~\n% NS ns.% ~\nns.% 192.0.2.1 ~\n",
    )
    .unwrap();

    let loaded = load_file(&path, Dialect::Maradns, &ZoneOptions::default()).unwrap();
    assert_eq!(loaded.origin, "example.net.");
    assert_eq!(loaded.zone.soa_data().unwrap().rname, "hostmaster.example.net.");
}

#[test]
fn test_missing_include_reports_path() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("example.com"),
        format!("{}$INCLUDE nowhere.db\n", HEAD),
    )
    .unwrap();

    let err = load_file(dir.path().join("example.com"), Dialect::Bind, &ZoneOptions::default()).unwrap_err();
    match err {
        LoadError::Io { path, .. } => assert!(path.ends_with("nowhere.db")),
        other => panic!("unexpected error: {}", other),
    }
}
