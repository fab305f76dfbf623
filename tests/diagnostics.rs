// DiagnosticEndpoint publishing and teardown.
use kbus_meta::Core::monitor::ENDPOINT_NAME;
use kbus_meta::Core::{DiagnosticEndpoint, FixedFacts};
use kbus_meta::{CategorySet, Metadata};
use std::fs;
use std::os::unix::fs::PermissionsExt;

#[test]
fn test_create_publishes_zeroed_counters() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = DiagnosticEndpoint::create(dir.path()).unwrap();

    let path = endpoint.path().unwrap();
    assert_eq!(path, dir.path().join(ENDPOINT_NAME));
    assert_eq!(fs::read_to_string(&path).unwrap(), "captures 0\nitems 0\n");

    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o400);
    assert!(!dir.path().join("kbusinfo.tmp").exists());
}

#[test]
fn test_record_and_publish() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = DiagnosticEndpoint::create(dir.path()).unwrap();
    let facts = FixedFacts::new().with_pid(1).with_uid(2);

    let mut meta = Metadata::new();
    let before = meta.attached();
    meta.append(&facts, CategorySet::PID | CategorySet::UID | CategorySet::EXE)
        .unwrap();
    endpoint.record(meta.attached() - before);
    endpoint.record(CategorySet::empty());

    assert_eq!(endpoint.captures(), 2);
    assert_eq!(endpoint.items(), 2);

    // counters change only in memory until published
    let path = endpoint.path().unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "captures 0\nitems 0\n");
    endpoint.publish().unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "captures 2\nitems 2\n");

    let mut dumped = Vec::new();
    endpoint.dump(&mut dumped).unwrap();
    assert_eq!(dumped, b"captures 2\nitems 2\n");
}

#[test]
fn test_remove_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = DiagnosticEndpoint::create(dir.path()).unwrap();
    let path = endpoint.path().unwrap();

    endpoint.remove().unwrap();
    assert!(!path.exists());
    assert_eq!(endpoint.path(), None);
    endpoint.remove().unwrap();

    // publishing after removal does not resurrect the file
    endpoint.record(CategorySet::PID);
    endpoint.publish().unwrap();
    assert!(!path.exists());
}

#[test]
fn test_drop_removes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = {
        let endpoint = DiagnosticEndpoint::create(dir.path()).unwrap();
        endpoint.path().unwrap()
    };
    assert!(!path.exists());
}

#[test]
fn test_file_already_gone() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = DiagnosticEndpoint::create(dir.path()).unwrap();
    fs::remove_file(endpoint.path().unwrap()).unwrap();
    endpoint.remove().unwrap();
}

#[test]
fn test_create_in_missing_dir_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    assert!(DiagnosticEndpoint::create(&missing).is_err());
}
