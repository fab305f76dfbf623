// LocalConnection: name ownership, closing, locked capture.
use kbus_meta::Core::connection::{is_valid_name, NAME_MAX_LEN};
use kbus_meta::Core::{LocalConnection, ProcessFacts};
use kbus_meta::{Category, CategorySet, ContextError, Fact, MetaError, Metadata};
use std::sync::Arc;
use std::thread;

fn connection() -> LocalConnection {
    LocalConnection::for_current_process(7).with_description("test peer")
}

#[test]
fn test_name_validation() {
    assert!(is_valid_name("org.example.Service"));
    assert!(is_valid_name("_a.-b"));
    assert!(is_valid_name("com.example.v2_api"));

    assert!(!is_valid_name(""));
    assert!(!is_valid_name("single"));
    assert!(!is_valid_name("org..example"));
    assert!(!is_valid_name(".org.example"));
    assert!(!is_valid_name("org.example."));
    assert!(!is_valid_name("org.2example"));
    assert!(!is_valid_name("org.exa mple"));
    assert!(!is_valid_name("org.exämple"));

    let long = format!("a.{}", "b".repeat(NAME_MAX_LEN));
    assert!(!is_valid_name(&long));
}

#[test]
fn test_acquire_and_release() {
    let conn = connection();
    assert!(conn.acquire_name("org.example.Alpha").unwrap());
    assert!(conn.acquire_name("org.example.Beta").unwrap());
    assert!(!conn.acquire_name("org.example.Alpha").unwrap());
    assert_eq!(conn.names(), vec!["org.example.Alpha", "org.example.Beta"]);

    assert!(conn.release_name("org.example.Alpha"));
    assert!(!conn.release_name("org.example.Alpha"));
    assert_eq!(conn.names(), vec!["org.example.Beta"]);

    let err = conn.acquire_name("not-a-name").unwrap_err();
    assert!(matches!(err, MetaError::InvalidName(ref n) if n == "not-a-name"));
}

#[test]
fn test_capture_includes_description_and_names() {
    let conn = connection();
    conn.acquire_name("org.example.Alpha").unwrap();
    conn.acquire_name("org.example.Beta").unwrap();

    let mut meta = Metadata::new();
    conn.capture(
        &mut meta,
        CategorySet::PID | CategorySet::DESCRIPTION | CategorySet::NAMES,
    )
    .unwrap();

    assert_eq!(
        meta.attached(),
        CategorySet::PID | CategorySet::DESCRIPTION | CategorySet::NAMES
    );
    assert_eq!(
        meta.find(Category::Pid).and_then(|i| i.fact()),
        Some(Fact::Pid(u64::from(std::process::id())))
    );
    assert_eq!(
        meta.find(Category::Description).and_then(|i| i.fact()),
        Some(Fact::Description("test peer".into()))
    );
    assert_eq!(
        meta.names().iter().collect::<Vec<_>>(),
        vec!["org.example.Alpha", "org.example.Beta"]
    );

    // names captured once; later changes are not picked up
    conn.release_name("org.example.Alpha");
    conn.capture(&mut meta, CategorySet::NAMES).unwrap();
    assert_eq!(meta.names().count(), 2);
}

#[test]
fn test_capture_with_policy() {
    let conn = connection();
    let hide_cmdline = |c: Category| c != Category::Cmdline;

    let mut meta = Metadata::new();
    conn.capture_with_policy(
        &mut meta,
        &hide_cmdline,
        CategorySet::PID | CategorySet::CMDLINE,
    )
    .unwrap();
    assert_eq!(meta.attached(), CategorySet::PID);
}

#[test]
fn test_closed_connection_is_fatal() {
    let conn = connection();
    conn.acquire_name("org.example.Alpha").unwrap();
    conn.close();

    assert!(conn.is_closed());
    assert!(conn.names().is_empty());
    assert!(matches!(
        conn.acquire_name("org.example.Beta"),
        Err(MetaError::Context(ContextError::Closed { id: 7 }))
    ));

    let mut meta = Metadata::new();
    let err = conn
        .capture(&mut meta, CategorySet::PID | CategorySet::NAMES)
        .unwrap_err();
    assert!(matches!(err, MetaError::Context(ContextError::Closed { id: 7 })));
    assert!(meta.attached().is_empty());
    assert!(meta.is_empty());
}

#[test]
fn test_view_holds_names_steady() {
    let conn = Arc::new(LocalConnection::new(9, ProcessFacts::current()));
    conn.acquire_name("org.example.Steady").unwrap();

    let view = conn.lock_facts();
    let writer = {
        let conn = Arc::clone(&conn);
        thread::spawn(move || conn.acquire_name("org.example.Late").unwrap())
    };

    let mut meta = Metadata::new();
    meta.append(&view, CategorySet::NAMES).unwrap();
    drop(view);
    assert!(writer.join().unwrap());

    assert_eq!(
        meta.names().iter().collect::<Vec<_>>(),
        vec!["org.example.Steady"]
    );
    assert_eq!(conn.names().len(), 2);
}

#[test]
fn test_debug_lists_names() {
    let conn = connection();
    conn.acquire_name("org.example.Alpha").unwrap();
    let shown = format!("{:?}", conn);
    assert!(shown.contains("LocalConnection"));
    assert!(shown.contains("org.example.Alpha"));
    assert!(shown.contains("test peer"));
}

#[test]
fn test_debug_inside_capture_window_with_queued_writer() {
    let conn = Arc::new(connection());
    conn.acquire_name("org.example.Alpha").unwrap();

    let view = conn.lock_facts();
    let writer = {
        let conn = Arc::clone(&conn);
        thread::spawn(move || conn.close())
    };
    // let the writer queue up behind the held read guard
    thread::sleep(std::time::Duration::from_millis(100));

    let shown = format!("{:?}", conn);
    assert!(shown.contains("org.example.Alpha"));
    assert!(shown.contains("closed: false"));
    assert_eq!(conn.names(), vec!["org.example.Alpha"]);
    assert!(!conn.is_closed());

    drop(view);
    writer.join().unwrap();
    assert!(conn.is_closed());
}
