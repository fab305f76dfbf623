use kbus_meta::Core::FixedFacts;
use kbus_meta::{Category, CategorySet, Fact, Metadata};
use std::sync::Arc;
use std::thread;

#[test]
fn test_parallel_builds_do_not_share_state() {
    let threads = 8;
    let mut handles = vec![];

    for t in 0..threads {
        handles.push(thread::spawn(move || {
            let facts = FixedFacts::new()
                .with_pid(1000 + t)
                .with_uid(t)
                .with_names([format!("org.example.Worker{t}")]);
            let mut meta = Metadata::new();
            for _ in 0..100 {
                meta.append(&facts, CategorySet::PID | CategorySet::UID | CategorySet::NAMES)
                    .unwrap();
            }
            (t, meta)
        }));
    }

    for h in handles {
        let (t, meta) = h.join().unwrap();
        assert_eq!(meta.items().len(), 3);
        assert_eq!(
            meta.find(Category::Pid).and_then(|i| i.fact()),
            Some(Fact::Pid(u64::from(1000 + t)))
        );
        assert_eq!(
            meta.find(Category::Uid).and_then(|i| i.fact()),
            Some(Fact::Uid(u64::from(t)))
        );
        let names: Vec<&str> = meta.names().iter().collect();
        assert_eq!(names, vec![format!("org.example.Worker{t}")]);
    }
}

#[test]
fn test_finished_metadata_is_readable_from_many_threads() {
    let facts = FixedFacts::new()
        .with_pid(42)
        .with_cmdline(["daemon", "--fork"])
        .with_names(["org.example.Shared"]);
    let mut meta = Metadata::new();
    meta.append(&facts, CategorySet::all()).unwrap();

    // single writer done: hand off read-only
    let meta = Arc::new(meta);
    let expected = meta.items().as_bytes().to_vec();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let meta = Arc::clone(&meta);
            let expected = expected.clone();
            thread::spawn(move || {
                for _ in 0..1000 {
                    assert_eq!(meta.items().as_bytes(), &expected[..]);
                    assert_eq!(meta.facts().count(), 3);
                    assert_eq!(meta.names().count(), 1);
                }
            })
        })
        .collect();

    for r in readers {
        r.join().unwrap();
    }
}
