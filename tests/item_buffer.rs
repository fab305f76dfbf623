use kbus_meta::Meta::Items::layout::DEFAULT_BLOCK_SIZE;
use kbus_meta::Meta::Items::{ItemBuffer, ItemIter};
use kbus_meta::{Category, Fact, MetaError};

#[test]
fn test_new_buffer_allocates_nothing() {
    let buffer = ItemBuffer::new();
    assert_eq!(buffer.size(), 0);
    assert_eq!(buffer.allocated_size(), 0);
    assert!(buffer.is_empty());
    assert_eq!(buffer.items().count(), 0);
}

#[test]
fn test_items_are_aligned_and_in_append_order() {
    let mut buffer = ItemBuffer::new();
    let payloads: [&[u8]; 4] = [b"", b"a", b"abcdefgh", b"abcdefghi"];

    for (i, payload) in payloads.iter().enumerate() {
        let offset = buffer.append(0x2000 + i as u32, payload).unwrap();
        assert_eq!(offset % 8, 0, "offset {offset} not aligned");
    }

    let items: Vec<_> = buffer.items().collect();
    assert_eq!(items.len(), 4);
    for (i, item) in items.iter().enumerate() {
        assert_eq!(item.tag, 0x2000 + i as u32);
        assert_eq!(item.payload, payloads[i]);
        assert_eq!(item.offset % 8, 0);
    }
    assert_eq!(buffer.size() % 8, 0);
    assert!(buffer.size() <= buffer.allocated_size());
}

#[test]
fn test_iteration_is_restartable() {
    let mut buffer = ItemBuffer::new();
    buffer.append(1, b"one").unwrap();
    buffer.append(2, b"two").unwrap();

    let mut iter = buffer.items();
    let snapshot = iter.clone();
    assert_eq!(iter.next().map(|i| i.tag), Some(1));
    assert_eq!(iter.next().map(|i| i.tag), Some(2));
    assert!(iter.next().is_none());

    // a clone taken earlier and a fresh iterator both start over
    assert_eq!(snapshot.map(|i| i.tag).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(buffer.items().count(), 2);
}

#[test]
fn test_growth_is_geometric_with_block_floor() {
    let mut buffer = ItemBuffer::new();
    buffer.append(1, &[0u8; 8]).unwrap();
    assert_eq!(buffer.allocated_size(), DEFAULT_BLOCK_SIZE);

    // fill past the first block: next reservation doubles
    while buffer.size() + 16 <= DEFAULT_BLOCK_SIZE {
        buffer.append(1, &[0u8; 8]).unwrap();
    }
    assert_eq!(buffer.allocated_size(), DEFAULT_BLOCK_SIZE);
    buffer.append(1, &[0u8; 8]).unwrap();
    assert_eq!(buffer.allocated_size(), DEFAULT_BLOCK_SIZE * 2);

    // a single large item jumps straight to what it needs
    let big = vec![7u8; DEFAULT_BLOCK_SIZE * 8];
    let before = buffer.size();
    buffer.append(2, &big).unwrap();
    assert_eq!(buffer.allocated_size(), before + 8 + big.len());
}

#[test]
fn test_growth_failure_leaves_buffer_untouched() {
    let mut buffer = ItemBuffer::with_limits(16, 32);
    buffer.append(1, &[1u8; 8]).unwrap();
    buffer.append(2, &[2u8; 8]).unwrap();
    assert_eq!(buffer.size(), 32);
    assert_eq!(buffer.allocated_size(), 32);

    let before = buffer.as_bytes().to_vec();
    let err = buffer.append(3, &[3u8; 8]).unwrap_err();
    assert!(matches!(err, MetaError::Allocation { requested: 48, limit: 32 }));
    assert!(err.is_retryable());

    assert_eq!(buffer.as_bytes(), &before[..]);
    assert_eq!(buffer.len(), 2);
    assert_eq!(buffer.allocated_size(), 32);
    assert_eq!(buffer.items().count(), 2);
}

#[test]
fn test_reserve_respects_limit() {
    let mut buffer = ItemBuffer::with_limits(64, 128);
    buffer.reserve(100).unwrap();
    assert!(buffer.allocated_size() >= 100);
    assert!(buffer.allocated_size() <= 128);
    assert!(buffer.reserve(129).is_err());
}

#[test]
fn test_append_fact_matches_manual_encoding() {
    let fact = Fact::Cmdline(vec!["bus-daemon".into(), "--system".into()]);

    let mut typed = ItemBuffer::new();
    typed.append_fact(&fact).unwrap();

    let mut payload = Vec::new();
    fact.encode(&mut payload);
    let mut manual = ItemBuffer::new();
    manual.append(Category::Cmdline.tag(), &payload).unwrap();

    assert_eq!(typed.as_bytes(), manual.as_bytes());
    assert_eq!(payload.len(), fact.payload_len());

    let item = typed.items().next().unwrap();
    assert_eq!(item.category(), Some(Category::Cmdline));
    assert_eq!(item.fact(), Some(fact));
}

#[test]
fn test_iter_over_raw_bytes_stops_at_truncation() {
    let mut buffer = ItemBuffer::new();
    buffer.append(1, b"complete").unwrap();
    buffer.append(2, b"cut short").unwrap();

    let bytes = buffer.as_bytes();
    let truncated = &bytes[..bytes.len() - 12];
    let tags: Vec<u32> = ItemIter::over(truncated).map(|i| i.tag).collect();
    assert_eq!(tags, vec![1]);
}

#[test]
fn test_free_is_idempotent() {
    let mut never_used = ItemBuffer::new();
    never_used.free();
    never_used.free();
    assert_eq!(never_used.allocated_size(), 0);

    let mut buffer = ItemBuffer::new();
    buffer.append(1, b"x").unwrap();
    buffer.free();
    assert_eq!(buffer.size(), 0);
    assert_eq!(buffer.allocated_size(), 0);
    assert!(buffer.is_empty());
    buffer.free();

    // still usable after free
    buffer.append(1, b"y").unwrap();
    assert_eq!(buffer.items().count(), 1);
}
