// C ABI surface exercised from Rust.
use kbus_meta::ffi::*;
use kbus_meta::{Category, CategorySet};
use std::ptr;

#[test]
fn test_lifecycle() {
    let handle = kbus_meta_new(0);
    assert!(!handle.is_null());
    assert_eq!(kbus_meta_attached(handle), 0);
    assert_eq!(kbus_meta_size(handle), 0);

    let which = (CategorySet::PID | CategorySet::NAMES).bits();
    assert_eq!(kbus_meta_append_self(handle, which), 0);
    assert_eq!(kbus_meta_attached(handle), which);
    assert!(kbus_meta_size(handle) > 0);

    let mut len = 0usize;
    let items = kbus_meta_items(handle, &mut len);
    assert!(!items.is_null());
    assert_eq!(len, kbus_meta_size(handle));
    let bytes = unsafe { std::slice::from_raw_parts(items, len) };
    assert_eq!(&bytes[..4], &Category::Pid.tag().to_le_bytes());

    // the current process owns no names: captured but empty
    let mut names_len = 1usize;
    kbus_meta_names(handle, &mut names_len);
    assert_eq!(names_len, 0);

    kbus_meta_free(handle);
    kbus_meta_free(handle);
    assert_eq!(kbus_meta_attached(handle), 0);
    assert_eq!(kbus_meta_size(handle), 0);

    // still usable after free
    assert_eq!(kbus_meta_append_self(handle, CategorySet::UID.bits()), 0);
    assert_eq!(kbus_meta_attached(handle), CategorySet::UID.bits());

    kbus_meta_destroy(handle);
}

#[test]
fn test_unknown_bits_are_ignored() {
    let handle = kbus_meta_new(0);
    let which = CategorySet::PID.bits() | (1 << 40);
    assert_eq!(kbus_meta_append_self(handle, which), 0);
    assert_eq!(kbus_meta_attached(handle), CategorySet::PID.bits());
    kbus_meta_destroy(handle);
}

#[test]
fn test_other_process() {
    let handle = kbus_meta_new(0);
    assert!(kbus_meta_append_pid(handle, 0, CategorySet::PID.bits()) < 0);
    assert_eq!(
        kbus_meta_append_pid(handle, std::process::id(), CategorySet::PID.bits()),
        0
    );
    assert_eq!(kbus_meta_attached(handle), CategorySet::PID.bits());
    kbus_meta_destroy(handle);
}

#[test]
fn test_tight_limit_reports_allocation() {
    // room for nothing but tiny items
    let handle = kbus_meta_new(8);
    assert!(!handle.is_null());
    assert!(kbus_meta_append_self(handle, CategorySet::PID.bits()) < 0);
    assert_eq!(kbus_meta_attached(handle), 0);
    kbus_meta_destroy(handle);
}

#[test]
fn test_null_handles() {
    let null = ptr::null_mut();
    assert!(kbus_meta_append_self(null, 1) < 0);
    assert!(kbus_meta_append_pid(null, 1, 1) < 0);
    assert_eq!(kbus_meta_attached(null), 0);
    assert_eq!(kbus_meta_size(null), 0);

    let mut len = 0usize;
    assert!(kbus_meta_items(null, &mut len).is_null());
    assert!(kbus_meta_names(null, &mut len).is_null());

    let handle = kbus_meta_new(0);
    assert!(kbus_meta_items(handle, ptr::null_mut()).is_null());
    kbus_meta_destroy(handle);

    kbus_meta_free(null);
    kbus_meta_destroy(null);
}
