use crate::Core::error::MetaError;
use crate::Core::procfs::ProcessFacts;
use crate::Meta::Structs::CategorySet;
use crate::Meta::{MetaBuilder, Metadata};
use std::ptr;

// Error codes
const KBUS_SUCCESS: i32 = 0;
const KBUS_ERROR_NULL_POINTER: i32 = -1;
const KBUS_ERROR_INVALID_ARG: i32 = -2;
const KBUS_ERROR_ALLOCATION_FAILED: i32 = -3;
const KBUS_ERROR_CONTEXT_GONE: i32 = -4;
const KBUS_ERROR_INTERNAL: i32 = -6;

/// Handle to a metadata object (opaque pointer)
pub struct MetaHandle {
    inner: Metadata,
}

fn error_code(err: &MetaError) -> i32 {
    match err {
        MetaError::Allocation { .. } => KBUS_ERROR_ALLOCATION_FAILED,
        MetaError::Context(_) => KBUS_ERROR_CONTEXT_GONE,
        MetaError::InvalidName(_) | MetaError::UnknownCategory(_) => KBUS_ERROR_INVALID_ARG,
        MetaError::Io(_) => KBUS_ERROR_INTERNAL,
    }
}

// -----------------------------------------------------------------------------
// Lifecycle
// -----------------------------------------------------------------------------

/// Create an empty metadata object.
///
/// # Arguments
/// * `max_size` - Item buffer limit in bytes, 0 for the default.
///
/// # Returns
/// * Pointer to `MetaHandle`, or NULL on failure.
#[no_mangle]
pub extern "C" fn kbus_meta_new(max_size: usize) -> *mut MetaHandle {
    let mut builder = MetaBuilder::new();
    if max_size > 0 {
        builder = builder.with_max_size(max_size);
    }
    match builder.build() {
        Ok(meta) => Box::into_raw(Box::new(MetaHandle { inner: meta })),
        Err(e) => {
            log::warn!("FFI Error: Failed to build metadata: {}", e);
            ptr::null_mut()
        }
    }
}

/// Release the item buffer and names snapshot of a metadata object.
///
/// The handle stays valid. Calling this twice is harmless.
#[no_mangle]
pub extern "C" fn kbus_meta_free(handle: *mut MetaHandle) {
    if !handle.is_null() {
        unsafe { (*handle).inner.free() };
    }
}

/// Destroy a metadata handle.
#[no_mangle]
pub extern "C" fn kbus_meta_destroy(handle: *mut MetaHandle) {
    if !handle.is_null() {
        unsafe {
            let _ = Box::from_raw(handle); // Dropped automatically
        }
    }
}

// -----------------------------------------------------------------------------
// Capture
// -----------------------------------------------------------------------------

/// Capture metadata of the calling process and thread.
///
/// # Arguments
/// * `handle` - Pointer to `MetaHandle`.
/// * `which` - Category bit mask; unknown bits are ignored.
///
/// # Returns
/// * 0 on success, negative error code otherwise.
#[no_mangle]
pub extern "C" fn kbus_meta_append_self(handle: *mut MetaHandle, which: u64) -> i32 {
    if handle.is_null() {
        return KBUS_ERROR_NULL_POINTER;
    }
    let meta = unsafe { &mut (*handle).inner };
    let facts = ProcessFacts::current();
    match meta.append(&facts, CategorySet::from_bits_truncate(which)) {
        Ok(()) => KBUS_SUCCESS,
        Err(e) => error_code(&e),
    }
}

/// Capture metadata of another process.
#[no_mangle]
pub extern "C" fn kbus_meta_append_pid(handle: *mut MetaHandle, pid: u32, which: u64) -> i32 {
    if handle.is_null() {
        return KBUS_ERROR_NULL_POINTER;
    }
    if pid == 0 {
        return KBUS_ERROR_INVALID_ARG;
    }
    let meta = unsafe { &mut (*handle).inner };
    let facts = ProcessFacts::for_pid(pid);
    match meta.append(&facts, CategorySet::from_bits_truncate(which)) {
        Ok(()) => KBUS_SUCCESS,
        Err(e) => error_code(&e),
    }
}

// -----------------------------------------------------------------------------
// Read back
// -----------------------------------------------------------------------------

/// Attachment mask of the object, 0 for a NULL handle.
#[no_mangle]
pub extern "C" fn kbus_meta_attached(handle: *const MetaHandle) -> u64 {
    if handle.is_null() {
        return 0;
    }
    unsafe { (*handle).inner.attached().bits() }
}

/// Used bytes of the item buffer, 0 for a NULL handle.
#[no_mangle]
pub extern "C" fn kbus_meta_size(handle: *const MetaHandle) -> usize {
    if handle.is_null() {
        return 0;
    }
    unsafe { (*handle).inner.size() }
}

/// Borrow the packed item bytes.
///
/// # Arguments
/// * `handle` - Pointer to `MetaHandle`.
/// * `out_len` - Output: number of bytes.
///
/// # Returns
/// * Pointer valid until the next append, free or destroy; NULL on error.
#[no_mangle]
pub extern "C" fn kbus_meta_items(handle: *const MetaHandle, out_len: *mut usize) -> *const u8 {
    if handle.is_null() || out_len.is_null() {
        return ptr::null();
    }
    let bytes = unsafe { (*handle).inner.items().as_bytes() };
    unsafe { *out_len = bytes.len() };
    bytes.as_ptr()
}

/// Borrow the owned-names snapshot blob (NUL-separated names).
#[no_mangle]
pub extern "C" fn kbus_meta_names(handle: *const MetaHandle, out_len: *mut usize) -> *const u8 {
    if handle.is_null() || out_len.is_null() {
        return ptr::null();
    }
    let bytes = unsafe { (*handle).inner.names().as_bytes() };
    unsafe { *out_len = bytes.len() };
    bytes.as_ptr()
}
