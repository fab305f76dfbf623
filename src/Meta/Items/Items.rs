// Growable arena of tagged, length-prefixed, 8-byte aligned items

use crate::Meta::Structs::Category_Structs::Category;
use crate::Meta::Structs::Fact_Structs::Fact;

/// Byte buffer holding a packed sequence of items.
///
/// Layout of every item:
/// `{ u32 tag, u32 payload_len, payload, zero padding to the next 8-byte boundary }`.
///
/// The buffer knows nothing about what the items mean. It tracks its own
/// `allocated_size` instead of trusting `Vec::capacity`, so the growth policy
/// stays observable:
/// - `size <= allocated_size` at all times.
/// - `allocated_size` only grows until the buffer is freed.
pub struct ItemBuffer {
    /// Packed items. `data.len()` is the used size.
    pub(crate) data: Vec<u8>,

    /// Bytes reserved by the growth policy.
    pub(crate) allocated_size: usize,

    /// Minimum growth step in bytes.
    pub(crate) block_size: usize,

    /// Hard ceiling for `allocated_size`.
    pub(crate) max_size: usize,

    /// Number of items appended since the last free.
    pub(crate) count: usize,
}

/// One item read back from an [`ItemBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item<'a> {
    /// Byte offset of the item header inside the buffer. Always a multiple of 8.
    pub offset: usize,
    pub tag: u32,
    pub payload: &'a [u8],
}

impl<'a> Item<'a> {
    /// The category this item belongs to, if the tag is a known one.
    pub fn category(&self) -> Option<Category> {
        Category::from_tag(self.tag)
    }

    /// Typed view of the payload.
    pub fn fact(&self) -> Option<Fact> {
        Fact::decode(self.tag, self.payload)
    }
}

/// Lazy iterator over the items of a buffer, in append order.
///
/// Cloning the iterator, or asking the buffer for a new one, restarts the walk.
#[derive(Debug, Clone)]
pub struct ItemIter<'a> {
    pub(crate) bytes: &'a [u8],
    pub(crate) cursor: usize,
}
