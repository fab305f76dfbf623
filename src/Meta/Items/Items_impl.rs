use super::layout::{item_stride, ItemHeader, DEFAULT_BLOCK_SIZE, DEFAULT_MAX_SIZE, ITEM_ALIGN};
use super::Items::{Item, ItemBuffer, ItemIter};
use crate::Core::error::MetaError;
use crate::Meta::Structs::Fact_Structs::Fact;

impl Default for ItemBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemBuffer {
    /// Empty buffer with the default growth policy. Allocates nothing.
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_BLOCK_SIZE, DEFAULT_MAX_SIZE)
    }

    /// Empty buffer growing in steps of at least `block_size` bytes and never
    /// beyond `max_size` bytes. Both are rounded to the item alignment.
    pub fn with_limits(block_size: usize, max_size: usize) -> Self {
        Self {
            data: Vec::new(),
            allocated_size: 0,
            block_size: block_size.max(ITEM_ALIGN) & !(ITEM_ALIGN - 1),
            max_size: max_size & !(ITEM_ALIGN - 1),
            count: 0,
        }
    }

    /// Used bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Bytes reserved so far.
    #[inline]
    pub fn allocated_size(&self) -> usize {
        self.allocated_size
    }

    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Change the growth limit, e.g. to retry after an allocation failure.
    ///
    /// Rounded down to the item alignment and never below the bytes already
    /// reserved. Committed items are not touched.
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = (max_size & !(ITEM_ALIGN - 1)).max(self.allocated_size);
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of items in the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Packed wire bytes of every item.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Make sure `additional` more bytes fit without further growth.
    pub fn reserve(&mut self, additional: usize) -> Result<(), MetaError> {
        let required = self
            .data
            .len()
            .checked_add(additional)
            .ok_or(MetaError::Allocation {
                requested: usize::MAX,
                limit: self.max_size,
            })?;
        self.grow_for(required)
    }

    /// Grow so that `required` bytes fit.
    ///
    /// The new size is the largest of `required`, twice the current size and
    /// one block, capped at `max_size`. On failure nothing changes.
    fn grow_for(&mut self, required: usize) -> Result<(), MetaError> {
        if required <= self.allocated_size {
            return Ok(());
        }
        if required > self.max_size {
            log::debug!(
                "[ItemBuffer::grow] {} bytes requested, limit is {}",
                required,
                self.max_size
            );
            return Err(MetaError::Allocation {
                requested: required,
                limit: self.max_size,
            });
        }

        let target = required
            .max(self.allocated_size.saturating_mul(2))
            .max(self.block_size)
            .min(self.max_size);

        self.data
            .try_reserve_exact(target - self.data.len())
            .map_err(|_| MetaError::Allocation {
                requested: target,
                limit: self.max_size,
            })?;

        log::debug!(
            "[ItemBuffer::grow] {} -> {} bytes",
            self.allocated_size,
            target
        );
        self.allocated_size = target;
        Ok(())
    }

    /// Append one item and return its offset.
    ///
    /// Either the whole item (header, payload, padding) becomes visible or,
    /// on error, nothing does.
    pub fn append(&mut self, tag: u32, payload: &[u8]) -> Result<usize, MetaError> {
        let offset = self.begin_item(tag, payload.len())?;
        self.data.extend_from_slice(payload);
        self.finish_item(offset, payload.len());
        Ok(offset)
    }

    /// Append a typed fact, encoding it straight into the buffer.
    pub fn append_fact(&mut self, fact: &Fact) -> Result<usize, MetaError> {
        let payload_len = fact.payload_len();
        let offset = self.begin_item(fact.category().tag(), payload_len)?;
        fact.encode(&mut self.data);
        self.finish_item(offset, payload_len);
        Ok(offset)
    }

    /// Reserve room for one item and write its header.
    fn begin_item(&mut self, tag: u32, payload_len: usize) -> Result<usize, MetaError> {
        let too_large = MetaError::Allocation {
            requested: payload_len.saturating_add(ItemHeader::SIZE),
            limit: self.max_size,
        };
        let wire_len = u32::try_from(payload_len).map_err(|_| too_large)?;

        let offset = self.data.len();
        let required = offset
            .checked_add(item_stride(payload_len))
            .ok_or(MetaError::Allocation {
                requested: usize::MAX,
                limit: self.max_size,
            })?;
        self.grow_for(required)?;

        let header = ItemHeader {
            tag,
            payload_len: wire_len,
        };
        self.data.extend_from_slice(&header.to_le_bytes());
        Ok(offset)
    }

    /// Zero-pad the item that starts at `offset` up to the next boundary.
    fn finish_item(&mut self, offset: usize, payload_len: usize) {
        debug_assert_eq!(self.data.len(), offset + ItemHeader::SIZE + payload_len);
        self.data.resize(offset + item_stride(payload_len), 0);
        self.count += 1;
    }

    /// Walk the items in append order.
    pub fn items(&self) -> ItemIter<'_> {
        ItemIter {
            bytes: &self.data,
            cursor: 0,
        }
    }

    /// Release the allocation and reset the bookkeeping.
    ///
    /// Safe to call on a buffer that never allocated, and more than once.
    pub fn free(&mut self) {
        self.data = Vec::new();
        self.allocated_size = 0;
        self.count = 0;
    }
}

impl<'a> ItemIter<'a> {
    /// Walk items packed in raw wire bytes, e.g. a received message.
    pub fn over(bytes: &'a [u8]) -> Self {
        Self { bytes, cursor: 0 }
    }
}

impl<'a> Iterator for ItemIter<'a> {
    type Item = Item<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.cursor;
        let header = ItemHeader::from_le_bytes(self.bytes.get(offset..)?)?;
        let start = offset + ItemHeader::SIZE;
        let end = start.checked_add(header.payload_len as usize)?;
        let payload = match self.bytes.get(start..end) {
            Some(payload) => payload,
            None => {
                // Truncated item: stop instead of reading past the end.
                self.cursor = self.bytes.len();
                return None;
            }
        };
        self.cursor = item_stride(header.payload_len as usize)
            .saturating_add(offset)
            .min(self.bytes.len());
        Some(Item {
            offset,
            tag: header.tag,
            payload,
        })
    }
}
