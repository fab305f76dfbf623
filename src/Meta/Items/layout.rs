/// Every item starts at a multiple of this many bytes.
pub const ITEM_ALIGN: usize = 8;

/// Minimum step the item buffer grows by.
pub const DEFAULT_BLOCK_SIZE: usize = 512;

/// Upper bound for one item buffer unless configured otherwise (8 MiB).
pub const DEFAULT_MAX_SIZE: usize = 8 * 1024 * 1024;

/// Header that precedes every item payload.
///
/// This struct documents the wire layout; the buffer writes its fields
/// little-endian, so it is never transmuted from buffer bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemHeader {
    /// Category tag (see `Category::tag`).
    pub tag: u32,

    /// Exact payload length, excluding header and padding.
    pub payload_len: u32,
}

impl ItemHeader {
    pub const SIZE: usize = std::mem::size_of::<ItemHeader>();

    pub(crate) fn to_le_bytes(self) -> [u8; Self::SIZE] {
        let mut raw = [0u8; Self::SIZE];
        raw[..4].copy_from_slice(&self.tag.to_le_bytes());
        raw[4..].copy_from_slice(&self.payload_len.to_le_bytes());
        raw
    }

    pub(crate) fn from_le_bytes(raw: &[u8]) -> Option<Self> {
        if raw.len() < Self::SIZE {
            return None;
        }
        let mut tag = [0u8; 4];
        let mut len = [0u8; 4];
        tag.copy_from_slice(&raw[..4]);
        len.copy_from_slice(&raw[4..8]);
        Some(Self {
            tag: u32::from_le_bytes(tag),
            payload_len: u32::from_le_bytes(len),
        })
    }
}

/// Round `n` up to the next item boundary.
#[inline]
pub const fn align_item(n: usize) -> usize {
    (n + ITEM_ALIGN - 1) & !(ITEM_ALIGN - 1)
}

/// Total bytes one item with `payload_len` payload bytes occupies.
#[inline]
pub const fn item_stride(payload_len: usize) -> usize {
    align_item(ItemHeader::SIZE + payload_len)
}
