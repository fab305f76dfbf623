// Owned-names snapshot kept beside the item buffer

use crate::Core::error::MetaError;

/// Longest blob a snapshot holds; its length travels as a `u32`.
pub const NAMES_MAX_LEN: usize = u32::MAX as usize;

/// Whether `name` survives the NUL-separated blob unchanged.
pub fn is_representable(name: &str) -> bool {
    !name.is_empty() && !name.as_bytes().contains(&0)
}

/// Well-known bus names owned by the sender when the names category was
/// first captured.
///
/// The blob is the concatenation of every name followed by a NUL byte. Once
/// captured the snapshot never changes; it is only ever released as a whole.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct NameSnapshot {
    pub(crate) blob: Option<Box<[u8]>>,
    pub(crate) count: u32,
}

impl NameSnapshot {
    /// Snapshot that was never captured.
    pub const fn new() -> Self {
        Self {
            blob: None,
            count: 0,
        }
    }

    /// Build a snapshot from the given names.
    ///
    /// The blob is allocated with a fallible reservation so memory pressure
    /// surfaces as [`MetaError::Allocation`] instead of aborting. Empty names
    /// and names containing NUL cannot be represented and give
    /// [`MetaError::InvalidName`].
    pub fn capture<I, S>(names: I) -> Result<Self, MetaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::capture_with_limit(names, NAMES_MAX_LEN)
    }

    /// [`NameSnapshot::capture`] with a cap on the blob length in bytes.
    pub fn capture_with_limit<I, S>(names: I, limit: usize) -> Result<Self, MetaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let limit = limit.min(NAMES_MAX_LEN);
        let mut blob: Vec<u8> = Vec::new();
        let mut count: u32 = 0;
        for name in names {
            let name = name.as_ref();
            if !is_representable(name) {
                return Err(MetaError::InvalidName(name.escape_debug().to_string()));
            }
            let needed = name.len() + 1;
            let requested = blob.len().saturating_add(needed);
            if requested > limit || count == u32::MAX {
                return Err(MetaError::Allocation { requested, limit });
            }
            blob.try_reserve(needed)
                .map_err(|_| MetaError::Allocation { requested, limit })?;
            blob.extend_from_slice(name.as_bytes());
            blob.push(0);
            count += 1;
        }
        Ok(Self {
            blob: Some(blob.into_boxed_slice()),
            count,
        })
    }

    /// Whether a capture happened, even one that found no names.
    #[inline]
    pub fn is_captured(&self) -> bool {
        self.blob.is_some()
    }

    /// Byte length of the blob.
    #[inline]
    pub fn len(&self) -> usize {
        self.blob.as_ref().map_or(0, |b| b.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of names in the snapshot.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// The raw blob handed to the message framer.
    pub fn as_bytes(&self) -> &[u8] {
        self.blob.as_deref().unwrap_or(&[])
    }

    /// Iterate the captured names in capture order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + Clone + '_ {
        self.as_bytes()
            .split(|b| *b == 0)
            .filter(|name| !name.is_empty())
            .filter_map(|name| std::str::from_utf8(name).ok())
    }

    /// Drop the blob. Safe on a snapshot that was never captured.
    pub fn release(&mut self) {
        self.blob = None;
        self.count = 0;
    }
}
