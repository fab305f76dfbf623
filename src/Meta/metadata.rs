// In src/Meta/metadata.rs
use super::collector::Collector;
use super::Items::{Item, ItemBuffer};
use super::Structs::{Category, CategorySet, Fact, NameSnapshot};
use crate::Core::error::MetaError;
use crate::Core::facts::ConnectionFactsProvider;
use crate::Core::gate::CapturePolicy;

/// Sender metadata of one message under construction.
///
/// Owns the item buffer, the attachment mask and the owned-names snapshot.
/// It is built by one thread through `&mut self` and is plain data afterwards,
/// so a finished object can be shared read-only with the thread that frames
/// the message.
///
/// Invariants:
/// - A bit is set in `attached` exactly when one item of that category is in
///   `items`.
/// - The names snapshot is captured at most once.
pub struct Metadata {
    pub(crate) attached: CategorySet,
    pub(crate) items: ItemBuffer,
    pub(crate) names: NameSnapshot,
    pub(crate) defaults: CategorySet,
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new()
    }
}

impl Metadata {
    /// Empty metadata with the default buffer limits. Allocates nothing.
    pub fn new() -> Self {
        Self::from_parts(ItemBuffer::new(), CategorySet::empty())
    }

    pub(crate) fn from_parts(items: ItemBuffer, defaults: CategorySet) -> Self {
        Self {
            attached: CategorySet::empty(),
            items,
            names: NameSnapshot::new(),
            defaults,
        }
    }

    /// Categories that already have an item.
    #[inline]
    pub fn attached(&self) -> CategorySet {
        self.attached
    }

    /// Categories captured by [`Metadata::append_defaults`].
    #[inline]
    pub fn defaults(&self) -> CategorySet {
        self.defaults
    }

    #[inline]
    pub fn items(&self) -> &ItemBuffer {
        &self.items
    }

    #[inline]
    pub fn names(&self) -> &NameSnapshot {
        &self.names
    }

    /// Used bytes of the item buffer.
    #[inline]
    pub fn size(&self) -> usize {
        self.items.size()
    }

    /// Reserved bytes of the item buffer.
    #[inline]
    pub fn allocated_size(&self) -> usize {
        self.items.allocated_size()
    }

    /// Growth limit of the item buffer.
    #[inline]
    pub fn max_size(&self) -> usize {
        self.items.max_size()
    }

    /// See [`ItemBuffer::set_max_size`].
    pub fn set_max_size(&mut self, max_size: usize) {
        self.items.set_max_size(max_size);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }

    /// Categories of `requested` that still have to be captured.
    #[inline]
    pub fn needed(&self, requested: CategorySet) -> CategorySet {
        (requested & CategorySet::all()).difference(self.attached)
    }

    /// Record that items for `categories` are committed. Bits never clear.
    #[inline]
    pub(crate) fn mark(&mut self, categories: CategorySet) {
        self.attached |= categories;
    }

    /// Capture every category of `which` not attached yet.
    ///
    /// Unavailable facts are skipped silently. Allocation failures and fatal
    /// context failures end the call early; categories committed before the
    /// failure stay attached.
    pub fn append(
        &mut self,
        conn: &dyn ConnectionFactsProvider,
        which: CategorySet,
    ) -> Result<(), MetaError> {
        Collector::new(conn).collect(self, which).map(|_| ())
    }

    /// [`Metadata::append`] with a policy gate consulted per category.
    pub fn append_with_policy(
        &mut self,
        conn: &dyn ConnectionFactsProvider,
        policy: &dyn CapturePolicy,
        which: CategorySet,
    ) -> Result<(), MetaError> {
        Collector::new(conn)
            .with_policy(policy)
            .collect(self, which)
            .map(|_| ())
    }

    /// Capture the configured default categories.
    pub fn append_defaults(&mut self, conn: &dyn ConnectionFactsProvider) -> Result<(), MetaError> {
        let defaults = self.defaults;
        self.append(conn, defaults)
    }

    /// The item of `category`, if attached.
    pub fn find(&self, category: Category) -> Option<Item<'_>> {
        if !self.attached.has(category) {
            return None;
        }
        self.items
            .items()
            .find(|item| item.category() == Some(category))
    }

    /// Typed view of every item, in append order.
    pub fn facts(&self) -> impl Iterator<Item = Fact> + '_ {
        self.items.items().filter_map(|item| item.fact())
    }

    /// Release the item buffer and the names snapshot.
    ///
    /// Safe on metadata that was never populated, and idempotent. The object
    /// stays usable; a later append starts from scratch.
    pub fn free(&mut self) {
        self.items.free();
        self.names.release();
        self.attached = CategorySet::empty();
    }
}
