use super::metadata::Metadata;
use super::Items::layout::{DEFAULT_BLOCK_SIZE, DEFAULT_MAX_SIZE};
use super::Items::ItemBuffer;
use super::Structs::CategorySet;
use crate::Core::error::MetaError;

pub struct MetaBuilder {
    block_size: usize,
    initial_capacity: usize,
    max_size: usize,
    defaults: CategorySet,
}

impl Default for MetaBuilder {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            initial_capacity: 0, // allocate on first append
            max_size: DEFAULT_MAX_SIZE,
            defaults: CategorySet::TIMESTAMP | CategorySet::CREDS,
        }
    }
}

impl MetaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum growth step of the item buffer.
    pub fn with_block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    /// Bytes to reserve up front.
    pub fn with_initial_capacity(mut self, size: usize) -> Self {
        self.initial_capacity = size;
        self
    }

    /// Hard limit of the item buffer; growing past it is an allocation failure.
    pub fn with_max_size(mut self, size: usize) -> Self {
        self.max_size = size;
        self
    }

    /// Categories captured by `Metadata::append_defaults`.
    pub fn with_default_categories(mut self, categories: CategorySet) -> Self {
        self.defaults = categories;
        self
    }

    /// Same as [`MetaBuilder::with_default_categories`], from a list such as `"pid,uid,names"`.
    pub fn with_default_categories_str(self, list: &str) -> Result<Self, MetaError> {
        let categories = CategorySet::parse(list)?;
        Ok(self.with_default_categories(categories))
    }

    pub fn build(self) -> Result<Metadata, MetaError> {
        let mut items = ItemBuffer::with_limits(self.block_size, self.max_size);
        if self.initial_capacity > 0 {
            items.reserve(self.initial_capacity)?;
        }
        Ok(Metadata::from_parts(items, self.defaults))
    }
}
