// Per-category capture policy

use crate::Meta::Structs::Category_Structs::{Category, CategorySet};

/// Decides whether a category may be captured for the connection at hand.
///
/// A refusal is treated exactly like an unavailable fact: no item, no mask bit.
pub trait CapturePolicy {
    fn may_capture(&self, category: Category) -> bool;
}

/// Policy that allows every category.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl CapturePolicy for AllowAll {
    #[inline]
    fn may_capture(&self, _category: Category) -> bool {
        true
    }
}

/// A category set acts as an allow-list.
impl CapturePolicy for CategorySet {
    #[inline]
    fn may_capture(&self, category: Category) -> bool {
        self.has(category)
    }
}

impl<F> CapturePolicy for F
where
    F: Fn(Category) -> bool,
{
    fn may_capture(&self, category: Category) -> bool {
        self(category)
    }
}
