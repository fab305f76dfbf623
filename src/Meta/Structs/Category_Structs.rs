// Metadata categories and the attachment mask over them

use crate::Core::error::MetaError;
use bitflags::bitflags;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// First wire tag used by metadata items. Category `i` is tagged `TAG_BASE + i`.
pub const TAG_BASE: u32 = 0x1000;

/// One kind of fact about a sending connection.
///
/// The discriminant is the category's index: it fixes both the bit in
/// [`CategorySet`] and the wire tag of its items.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Timestamp = 0,
    Pid = 1,
    Tid = 2,
    Uid = 3,
    Gid = 4,
    AuxGroups = 5,
    Caps = 6,
    SecLabel = 7,
    Cgroup = 8,
    Exe = 9,
    Cmdline = 10,
    Comm = 11,
    Description = 12,
    Audit = 13,
    Names = 14,
}

bitflags! {
    /// Attachment mask: one bit per [`Category`].
    #[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct CategorySet: u64 {
        const TIMESTAMP   = 1 << 0;
        const PID         = 1 << 1;
        const TID         = 1 << 2;
        const UID         = 1 << 3;
        const GID         = 1 << 4;
        const AUX_GROUPS  = 1 << 5;
        const CAPS        = 1 << 6;
        const SECLABEL    = 1 << 7;
        const CGROUP      = 1 << 8;
        const EXE         = 1 << 9;
        const CMDLINE     = 1 << 10;
        const COMM        = 1 << 11;
        const DESCRIPTION = 1 << 12;
        const AUDIT       = 1 << 13;
        const NAMES       = 1 << 14;

        /// Process and thread ids plus user/group credentials.
        const CREDS = Self::PID.bits() | Self::TID.bits() | Self::UID.bits()
            | Self::GID.bits() | Self::AUX_GROUPS.bits();
    }
}

lazy_static! {
    static ref CATEGORY_BY_NAME: HashMap<&'static str, Category> = {
        let mut m = HashMap::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            m.insert(category.name(), category);
        }
        m
    };
}

impl Category {
    /// Every known category in canonical (wire) order.
    pub const ALL: [Category; 15] = [
        Category::Timestamp,
        Category::Pid,
        Category::Tid,
        Category::Uid,
        Category::Gid,
        Category::AuxGroups,
        Category::Caps,
        Category::SecLabel,
        Category::Cgroup,
        Category::Exe,
        Category::Cmdline,
        Category::Comm,
        Category::Description,
        Category::Audit,
        Category::Names,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The single-bit set for this category.
    #[inline]
    pub fn flag(self) -> CategorySet {
        CategorySet::from_bits_truncate(1 << self.index())
    }

    /// Wire tag of this category's items.
    #[inline]
    pub fn tag(self) -> u32 {
        TAG_BASE + self as u32
    }

    pub fn from_tag(tag: u32) -> Option<Self> {
        let index = tag.checked_sub(TAG_BASE)? as usize;
        Self::ALL.get(index).copied()
    }

    /// Lowercase name used in configuration strings.
    pub fn name(self) -> &'static str {
        match self {
            Category::Timestamp => "timestamp",
            Category::Pid => "pid",
            Category::Tid => "tid",
            Category::Uid => "uid",
            Category::Gid => "gid",
            Category::AuxGroups => "groups",
            Category::Caps => "caps",
            Category::SecLabel => "seclabel",
            Category::Cgroup => "cgroup",
            Category::Exe => "exe",
            Category::Cmdline => "cmdline",
            Category::Comm => "comm",
            Category::Description => "description",
            Category::Audit => "audit",
            Category::Names => "names",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = MetaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CATEGORY_BY_NAME
            .get(s.trim().to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| MetaError::UnknownCategory(s.trim().to_string()))
    }
}

impl From<Category> for CategorySet {
    fn from(category: Category) -> Self {
        category.flag()
    }
}

impl FromIterator<Category> for CategorySet {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        iter.into_iter()
            .fold(CategorySet::empty(), |set, c| set | c.flag())
    }
}

impl CategorySet {
    /// Whether `category` is a member of this set.
    #[inline]
    pub fn has(&self, category: Category) -> bool {
        self.contains(category.flag())
    }

    /// Iterate the member categories in canonical order.
    ///
    /// The iterator borrows nothing and allocates nothing.
    pub fn categories(self) -> impl Iterator<Item = Category> + Clone {
        Category::ALL.into_iter().filter(move |c| self.has(*c))
    }

    /// Parse a category list such as `"pid,uid|names"`.
    ///
    /// Names are case-insensitive and may be separated by commas, pipes or
    /// whitespace. `all` and `none` are accepted as shorthands.
    pub fn parse(list: &str) -> Result<Self, MetaError> {
        let mut set = CategorySet::empty();
        for word in list
            .split(|c: char| c == ',' || c == '|' || c.is_whitespace())
            .filter(|w| !w.is_empty())
        {
            match word.to_ascii_lowercase().as_str() {
                "all" => set |= CategorySet::all(),
                "none" => {}
                _ => set |= word.parse::<Category>()?.flag(),
            }
        }
        Ok(set)
    }
}

impl fmt::Debug for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.categories()).finish()
    }
}

impl fmt::Display for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for category in self.categories() {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(category.name())?;
            first = false;
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}
