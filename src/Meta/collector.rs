use super::metadata::Metadata;
use super::Structs::Name_Structs::{is_representable, NAMES_MAX_LEN};
use super::Structs::{Category, CategorySet, Fact, NameSnapshot};
use crate::Core::error::{ContextError, MetaError};
use crate::Core::facts::ConnectionFactsProvider;
use crate::Core::gate::{AllowAll, CapturePolicy};

/// Turns still-needed categories into items.
///
/// Per category, in canonical order:
/// - refused by the policy or unavailable: skipped, mask bit stays clear.
/// - available: one item appended, then the mask bit set.
/// - allocation or fatal context failure: the call stops and returns the error.
///   Categories committed earlier in the same call stay committed.
pub struct Collector<'a> {
    facts: &'a dyn ConnectionFactsProvider,
    policy: &'a dyn CapturePolicy,
}

impl<'a> Collector<'a> {
    pub fn new(facts: &'a dyn ConnectionFactsProvider) -> Self {
        Self {
            facts,
            policy: &AllowAll,
        }
    }

    pub fn with_policy(mut self, policy: &'a dyn CapturePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Capture `which` into `meta` and return the categories newly attached.
    pub fn collect(&self, meta: &mut Metadata, which: CategorySet) -> Result<CategorySet, MetaError> {
        let needed = meta.needed(which);
        let mut added = CategorySet::empty();

        for category in needed.categories() {
            if !self.policy.may_capture(category) {
                log::trace!("[Collector] {} refused by policy", category);
                continue;
            }

            match self.attach(meta, category) {
                Ok(true) => {
                    meta.mark(category.flag());
                    added |= category.flag();
                }
                Ok(false) => log::trace!("[Collector] {} unavailable, skipped", category),
                Err(err) => {
                    log::debug!(
                        "[Collector] capture aborted at {} (committed: {}): {}",
                        category,
                        added,
                        err
                    );
                    return Err(err);
                }
            }
        }

        Ok(added)
    }

    /// Append the item for one category. `Ok(false)` means unavailable.
    fn attach(&self, meta: &mut Metadata, category: Category) -> Result<bool, MetaError> {
        if category == Category::Names {
            return self.attach_names(meta);
        }
        match self.fetch(category)? {
            Some(fact) => {
                meta.items.append_fact(&fact)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Snapshot the owned names and append their marker item.
    ///
    /// Names the blob cannot carry are left out. The snapshot is only stored
    /// once the marker is in the buffer, so a failure leaves the object as it was.
    fn attach_names(&self, meta: &mut Metadata) -> Result<bool, MetaError> {
        let mut names = match self.facts.owned_names()? {
            Some(names) => names,
            None => return Ok(false),
        };
        names.retain(|name| {
            let keep = is_representable(name);
            if !keep {
                log::warn!("[Collector] dropping unrepresentable name {:?}", name);
            }
            keep
        });
        let snapshot = NameSnapshot::capture(&names)?;
        let len = u32::try_from(snapshot.len()).map_err(|_| MetaError::Allocation {
            requested: snapshot.len(),
            limit: NAMES_MAX_LEN,
        })?;
        let marker = Fact::Names {
            count: snapshot.count(),
            len,
        };
        meta.items.append_fact(&marker)?;
        meta.names = snapshot;
        Ok(true)
    }

    fn fetch(&self, category: Category) -> Result<Option<Fact>, ContextError> {
        let facts = self.facts;
        let fact = match category {
            Category::Timestamp => facts.timestamp()?.map(Fact::Timestamp),
            Category::Pid => facts.pid()?.map(|v| Fact::Pid(v.into())),
            Category::Tid => facts.tid()?.map(|v| Fact::Tid(v.into())),
            Category::Uid => facts.uid()?.map(|v| Fact::Uid(v.into())),
            Category::Gid => facts.gid()?.map(|v| Fact::Gid(v.into())),
            Category::AuxGroups => facts
                .aux_groups()?
                .map(|groups| Fact::AuxGroups(groups.into_iter().map(u64::from).collect())),
            Category::Caps => facts.caps()?.map(Fact::Caps),
            Category::SecLabel => facts.seclabel()?.map(Fact::SecLabel),
            Category::Cgroup => facts.cgroup()?.map(Fact::Cgroup),
            Category::Exe => facts.exe()?.map(Fact::Exe),
            Category::Cmdline => facts.cmdline()?.map(Fact::Cmdline),
            Category::Comm => facts.comm()?.map(Fact::Comm),
            Category::Description => facts.description()?.map(Fact::Description),
            Category::Audit => facts.audit()?.map(Fact::Audit),
            // Captured through the names snapshot.
            Category::Names => None,
        };
        Ok(fact)
    }
}

/// Capture `which` from `conn` into `meta`.
///
/// Categories already attached are left alone, so repeating a call is a no-op.
pub fn append(
    meta: &mut Metadata,
    conn: &dyn ConnectionFactsProvider,
    which: CategorySet,
) -> Result<(), MetaError> {
    Collector::new(conn).collect(meta, which).map(|_| ())
}
