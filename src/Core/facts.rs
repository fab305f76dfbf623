// Connection facts consumed by the collector

use super::error::ContextError;
use crate::Meta::Structs::Category_Structs::{Category, CategorySet};
use crate::Meta::Structs::Fact_Structs::{AuditInfo, CapabilitySet, Timestamp};

/// Result of one fact accessor.
///
/// - `Ok(Some(v))`: the fact is available.
/// - `Ok(None)`: soft unavailability (exited thread, permission, feature off).
/// - `Err(_)`: the whole context is gone; capture stops.
pub type FactResult<T> = Result<Option<T>, ContextError>;

/// Read-only view of everything metadata capture may ask about a connection.
///
/// Production implementations read live process and connection state
/// ([`ProcessFacts`](super::procfs::ProcessFacts),
/// [`ConnectionView`](super::connection::ConnectionView)); tests use
/// [`FixedFacts`].
pub trait ConnectionFactsProvider {
    fn timestamp(&self) -> FactResult<Timestamp>;
    fn pid(&self) -> FactResult<u32>;
    fn tid(&self) -> FactResult<u32>;
    fn uid(&self) -> FactResult<u32>;
    fn gid(&self) -> FactResult<u32>;
    fn aux_groups(&self) -> FactResult<Vec<u32>>;
    fn caps(&self) -> FactResult<CapabilitySet>;
    fn seclabel(&self) -> FactResult<String>;
    fn cgroup(&self) -> FactResult<String>;
    fn exe(&self) -> FactResult<String>;
    fn cmdline(&self) -> FactResult<Vec<String>>;
    fn comm(&self) -> FactResult<String>;
    fn description(&self) -> FactResult<String>;
    fn audit(&self) -> FactResult<AuditInfo>;

    /// Well-known names the connection owns right now.
    fn owned_names(&self) -> FactResult<Vec<String>>;
}

/// Provider answering from fixed values.
///
/// Unset facts are unavailable. Categories passed to [`FixedFacts::fatal_on`]
/// fail as if the process had exited.
#[derive(Debug, Clone, Default)]
pub struct FixedFacts {
    timestamp: Option<Timestamp>,
    pid: Option<u32>,
    tid: Option<u32>,
    uid: Option<u32>,
    gid: Option<u32>,
    aux_groups: Option<Vec<u32>>,
    caps: Option<CapabilitySet>,
    seclabel: Option<String>,
    cgroup: Option<String>,
    exe: Option<String>,
    cmdline: Option<Vec<String>>,
    comm: Option<String>,
    description: Option<String>,
    audit: Option<AuditInfo>,
    names: Option<Vec<String>>,
    fatal: CategorySet,
}

impl FixedFacts {
    /// Provider with no facts except an empty owned-names list.
    pub fn new() -> Self {
        Self {
            names: Some(Vec::new()),
            ..Self::default()
        }
    }

    pub fn with_timestamp(mut self, monotonic_ns: u64, realtime_ns: u64) -> Self {
        self.timestamp = Some(Timestamp {
            monotonic_ns,
            realtime_ns,
        });
        self
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn with_tid(mut self, tid: u32) -> Self {
        self.tid = Some(tid);
        self
    }

    pub fn with_uid(mut self, uid: u32) -> Self {
        self.uid = Some(uid);
        self
    }

    pub fn with_gid(mut self, gid: u32) -> Self {
        self.gid = Some(gid);
        self
    }

    pub fn with_aux_groups(mut self, groups: impl Into<Vec<u32>>) -> Self {
        self.aux_groups = Some(groups.into());
        self
    }

    pub fn with_caps(mut self, caps: CapabilitySet) -> Self {
        self.caps = Some(caps);
        self
    }

    pub fn with_seclabel(mut self, label: impl Into<String>) -> Self {
        self.seclabel = Some(label.into());
        self
    }

    pub fn with_cgroup(mut self, path: impl Into<String>) -> Self {
        self.cgroup = Some(path.into());
        self
    }

    pub fn with_exe(mut self, path: impl Into<String>) -> Self {
        self.exe = Some(path.into());
        self
    }

    pub fn with_cmdline<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cmdline = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_comm(mut self, comm: impl Into<String>) -> Self {
        self.comm = Some(comm.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_audit(mut self, login_uid: u32, session_id: u32) -> Self {
        self.audit = Some(AuditInfo {
            login_uid,
            session_id,
        });
        self
    }

    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Make the owned-names accessor report unavailability.
    pub fn without_names(mut self) -> Self {
        self.names = None;
        self
    }

    /// Accessors for `categories` fail fatally.
    pub fn fatal_on(mut self, categories: CategorySet) -> Self {
        self.fatal |= categories;
        self
    }

    fn answer<T: Clone>(&self, category: Category, value: &Option<T>) -> FactResult<T> {
        if self.fatal.has(category) {
            return Err(ContextError::Gone {
                pid: self.pid.unwrap_or(0),
            });
        }
        Ok(value.clone())
    }
}

impl ConnectionFactsProvider for FixedFacts {
    fn timestamp(&self) -> FactResult<Timestamp> {
        self.answer(Category::Timestamp, &self.timestamp)
    }

    fn pid(&self) -> FactResult<u32> {
        self.answer(Category::Pid, &self.pid)
    }

    fn tid(&self) -> FactResult<u32> {
        self.answer(Category::Tid, &self.tid)
    }

    fn uid(&self) -> FactResult<u32> {
        self.answer(Category::Uid, &self.uid)
    }

    fn gid(&self) -> FactResult<u32> {
        self.answer(Category::Gid, &self.gid)
    }

    fn aux_groups(&self) -> FactResult<Vec<u32>> {
        self.answer(Category::AuxGroups, &self.aux_groups)
    }

    fn caps(&self) -> FactResult<CapabilitySet> {
        self.answer(Category::Caps, &self.caps)
    }

    fn seclabel(&self) -> FactResult<String> {
        self.answer(Category::SecLabel, &self.seclabel)
    }

    fn cgroup(&self) -> FactResult<String> {
        self.answer(Category::Cgroup, &self.cgroup)
    }

    fn exe(&self) -> FactResult<String> {
        self.answer(Category::Exe, &self.exe)
    }

    fn cmdline(&self) -> FactResult<Vec<String>> {
        self.answer(Category::Cmdline, &self.cmdline)
    }

    fn comm(&self) -> FactResult<String> {
        self.answer(Category::Comm, &self.comm)
    }

    fn description(&self) -> FactResult<String> {
        self.answer(Category::Description, &self.description)
    }

    fn audit(&self) -> FactResult<AuditInfo> {
        self.answer(Category::Audit, &self.audit)
    }

    fn owned_names(&self) -> FactResult<Vec<String>> {
        self.answer(Category::Names, &self.names)
    }
}
