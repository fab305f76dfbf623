// In-process bus connection: the source of captured facts
use super::error::{ContextError, MetaError};
use super::facts::{ConnectionFactsProvider, FactResult};
use super::gate::CapturePolicy;
use super::procfs::ProcessFacts;
use crate::Meta::Structs::{AuditInfo, CapabilitySet, CategorySet, Timestamp};
use crate::Meta::Metadata;
use parking_lot::{RwLock, RwLockReadGuard};
use std::fmt;

/// Longest well-known name a connection may own.
pub const NAME_MAX_LEN: usize = 255;

struct ConnectionState {
    names: Vec<String>,
    closed: bool,
}

/// A bus connection living in this process.
///
/// Its owned names and open/closed state sit behind one lock. Capture holds
/// the read side for the whole capture window (see [`LocalConnection::lock_facts`]),
/// so names cannot change halfway through a message.
pub struct LocalConnection {
    id: u64,
    description: Option<String>,
    process: ProcessFacts,
    state: RwLock<ConnectionState>,
}

impl LocalConnection {
    pub fn new(id: u64, process: ProcessFacts) -> Self {
        Self {
            id,
            description: None,
            process,
            state: RwLock::new(ConnectionState {
                names: Vec::new(),
                closed: false,
            }),
        }
    }

    /// Connection of the calling process.
    pub fn for_current_process(id: u64) -> Self {
        Self::new(id, ProcessFacts::current())
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn process(&self) -> &ProcessFacts {
        &self.process
    }

    /// Take ownership of a well-known name.
    ///
    /// Returns `Ok(false)` if the connection already owns it.
    pub fn acquire_name(&self, name: &str) -> Result<bool, MetaError> {
        if !is_valid_name(name) {
            return Err(MetaError::InvalidName(name.to_string()));
        }
        let mut state = self.state.write();
        if state.closed {
            return Err(ContextError::Closed { id: self.id }.into());
        }
        if state.names.iter().any(|owned| owned == name) {
            return Ok(false);
        }
        state.names.push(name.to_string());
        log::debug!("[LocalConnection] {} acquired {}", self.id, name);
        Ok(true)
    }

    /// Give up a name. Returns whether it was owned.
    pub fn release_name(&self, name: &str) -> bool {
        let mut state = self.state.write();
        let before = state.names.len();
        state.names.retain(|owned| owned != name);
        before != state.names.len()
    }

    /// Names owned right now, in acquisition order.
    ///
    /// Safe to call while this thread holds a [`ConnectionView`].
    pub fn names(&self) -> Vec<String> {
        self.state.read_recursive().names.clone()
    }

    /// Close the connection. Every later capture fails fatally.
    pub fn close(&self) {
        let mut state = self.state.write();
        state.closed = true;
        state.names.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.state.read_recursive().closed
    }

    /// Names and closed flag read under one recursive guard.
    pub(crate) fn state_snapshot(&self) -> (Vec<String>, bool) {
        let state = self.state.read_recursive();
        (state.names.clone(), state.closed)
    }

    /// Consistent view of this connection for one capture window.
    ///
    /// The read lock is held until the view is dropped.
    pub fn lock_facts(&self) -> ConnectionView<'_> {
        ConnectionView {
            conn: self,
            state: self.state.read(),
        }
    }

    /// Capture `which` into `meta` under the connection lock.
    pub fn capture(&self, meta: &mut Metadata, which: CategorySet) -> Result<(), MetaError> {
        let view = self.lock_facts();
        meta.append(&view, which)
    }

    /// [`LocalConnection::capture`] with a policy gate.
    pub fn capture_with_policy(
        &self,
        meta: &mut Metadata,
        policy: &dyn CapturePolicy,
        which: CategorySet,
    ) -> Result<(), MetaError> {
        let view = self.lock_facts();
        meta.append_with_policy(&view, policy, which)
    }
}

impl fmt::Debug for LocalConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_local_connection(self, f)
    }
}

/// Facts of a [`LocalConnection`] read under its lock.
pub struct ConnectionView<'a> {
    conn: &'a LocalConnection,
    state: RwLockReadGuard<'a, ConnectionState>,
}

impl ConnectionView<'_> {
    fn live(&self) -> Result<&ProcessFacts, ContextError> {
        if self.state.closed {
            return Err(ContextError::Closed { id: self.conn.id });
        }
        Ok(&self.conn.process)
    }
}

impl ConnectionFactsProvider for ConnectionView<'_> {
    fn timestamp(&self) -> FactResult<Timestamp> {
        self.live()?.timestamp()
    }

    fn pid(&self) -> FactResult<u32> {
        self.live()?.pid()
    }

    fn tid(&self) -> FactResult<u32> {
        self.live()?.tid()
    }

    fn uid(&self) -> FactResult<u32> {
        self.live()?.uid()
    }

    fn gid(&self) -> FactResult<u32> {
        self.live()?.gid()
    }

    fn aux_groups(&self) -> FactResult<Vec<u32>> {
        self.live()?.aux_groups()
    }

    fn caps(&self) -> FactResult<CapabilitySet> {
        self.live()?.caps()
    }

    fn seclabel(&self) -> FactResult<String> {
        self.live()?.seclabel()
    }

    fn cgroup(&self) -> FactResult<String> {
        self.live()?.cgroup()
    }

    fn exe(&self) -> FactResult<String> {
        self.live()?.exe()
    }

    fn cmdline(&self) -> FactResult<Vec<String>> {
        self.live()?.cmdline()
    }

    fn comm(&self) -> FactResult<String> {
        self.live()?.comm()
    }

    fn description(&self) -> FactResult<String> {
        self.live()?;
        Ok(self.conn.description.clone())
    }

    fn audit(&self) -> FactResult<AuditInfo> {
        self.live()?.audit()
    }

    fn owned_names(&self) -> FactResult<Vec<String>> {
        self.live()?;
        Ok(Some(self.state.names.clone()))
    }
}

/// Whether `name` is a valid well-known bus name.
///
/// At least two dot-separated elements of `[A-Za-z0-9_-]`, none empty and
/// none starting with a digit, at most [`NAME_MAX_LEN`] bytes.
pub fn is_valid_name(name: &str) -> bool {
    if name.is_empty() || name.len() > NAME_MAX_LEN {
        return false;
    }
    let mut elements = 0;
    for element in name.split('.') {
        let mut chars = element.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '-' => {}
            _ => return false,
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return false;
        }
        elements += 1;
    }
    elements >= 2
}
