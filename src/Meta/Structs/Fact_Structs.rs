// Typed metadata records and their payload encoding
//
// All integers are little-endian. Strings are raw UTF-8 without terminator,
// except the command line where every argument is followed by a NUL byte.

use super::Category_Structs::Category;

/// Capture timestamp of a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timestamp {
    pub monotonic_ns: u64,
    pub realtime_ns: u64,
}

/// Linux capability sets of the sending task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    pub inheritable: u64,
    pub permitted: u64,
    pub effective: u64,
    pub bounding: u64,
}

/// Audit identity of the sending task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditInfo {
    pub login_uid: u32,
    pub session_id: u32,
}

/// One captured fact, as stored in a metadata item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fact {
    Timestamp(Timestamp),
    Pid(u64),
    Tid(u64),
    Uid(u64),
    Gid(u64),
    AuxGroups(Vec<u64>),
    Caps(CapabilitySet),
    SecLabel(String),
    Cgroup(String),
    Exe(String),
    Cmdline(Vec<String>),
    Comm(String),
    Description(String),
    Audit(AuditInfo),
    /// Marker for the owned-names snapshot kept beside the items.
    Names { count: u32, len: u32 },
}

impl Fact {
    pub fn category(&self) -> Category {
        match self {
            Fact::Timestamp(_) => Category::Timestamp,
            Fact::Pid(_) => Category::Pid,
            Fact::Tid(_) => Category::Tid,
            Fact::Uid(_) => Category::Uid,
            Fact::Gid(_) => Category::Gid,
            Fact::AuxGroups(_) => Category::AuxGroups,
            Fact::Caps(_) => Category::Caps,
            Fact::SecLabel(_) => Category::SecLabel,
            Fact::Cgroup(_) => Category::Cgroup,
            Fact::Exe(_) => Category::Exe,
            Fact::Cmdline(_) => Category::Cmdline,
            Fact::Comm(_) => Category::Comm,
            Fact::Description(_) => Category::Description,
            Fact::Audit(_) => Category::Audit,
            Fact::Names { .. } => Category::Names,
        }
    }

    /// Exact payload length of [`Fact::encode`].
    pub fn payload_len(&self) -> usize {
        match self {
            Fact::Timestamp(_) => 16,
            Fact::Pid(_) | Fact::Tid(_) | Fact::Uid(_) | Fact::Gid(_) => 8,
            Fact::AuxGroups(groups) => groups.len() * 8,
            Fact::Caps(_) => 32,
            Fact::SecLabel(s)
            | Fact::Cgroup(s)
            | Fact::Exe(s)
            | Fact::Comm(s)
            | Fact::Description(s) => s.len(),
            Fact::Cmdline(args) => args.iter().map(|a| a.len() + 1).sum(),
            Fact::Audit(_) | Fact::Names { .. } => 8,
        }
    }

    /// Append the payload bytes of this fact to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Fact::Timestamp(ts) => {
                out.extend_from_slice(&ts.monotonic_ns.to_le_bytes());
                out.extend_from_slice(&ts.realtime_ns.to_le_bytes());
            }
            Fact::Pid(v) | Fact::Tid(v) | Fact::Uid(v) | Fact::Gid(v) => {
                out.extend_from_slice(&v.to_le_bytes())
            }
            Fact::AuxGroups(groups) => {
                for gid in groups {
                    out.extend_from_slice(&gid.to_le_bytes());
                }
            }
            Fact::Caps(caps) => {
                for set in [caps.inheritable, caps.permitted, caps.effective, caps.bounding] {
                    out.extend_from_slice(&set.to_le_bytes());
                }
            }
            Fact::SecLabel(s)
            | Fact::Cgroup(s)
            | Fact::Exe(s)
            | Fact::Comm(s)
            | Fact::Description(s) => out.extend_from_slice(s.as_bytes()),
            Fact::Cmdline(args) => {
                for arg in args {
                    out.extend_from_slice(arg.as_bytes());
                    out.push(0);
                }
            }
            Fact::Audit(audit) => {
                out.extend_from_slice(&audit.login_uid.to_le_bytes());
                out.extend_from_slice(&audit.session_id.to_le_bytes());
            }
            Fact::Names { count, len } => {
                out.extend_from_slice(&count.to_le_bytes());
                out.extend_from_slice(&len.to_le_bytes());
            }
        }
    }

    /// Decode an item payload. Unknown tags and malformed payloads give `None`.
    pub fn decode(tag: u32, payload: &[u8]) -> Option<Self> {
        let category = Category::from_tag(tag)?;
        let fact = match category {
            Category::Timestamp => {
                let [monotonic_ns, realtime_ns] = read_u64s::<2>(payload)?;
                Fact::Timestamp(Timestamp {
                    monotonic_ns,
                    realtime_ns,
                })
            }
            Category::Pid => Fact::Pid(read_u64s::<1>(payload)?[0]),
            Category::Tid => Fact::Tid(read_u64s::<1>(payload)?[0]),
            Category::Uid => Fact::Uid(read_u64s::<1>(payload)?[0]),
            Category::Gid => Fact::Gid(read_u64s::<1>(payload)?[0]),
            Category::AuxGroups => {
                if payload.len() % 8 != 0 {
                    return None;
                }
                Fact::AuxGroups(payload.chunks_exact(8).map(le_u64).collect())
            }
            Category::Caps => {
                let [inheritable, permitted, effective, bounding] = read_u64s::<4>(payload)?;
                Fact::Caps(CapabilitySet {
                    inheritable,
                    permitted,
                    effective,
                    bounding,
                })
            }
            Category::SecLabel => Fact::SecLabel(utf8(payload)?),
            Category::Cgroup => Fact::Cgroup(utf8(payload)?),
            Category::Exe => Fact::Exe(utf8(payload)?),
            Category::Comm => Fact::Comm(utf8(payload)?),
            Category::Description => Fact::Description(utf8(payload)?),
            Category::Cmdline if payload.is_empty() => Fact::Cmdline(Vec::new()),
            Category::Cmdline => {
                let body = payload.strip_suffix(&[0])?;
                let args = body
                    .split(|b| *b == 0)
                    .map(utf8)
                    .collect::<Option<Vec<_>>>()?;
                Fact::Cmdline(args)
            }
            Category::Audit => {
                let [login_uid, session_id] = read_u32s::<2>(payload)?;
                Fact::Audit(AuditInfo {
                    login_uid,
                    session_id,
                })
            }
            Category::Names => {
                let [count, len] = read_u32s::<2>(payload)?;
                Fact::Names { count, len }
            }
        };
        Some(fact)
    }
}

fn le_u64(chunk: &[u8]) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(chunk);
    u64::from_le_bytes(raw)
}

fn read_u64s<const N: usize>(payload: &[u8]) -> Option<[u64; N]> {
    if payload.len() != N * 8 {
        return None;
    }
    let mut out = [0u64; N];
    for (slot, chunk) in out.iter_mut().zip(payload.chunks_exact(8)) {
        *slot = le_u64(chunk);
    }
    Some(out)
}

fn read_u32s<const N: usize>(payload: &[u8]) -> Option<[u32; N]> {
    if payload.len() != N * 4 {
        return None;
    }
    let mut out = [0u32; N];
    for (slot, chunk) in out.iter_mut().zip(payload.chunks_exact(4)) {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(chunk);
        *slot = u32::from_le_bytes(raw);
    }
    Some(out)
}

fn utf8(bytes: &[u8]) -> Option<String> {
    std::str::from_utf8(bytes).ok().map(str::to_owned)
}
