// Process facts read from procfs
// Uses /proc/<pid>/* plus libc for ids and clocks of the calling process

use super::error::ContextError;
use super::facts::{ConnectionFactsProvider, FactResult};
use crate::Meta::Structs::Fact_Structs::{AuditInfo, CapabilitySet, Timestamp};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Audit ids use this value for "not set".
const AUDIT_UNSET: u32 = u32::MAX;

/// Production provider for the facts of one process.
///
/// Per-file failures (missing LSM attribute, permission denied) are soft.
/// A vanished `/proc/<pid>` directory is fatal: the sender is gone.
#[derive(Debug, Clone)]
pub struct ProcessFacts {
    pid: u32,
    tid: Option<u32>,
    root: PathBuf,
}

impl ProcessFacts {
    /// Facts of the calling process and thread.
    pub fn current() -> Self {
        Self {
            pid: std::process::id(),
            tid: current_tid(),
            root: PathBuf::from("/proc"),
        }
    }

    /// Facts of another process. Its thread id is not known.
    pub fn for_pid(pid: u32) -> Self {
        Self {
            pid,
            tid: None,
            root: PathBuf::from("/proc"),
        }
    }

    /// Read from a different procfs mount (containers, test fixtures).
    pub fn with_proc_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Override the thread id reported for this process.
    pub fn with_tid(mut self, tid: u32) -> Self {
        self.tid = Some(tid);
        self
    }

    #[inline]
    pub fn process_id(&self) -> u32 {
        self.pid
    }

    pub fn proc_dir(&self) -> PathBuf {
        self.root.join(self.pid.to_string())
    }

    /// Whether the process directory still exists.
    pub fn is_alive(&self) -> bool {
        self.proc_dir().is_dir()
    }

    fn ensure_alive(&self) -> Result<(), ContextError> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(ContextError::Gone { pid: self.pid })
        }
    }

    /// Classify a read failure as soft (`Ok(None)`) or fatal.
    fn soften<T>(&self, file: &Path, err: io::Error) -> FactResult<T> {
        if !self.is_alive() || err.raw_os_error() == Some(libc::ESRCH) {
            return Err(ContextError::Gone { pid: self.pid });
        }
        match err.kind() {
            io::ErrorKind::NotFound
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::InvalidInput => {
                log::trace!("[ProcessFacts] {} unavailable: {}", file.display(), err);
                Ok(None)
            }
            _ => Err(ContextError::Io(err)),
        }
    }

    fn read_bytes(&self, name: &str) -> FactResult<Vec<u8>> {
        let path = self.proc_dir().join(name);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) => self.soften(&path, err),
        }
    }

    fn read_text(&self, name: &str) -> FactResult<String> {
        Ok(self
            .read_bytes(name)?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Value of one `Key:\tvalue` line of `/proc/<pid>/status`.
    fn status_field(&self, key: &str) -> FactResult<String> {
        let status = match self.read_text("status")? {
            Some(status) => status,
            None => return Ok(None),
        };
        Ok(status.lines().find_map(|line| {
            let (k, v) = line.split_once(':')?;
            (k == key).then(|| v.trim().to_string())
        }))
    }

    /// First (real) id of a `Uid:`/`Gid:` status line.
    fn status_id(&self, key: &str) -> FactResult<u32> {
        Ok(self
            .status_field(key)?
            .and_then(|v| v.split_whitespace().next()?.parse().ok()))
    }

    fn status_caps(&self, key: &str) -> FactResult<u64> {
        Ok(self
            .status_field(key)?
            .and_then(|v| u64::from_str_radix(v.trim(), 16).ok()))
    }

    fn audit_id(&self, name: &str) -> FactResult<u32> {
        Ok(self
            .read_text(name)?
            .and_then(|v| v.trim().parse::<u32>().ok()))
    }
}

impl ConnectionFactsProvider for ProcessFacts {
    fn timestamp(&self) -> FactResult<Timestamp> {
        Ok(Some(now()))
    }

    fn pid(&self) -> FactResult<u32> {
        self.ensure_alive()?;
        Ok(Some(self.pid))
    }

    fn tid(&self) -> FactResult<u32> {
        self.ensure_alive()?;
        let tid = match self.tid {
            Some(tid) => tid,
            None => return Ok(None),
        };
        // The thread may have exited while the process lives on.
        let task = self.proc_dir().join("task").join(tid.to_string());
        Ok(task.is_dir().then_some(tid))
    }

    fn uid(&self) -> FactResult<u32> {
        self.status_id("Uid")
    }

    fn gid(&self) -> FactResult<u32> {
        self.status_id("Gid")
    }

    fn aux_groups(&self) -> FactResult<Vec<u32>> {
        Ok(self.status_field("Groups")?.map(|v| {
            v.split_whitespace()
                .filter_map(|g| g.parse().ok())
                .collect()
        }))
    }

    fn caps(&self) -> FactResult<CapabilitySet> {
        let (inheritable, permitted, effective, bounding) = (
            self.status_caps("CapInh")?,
            self.status_caps("CapPrm")?,
            self.status_caps("CapEff")?,
            self.status_caps("CapBnd")?,
        );
        Ok(match (inheritable, permitted, effective, bounding) {
            (Some(inheritable), Some(permitted), Some(effective), Some(bounding)) => {
                Some(CapabilitySet {
                    inheritable,
                    permitted,
                    effective,
                    bounding,
                })
            }
            _ => None,
        })
    }

    fn seclabel(&self) -> FactResult<String> {
        Ok(self.read_text("attr/current")?.and_then(|label| {
            let label = label.trim_end_matches(['\0', '\n']);
            (!label.is_empty()).then(|| label.to_string())
        }))
    }

    fn cgroup(&self) -> FactResult<String> {
        let text = match self.read_text("cgroup")? {
            Some(text) => text,
            None => return Ok(None),
        };
        // Prefer the unified hierarchy ("0::/path"), else the first line.
        let unified = text.lines().find_map(|l| l.strip_prefix("0::"));
        let first = || text.lines().next()?.splitn(3, ':').nth(2);
        Ok(unified.or_else(first).map(str::to_string))
    }

    fn exe(&self) -> FactResult<String> {
        let path = self.proc_dir().join("exe");
        match fs::read_link(&path) {
            Ok(target) => Ok(Some(target.to_string_lossy().into_owned())),
            Err(err) => self.soften(&path, err),
        }
    }

    fn cmdline(&self) -> FactResult<Vec<String>> {
        let raw = match self.read_bytes("cmdline")? {
            Some(raw) if !raw.is_empty() => raw,
            // Kernel threads and zombies have an empty command line.
            _ => return Ok(None),
        };
        let body = raw.strip_suffix(&[0]).unwrap_or(&raw[..]);
        Ok(Some(
            body.split(|b| *b == 0)
                .map(|arg| String::from_utf8_lossy(arg).into_owned())
                .collect(),
        ))
    }

    fn comm(&self) -> FactResult<String> {
        Ok(self
            .read_text("comm")?
            .map(|comm| comm.trim_end_matches('\n').to_string()))
    }

    fn description(&self) -> FactResult<String> {
        // A bare process has no bus connection description.
        Ok(None)
    }

    fn audit(&self) -> FactResult<AuditInfo> {
        let login_uid = self.audit_id("loginuid")?.unwrap_or(AUDIT_UNSET);
        let session_id = self.audit_id("sessionid")?.unwrap_or(AUDIT_UNSET);
        if login_uid == AUDIT_UNSET && session_id == AUDIT_UNSET {
            return Ok(None);
        }
        Ok(Some(AuditInfo {
            login_uid,
            session_id,
        }))
    }

    fn owned_names(&self) -> FactResult<Vec<String>> {
        self.ensure_alive()?;
        Ok(Some(Vec::new()))
    }
}

fn current_tid() -> Option<u32> {
    u32::try_from(unsafe { libc::syscall(libc::SYS_gettid) }).ok()
}

/// Current monotonic and wall-clock time.
pub fn now() -> Timestamp {
    fn clock_ns(clock: libc::clockid_t) -> u64 {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // clock_gettime only fails for invalid clock ids.
        let rc = unsafe { libc::clock_gettime(clock, &mut ts) };
        if rc != 0 {
            return 0;
        }
        (ts.tv_sec as u64)
            .saturating_mul(1_000_000_000)
            .saturating_add(ts.tv_nsec as u64)
    }

    Timestamp {
        monotonic_ns: clock_ns(libc::CLOCK_MONOTONIC),
        realtime_ns: clock_ns(libc::CLOCK_REALTIME),
    }
}
