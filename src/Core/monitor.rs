// Read-only diagnostic file exposing capture counters
//
// The endpoint is an owned object: the host creates it for a run and drops it
// at teardown. The path lock is a scoped guard, so every return path
// releases it.

use super::error::MetaError;
use crate::Meta::Structs::CategorySet;
use crossbeam_utils::CachePadded;
use parking_lot::Mutex;
use std::fmt;
use std::fs::{self, OpenOptions, Permissions};
use std::io::{self, Write};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// File name of the endpoint inside its directory.
pub const ENDPOINT_NAME: &str = "kbusinfo";

/// Mode of the published file: read-only for the owner.
const ENDPOINT_MODE: u32 = 0o400;

pub struct DiagnosticEndpoint {
    /// `None` once removed.
    path: Mutex<Option<PathBuf>>,

    /// Number of capture calls recorded.
    captures: CachePadded<AtomicU64>,

    /// Number of items those captures attached.
    items: CachePadded<AtomicU64>,
}

impl DiagnosticEndpoint {
    /// Create the endpoint file inside `dir` and publish the zeroed counters.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self, MetaError> {
        let endpoint = Self {
            path: Mutex::new(Some(dir.as_ref().join(ENDPOINT_NAME))),
            captures: CachePadded::new(AtomicU64::new(0)),
            items: CachePadded::new(AtomicU64::new(0)),
        };
        endpoint.publish()?;
        log::debug!("[DiagnosticEndpoint] created in {}", dir.as_ref().display());
        Ok(endpoint)
    }

    /// Count one capture call that attached `newly` categories.
    pub fn record(&self, newly: CategorySet) {
        self.captures.fetch_add(1, Ordering::Relaxed);
        self.items
            .fetch_add(u64::from(newly.bits().count_ones()), Ordering::Relaxed);
    }

    pub fn captures(&self) -> u64 {
        self.captures.load(Ordering::Relaxed)
    }

    pub fn items(&self) -> u64 {
        self.items.load(Ordering::Relaxed)
    }

    /// Path of the published file, `None` after removal.
    pub fn path(&self) -> Option<PathBuf> {
        self.path.lock().clone()
    }

    /// Render the counters as the endpoint file shows them.
    pub fn dump<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "captures {}", self.captures())?;
        writeln!(out, "items {}", self.items())
    }

    /// Rewrite the endpoint file with the current counters.
    ///
    /// The new content is written to a temporary file, made read-only and
    /// renamed over the old one. A removed endpoint is left alone.
    pub fn publish(&self) -> Result<(), MetaError> {
        let guard = self.path.lock();
        let path = match guard.as_ref() {
            Some(path) => path,
            None => return Ok(()),
        };

        let tmp = path.with_extension("tmp");
        let _ = fs::remove_file(&tmp);
        let written = self.write_file(&tmp).and_then(|()| fs::rename(&tmp, path));
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        Ok(())
    }

    fn write_file(&self, tmp: &Path) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o600)
            .open(tmp)?;
        self.dump(&mut file)?;
        drop(file);
        fs::set_permissions(tmp, Permissions::from_mode(ENDPOINT_MODE))
    }

    /// Remove the endpoint file. Idempotent.
    pub fn remove(&self) -> Result<(), MetaError> {
        let path = match self.path.lock().take() {
            Some(path) => path,
            None => return Ok(()),
        };
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl Drop for DiagnosticEndpoint {
    fn drop(&mut self) {
        if let Err(err) = self.remove() {
            log::warn!("[DiagnosticEndpoint] failed to remove endpoint: {}", err);
        }
    }
}

impl fmt::Debug for DiagnosticEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_diagnostic_endpoint(self, f)
    }
}
