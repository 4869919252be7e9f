use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use crate::shared::error::ExportError;

/// Output paths currently being written, shared by every job in the
/// process.
///
/// A job holds an [`OutputGuard`] per path it writes; a second job asking
/// for the same path fails fast instead of waiting.
#[derive(Clone, Debug, Default)]
pub struct OutputLocks {
    held: Arc<Mutex<HashSet<PathBuf>>>,
}

impl OutputLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> Self {
        static GLOBAL: OnceLock<OutputLocks> = OnceLock::new();
        GLOBAL.get_or_init(OutputLocks::new).clone()
    }

    pub fn acquire(&self, path: &Path) -> Result<OutputGuard, ExportError> {
        let key = normalize(path);
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        if !held.insert(key.clone()) {
            return Err(ExportError::OutputBusy(path.to_path_buf()));
        }
        log::debug!("Locked output {}", key.display());
        Ok(OutputGuard {
            locks: self.clone(),
            path: key,
        })
    }

    pub fn is_held(&self, path: &Path) -> bool {
        self.held
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&normalize(path))
    }
}

/// Releases its path when dropped.
#[derive(Debug)]
pub struct OutputGuard {
    locks: OutputLocks,
    path: PathBuf,
}

impl OutputGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for OutputGuard {
    fn drop(&mut self) {
        let mut held = self.locks.held.lock().unwrap_or_else(|e| e.into_inner());
        held.remove(&self.path);
    }
}

/// Whether two spellings name the same file location.
pub fn same_location(a: &Path, b: &Path) -> bool {
    normalize(a) == normalize(b)
}

/// Absolute form of `path`, resolving symlinks in its parent when the
/// parent exists so two spellings of one file share a lock.
fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|p| p.join(name))
            .unwrap_or(absolute),
        _ => absolute,
    }
}
