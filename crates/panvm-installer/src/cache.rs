use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use panvm_core::{Error, Result};
use tracing::{debug, info, warn};

/// The working directory is process-wide; fetches that change it are
/// serialized through this lock.
static WORKING_DIR_LOCK: Mutex<()> = Mutex::new(());

pub(crate) fn lock_working_dir() -> MutexGuard<'static, ()> {
    WORKING_DIR_LOCK
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedBundle {
    pub path: PathBuf,
    pub reused: bool,
}

/// Per-process bundle cache: one temp directory per version, one file per
/// bundle name. Entries are never evicted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadCache {
    root: PathBuf,
}

impl DownloadCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn for_process() -> Self {
        Self::new(env::temp_dir().join(format!("panvm-cache-{}", std::process::id())))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.root.join(version)
    }

    /// Returns the cached bundle for `(version, bundle_name)`, running `fetch`
    /// only on a miss. `fetch` runs with the version's cache directory as the
    /// working directory and receives the absolute destination path; the
    /// previous working directory is restored on every exit path.
    pub fn with_cached_download<F>(
        &self,
        version: &str,
        bundle_name: &str,
        fetch: F,
    ) -> Result<CachedBundle>
    where
        F: FnOnce(&Path) -> Result<()>,
    {
        let _lock = lock_working_dir();

        let dir = self.version_dir(version);
        fs::create_dir_all(&dir).map_err(|source| Error::CacheDirectoryError {
            path: dir.clone(),
            source,
        })?;
        let dir = fs::canonicalize(&dir).map_err(|source| Error::CacheDirectoryError {
            path: dir.clone(),
            source,
        })?;

        let path = dir.join(bundle_name);
        if path.is_file() {
            info!(bundle = bundle_name, version, "reusing cached bundle");
            return Ok(CachedBundle { path, reused: true });
        }

        {
            let _cwd = WorkingDirGuard::enter(&dir)?;
            debug!(bundle = bundle_name, version, "fetching bundle");
            fetch(&path)?;
        }

        Ok(CachedBundle {
            path,
            reused: false,
        })
    }
}

struct WorkingDirGuard {
    previous: PathBuf,
}

impl WorkingDirGuard {
    fn enter(dir: &Path) -> Result<Self> {
        let previous = env::current_dir().map_err(|source| Error::CacheDirectoryError {
            path: dir.to_path_buf(),
            source,
        })?;
        env::set_current_dir(dir).map_err(|source| Error::CacheDirectoryError {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self { previous })
    }
}

impl Drop for WorkingDirGuard {
    fn drop(&mut self) {
        if let Err(err) = env::set_current_dir(&self.previous) {
            warn!(
                path = %self.previous.display(),
                error = %err,
                "failed to restore working directory"
            );
        }
    }
}
