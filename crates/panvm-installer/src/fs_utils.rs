use std::fs;
use std::io;
use std::path::Path;

use panvm_core::{IoContext, Result};

/// A directory counts as an install only when it has at least one entry.
pub(crate) fn dir_is_populated(path: &Path) -> Result<bool> {
    if !path.is_dir() {
        return Ok(false);
    }
    let mut entries =
        fs::read_dir(path).io_context(|| format!("failed to read {}", path.display()))?;
    Ok(entries.next().is_some())
}

pub(crate) fn remove_dir_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err).io_context(|| format!("failed to remove {}", path.display())),
    }
}
