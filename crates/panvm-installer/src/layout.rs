use std::fs;
use std::path::{Path, PathBuf};

use panvm_core::{Error, InstallSlot, IoContext, Result};

/// Overrides the data root for every panvm path.
pub const HOME_ENV: &str = "PANVM_HOME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionsLayout {
    root: PathBuf,
}

impl VersionsLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    pub fn slot_dir(&self, slot: &InstallSlot) -> PathBuf {
        self.versions_dir().join(slot.dir_name())
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn ensure_base_dirs(&self) -> Result<()> {
        for dir in [self.versions_dir(), self.tmp_dir()] {
            fs::create_dir_all(&dir).io_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}

pub fn default_user_root() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(home));
    }

    if cfg!(windows) {
        let app_data = std::env::var("LOCALAPPDATA").map_err(|_| Error::DataDirUnavailable {
            message: "LOCALAPPDATA is not set".to_string(),
        })?;
        return Ok(PathBuf::from(app_data).join("panvm"));
    }

    let home = std::env::var("HOME").map_err(|_| Error::DataDirUnavailable {
        message: "HOME is not set".to_string(),
    })?;
    Ok(PathBuf::from(home).join(".panvm"))
}
