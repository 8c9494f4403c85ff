use std::fs;
use std::path::{Path, PathBuf};

use panvm_core::{Error, IoContext, Release, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Names a local release snapshot used instead of the network listing.
pub const RELEASES_SNAPSHOT_ENV: &str = "PANVM_RELEASES_SNAPSHOT";
pub const SNAPSHOT_EXTENSION: &str = "json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotFile {
    #[serde(default = "snapshot_file_version")]
    version: u32,
    #[serde(default)]
    releases: Vec<Release>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SnapshotFileCompat {
    Versioned(SnapshotFile),
    Bare(Vec<Release>),
}

fn snapshot_file_version() -> u32 {
    1
}

pub fn snapshot_override_from_env() -> Option<PathBuf> {
    let raw = std::env::var_os(RELEASES_SNAPSHOT_ENV)?;
    if raw.is_empty() {
        return None;
    }
    validate_snapshot_path(Path::new(&raw))
}

/// Accepts `path` only when it is an existing `.json` file.
pub fn validate_snapshot_path(path: &Path) -> Option<PathBuf> {
    if !path.is_file() {
        warn!(path = %path.display(), "ignoring release snapshot: file does not exist");
        return None;
    }
    if path.extension().and_then(|ext| ext.to_str()) != Some(SNAPSHOT_EXTENSION) {
        warn!(
            path = %path.display(),
            "ignoring release snapshot: expected a .{SNAPSHOT_EXTENSION} file"
        );
        return None;
    }
    Some(path.to_path_buf())
}

pub fn read_snapshot(path: &Path) -> Result<Vec<Release>> {
    let content = fs::read_to_string(path)
        .io_context(|| format!("failed reading release snapshot: {}", path.display()))?;
    let parsed =
        serde_json::from_str::<SnapshotFileCompat>(&content).map_err(|err| Error::Snapshot {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    Ok(match parsed {
        SnapshotFileCompat::Versioned(file) => file.releases,
        SnapshotFileCompat::Bare(releases) => releases,
    })
}

pub fn write_snapshot(path: &Path, releases: &[Release]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .io_context(|| format!("failed to create {}", parent.display()))?;
    }

    let file = SnapshotFile {
        version: snapshot_file_version(),
        releases: releases.to_vec(),
    };
    let content = serde_json::to_string_pretty(&file).map_err(|err| Error::Snapshot {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    fs::write(path, content)
        .io_context(|| format!("failed writing release snapshot: {}", path.display()))
}
