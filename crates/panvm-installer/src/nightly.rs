use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use panvm_core::{Error, InstallSlot, IoContext, Os, Result, NIGHTLY};
use tracing::{debug, info};

use crate::fs_utils::{dir_is_populated, remove_dir_if_exists};
use crate::normalize::repair_executable_bit;
use crate::session::Session;

/// Leading text of the marker file the nightly build leaves in its bundle.
pub const NIGHTLY_MARKER_PREFIX: &str = "Built from ";

const MARKER_MAX_BYTES: u64 = 1024;
const SHORT_SHA_LEN: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NightlyOutcome {
    /// The installed nightly already came from the selected commit.
    Unchanged(PathBuf),
    Installed(PathBuf),
}

impl NightlyOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Unchanged(path) | Self::Installed(path) => path,
        }
    }
}

/// Name of the build-workflow artifact carrying the bundle for `os`.
pub fn nightly_artifact_name(os: Os) -> &'static str {
    match os {
        Os::Linux => "nightly-linux",
        Os::MacOs => "nightly-macos",
        Os::Windows => "nightly-windows",
    }
}

/// Commit recorded by the marker file in an existing nightly install.
pub fn read_nightly_commit(install_dir: &Path) -> Result<Option<String>> {
    if !install_dir.is_dir() {
        return Ok(None);
    }
    let mut entries = fs::read_dir(install_dir)
        .io_context(|| format!("failed to read {}", install_dir.display()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .io_context(|| format!("failed to read {}", install_dir.display()))?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let metadata = fs::symlink_metadata(&path)
            .io_context(|| format!("failed to stat {}", path.display()))?;
        if !metadata.is_file() || metadata.len() > MARKER_MAX_BYTES {
            continue;
        }

        let file = fs::File::open(&path)
            .io_context(|| format!("failed to open {}", path.display()))?;
        let mut first_line = String::new();
        // Binary files are not markers.
        if BufReader::new(file.take(MARKER_MAX_BYTES))
            .read_line(&mut first_line)
            .is_err()
        {
            continue;
        }
        if let Some(commit) = first_line.trim_end().strip_prefix(NIGHTLY_MARKER_PREFIX) {
            let commit = commit.trim();
            if !commit.is_empty() {
                return Ok(Some(commit.to_string()));
            }
        }
    }
    Ok(None)
}

/// Recorded identities may be abbreviated to a short sha.
fn same_commit(recorded: &str, head_sha: &str) -> bool {
    recorded.eq_ignore_ascii_case(head_sha)
        || (recorded.len() >= SHORT_SHA_LEN
            && head_sha
                .get(..recorded.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(recorded)))
}

impl Session {
    /// Installs the bundle from the `n_last`-th most recent successful build,
    /// replacing any nightly from a different commit.
    pub fn install_nightly(&mut self, n_last: usize) -> Result<NightlyOutcome> {
        let runs = self.catalog.successful_runs()?;
        if runs.is_empty() {
            return Err(Error::NoNightlyRuns);
        }
        let index = n_last.max(1).min(runs.len()) - 1;
        let run = &runs[index];
        if index + 1 < n_last {
            debug!(requested = n_last, available = runs.len(), "clamped to oldest successful run");
        }

        let artifact_name = nightly_artifact_name(self.platform.os);
        let artifact = self
            .catalog
            .run_artifacts(run)?
            .into_iter()
            .find(|artifact| artifact.name == artifact_name)
            .ok_or_else(|| Error::NightlyArtifactNotFound {
                name: artifact_name.to_string(),
                run_id: run.id,
            })?;

        let slot = InstallSlot::Nightly;
        let install_dir = self.layout.slot_dir(&slot);
        let mut replaced_active = false;
        if dir_is_populated(&install_dir)? {
            match read_nightly_commit(&install_dir)? {
                Some(recorded) if same_commit(&recorded, &run.head_sha) => {
                    info!(commit = %recorded, "nightly is up to date");
                    return Ok(NightlyOutcome::Unchanged(install_dir));
                }
                recorded => {
                    debug!(
                        installed = recorded.as_deref().unwrap_or("unknown"),
                        selected = %run.head_sha,
                        "replacing nightly"
                    );
                    replaced_active = self.active()?.as_ref() == Some(&slot);
                    remove_dir_if_exists(&install_dir)?;
                    if replaced_active {
                        // Never left pointing at a missing slot if the
                        // download or extraction below fails.
                        let fallback = self.installed_latest()?.map(InstallSlot::Release);
                        self.set_active(fallback);
                    }
                }
            }
        }

        let short_sha = run.head_sha.get(..SHORT_SHA_LEN).unwrap_or(&run.head_sha);
        let bundle_name = format!("{artifact_name}-{short_sha}.zip");
        let downloader = &self.downloader;
        let bundle = self
            .cache
            .with_cached_download(NIGHTLY, &bundle_name, |destination| {
                downloader.download(&artifact.download_url, destination)
            })?;

        self.extract_flat(&bundle.path, &install_dir)?;

        if matches!(self.platform.os, Os::MacOs | Os::Linux) {
            let binary = self.bin_path(&slot);
            if binary.is_file() {
                repair_executable_bit(&binary)?;
            }
        }

        if replaced_active {
            self.set_active(Some(slot.clone()));
        } else {
            self.adopt_if_inactive(&slot)?;
        }
        info!(commit = %run.head_sha, run = run.id, "installed nightly");
        Ok(NightlyOutcome::Installed(install_dir))
    }
}
