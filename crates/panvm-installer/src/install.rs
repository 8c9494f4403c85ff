use std::path::{Path, PathBuf};

use panvm_core::{ArchiveType, Error, InstallSlot, Os, Result, VersionSpec};
use panvm_resolver::{resolve_asset, ReleaseRequest};
use tracing::{debug, info};

use crate::extract::flatten_into;
use crate::fs_utils::{dir_is_populated, remove_dir_if_exists};
use crate::nightly::NightlyOutcome;
use crate::normalize::{link_nested_binaries, repair_executable_bit};
use crate::session::Session;

impl Session {
    /// Installs the requested version. `None` means it was already installed
    /// and nothing was done.
    pub fn install(&mut self, spec: &VersionSpec, force: bool) -> Result<Option<PathBuf>> {
        let request = match spec {
            VersionSpec::External(name) => {
                return Err(Error::ExternalVersionMisuse { name: name.clone() });
            }
            VersionSpec::Nightly => {
                return match self.install_nightly(1)? {
                    NightlyOutcome::Installed(path) => Ok(Some(path)),
                    NightlyOutcome::Unchanged(_) => Ok(None),
                };
            }
            VersionSpec::Latest => ReleaseRequest::Latest,
            VersionSpec::Specific(version) => {
                let slot = self.installed_spelling(InstallSlot::Release(version.clone()))?;
                if !force && dir_is_populated(&self.layout.slot_dir(&slot))? {
                    info!(version = %version, "already installed");
                    return Ok(None);
                }
                ReleaseRequest::Specific(version.clone())
            }
        };

        let asset = resolve_asset(&self.catalog, &request, self.platform)?;
        let slot = self.installed_spelling(InstallSlot::Release(asset.version.clone()))?;
        let install_dir = self.layout.slot_dir(&slot);

        if dir_is_populated(&install_dir)? {
            if !force {
                info!(version = %asset.version, "already installed");
                return Ok(None);
            }
            remove_dir_if_exists(&install_dir)?;
            debug!(dir = %install_dir.display(), "removed previous install");
        }

        let downloader = &self.downloader;
        let bundle = self.cache.with_cached_download(
            asset.version.as_str(),
            &asset.name,
            |destination| downloader.download(&asset.download_url, destination),
        )?;

        match asset.archive {
            ArchiveType::TarGz => {
                self.extractor
                    .extract(&bundle.path, &install_dir, ArchiveType::TarGz)?;
            }
            ArchiveType::Zip => self.extract_flat(&bundle.path, &install_dir)?,
        }

        link_nested_binaries(&install_dir, self.platform.os)?;
        if self.platform.os == Os::MacOs {
            let binary = self.bin_path(&slot);
            if binary.is_file() {
                repair_executable_bit(&binary)?;
            }
        }

        self.adopt_if_inactive(&slot)?;
        info!(version = %asset.version, dir = %install_dir.display(), "installed");
        Ok(Some(install_dir))
    }

    /// Unpacks a zip bundle into a staging directory beside it, then moves
    /// every file to the top level of `install_dir`.
    pub(crate) fn extract_flat(&self, archive: &Path, install_dir: &Path) -> Result<()> {
        let staging = staging_dir_for(archive);
        remove_dir_if_exists(&staging)?;

        let result = self
            .extractor
            .extract(archive, &staging, ArchiveType::Zip)
            .and_then(|()| flatten_into(&staging, install_dir));
        remove_dir_if_exists(&staging)?;

        let placed = result?;
        debug!(files = placed.len(), dir = %install_dir.display(), "flattened bundle");
        Ok(())
    }
}

fn staging_dir_for(archive: &Path) -> PathBuf {
    let name = archive
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("bundle");
    archive.with_file_name(format!("{name}.unpack"))
}
