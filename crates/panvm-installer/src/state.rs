use std::fs;
use std::io;

use panvm_core::{
    sort_install_slots, Error, InstallSlot, IoContext, Result, ToolVersion, VersionSpec,
};
use tracing::{debug, info};

use crate::fs_utils::{dir_is_populated, remove_dir_if_exists};
use crate::layout::VersionsLayout;
use crate::session::{AliasTarget, InstallPrompt, Session};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UninstallOutcome {
    Removed(InstallSlot),
    NotInstalled,
}

/// Installed slots, nightly first and then newest release first. Empty when
/// the versions root is missing or holds no populated install.
pub fn installed_versions(layout: &VersionsLayout) -> Result<Vec<InstallSlot>> {
    let root = layout.versions_dir();
    let entries = match fs::read_dir(&root) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err).io_context(|| format!("failed to read {}", root.display()));
        }
    };

    let mut slots = Vec::new();
    for entry in entries {
        let entry = entry.io_context(|| format!("failed to read {}", root.display()))?;
        let name = entry.file_name();
        let Some(slot) = name.to_str().and_then(InstallSlot::from_dir_name) else {
            debug!(entry = ?name, "skipping unrecognized entry in versions root");
            continue;
        };
        if dir_is_populated(&entry.path())? {
            slots.push(slot);
        }
    }

    sort_install_slots(&mut slots);
    Ok(slots)
}

/// Newest installed release. Nightly is never part of the comparison.
pub fn installed_latest(layout: &VersionsLayout) -> Result<Option<ToolVersion>> {
    Ok(installed_versions(layout)?
        .into_iter()
        .filter_map(|slot| match slot {
            InstallSlot::Release(version) => Some(version),
            InstallSlot::Nightly => None,
        })
        .max())
}

impl Session {
    pub fn installed_versions(&self) -> Result<Vec<InstallSlot>> {
        installed_versions(&self.layout)
    }

    pub fn installed_latest(&self) -> Result<Option<ToolVersion>> {
        installed_latest(&self.layout)
    }

    /// Pure query. `latest` is answered against the newest catalog release.
    pub fn is_installed(&self, spec: &VersionSpec) -> Result<bool> {
        let slot = self.requested_slot(spec)?;
        dir_is_populated(&self.layout.slot_dir(&slot))
    }

    pub fn require_installed(&self, spec: &VersionSpec) -> Result<InstallSlot> {
        let slot = self.requested_slot(spec)?;
        if dir_is_populated(&self.layout.slot_dir(&slot))? {
            return Ok(slot);
        }
        Err(Error::VersionNotInstalled {
            version: slot.to_string(),
        })
    }

    /// Installs `spec` after confirmation when it is missing. Only engages
    /// the prompt in an interactive session.
    pub fn ensure_installed(
        &mut self,
        spec: &VersionSpec,
        prompt: &dyn InstallPrompt,
    ) -> Result<bool> {
        if self.is_installed(spec)? {
            return Ok(true);
        }
        if !prompt.is_interactive() {
            return Err(Error::NonInteractiveInputRequired {
                version: spec.to_string(),
            });
        }
        if !prompt.confirm(&format!("pandoc {spec} is not installed. Install it now?"))? {
            return Ok(false);
        }

        self.install(spec, false)?;
        self.is_installed(spec)
    }

    /// Deletes a slot's install directory. When it held the active version,
    /// the pointer moves to the newest remaining release, or clears.
    pub fn uninstall(&mut self, spec: &VersionSpec) -> Result<UninstallOutcome> {
        let slot = match spec {
            VersionSpec::External(name) => {
                debug!(name, "external versions have nothing to uninstall");
                return Ok(UninstallOutcome::NotInstalled);
            }
            VersionSpec::Latest => match self.installed_latest()? {
                Some(version) => InstallSlot::Release(version),
                None => return Ok(UninstallOutcome::NotInstalled),
            },
            VersionSpec::Specific(version) => {
                self.installed_spelling(InstallSlot::Release(version.clone()))?
            }
            VersionSpec::Nightly => InstallSlot::Nightly,
        };

        let was_active = self.active()?.as_ref() == Some(&slot);
        let removed = remove_dir_if_exists(&self.layout.slot_dir(&slot))?;

        if was_active {
            let next = self.installed_latest()?.map(InstallSlot::Release);
            info!(
                removed = %slot,
                active = next.as_ref().map(ToString::to_string).unwrap_or_default(),
                "active version uninstalled"
            );
            self.set_active(next);
        }

        Ok(if removed {
            UninstallOutcome::Removed(slot)
        } else {
            UninstallOutcome::NotInstalled
        })
    }

    pub fn is_active(&mut self, spec: &VersionSpec) -> Result<bool> {
        let target = match spec {
            VersionSpec::External(name) => match self.policy.resolve_alias(name) {
                AliasTarget::Managed(slot) => slot,
                AliasTarget::External => return Ok(false),
            },
            VersionSpec::Latest => match self.installed_latest()? {
                Some(version) => InstallSlot::Release(version),
                None => return Ok(false),
            },
            VersionSpec::Specific(version) => InstallSlot::Release(version.clone()),
            VersionSpec::Nightly => InstallSlot::Nightly,
        };
        Ok(self.active()?.as_ref() == Some(&target))
    }

    /// Makes an installed slot the active one.
    pub fn activate(&mut self, spec: &VersionSpec) -> Result<InstallSlot> {
        let slot = match spec {
            VersionSpec::External(name) => match self.policy.resolve_alias(name) {
                AliasTarget::Managed(slot) => slot,
                AliasTarget::External => {
                    return Err(Error::ExternalVersionMisuse { name: name.clone() });
                }
            },
            VersionSpec::Latest => self
                .installed_latest()?
                .map(InstallSlot::Release)
                .ok_or_else(|| Error::VersionNotInstalled {
                    version: spec.to_string(),
                })?,
            VersionSpec::Specific(version) => {
                self.installed_spelling(InstallSlot::Release(version.clone()))?
            }
            VersionSpec::Nightly => InstallSlot::Nightly,
        };

        if !dir_is_populated(&self.layout.slot_dir(&slot))? {
            return Err(Error::VersionNotInstalled {
                version: slot.to_string(),
            });
        }
        self.set_active(Some(slot.clone()));
        Ok(slot)
    }

    /// The slot a request refers to. Aliases are rejected: their binaries do
    /// not live under the versions root.
    fn requested_slot(&self, spec: &VersionSpec) -> Result<InstallSlot> {
        match spec {
            VersionSpec::External(name) => Err(Error::ExternalVersionMisuse { name: name.clone() }),
            VersionSpec::Latest => {
                let release = self.catalog.latest()?;
                let version = release.version().ok_or_else(|| {
                    Error::catalog_unavailable(format!(
                        "newest release tag '{}' is not a version",
                        release.tag
                    ))
                })?;
                self.installed_spelling(InstallSlot::Release(version))
            }
            VersionSpec::Specific(version) => {
                self.installed_spelling(InstallSlot::Release(version.clone()))
            }
            VersionSpec::Nightly => Ok(InstallSlot::Nightly),
        }
    }

    /// The installed slot equal to `slot`, spelled the way its directory is
    /// named. `2.12.0` finds `versions/2.12`; anything not installed comes
    /// back as given.
    pub(crate) fn installed_spelling(&self, slot: InstallSlot) -> Result<InstallSlot> {
        if slot == InstallSlot::Nightly {
            return Ok(slot);
        }
        Ok(self
            .installed_versions()?
            .into_iter()
            .find(|installed| *installed == slot)
            .unwrap_or(slot))
    }
}
