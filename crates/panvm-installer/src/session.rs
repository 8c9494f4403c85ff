use std::path::PathBuf;

use panvm_catalog::ReleaseCatalog;
use panvm_core::{InstallSlot, Platform, Result};
use tracing::warn;

use crate::cache::DownloadCache;
use crate::download::Downloader;
use crate::extract::{CommandExtractor, Extractor};
use crate::layout::VersionsLayout;
use crate::state::installed_versions;

/// What an alias such as `default` or `system` stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasTarget {
    Managed(InstallSlot),
    External,
}

/// Decisions about the active version that live outside the install engine.
pub trait ActiveVersionPolicy {
    /// Active slot for a fresh session, given what is installed (nightly
    /// first, then newest release first).
    fn initial_active(&self, installed: &[InstallSlot]) -> Option<InstallSlot>;

    fn resolve_alias(&self, name: &str) -> AliasTarget;
}

/// Starts on the newest installed release; every alias is external.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatestInstalledPolicy;

impl ActiveVersionPolicy for LatestInstalledPolicy {
    fn initial_active(&self, installed: &[InstallSlot]) -> Option<InstallSlot> {
        installed
            .iter()
            .find(|slot| matches!(slot, InstallSlot::Release(_)))
            .cloned()
    }

    fn resolve_alias(&self, _name: &str) -> AliasTarget {
        AliasTarget::External
    }
}

/// Asks the user before an implicit install.
pub trait InstallPrompt {
    fn is_interactive(&self) -> bool;

    fn confirm(&self, question: &str) -> Result<bool>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ActivePointer {
    Unresolved,
    Resolved(Option<InstallSlot>),
}

/// Everything one run of the tool shares: layout, catalog memo, caches and
/// the active-version pointer. Independent sessions never share state.
pub struct Session {
    pub(crate) layout: VersionsLayout,
    pub(crate) platform: Platform,
    pub(crate) catalog: ReleaseCatalog,
    pub(crate) cache: DownloadCache,
    pub(crate) downloader: Box<dyn Downloader>,
    pub(crate) extractor: Box<dyn Extractor>,
    pub(crate) policy: Box<dyn ActiveVersionPolicy>,
    active: ActivePointer,
}

impl Session {
    pub fn new(
        layout: VersionsLayout,
        platform: Platform,
        catalog: ReleaseCatalog,
        downloader: impl Downloader + 'static,
    ) -> Self {
        Self {
            layout,
            platform,
            catalog,
            cache: DownloadCache::for_process(),
            downloader: Box::new(downloader),
            extractor: Box::new(CommandExtractor),
            policy: Box::new(LatestInstalledPolicy),
            active: ActivePointer::Unresolved,
        }
    }

    pub fn with_cache(mut self, cache: DownloadCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_extractor(mut self, extractor: impl Extractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn with_policy(mut self, policy: impl ActiveVersionPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn layout(&self) -> &VersionsLayout {
        &self.layout
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn catalog(&self) -> &ReleaseCatalog {
        &self.catalog
    }

    pub fn slot_dir(&self, slot: &InstallSlot) -> PathBuf {
        self.layout.slot_dir(slot)
    }

    /// Path of the managed executable inside a slot's install directory.
    pub fn bin_path(&self, slot: &InstallSlot) -> PathBuf {
        self.slot_dir(slot).join(self.platform.os.binary_name())
    }

    /// The active slot, resolved through the policy on first use.
    pub fn active(&mut self) -> Result<Option<InstallSlot>> {
        if let ActivePointer::Resolved(active) = &self.active {
            return Ok(active.clone());
        }

        let installed = installed_versions(&self.layout)?;
        let initial = self
            .policy
            .initial_active(&installed)
            .and_then(|slot| {
                if installed.contains(&slot) {
                    Some(slot)
                } else {
                    warn!(version = %slot, "ignoring default version that is not installed");
                    None
                }
            });
        self.active = ActivePointer::Resolved(initial.clone());
        Ok(initial)
    }

    pub(crate) fn set_active(&mut self, slot: Option<InstallSlot>) {
        self.active = ActivePointer::Resolved(slot);
    }

    /// Points the active version at `slot` when nothing is active yet.
    pub(crate) fn adopt_if_inactive(&mut self, slot: &InstallSlot) -> Result<()> {
        if self.active()?.is_none() {
            self.set_active(Some(slot.clone()));
        }
        Ok(())
    }
}
