use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use panvm_core::{Error, Release, Result, RunArtifact, ToolVersion, WorkflowRun};
use tracing::{debug, info};

use crate::snapshot::{read_snapshot, write_snapshot};
use crate::source::ReleaseSource;

/// Oldest release whose bundles follow a naming scheme the matcher knows for
/// every platform. Older releases are left out of the catalog entirely.
pub const MIN_SUPPORTED_VERSION: [u64; 3] = [2, 0, 3];

pub fn minimum_supported_version() -> ToolVersion {
    ToolVersion::from_components(&MIN_SUPPORTED_VERSION)
}

/// Memoized view of the upstream release listing.
///
/// The first successful listing is kept for the lifetime of the catalog. When
/// a snapshot path is set, it replaces the network listing altogether.
pub struct ReleaseCatalog {
    source: Box<dyn ReleaseSource>,
    snapshot: Option<PathBuf>,
    releases: OnceCell<Vec<Release>>,
}

impl ReleaseCatalog {
    pub fn new(source: impl ReleaseSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            snapshot: None,
            releases: OnceCell::new(),
        }
    }

    pub fn with_snapshot(mut self, snapshot: Option<PathBuf>) -> Self {
        self.snapshot = snapshot;
        self
    }

    pub fn snapshot(&self) -> Option<&Path> {
        self.snapshot.as_deref()
    }

    pub fn list_releases(&self) -> Result<&[Release]> {
        if let Some(releases) = self.releases.get() {
            return Ok(releases);
        }

        let fetched = match &self.snapshot {
            Some(path) => {
                info!(path = %path.display(), "using release snapshot");
                read_snapshot(path).map_err(Error::catalog_unavailable)?
            }
            None => self.source.list_releases().map_err(|err| match err {
                Error::CatalogUnavailable { .. } => err,
                other => Error::catalog_unavailable(other),
            })?,
        };
        debug!(count = fetched.len(), "release catalog loaded");

        Ok(self.releases.get_or_init(|| fetched))
    }

    /// The newest release, as listed first by the source.
    pub fn latest(&self) -> Result<&Release> {
        self.list_releases()?
            .first()
            .ok_or_else(|| Error::catalog_unavailable("release source listed no releases"))
    }

    pub fn find(&self, version: &ToolVersion) -> Result<Option<&Release>> {
        Ok(self
            .list_releases()?
            .iter()
            .find(|release| release.version().as_ref() == Some(version)))
    }

    /// Released versions at or above the supported floor, newest first.
    pub fn available_versions(&self) -> Result<Vec<ToolVersion>> {
        let minimum = minimum_supported_version();
        let mut versions = self
            .list_releases()?
            .iter()
            .filter_map(Release::version)
            .filter(|version| *version >= minimum)
            .collect::<Vec<_>>();
        versions.sort_by(|a, b| b.cmp(a));
        versions.dedup();
        Ok(versions)
    }

    /// Successful nightly runs, newest first. Never memoized.
    pub fn successful_runs(&self) -> Result<Vec<WorkflowRun>> {
        let runs = self.source.list_workflow_runs()?;
        Ok(runs.into_iter().filter(WorkflowRun::succeeded).collect())
    }

    pub fn run_artifacts(&self, run: &WorkflowRun) -> Result<Vec<RunArtifact>> {
        self.source.run_artifacts(run)
    }

    pub fn write_snapshot(&self, path: &Path) -> Result<()> {
        let releases = self.list_releases()?;
        write_snapshot(path, releases)
    }
}
