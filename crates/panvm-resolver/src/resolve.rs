use panvm_catalog::ReleaseCatalog;
use panvm_core::{
    ArchiveType, Error, Platform, Release, ReleaseAsset, Result, ToolVersion, VersionSpec,
};
use tracing::debug;

use crate::pattern::{BundlePattern, BundleSelector};
use crate::rules::check_release_rules;

/// The subset of version requests that map onto catalog releases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseRequest {
    Latest,
    Specific(ToolVersion),
}

impl ReleaseRequest {
    pub fn from_spec(spec: &VersionSpec) -> Option<Self> {
        match spec {
            VersionSpec::Latest => Some(Self::Latest),
            VersionSpec::Specific(version) => Some(Self::Specific(version.clone())),
            VersionSpec::Nightly | VersionSpec::External(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub version: ToolVersion,
    pub name: String,
    pub download_url: String,
    pub archive: ArchiveType,
}

/// Maps a release request and host platform onto exactly one bundle.
pub fn resolve_asset(
    catalog: &ReleaseCatalog,
    request: &ReleaseRequest,
    platform: Platform,
) -> Result<ResolvedAsset> {
    let (version, release) = match request {
        ReleaseRequest::Latest => {
            let release = catalog.latest()?;
            let version = release.version().ok_or_else(|| {
                Error::catalog_unavailable(format!(
                    "newest release tag '{}' is not a version",
                    release.tag
                ))
            })?;
            check_release_rules(&version, platform, || catalog.available_versions())?;
            (version, release)
        }
        ReleaseRequest::Specific(version) => {
            check_release_rules(version, platform, || catalog.available_versions())?;
            let release = catalog
                .find(version)?
                .ok_or_else(|| Error::VersionNotFound {
                    version: version.clone(),
                })?;
            // Asset names and install directories follow the tag, so
            // `2.12.0` resolves as `2.12`.
            let canonical = release.version().unwrap_or_else(|| version.clone());
            (canonical, release)
        }
    };

    let selector = BundleSelector {
        os: platform.os,
        arch: platform.arch,
        version,
    };
    let asset = select_asset(release, &selector)?;
    debug!(name = %asset.name, url = %asset.download_url, "resolved bundle");

    Ok(ResolvedAsset {
        version: selector.version,
        name: asset.name.clone(),
        download_url: asset.download_url.clone(),
        archive: platform.os.bundle_archive(),
    })
}

/// First asset, in listed order, whose name matches the selector's pattern.
pub fn select_asset<'a>(release: &'a Release, selector: &BundleSelector) -> Result<&'a ReleaseAsset> {
    let pattern = BundlePattern::build(selector)?;
    release
        .assets
        .iter()
        .find(|asset| pattern.is_match(&asset.name))
        .ok_or_else(|| Error::BundleNotFound {
            version: selector.version.to_string(),
            os: selector.os,
            arch: selector.arch,
            pattern: pattern.as_str().to_string(),
        })
}
