mod catalog;
mod github;
mod snapshot;
mod source;

pub use catalog::{minimum_supported_version, ReleaseCatalog, MIN_SUPPORTED_VERSION};
pub use github::{GitHubSource, DEFAULT_API_URL, NIGHTLY_WORKFLOW, UPSTREAM_REPO};
pub use snapshot::{
    read_snapshot, snapshot_override_from_env, validate_snapshot_path, write_snapshot,
    RELEASES_SNAPSHOT_ENV, SNAPSHOT_EXTENSION,
};
pub use source::ReleaseSource;

#[cfg(test)]
mod tests;
