mod cache;
mod download;
mod extract;
mod fs_utils;
mod install;
mod layout;
mod nightly;
mod normalize;
mod session;
mod state;

pub use cache::{CachedBundle, DownloadCache};
pub use download::{Downloader, HttpDownloader};
pub use extract::{CommandExtractor, Extractor};
pub use layout::{default_user_root, VersionsLayout, HOME_ENV};
pub use nightly::{
    nightly_artifact_name, read_nightly_commit, NightlyOutcome, NIGHTLY_MARKER_PREFIX,
};
pub use session::{
    ActiveVersionPolicy, AliasTarget, InstallPrompt, LatestInstalledPolicy, Session,
};
pub use state::{installed_latest, installed_versions, UninstallOutcome};
