mod pattern;
mod resolve;
mod rules;

pub use pattern::{bundle_pattern_source, BundlePattern, BundleSelector};
pub use resolve::{resolve_asset, select_asset, ReleaseRequest, ResolvedAsset};
pub use rules::{
    check_release_rules, BROKEN_RELEASE, BROKEN_RELEASE_FALLBACK, LINUX_ARM64_SINCE,
    MACOS_ARCH_IN_NAME_SINCE, MACOS_ARM64_SINCE,
};
