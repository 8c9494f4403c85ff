use panvm_catalog::minimum_supported_version;
use panvm_core::{Arch, Error, Os, Platform, Result, ToolVersion};

pub const LINUX_ARM64_SINCE: [u64; 2] = [2, 12];
pub const MACOS_ARM64_SINCE: [u64; 3] = [3, 1, 2];
/// First release whose macOS bundles carry an architecture token.
pub const MACOS_ARCH_IN_NAME_SINCE: [u64; 3] = [3, 1, 2];
pub const BROKEN_RELEASE: [u64; 3] = [2, 2, 3];
pub const BROKEN_RELEASE_FALLBACK: [u64; 4] = [2, 2, 3, 2];

/// Rejects requests that upstream never produced a usable bundle for, before
/// any asset search. `known_versions` is only consulted to suggest a
/// replacement for the broken release; when it fails the fixed fallback is
/// suggested instead.
pub fn check_release_rules<F>(
    version: &ToolVersion,
    platform: Platform,
    known_versions: F,
) -> Result<()>
where
    F: FnOnce() -> Result<Vec<ToolVersion>>,
{
    let broken = ToolVersion::from_components(&BROKEN_RELEASE);
    if *version == broken {
        let suggested = known_versions()
            .unwrap_or_default()
            .into_iter()
            .filter(|candidate| *candidate > broken)
            .min()
            .unwrap_or_else(|| ToolVersion::from_components(&BROKEN_RELEASE_FALLBACK));
        return Err(Error::KnownBrokenRelease {
            version: version.clone(),
            suggested,
        });
    }

    if platform.arch == Arch::Arm64 {
        let since = match platform.os {
            Os::Linux => Some(ToolVersion::from_components(&LINUX_ARM64_SINCE)),
            Os::MacOs => Some(ToolVersion::from_components(&MACOS_ARM64_SINCE)),
            Os::Windows => None,
        };
        if let Some(since) = since.filter(|since| version < since) {
            return Err(Error::ArchitectureNotSupportedForVersion {
                os: platform.os,
                arch: platform.arch,
                version: version.clone(),
                since,
            });
        }
    }

    let minimum = minimum_supported_version();
    if *version < minimum {
        return Err(Error::VersionTooOld {
            version: version.clone(),
            minimum,
        });
    }

    Ok(())
}
