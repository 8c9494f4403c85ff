use panvm_core::{Arch, ArchiveType, Error, Os, Result, ToolVersion, TOOL_NAME};
use regex::Regex;

use crate::rules::MACOS_ARCH_IN_NAME_SINCE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSelector {
    pub os: Os,
    pub arch: Arch,
    pub version: ToolVersion,
}

/// Builds the bundle-name expression for a selector.
///
/// Upstream renamed its bundles twice: first no architecture at all, then
/// `-os-arch` suffixes, then on macOS only `-arch-os` from 3.1.2 on.
pub fn bundle_pattern_source(selector: &BundleSelector) -> String {
    let prefix = format!(
        "^{TOOL_NAME}-{}(-\\d+)?",
        regex::escape(selector.version.as_str())
    );

    let suffix = match selector.os {
        Os::MacOs if selector.version < ToolVersion::from_components(&MACOS_ARCH_IN_NAME_SINCE) => {
            format!("-{}", Os::MacOs.as_str())
        }
        Os::MacOs => format!("-{}-{}", selector.arch.as_str(), Os::MacOs.as_str()),
        os => format!("(-{})?(-{})?", os.as_str(), selector.arch.as_str()),
    };

    let extension = match selector.os.bundle_archive() {
        ArchiveType::TarGz => "\\.tar\\.gz",
        ArchiveType::Zip => "\\.zip",
    };

    format!("{prefix}{suffix}{extension}$")
}

#[derive(Debug, Clone)]
pub struct BundlePattern {
    regex: Regex,
}

impl BundlePattern {
    pub fn build(selector: &BundleSelector) -> Result<Self> {
        let source = bundle_pattern_source(selector);
        let regex = Regex::new(&source).map_err(|err| Error::Command {
            context: format!("invalid bundle pattern '{source}'"),
            message: err.to_string(),
        })?;
        Ok(Self { regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, asset_name: &str) -> bool {
        self.regex.is_match(asset_name)
    }
}
