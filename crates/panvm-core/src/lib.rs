mod archive;
mod error;
mod platform;
mod release;
mod version;

pub use archive::ArchiveType;
pub use error::{BoxError, Error, IoContext, Result};
pub use platform::{arch_for_os, detect_arch, detect_os, os_from_kernel, Arch, Os, Platform};
pub use release::{Release, ReleaseAsset, RunArtifact, RunConclusion, WorkflowRun};
pub use version::{
    sort_install_slots, InstallSlot, ParseVersionError, ToolVersion, VersionSpec, LATEST, NIGHTLY,
};

/// Name of the managed upstream tool, as it appears in bundle names.
pub const TOOL_NAME: &str = "pandoc";

#[cfg(test)]
mod tests;
