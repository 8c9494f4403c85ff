use serde::{Deserialize, Serialize};

use crate::version::ToolVersion;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub download_url: String,
}

/// One upstream release: its tag and downloadable bundles, in listed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub tag: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    pub fn version(&self) -> Option<ToolVersion> {
        ToolVersion::parse(&self.tag).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunConclusion {
    Success,
    Failure,
    Cancelled,
    Skipped,
    #[serde(other)]
    Other,
}

/// A build-workflow run producing nightly bundles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRun {
    pub id: u64,
    pub conclusion: Option<RunConclusion>,
    pub head_sha: String,
    pub artifacts_url: String,
}

impl WorkflowRun {
    pub fn succeeded(&self) -> bool {
        self.conclusion == Some(RunConclusion::Success)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunArtifact {
    pub name: String,
    pub download_url: String,
}
