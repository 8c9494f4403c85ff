use panvm_core::{Error, Release, ReleaseAsset, Result, RunArtifact, RunConclusion, WorkflowRun};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::source::ReleaseSource;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const UPSTREAM_REPO: &str = "jgm/pandoc";
pub const NIGHTLY_WORKFLOW: &str = "nightly.yml";

const RELEASES_PER_PAGE: u32 = 100;
const RUNS_PER_PAGE: u32 = 30;
const MAX_RELEASE_PAGES: u32 = 20;

#[derive(Debug, Deserialize)]
struct GitHubRelease {
    tag_name: String,
    #[serde(default)]
    assets: Vec<GitHubAsset>,
}

#[derive(Debug, Deserialize)]
struct GitHubAsset {
    name: String,
    browser_download_url: String,
}

#[derive(Debug, Deserialize)]
struct GitHubRunsPage {
    #[serde(default)]
    workflow_runs: Vec<GitHubRun>,
}

#[derive(Debug, Deserialize)]
struct GitHubRun {
    id: u64,
    conclusion: Option<RunConclusion>,
    head_sha: String,
    artifacts_url: String,
}

#[derive(Debug, Deserialize)]
struct GitHubArtifactsPage {
    #[serde(default)]
    artifacts: Vec<GitHubArtifact>,
}

#[derive(Debug, Deserialize)]
struct GitHubArtifact {
    name: String,
    archive_download_url: String,
    #[serde(default)]
    expired: bool,
}

/// Release source backed by the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubSource {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubSource {
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .user_agent(concat!("panvm/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| Error::http(&api_url, err))?;
        Ok(Self {
            client,
            api_url,
            token: token.filter(|value| !value.trim().is_empty()),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn releases_url(&self, page: u32) -> String {
        format!(
            "{}/repos/{UPSTREAM_REPO}/releases?per_page={RELEASES_PER_PAGE}&page={page}",
            self.api_url
        )
    }

    fn runs_url(&self) -> String {
        format!(
            "{}/repos/{UPSTREAM_REPO}/actions/workflows/{NIGHTLY_WORKFLOW}/runs?per_page={RUNS_PER_PAGE}",
            self.api_url
        )
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url, "requesting");
        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        request
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.json::<T>())
            .map_err(|err| Error::http(url, err))
    }
}

impl ReleaseSource for GitHubSource {
    fn list_releases(&self) -> Result<Vec<Release>> {
        let mut releases = Vec::new();
        for page in 1..=MAX_RELEASE_PAGES {
            let batch: Vec<GitHubRelease> = self
                .get_json(&self.releases_url(page))
                .map_err(Error::catalog_unavailable)?;
            if batch.is_empty() {
                break;
            }
            releases.extend(batch.into_iter().map(|release| Release {
                tag: release.tag_name,
                assets: release
                    .assets
                    .into_iter()
                    .map(|asset| ReleaseAsset {
                        name: asset.name,
                        download_url: asset.browser_download_url,
                    })
                    .collect(),
            }));
        }

        debug!(count = releases.len(), "fetched release listing");
        Ok(releases)
    }

    fn list_workflow_runs(&self) -> Result<Vec<WorkflowRun>> {
        let page: GitHubRunsPage = self.get_json(&self.runs_url())?;
        Ok(page
            .workflow_runs
            .into_iter()
            .map(|run| WorkflowRun {
                id: run.id,
                conclusion: run.conclusion,
                head_sha: run.head_sha,
                artifacts_url: run.artifacts_url,
            })
            .collect())
    }

    fn run_artifacts(&self, run: &WorkflowRun) -> Result<Vec<RunArtifact>> {
        let page: GitHubArtifactsPage = self.get_json(&run.artifacts_url)?;
        Ok(page
            .artifacts
            .into_iter()
            .filter(|artifact| !artifact.expired)
            .map(|artifact| RunArtifact {
                name: artifact.name,
                download_url: artifact.archive_download_url,
            })
            .collect())
    }
}
