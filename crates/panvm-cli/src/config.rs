use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use panvm_catalog::{
    snapshot_override_from_env, validate_snapshot_path, DEFAULT_API_URL, RELEASES_SNAPSHOT_ENV,
};
use panvm_core::{InstallSlot, VersionSpec};
use panvm_installer::{ActiveVersionPolicy, AliasTarget};
use serde::{Deserialize, Serialize};
use tracing::warn;

const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_PAT", "GITHUB_TOKEN"];

/// The alias that names the configured default version.
pub(crate) const DEFAULT_ALIAS: &str = "default";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct PanvmConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) github_api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) github_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) default_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) releases_snapshot: Option<PathBuf>,
}

impl PanvmConfig {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        parse_config(&content).with_context(|| format!("failed parsing config: {}", path.display()))
    }

    pub(crate) fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed creating config dir: {}", parent.display()))?;
        }
        let content = toml::to_string(self)
            .with_context(|| format!("failed serializing config: {}", path.display()))?;
        fs::write(path, content)
            .with_context(|| format!("failed writing config: {}", path.display()))
    }

    pub(crate) fn api_url(&self) -> &str {
        self.github_api_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_API_URL)
    }

    /// Token from the environment first, then the config file.
    pub(crate) fn token(&self) -> Option<String> {
        let from_env = TOKEN_ENV_VARS
            .iter()
            .map(|name| std::env::var(name).ok());
        select_token(from_env, self.github_token.as_deref())
    }

    /// `PANVM_RELEASES_SNAPSHOT` wins over the config file. Invalid paths are
    /// dropped with a warning.
    pub(crate) fn snapshot(&self) -> Option<PathBuf> {
        if std::env::var_os(RELEASES_SNAPSHOT_ENV).is_some_and(|value| !value.is_empty()) {
            return snapshot_override_from_env();
        }
        self.releases_snapshot
            .as_deref()
            .and_then(validate_snapshot_path)
    }

    pub(crate) fn default_slot(&self) -> Option<InstallSlot> {
        let value = self.default_version.as_deref()?.trim();
        if value.is_empty() {
            return None;
        }
        let slot = VersionSpec::parse(value).slot();
        if slot.is_none() {
            warn!(value, "ignoring default_version that names no installable version");
        }
        slot
    }
}

fn parse_config(content: &str) -> Result<PanvmConfig> {
    Ok(toml::from_str::<PanvmConfig>(content)?)
}

pub(crate) fn select_token<I>(env_values: I, configured: Option<&str>) -> Option<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    env_values
        .into_iter()
        .flatten()
        .chain(configured.map(str::to_string))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

/// Starts on the configured default version when it is installed, else on
/// the newest installed release. Only `default` maps to a managed slot.
#[derive(Debug, Clone, Default)]
pub(crate) struct ConfigPolicy {
    default: Option<InstallSlot>,
}

impl ConfigPolicy {
    pub(crate) fn new(config: &PanvmConfig) -> Self {
        Self {
            default: config.default_slot(),
        }
    }
}

impl ActiveVersionPolicy for ConfigPolicy {
    fn initial_active(&self, installed: &[InstallSlot]) -> Option<InstallSlot> {
        if let Some(default) = self.default.as_ref().filter(|slot| installed.contains(slot)) {
            return Some(default.clone());
        }
        installed
            .iter()
            .find(|slot| matches!(slot, InstallSlot::Release(_)))
            .cloned()
    }

    fn resolve_alias(&self, name: &str) -> AliasTarget {
        match (&self.default, name) {
            (Some(slot), DEFAULT_ALIAS) => AliasTarget::Managed(slot.clone()),
            _ => AliasTarget::External,
        }
    }
}
