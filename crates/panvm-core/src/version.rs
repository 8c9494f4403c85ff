use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const NIGHTLY: &str = "nightly";
pub const LATEST: &str = "latest";

/// A dotted numeric release version such as `3.1.2` or `2.2.3.2`.
///
/// Missing trailing components compare as zero, so `2.12` equals `2.12.0`.
/// The text it was parsed from is kept for display and directory names.
#[derive(Debug, Clone)]
pub struct ToolVersion {
    components: Vec<u64>,
    text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVersionError {
    input: String,
}

impl fmt::Display for ParseVersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid version '{}'", self.input)
    }
}

impl std::error::Error for ParseVersionError {}

impl ToolVersion {
    pub fn parse(input: &str) -> Result<Self, ParseVersionError> {
        let trimmed = input.trim();
        let text = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let invalid = || ParseVersionError {
            input: input.to_string(),
        };
        if text.is_empty() {
            return Err(invalid());
        }

        let mut components = Vec::new();
        for part in text.split('.') {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            components.push(part.parse::<u64>().map_err(|_| invalid())?);
        }

        Ok(Self {
            components,
            text: text.to_string(),
        })
    }

    pub fn from_components(components: &[u64]) -> Self {
        let text = components
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        Self {
            components: components.to_vec(),
            text,
        }
    }

    pub fn components(&self) -> &[u64] {
        &self.components
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    fn significant(&self) -> &[u64] {
        let len = self
            .components
            .iter()
            .rposition(|component| *component != 0)
            .map_or(0, |index| index + 1);
        &self.components[..len]
    }
}

impl FromStr for ToolVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl PartialEq for ToolVersion {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl Eq for ToolVersion {}

impl Hash for ToolVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl PartialOrd for ToolVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ToolVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let width = self.components.len().max(other.components.len());
        for index in 0..width {
            let left = self.components.get(index).copied().unwrap_or(0);
            let right = other.components.get(index).copied().unwrap_or(0);
            match left.cmp(&right) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl Serialize for ToolVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for ToolVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// A version request as typed by a user, resolved once at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    Latest,
    Specific(ToolVersion),
    Nightly,
    /// A pandoc this tool does not manage, e.g. `system`.
    External(String),
}

impl VersionSpec {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case(LATEST) {
            return Self::Latest;
        }
        if trimmed.eq_ignore_ascii_case(NIGHTLY) {
            return Self::Nightly;
        }
        match ToolVersion::parse(trimmed) {
            Ok(version) => Self::Specific(version),
            Err(_) => Self::External(trimmed.to_string()),
        }
    }

    /// The install slot this request maps to without consulting the catalog.
    pub fn slot(&self) -> Option<InstallSlot> {
        match self {
            Self::Specific(version) => Some(InstallSlot::Release(version.clone())),
            Self::Nightly => Some(InstallSlot::Nightly),
            Self::Latest | Self::External(_) => None,
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str(LATEST),
            Self::Specific(version) => write!(f, "{version}"),
            Self::Nightly => f.write_str(NIGHTLY),
            Self::External(name) => f.write_str(name),
        }
    }
}

/// One directory under the versions root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstallSlot {
    Nightly,
    Release(ToolVersion),
}

impl InstallSlot {
    pub fn from_dir_name(name: &str) -> Option<Self> {
        if name == NIGHTLY {
            return Some(Self::Nightly);
        }
        ToolVersion::parse(name).ok().map(Self::Release)
    }

    pub fn dir_name(&self) -> &str {
        match self {
            Self::Nightly => NIGHTLY,
            Self::Release(version) => version.as_str(),
        }
    }

    pub fn release(&self) -> Option<&ToolVersion> {
        match self {
            Self::Nightly => None,
            Self::Release(version) => Some(version),
        }
    }
}

impl fmt::Display for InstallSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Nightly first, then releases from newest to oldest.
pub fn sort_install_slots(slots: &mut [InstallSlot]) {
    slots.sort_by(|a, b| match (a, b) {
        (InstallSlot::Nightly, InstallSlot::Nightly) => Ordering::Equal,
        (InstallSlot::Nightly, _) => Ordering::Less,
        (_, InstallSlot::Nightly) => Ordering::Greater,
        (InstallSlot::Release(left), InstallSlot::Release(right)) => right.cmp(left),
    });
}
