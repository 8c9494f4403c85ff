use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::platform::{Arch, Os};
use crate::version::ToolVersion;

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported platform '{kernel}'; supported: linux, macOS, windows")]
    UnsupportedPlatform { kernel: String },

    #[error("unsupported architecture '{arch}' on {os}")]
    UnsupportedArchitecture { os: Os, arch: String },

    #[error("release catalog is unavailable: {source}")]
    CatalogUnavailable {
        #[source]
        source: BoxError,
    },

    #[error("pandoc {version} was not found in the release catalog")]
    VersionNotFound { version: ToolVersion },

    #[error("pandoc {version} is older than the minimum supported version {minimum}")]
    VersionTooOld {
        version: ToolVersion,
        minimum: ToolVersion,
    },

    #[error("pandoc {version} has no {arch} build for {os}; {arch} is available from {since}")]
    ArchitectureNotSupportedForVersion {
        os: Os,
        arch: Arch,
        version: ToolVersion,
        since: ToolVersion,
    },

    #[error("pandoc {version} shipped a broken build; install {suggested} instead")]
    KnownBrokenRelease {
        version: ToolVersion,
        suggested: ToolVersion,
    },

    #[error("no pandoc {version} bundle matches {os}/{arch} (pattern: {pattern})")]
    BundleNotFound {
        version: String,
        os: Os,
        arch: Arch,
        pattern: String,
    },

    #[error("failed to prepare download cache directory {}: {source}", path.display())]
    CacheDirectoryError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to extract {}: {message}", archive.display())]
    ExtractionFailure { archive: PathBuf, message: String },

    #[error("pandoc {version} is not installed")]
    VersionNotInstalled { version: String },

    #[error("'{name}' refers to an external pandoc that is not managed here")]
    ExternalVersionMisuse { name: String },

    #[error("installing pandoc {version} needs confirmation, but the session is not interactive")]
    NonInteractiveInputRequired { version: String },

    #[error("no nightly artifact named '{name}' in build run {run_id}")]
    NightlyArtifactNotFound { name: String, run_id: u64 },

    #[error("no successful nightly build runs were found")]
    NoNightlyRuns,

    #[error("cannot resolve the panvm data directory: {message}")]
    DataDirUnavailable { message: String },

    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("invalid release snapshot {}: {message}", path.display())]
    Snapshot { path: PathBuf, message: String },

    #[error("{context}: {message}")]
    Command { context: String, message: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub fn catalog_unavailable(source: impl Into<BoxError>) -> Self {
        Self::CatalogUnavailable {
            source: source.into(),
        }
    }

    pub fn http(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Http {
            url: url.into(),
            message: message.to_string(),
        }
    }
}

/// Attaches a path-bearing message to I/O failures, mirroring
/// `anyhow::Context::with_context` for the typed error.
pub trait IoContext<T> {
    fn io_context<F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> IoContext<T> for std::result::Result<T, io::Error> {
    fn io_context<F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|source| Error::Io {
            context: context(),
            source,
        })
    }
}
