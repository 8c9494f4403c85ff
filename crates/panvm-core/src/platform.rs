use std::fmt;

use crate::archive::ArchiveType;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    MacOs,
    Windows,
}

impl Os {
    /// Token used in upstream bundle names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::MacOs => "macOS",
            Self::Windows => "windows",
        }
    }

    pub fn bundle_archive(self) -> ArchiveType {
        match self {
            Self::Linux => ArchiveType::TarGz,
            Self::MacOs | Self::Windows => ArchiveType::Zip,
        }
    }

    pub fn binary_name(self) -> &'static str {
        match self {
            Self::Windows => "pandoc.exe",
            Self::Linux | Self::MacOs => "pandoc",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Architecture labels as the upstream distributor spells them. The same
/// silicon carries different labels per OS (`amd64` on linux, `x86_64`
/// elsewhere).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86_64,
    Amd64,
    Arm64,
}

impl Arch {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
}

impl Platform {
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    pub fn detect() -> Result<Self> {
        let os = detect_os()?;
        let arch = detect_arch(os)?;
        Ok(Self { os, arch })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

pub fn detect_os() -> Result<Os> {
    os_from_kernel(std::env::consts::OS)
}

pub fn detect_arch(os: Os) -> Result<Arch> {
    arch_for_os(os, std::env::consts::ARCH)
}

pub fn os_from_kernel(kernel: &str) -> Result<Os> {
    match kernel.trim().to_ascii_lowercase().as_str() {
        "linux" => Ok(Os::Linux),
        "darwin" | "macos" => Ok(Os::MacOs),
        "windows" => Ok(Os::Windows),
        _ => Err(Error::UnsupportedPlatform {
            kernel: kernel.to_string(),
        }),
    }
}

pub fn arch_for_os(os: Os, machine: &str) -> Result<Arch> {
    let normalized = machine.trim().to_ascii_lowercase();
    let arch = match (os, normalized.as_str()) {
        (Os::Linux, "x86_64" | "amd64") => Some(Arch::Amd64),
        (Os::Linux, "aarch64" | "arm64") => Some(Arch::Arm64),
        (Os::MacOs, "x86_64") => Some(Arch::X86_64),
        (Os::MacOs, "aarch64" | "arm64") => Some(Arch::Arm64),
        (Os::Windows, "x86_64" | "amd64") => Some(Arch::X86_64),
        (Os::Windows, "aarch64" | "arm64") => Some(Arch::Arm64),
        _ => None,
    };

    arch.ok_or_else(|| Error::UnsupportedArchitecture {
        os,
        arch: machine.to_string(),
    })
}
