//! Host platform keys used to match release asset names.
//!
//! Asset names carry no structured metadata, so an OS or architecture is
//! recognised purely by keyword substrings in the lowercased file name.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsKey {
    Windows,
    Darwin,
    Linux,
}

impl OsKey {
    /// Map an OS name such as `std::env::consts::OS` or `uname -s` output.
    /// Unrecognised systems yield `None`, which matches every asset.
    pub fn from_system(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_lowercase();
        if raw.starts_with("win") {
            Some(Self::Windows)
        } else if raw.starts_with("darwin") || raw.starts_with("macos") {
            Some(Self::Darwin)
        } else if raw.starts_with("linux") {
            Some(Self::Linux)
        } else {
            None
        }
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Windows => &["windows", "msvc", "win"],
            Self::Darwin => &["darwin", "mac", "osx"],
            Self::Linux => &["linux"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Darwin => "darwin",
            Self::Linux => "linux",
        }
    }
}

impl fmt::Display for OsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArchKey {
    X86_64,
    Arm64,
    /// Any other machine string, lowercased. Has no keywords.
    Other(String),
}

impl ArchKey {
    pub fn from_machine(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_lowercase();
        match raw.as_str() {
            "" => None,
            "x86_64" | "amd64" => Some(Self::X86_64),
            "arm64" | "aarch64" => Some(Self::Arm64),
            _ => Some(Self::Other(raw)),
        }
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::X86_64 => &["x86_64", "amd64"],
            Self::Arm64 => &["arm64", "aarch64"],
            Self::Other(_) => &[],
        }
    }
}

impl fmt::Display for ArchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X86_64 => f.write_str("x86_64"),
            Self::Arm64 => f.write_str("arm64"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

/// The running host, already mapped to canonical keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPlatform {
    pub os: Option<OsKey>,
    pub arch: Option<ArchKey>,
}

impl HostPlatform {
    pub fn new(os: Option<OsKey>, arch: Option<ArchKey>) -> Self {
        Self { os, arch }
    }

    pub fn current() -> Self {
        Self::new(
            OsKey::from_system(std::env::consts::OS),
            ArchKey::from_machine(std::env::consts::ARCH),
        )
    }

    pub fn is_windows(&self) -> bool {
        self.os == Some(OsKey::Windows)
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let os = self.os.map(|o| o.as_str()).unwrap_or("unknown");
        match &self.arch {
            Some(arch) => write!(f, "{}/{}", os, arch),
            None => write!(f, "{}/unknown", os),
        }
    }
}
