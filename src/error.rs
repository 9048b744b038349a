//! Error types for the updater.
//!
//! Every failure is fatal to the current operation and surfaces as a single
//! [`Error`]. Errors are grouped into an [`ErrorCategory`] so the CLI can
//! print one line of advice next to the message.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::update::installer::InstallStep;
use crate::update::method::InstallMethod;

pub type Result<T> = std::result::Result<T, Error>;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// No release asset fits the host platform.
    Resolution,
    /// Downloaded archive could not be unpacked.
    Extraction,
    /// Archive unpacked but held no usable executable.
    Locator,
    /// The atomic swap failed.
    Installer,
    /// Release lookup or download failed.
    Network,
    /// Local setup problem: missing tool, bad config, package manager.
    Environment,
}

impl ErrorCategory {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Resolution => "No matching release asset",
            Self::Extraction => "Archive extraction failed",
            Self::Locator => "Executable not found in artifact",
            Self::Installer => "Binary replacement failed",
            Self::Network => "Network request failed",
            Self::Environment => "Local environment problem",
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            Self::Resolution => "Download the appropriate file from the release page manually",
            Self::Extraction => "The download may be corrupted, try again",
            Self::Locator => "The release layout may have changed, install manually",
            Self::Installer => "Check permissions on the install directory",
            Self::Network => "Check your internet connection and try again",
            Self::Environment => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(
        "no compatible asset found for release {tag}, please download the appropriate file manually"
    )]
    NoCompatibleAsset { tag: String },

    #[error("failed to extract {format} archive {}: {source}", .path.display())]
    Extraction {
        path: PathBuf,
        format: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("unable to locate {tool} executable inside downloaded artifact {artifact}")]
    BinaryNotFound { tool: String, artifact: String },

    #[error("{step} failed for {}: {source}{}", .path.display(), rollback_note(.rolled_back))]
    Install {
        step: InstallStep,
        path: PathBuf,
        rolled_back: bool,
        #[source]
        source: io::Error,
    },

    #[error("{0} executable not found in PATH")]
    ToolNotFound(String),

    #[error("unable to parse {0} --version output")]
    VersionUnavailable(String),

    #[error("command `{command}` failed: {message}")]
    Command { command: String, message: String },

    #[error("HTTP request failed: {message}")]
    Http { message: String, status: Option<u16> },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("{tool} is managed by {method}, run `{hint}` instead")]
    ManagedInstall {
        tool: String,
        method: InstallMethod,
        hint: String,
    },

    #[error("invalid config file {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn rollback_note(rolled_back: &bool) -> &'static str {
    if *rolled_back {
        " (previous binary restored)"
    } else {
        ""
    }
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn extraction(
        path: impl Into<PathBuf>,
        format: &'static str,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Extraction {
            path: path.into(),
            format,
            source: source.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::NoCompatibleAsset { .. } => ErrorCategory::Resolution,
            Error::Extraction { .. } => ErrorCategory::Extraction,
            Error::BinaryNotFound { .. } => ErrorCategory::Locator,
            Error::Install { .. } => ErrorCategory::Installer,
            Error::Http { .. } | Error::InvalidResponse(_) => ErrorCategory::Network,
            Error::ToolNotFound(_)
            | Error::VersionUnavailable(_)
            | Error::Command { .. }
            | Error::ManagedInstall { .. }
            | Error::Config { .. }
            | Error::Io { .. } => ErrorCategory::Environment,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Http {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}
