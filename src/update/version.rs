use std::fmt;
use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Comparable version extracted from free-form text.
///
/// Two tokens are only ever compared for equality. No ordering is implied:
/// an installed build that is newer than the published one still counts as
/// "different".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A published release: its tag plus the version token derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub version: VersionToken,
    pub tag: String,
}

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)v?(\d+(?:\.\d+)*([-\w.]+)?)").expect("version pattern is valid")
    })
}

/// Extract a version token from `--version` output or a release tag.
///
/// Returns `None` for empty or whitespace-only input. Text without anything
/// version-shaped is kept verbatim so that it still compares as "different".
pub fn normalize(raw: &str) -> Option<VersionToken> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let matched = version_pattern()
        .find(trimmed)
        .map(|m| m.as_str())
        .unwrap_or(trimmed);

    let token = match matched.chars().next() {
        Some('v') | Some('V') => &matched[1..],
        _ => matched,
    };
    Some(VersionToken(token.to_string()))
}

/// Installed and latest are the same build only on exact token equality
pub fn is_up_to_date(installed: &VersionToken, latest: &VersionToken) -> bool {
    installed == latest
}

/// Ask the installed tool for its version via `<program> --version`.
/// A bare name is looked up on PATH.
pub fn installed_version(program: &Path) -> Result<VersionToken> {
    let tool = program.display().to_string();
    let output = Command::new(program).arg("--version").output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::ToolNotFound(tool.clone())
        } else {
            Error::Command {
                command: format!("{} --version", tool),
                message: e.to_string(),
            }
        }
    })?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !output.status.success() {
        let message = match stderr.trim() {
            "" => "unknown error".to_string(),
            s => s.to_string(),
        };
        return Err(Error::Command {
            command: format!("{} --version", tool),
            message,
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    log::debug!("{} --version printed {:?}", tool, stdout.trim());

    normalize(&stdout)
        .or_else(|| normalize(&stderr))
        .ok_or_else(|| Error::VersionUnavailable(tool))
}
