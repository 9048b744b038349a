use std::fmt;
use std::process::{Command, Stdio};

use crate::config::Config;

/// How the tool ended up on this machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMethod {
    Homebrew,
    Npm,
    /// Anything else: a binary we are allowed to replace ourselves
    Custom,
}

impl InstallMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Homebrew => "homebrew",
            Self::Npm => "npm",
            Self::Custom => "custom",
        }
    }

    /// Command that upgrades a package-manager install, if any
    pub fn upgrade_hint(&self, config: &Config) -> Option<String> {
        match self {
            Self::Homebrew => Some(format!("brew upgrade --cask {}", config.homebrew_cask)),
            Self::Npm => Some(format!("npm update -g {}", config.npm_package)),
            Self::Custom => None,
        }
    }
}

impl fmt::Display for InstallMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run a probe command quietly; true only if it exists and exits 0
fn probe(program: &str, args: &[&str]) -> bool {
    if which::which(program).is_err() {
        return false;
    }

    let ok = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false);
    log::debug!("{} {} -> {}", program, args.join(" "), ok);
    ok
}

pub fn detect(config: &Config) -> InstallMethod {
    if probe("brew", &["list", "--cask", &config.homebrew_cask]) {
        InstallMethod::Homebrew
    } else if probe("npm", &["list", "-g", &config.npm_package, "--depth=0"]) {
        InstallMethod::Npm
    } else {
        InstallMethod::Custom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upgrade_hints() {
        let config = Config::default();
        assert_eq!(
            InstallMethod::Homebrew.upgrade_hint(&config).as_deref(),
            Some("brew upgrade --cask codex")
        );
        assert_eq!(
            InstallMethod::Npm.upgrade_hint(&config).as_deref(),
            Some("npm update -g @openai/codex")
        );
        assert_eq!(InstallMethod::Custom.upgrade_hint(&config), None);
    }

    #[test]
    fn test_probe_missing_program() {
        assert!(!probe("codexu-test-no-such-program", &["--version"]));
    }
}
