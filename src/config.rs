use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::update::selector::{AssetSelector, DEFAULT_NON_CLI_KEYWORDS};

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Executable name on PATH and inside release archives
    pub tool_name: String,

    /// GitHub `owner/name` the releases come from
    pub repository: String,

    /// Name fragments marking assets and files that are not the CLI
    pub non_cli_keywords: Vec<String>,

    /// Binary to replace; looked up on PATH when unset
    pub install_path: Option<PathBuf>,

    /// Start the tool when it is already current
    pub launch_when_current: bool,

    pub homebrew_cask: String,
    pub npm_package: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tool_name: "codex".to_string(),
            repository: "openai/codex".to_string(),
            non_cli_keywords: DEFAULT_NON_CLI_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            install_path: None,
            launch_when_current: true,
            homebrew_cask: "codex".to_string(),
            npm_package: "@openai/codex".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config: Config = toml::from_str(&content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("codexu").join("config.toml"))
    }

    pub fn selector(&self) -> AssetSelector {
        AssetSelector::new(&self.non_cli_keywords)
    }
}
