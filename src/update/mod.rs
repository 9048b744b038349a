pub mod archive;
pub mod github;
pub mod installer;
pub mod locator;
pub mod method;
pub mod platform;
pub mod selector;
pub mod version;

use std::path::{Path, PathBuf};
use std::process::Command;

use colored::Colorize;

use crate::config::Config;
use crate::error::{Error, Result};
use locator::BinaryMatcher;
use method::InstallMethod;
use platform::HostPlatform;

pub use selector::ReleaseAsset;
pub use version::{ReleaseInfo, VersionToken};

/// Installed and latest versions side by side
#[derive(Debug, Clone)]
pub struct UpdateCheck {
    pub installed: VersionToken,
    pub latest: ReleaseInfo,
}

impl UpdateCheck {
    pub fn is_up_to_date(&self) -> bool {
        version::is_up_to_date(&self.installed, &self.latest.version)
    }

    /// Equal versions never reach the installer unless forced
    pub fn needs_update(&self, force: bool) -> bool {
        force || !self.is_up_to_date()
    }
}

pub fn check_for_update(config: &Config) -> Result<UpdateCheck> {
    let installed = version::installed_version(&tool_program(config))?;
    let latest = github::latest_release(&config.repository)?;
    log::info!(
        "installed {} {}, latest {} ({})",
        config.tool_name,
        installed,
        latest.version,
        latest.tag
    );
    Ok(UpdateCheck { installed, latest })
}

/// The program run for `--version` and launch: the configured install path
/// when set, else the tool name looked up on PATH
pub fn tool_program(config: &Config) -> PathBuf {
    config
        .install_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.tool_name))
}

/// The executable to replace: configured path, else the PATH entry resolved
/// through symlinks
pub fn resolve_install_path(config: &Config) -> Result<PathBuf> {
    if let Some(path) = &config.install_path {
        return Ok(path.clone());
    }
    let found =
        which::which(&config.tool_name).map_err(|_| Error::ToolNotFound(config.tool_name.clone()))?;
    found.canonicalize().map_err(|e| Error::io(&found, e))
}

/// Update through the install method in use. Package-manager installs are
/// reported, not upgraded.
pub fn update(config: &Config, check: &UpdateCheck) -> Result<()> {
    let method = method::detect(config);
    println!(
        "Updating {} from {} {} {} using {} workflow.",
        config.tool_name,
        check.installed.to_string().dimmed(),
        "→".yellow(),
        check.latest.version.to_string().green(),
        method
    );

    if let Some(hint) = method.upgrade_hint(config) {
        return Err(Error::ManagedInstall {
            tool: config.tool_name.clone(),
            method,
            hint,
        });
    }
    debug_assert_eq!(method, InstallMethod::Custom);

    install_release(config, &check.latest, &HostPlatform::current())
}

/// Download, unpack and swap in the release binary for `host`
pub fn install_release(config: &Config, release: &ReleaseInfo, host: &HostPlatform) -> Result<()> {
    let live = resolve_install_path(config)?;
    let assets = github::fetch_release_assets(&config.repository, &release.tag)?;
    let selector = config.selector();

    let asset = selector
        .select(&assets, host.os, host.arch.as_ref())
        .ok_or_else(|| Error::NoCompatibleAsset {
            tag: release.tag.clone(),
        })?;
    log::info!("selected {} for {}", asset.name, host);

    // dropped on every exit path, taking the download with it
    let scratch = tempfile::Builder::new()
        .prefix("codexu-")
        .tempdir()
        .map_err(|e| Error::io(std::env::temp_dir(), e))?;

    let archive_path = scratch.path().join(asset.file_name());
    println!(
        "Downloading {} to {} ...",
        asset.file_name(),
        archive_path.display().to_string().dimmed()
    );
    github::download(&asset.download_url, &archive_path)?;

    println!("{}", "Extracting...".cyan());
    let matcher = BinaryMatcher::new(&config.tool_name, selector.clone());
    let new_binary = unpack_binary(&archive_path, scratch.path(), &matcher, host, &config.tool_name)?;

    println!("{}", "Installing...".cyan());
    installer::install(&new_binary, &live)?;

    println!(
        "{} Installed new {} binary to {}",
        "✓".green(),
        config.tool_name,
        live.display()
    );
    Ok(())
}

/// Extract an artifact and find the executable inside it
pub fn unpack_binary(
    archive_path: &Path,
    scratch_dir: &Path,
    matcher: &BinaryMatcher,
    host: &HostPlatform,
    tool: &str,
) -> Result<PathBuf> {
    let root = archive::extract(archive_path, scratch_dir)?;
    locator::locate(&root, matcher, host).ok_or_else(|| Error::BinaryNotFound {
        tool: tool.to_string(),
        artifact: archive_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    })
}

/// Start the tool with inherited stdio and return its exit code
pub fn launch(program: &Path) -> Result<i32> {
    let status = Command::new(program).status().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::ToolNotFound(program.display().to_string())
        } else {
            Error::Command {
                command: program.display().to_string(),
                message: e.to_string(),
            }
        }
    })?;
    Ok(status.code().unwrap_or(1))
}
