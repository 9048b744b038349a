//! Crash-safe replacement of the installed executable.
//!
//! The live binary, a staging copy (`.<name>.new`) and a single backup
//! (`<name>.bak`) share one directory so every move is an atomic rename.
//! The live path is only empty between moving it to the backup and renaming
//! the staged file into place; a failure in that window restores the backup.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::error::{Error, Result};

/// The three sibling paths of one installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTarget {
    live: PathBuf,
    staging: PathBuf,
    backup: PathBuf,
}

impl InstallTarget {
    pub fn new(live: impl Into<PathBuf>) -> Self {
        let live = live.into();
        let dir = live.parent().map(Path::to_path_buf).unwrap_or_default();
        let name = live
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            staging: dir.join(format!(".{}.new", name)),
            backup: dir.join(format!("{}.bak", name)),
            live,
        }
    }

    pub fn live(&self) -> &Path {
        &self.live
    }

    pub fn staging(&self) -> &Path {
        &self.staging
    }

    pub fn backup(&self) -> &Path {
        &self.backup
    }
}

/// Protocol steps, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStep {
    Stage,
    MarkExecutable,
    DropOldBackup,
    Backup,
    Swap,
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Stage => "staging new binary",
            Self::MarkExecutable => "marking staged binary executable",
            Self::DropOldBackup => "removing previous backup",
            Self::Backup => "backing up current binary",
            Self::Swap => "placing new binary",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapState {
    /// Nothing touched yet
    Clean,
    /// New binary copied to the staging path and executable
    Staged,
    /// New binary is live
    Swapped,
    /// Swap failed after the backup was taken; backup restored to live
    RolledBack,
    /// A step failed; live is untouched or could not be restored
    Failed,
}

/// Filesystem primitives the protocol is built from
pub trait FileOps {
    fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn remove_file(&self, path: &Path) -> io::Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn make_executable(&self, path: &Path) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileOps;

impl FileOps for StdFileOps {
    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::copy(from, to).map(|_| ())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    #[cfg(unix)]
    fn make_executable(&self, path: &Path) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(perms.mode() | 0o111);
        fs::set_permissions(path, perms)
    }

    #[cfg(not(unix))]
    fn make_executable(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

pub struct BinaryInstaller<F: FileOps = StdFileOps> {
    target: InstallTarget,
    ops: F,
    state: SwapState,
}

impl BinaryInstaller<StdFileOps> {
    pub fn new(target: InstallTarget) -> Self {
        Self::with_ops(target, StdFileOps)
    }
}

impl<F: FileOps> BinaryInstaller<F> {
    pub fn with_ops(target: InstallTarget, ops: F) -> Self {
        Self {
            target,
            ops,
            state: SwapState::Clean,
        }
    }

    pub fn state(&self) -> SwapState {
        self.state
    }

    pub fn target(&self) -> &InstallTarget {
        &self.target
    }

    /// Run the full protocol: stage, drop old backup, back up live, swap.
    pub fn install(&mut self, new_binary: &Path) -> Result<()> {
        self.stage(new_binary)?;
        self.swap()
    }

    fn fail(&mut self, step: InstallStep, path: &Path, source: io::Error) -> Error {
        self.state = SwapState::Failed;
        Error::Install {
            step,
            path: path.to_path_buf(),
            rolled_back: false,
            source,
        }
    }

    fn stage(&mut self, new_binary: &Path) -> Result<()> {
        let staging = self.target.staging.clone();
        log::debug!("staging {} at {}", new_binary.display(), staging.display());

        if let Err(e) = self.ops.copy(new_binary, &staging) {
            return Err(self.fail(InstallStep::Stage, &staging, e));
        }
        if let Err(e) = self.ops.make_executable(&staging) {
            return Err(self.fail(InstallStep::MarkExecutable, &staging, e));
        }

        self.state = SwapState::Staged;
        Ok(())
    }

    fn swap(&mut self) -> Result<()> {
        debug_assert_eq!(self.state, SwapState::Staged);
        let InstallTarget {
            live,
            staging,
            backup,
        } = self.target.clone();

        if self.ops.exists(&backup) {
            log::debug!("removing previous backup {}", backup.display());
            if let Err(e) = self.ops.remove_file(&backup) {
                return Err(self.fail(InstallStep::DropOldBackup, &backup, e));
            }
        }

        if self.ops.exists(&live) {
            println!("Creating backup at {}", backup.display().to_string().dimmed());
            if let Err(e) = self.ops.rename(&live, &backup) {
                return Err(self.fail(InstallStep::Backup, &live, e));
            }
        }

        match self.ops.rename(&staging, &live) {
            Ok(()) => {
                self.state = SwapState::Swapped;
                log::info!("installed {}", live.display());
                Ok(())
            }
            Err(e) => {
                let rolled_back = self.roll_back();
                Err(Error::Install {
                    step: InstallStep::Swap,
                    path: live,
                    rolled_back,
                    source: e,
                })
            }
        }
    }

    /// Put the backup back when the live slot is empty. Best effort.
    fn roll_back(&mut self) -> bool {
        let live = &self.target.live;
        let backup = &self.target.backup;

        if self.ops.exists(live) || !self.ops.exists(backup) {
            self.state = SwapState::Failed;
            return false;
        }

        match self.ops.rename(backup, live) {
            Ok(()) => {
                log::warn!("restored previous binary from {}", backup.display());
                self.state = SwapState::RolledBack;
                true
            }
            Err(e) => {
                log::error!(
                    "could not restore {} from {}: {}",
                    live.display(),
                    backup.display(),
                    e
                );
                self.state = SwapState::Failed;
                false
            }
        }
    }
}

/// Replace `live_target` with a copy of `new_binary`
pub fn install(new_binary: &Path, live_target: &Path) -> Result<()> {
    BinaryInstaller::new(InstallTarget::new(live_target)).install(new_binary)
}
