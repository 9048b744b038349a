use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::platform::HostPlatform;
use super::selector::AssetSelector;

/// Decides which file names count as the tool's executable
#[derive(Debug, Clone)]
pub struct BinaryMatcher {
    canonical_name: String,
    selector: AssetSelector,
}

impl BinaryMatcher {
    /// `selector` supplies the same exclusion vocabulary used for assets, so an
    /// SDK bundled next to the CLI is never picked.
    pub fn new(canonical_name: &str, selector: AssetSelector) -> Self {
        Self {
            canonical_name: canonical_name.to_lowercase(),
            selector,
        }
    }

    pub fn is_binary_name(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        let stripped = lower.strip_suffix(".exe").unwrap_or(&lower);
        if self.selector.is_non_cli(stripped) {
            return false;
        }
        stripped == self.canonical_name
            || stripped
                .strip_prefix(self.canonical_name.as_str())
                .is_some_and(|rest| rest.starts_with('-'))
    }

    fn qualifies(&self, path: &Path) -> bool {
        path.file_name()
            .map(|n| self.is_binary_name(&n.to_string_lossy()))
            .unwrap_or(false)
    }
}

/// Find the executable inside an extraction root.
///
/// `root` may be a bare binary or a directory. Directories are walked in file
/// name order so the result does not depend on filesystem enumeration order.
pub fn locate(root: &Path, matcher: &BinaryMatcher, host: &HostPlatform) -> Option<PathBuf> {
    if root.is_file() {
        return matcher.qualifies(root).then(|| root.to_path_buf());
    }

    let candidates: Vec<PathBuf> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| matcher.qualifies(path))
        .collect();

    log::debug!(
        "{} executable candidate(s) under {}",
        candidates.len(),
        root.display()
    );

    if host.is_windows() {
        let exe = candidates.iter().find(|p| {
            p.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("exe"))
        });
        if let Some(exe) = exe {
            return Some(exe.clone());
        }
    }

    candidates.into_iter().next()
}
