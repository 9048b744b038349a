//! Pick the release asset that best fits the host platform.
//!
//! Candidates are narrowed through a fixed cascade of groups, most specific
//! first. The first non-empty group wins and its members are ranked by the
//! packaging preference of the host OS.

use super::platform::{ArchKey, OsKey};

/// Keywords marking assets that are not the CLI executable itself
pub const DEFAULT_NON_CLI_KEYWORDS: [&str; 4] = ["responses", "proxy", "sdk", "npm"];

/// Download file name used when a release asset has no name
const FALLBACK_ASSET_FILE_NAME: &str = "codex-release";

/// One file attached to a release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseAsset {
    pub name: String,
    pub download_url: String,
}

impl ReleaseAsset {
    pub fn new(name: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            download_url: download_url.into(),
        }
    }

    /// File name to save the download under, never empty
    pub fn file_name(&self) -> &str {
        match self.name.trim() {
            "" => FALLBACK_ASSET_FILE_NAME,
            _ => &self.name,
        }
    }
}

/// Candidate groups in cascade order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateGroup {
    CliOsArch,
    AnyOsArch,
    CliOs,
    AnyOs,
    Cli,
    Any,
}

impl CandidateGroup {
    pub const CASCADE: [CandidateGroup; 6] = [
        CandidateGroup::CliOsArch,
        CandidateGroup::AnyOsArch,
        CandidateGroup::CliOs,
        CandidateGroup::AnyOs,
        CandidateGroup::Cli,
        CandidateGroup::Any,
    ];

    fn cli_only(self) -> bool {
        matches!(self, Self::CliOsArch | Self::CliOs | Self::Cli)
    }

    fn needs_os(self) -> bool {
        !matches!(self, Self::Cli | Self::Any)
    }

    fn needs_arch(self) -> bool {
        matches!(self, Self::CliOsArch | Self::AnyOsArch)
    }
}

/// Packaging suffixes in order of preference for an OS.
/// Unknown hosts fall back to the Windows order.
pub fn packaging_preferences(os: Option<OsKey>) -> &'static [&'static str] {
    match os {
        Some(OsKey::Darwin) => &[".tar.gz", ".zip", ".tar", ".zst"],
        Some(OsKey::Linux) => &[".tar.gz", ".tar", ".zst", ".zip"],
        Some(OsKey::Windows) | None => &[".zip", ".tar.gz", ".tar", ".zst"],
    }
}

/// Higher is better; 0 when no preferred suffix matches
pub fn packaging_score(name: &str, os: Option<OsKey>) -> usize {
    let name = name.to_lowercase();
    let preferred = packaging_preferences(os);
    preferred
        .iter()
        .position(|ext| name.ends_with(ext))
        .map(|idx| preferred.len() - idx)
        .unwrap_or(0)
}

fn matches_os(name: &str, os: Option<OsKey>) -> bool {
    match os {
        Some(os) => os.keywords().iter().any(|k| name.contains(k)),
        None => true,
    }
}

fn matches_arch(name: &str, arch: Option<&ArchKey>) -> bool {
    match arch {
        Some(arch) => arch.keywords().iter().any(|k| name.contains(k)),
        None => true,
    }
}

#[derive(Debug, Clone)]
pub struct AssetSelector {
    non_cli_keywords: Vec<String>,
}

impl Default for AssetSelector {
    fn default() -> Self {
        Self::new(DEFAULT_NON_CLI_KEYWORDS)
    }
}

impl AssetSelector {
    pub fn new<I, S>(non_cli_keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            non_cli_keywords: non_cli_keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn non_cli_keywords(&self) -> &[String] {
        &self.non_cli_keywords
    }

    /// True when the lowercased name contains an exclusion keyword
    pub fn is_non_cli(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.non_cli_keywords.iter().any(|k| name.contains(k.as_str()))
    }

    fn admits(
        &self,
        group: CandidateGroup,
        asset: &ReleaseAsset,
        os: Option<OsKey>,
        arch: Option<&ArchKey>,
    ) -> bool {
        let name = asset.name.to_lowercase();
        if group.cli_only() && (name.is_empty() || self.is_non_cli(&name)) {
            return false;
        }
        if group.needs_os() && !matches_os(&name, os) {
            return false;
        }
        if group.needs_arch() && !matches_arch(&name, arch) {
            return false;
        }
        true
    }

    /// Members of one cascade group, in release order
    pub fn candidates<'a>(
        &self,
        group: CandidateGroup,
        assets: &'a [ReleaseAsset],
        os: Option<OsKey>,
        arch: Option<&ArchKey>,
    ) -> Vec<&'a ReleaseAsset> {
        assets
            .iter()
            .filter(|asset| self.admits(group, asset, os, arch))
            .collect()
    }

    /// Walk the cascade and return the winning group with its best asset.
    /// `None` only when `assets` is empty.
    pub fn select_with_group<'a>(
        &self,
        assets: &'a [ReleaseAsset],
        os: Option<OsKey>,
        arch: Option<&ArchKey>,
    ) -> Option<(CandidateGroup, &'a ReleaseAsset)> {
        CandidateGroup::CASCADE.iter().find_map(|&group| {
            let candidates = self.candidates(group, assets, os, arch);
            log::debug!("candidate group {:?}: {} asset(s)", group, candidates.len());
            best_packaging(&candidates, os).map(|asset| (group, asset))
        })
    }

    pub fn select<'a>(
        &self,
        assets: &'a [ReleaseAsset],
        os: Option<OsKey>,
        arch: Option<&ArchKey>,
    ) -> Option<&'a ReleaseAsset> {
        self.select_with_group(assets, os, arch)
            .map(|(_, asset)| asset)
    }
}

/// First asset with the highest packaging score
fn best_packaging<'a>(
    candidates: &[&'a ReleaseAsset],
    os: Option<OsKey>,
) -> Option<&'a ReleaseAsset> {
    let mut best: Option<(&'a ReleaseAsset, usize)> = None;
    for &asset in candidates {
        let score = packaging_score(&asset.name, os);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((asset, score)),
        }
    }
    best.map(|(asset, _)| asset)
}

/// Convenience wrapper using the default exclusion vocabulary
pub fn select_best_asset<'a>(
    assets: &'a [ReleaseAsset],
    os: Option<OsKey>,
    arch: Option<&ArchKey>,
) -> Option<&'a ReleaseAsset> {
    AssetSelector::default().select(assets, os, arch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assets(names: &[&str]) -> Vec<ReleaseAsset> {
        names
            .iter()
            .map(|n| ReleaseAsset::new(*n, format!("https://example.com/{}", n)))
            .collect()
    }

    #[test]
    fn test_asset_file_name_fallback() {
        assert_eq!(ReleaseAsset::new("codex.tar.gz", "u").file_name(), "codex.tar.gz");
        assert_eq!(ReleaseAsset::new("", "u").file_name(), "codex-release");
        assert_eq!(ReleaseAsset::new("  ", "u").file_name(), "codex-release");
    }

    fn pick<'a>(
        list: &'a [ReleaseAsset],
        os: Option<OsKey>,
        arch: Option<ArchKey>,
    ) -> Option<&'a str> {
        select_best_asset(list, os, arch.as_ref()).map(|a| a.name.as_str())
    }

    #[test]
    fn test_prefers_cli_exact_match() {
        let list = assets(&[
            "codex-responses-linux-x86_64.tar.gz",
            "codex-linux-x86_64.tar.gz",
            "codex-linux-arm64.tar.gz",
        ]);
        assert_eq!(
            pick(&list, Some(OsKey::Linux), Some(ArchKey::X86_64)),
            Some("codex-linux-x86_64.tar.gz")
        );
    }

    #[test]
    fn test_windows_prefers_zip() {
        let list = assets(&["codex-win-x86_64.tar.gz", "codex-win-x86_64.zip"]);
        assert_eq!(
            pick(&list, Some(OsKey::Windows), Some(ArchKey::X86_64)),
            Some("codex-win-x86_64.zip")
        );
        let list = assets(&["codex-win-x86_64.zip", "codex-win-x86_64.tar.gz"]);
        assert_eq!(
            pick(&list, Some(OsKey::Windows), None),
            Some("codex-win-x86_64.zip")
        );
    }

    #[test]
    fn test_linux_prefers_tar_gz() {
        let list = assets(&[
            "codex-x86_64-unknown-linux-musl.zst",
            "codex-x86_64-unknown-linux-musl.tar.gz",
        ]);
        assert_eq!(
            pick(&list, Some(OsKey::Linux), Some(ArchKey::X86_64)),
            Some("codex-x86_64-unknown-linux-musl.tar.gz")
        );
    }

    #[test]
    fn test_falls_back_to_any_asset() {
        let list = assets(&["codex-darwin-arm64.tar.gz"]);
        let selector = AssetSelector::default();
        let (group, asset) = selector
            .select_with_group(&list, Some(OsKey::Linux), Some(&ArchKey::X86_64))
            .unwrap();
        assert_eq!(group, CandidateGroup::Cli);
        assert_eq!(asset.name, "codex-darwin-arm64.tar.gz");
    }

    #[test]
    fn test_relaxes_arch_before_os() {
        let list = assets(&["codex-linux-arm64.tar.gz", "codex-darwin-x86_64.tar.gz"]);
        let selector = AssetSelector::default();
        let (group, asset) = selector
            .select_with_group(&list, Some(OsKey::Linux), Some(&ArchKey::X86_64))
            .unwrap();
        assert_eq!(group, CandidateGroup::CliOs);
        assert_eq!(asset.name, "codex-linux-arm64.tar.gz");
    }

    #[test]
    fn test_non_cli_only_when_nothing_else() {
        let list = assets(&["codex-sdk-linux-x86_64.tar.gz"]);
        let selector = AssetSelector::default();
        let (group, asset) = selector
            .select_with_group(&list, Some(OsKey::Linux), Some(&ArchKey::X86_64))
            .unwrap();
        assert_eq!(group, CandidateGroup::AnyOsArch);
        assert_eq!(asset.name, "codex-sdk-linux-x86_64.tar.gz");
    }

    #[test]
    fn test_unknown_arch_matches_os_only() {
        let list = assets(&["codex-linux-x86_64.tar.gz", "codex-linux-arm64.zip"]);
        let selector = AssetSelector::default();
        let arch = ArchKey::Other("riscv64".to_string());
        let (group, asset) = selector
            .select_with_group(&list, Some(OsKey::Linux), Some(&arch))
            .unwrap();
        assert_eq!(group, CandidateGroup::CliOs);
        assert_eq!(asset.name, "codex-linux-x86_64.tar.gz");
    }

    #[test]
    fn test_unknown_os_uses_windows_preferences() {
        let list = assets(&["codex-x86_64.tar.gz", "codex-x86_64.zip"]);
        assert_eq!(pick(&list, None, None), Some("codex-x86_64.zip"));
    }

    #[test]
    fn test_tie_keeps_first() {
        let list = assets(&["codex-linux-a.tar.gz", "codex-linux-b.tar.gz"]);
        assert_eq!(
            pick(&list, Some(OsKey::Linux), None),
            Some("codex-linux-a.tar.gz")
        );
        let list = assets(&["codex-linux-a.bin", "codex-linux-b.bin"]);
        assert_eq!(
            pick(&list, Some(OsKey::Linux), None),
            Some("codex-linux-a.bin")
        );
    }

    #[test]
    fn test_empty_release() {
        assert_eq!(pick(&[], Some(OsKey::Linux), Some(ArchKey::X86_64)), None);
    }

    #[test]
    fn test_group_candidates_independently() {
        let list = assets(&[
            "codex-npm-linux-x86_64.tgz",
            "codex-linux-x86_64.tar.gz",
            "codex-linux-arm64.tar.gz",
            "",
        ]);
        let selector = AssetSelector::default();
        let os = Some(OsKey::Linux);
        let arch = Some(&ArchKey::X86_64);
        assert_eq!(
            selector
                .candidates(CandidateGroup::CliOsArch, &list, os, arch)
                .len(),
            1
        );
        assert_eq!(
            selector
                .candidates(CandidateGroup::AnyOsArch, &list, os, arch)
                .len(),
            2
        );
        assert_eq!(selector.candidates(CandidateGroup::CliOs, &list, os, arch).len(), 2);
        assert_eq!(selector.candidates(CandidateGroup::Cli, &list, os, arch).len(), 2);
        assert_eq!(selector.candidates(CandidateGroup::Any, &list, os, arch).len(), 4);
    }

    #[test]
    fn test_custom_exclusion_vocabulary() {
        let list = assets(&["codex-debug-linux.tar.gz", "codex-linux.tar"]);
        let selector = AssetSelector::new(["DEBUG"]);
        assert!(selector.is_non_cli("codex-debug-linux.tar.gz"));
        assert_eq!(
            selector
                .select(&list, Some(OsKey::Linux), None)
                .map(|a| a.name.as_str()),
            Some("codex-linux.tar")
        );
    }

    #[test]
    fn test_packaging_score() {
        assert_eq!(packaging_score("a.ZIP", Some(OsKey::Windows)), 4);
        assert_eq!(packaging_score("a.tar.gz", Some(OsKey::Linux)), 4);
        assert_eq!(packaging_score("a.zip", Some(OsKey::Linux)), 1);
        assert_eq!(packaging_score("a.exe", Some(OsKey::Linux)), 0);
    }
}
