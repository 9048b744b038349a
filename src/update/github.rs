use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;

use super::selector::ReleaseAsset;
use super::version::{normalize, ReleaseInfo};
use crate::error::{Error, Result};

const USER_AGENT: &str = concat!("codexu/", env!("CARGO_PKG_VERSION"));
const GITHUB_URL: &str = "https://github.com";
const GITHUB_API_URL: &str = "https://api.github.com";
const METADATA_TIMEOUT: Duration = Duration::from_secs(10);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct GithubRelease {
    #[serde(default)]
    assets: Vec<GithubAsset>,
}

#[derive(Debug, Deserialize)]
struct GithubAsset {
    #[serde(default)]
    name: String,
    browser_download_url: Option<String>,
}

fn client(timeout: Duration) -> Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?)
}

fn latest_release_url(repo: &str) -> String {
    format!("{}/{}/releases/latest", GITHUB_URL, repo)
}

fn release_api_url(repo: &str, tag: &str) -> String {
    format!("{}/repos/{}/releases/tags/{}", GITHUB_API_URL, repo, tag)
}

/// Last non-empty path segment of a release page URL
pub fn tag_from_url(url: &reqwest::Url) -> Option<String> {
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(str::to_string)
}

/// Follow the `releases/latest` redirect and read the tag from where it lands
pub fn latest_release(repo: &str) -> Result<ReleaseInfo> {
    let url = latest_release_url(repo);
    let response = client(METADATA_TIMEOUT)?
        .get(&url)
        .send()
        .map_err(|e| Error::Http {
            status: e.status().map(|s| s.as_u16()),
            message: format!("failed to query GitHub releases: {}", e),
        })?;

    let final_url = response.url().clone();
    log::debug!("{} resolved to {}", url, final_url);

    let tag = tag_from_url(&final_url).filter(|t| t != "latest");
    let version = tag.as_deref().and_then(normalize);
    match (tag, version) {
        (Some(tag), Some(version)) => Ok(ReleaseInfo { version, tag }),
        _ => Err(Error::InvalidResponse(format!(
            "unable to determine version from redirect URL: {}",
            final_url
        ))),
    }
}

/// Assets attached to the release with the given tag
pub fn fetch_release_assets(repo: &str, tag: &str) -> Result<Vec<ReleaseAsset>> {
    let response = client(METADATA_TIMEOUT)?
        .get(release_api_url(repo, tag))
        .header("Accept", "application/vnd.github+json")
        .send()?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Http {
            message: format!("failed to fetch release data for {}: HTTP {}", tag, status),
            status: Some(status.as_u16()),
        });
    }

    let release: GithubRelease = response.json().map_err(|e| {
        Error::InvalidResponse(format!("invalid JSON from GitHub releases API: {}", e))
    })?;

    Ok(into_assets(release))
}

fn into_assets(release: GithubRelease) -> Vec<ReleaseAsset> {
    release
        .assets
        .into_iter()
        .filter_map(|a| match a.browser_download_url {
            Some(url) => Some(ReleaseAsset::new(a.name, url)),
            None => {
                log::warn!("release asset {:?} has no download URL, skipping", a.name);
                None
            }
        })
        .collect()
}

fn progress_bar(total: Option<u64>) -> ProgressBar {
    match total {
        Some(len) => {
            let pb = ProgressBar::new(len);
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
            pb.set_style(style);
            pb
        }
        None => ProgressBar::new_spinner(),
    }
}

/// Download `url` to `dest`, overwriting it, with a progress bar
pub fn download(url: &str, dest: &Path) -> Result<()> {
    let mut response = client(DOWNLOAD_TIMEOUT)?
        .get(url)
        .send()
        .map_err(|e| Error::Http {
            status: e.status().map(|s| s.as_u16()),
            message: format!("failed to download {}: {}", url, e),
        })?;

    if !response.status().is_success() {
        return Err(Error::Http {
            message: format!("failed to download {}: HTTP {}", url, response.status()),
            status: Some(response.status().as_u16()),
        });
    }

    let pb = progress_bar(response.content_length());
    let mut file = File::create(dest).map_err(|e| Error::io(dest, e))?;
    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = response.read(&mut buffer).map_err(|e| Error::Http {
            message: format!("failed to download {}: {}", url, e),
            status: None,
        })?;
        if bytes_read == 0 {
            break;
        }
        file.write_all(&buffer[..bytes_read])
            .map_err(|e| Error::io(dest, e))?;
        downloaded += bytes_read as u64;
        pb.set_position(downloaded);
    }

    pb.finish_and_clear();
    log::debug!("downloaded {} bytes to {}", downloaded, dest.display());
    Ok(())
}
