use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Name of the directory archives are unpacked into, inside the scratch dir
const EXTRACT_DIR: &str = "extracted";

/// Suffix chains recognised as tar archives, most specific first
const TAR_SUFFIX_PATTERNS: &[&[&str]] = &[
    &[".tar", ".gz"],
    &[".tar", ".xz"],
    &[".tar", ".bz2"],
    &[".tar", ".zst"],
    &[".tar"],
    &[".tgz"],
    &[".tbz2"],
    &[".txz"],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Tar,
}

impl ArchiveKind {
    /// Classify by file-name suffixes only. `None` means a bare executable.
    pub fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy();
        let suffixes = suffix_chain(&name);

        if suffixes.last().map(String::as_str) == Some(".zip") {
            return Some(Self::Zip);
        }

        TAR_SUFFIX_PATTERNS
            .iter()
            .any(|pattern| ends_with_pattern(&suffixes, pattern))
            .then_some(Self::Tar)
    }
}

fn ends_with_pattern(suffixes: &[String], pattern: &[&str]) -> bool {
    suffixes.len() >= pattern.len()
        && suffixes[suffixes.len() - pattern.len()..]
            .iter()
            .zip(pattern)
            .all(|(a, b)| a.as_str() == *b)
}

/// Lowercased dotted suffixes of a file name: `Codex-1.2.tar.GZ` gives
/// `[".2", ".tar", ".gz"]`. Leading dots of hidden files are not suffixes.
pub fn suffix_chain(name: &str) -> Vec<String> {
    let lower = name.to_lowercase();
    let stem = lower.trim_start_matches('.');
    if stem.ends_with('.') {
        return Vec::new();
    }
    stem.split('.')
        .skip(1)
        .map(|part| format!(".{}", part))
        .collect()
}

/// Unpack `archive_path` into a fresh directory under `scratch_dir`.
///
/// Returns the extraction directory, or `archive_path` itself when the file
/// name carries no known archive suffix and is treated as a bare binary.
pub fn extract(archive_path: &Path, scratch_dir: &Path) -> Result<PathBuf> {
    let kind = match ArchiveKind::detect(archive_path) {
        Some(kind) => kind,
        None => {
            log::debug!(
                "{} has no archive suffix, treating as a binary",
                archive_path.display()
            );
            return Ok(archive_path.to_path_buf());
        }
    };

    let destination = scratch_dir.join(EXTRACT_DIR);
    fs::create_dir_all(&destination).map_err(|e| Error::io(&destination, e))?;

    match kind {
        ArchiveKind::Zip => extract_zip(archive_path, &destination)?,
        ArchiveKind::Tar => extract_tar(archive_path, &destination)?,
    }

    log::debug!(
        "extracted {} into {}",
        archive_path.display(),
        destination.display()
    );
    Ok(destination)
}

fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = File::open(archive_path).map_err(|e| Error::extraction(archive_path, "zip", e))?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| Error::extraction(archive_path, "zip", e))?;
    archive
        .extract(dest_dir)
        .map_err(|e| Error::extraction(archive_path, "zip", e))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compression {
    None,
    Gzip,
    Xz,
    Bzip2,
    Zstd,
}

impl Compression {
    fn sniff(magic: &[u8]) -> Self {
        if magic.starts_with(&[0x1f, 0x8b]) {
            Self::Gzip
        } else if magic.starts_with(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]) {
            Self::Xz
        } else if magic.starts_with(b"BZh") {
            Self::Bzip2
        } else if magic.starts_with(&[0x28, 0xb5, 0x2f, 0xfd]) {
            Self::Zstd
        } else {
            Self::None
        }
    }
}

fn read_magic(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut magic = Vec::with_capacity(6);
    File::open(path)?.take(6).read_to_end(&mut magic)?;
    Ok(magic)
}

fn extract_tar(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let fail = |e: std::io::Error| Error::extraction(archive_path, "tar", e);

    let compression = Compression::sniff(&read_magic(archive_path).map_err(fail)?);
    log::debug!("{} compression: {:?}", archive_path.display(), compression);

    let reader = BufReader::new(File::open(archive_path).map_err(fail)?);
    let decoded: Box<dyn Read> = match compression {
        Compression::None => Box::new(reader),
        Compression::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
        Compression::Xz => Box::new(xz2::read::XzDecoder::new(reader)),
        Compression::Bzip2 => Box::new(bzip2::read::BzDecoder::new(reader)),
        Compression::Zstd => Box::new(zstd::Decoder::with_buffer(reader).map_err(fail)?),
    };

    tar::Archive::new(decoded).unpack(dest_dir).map_err(fail)
}
