//! ZIP packaging of generated files.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// A file to store in the archive under `name`.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub path: PathBuf,
}

impl ArchiveEntry {
    /// Entry named after the file's own name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { name, path }
    }
}

/// Add `entries` to the archive at `zip_path`, creating it if needed.
///
/// Existing entries with the same name are replaced; all other entries are
/// kept. The new archive is written next to the old one and moved into
/// place once complete.
pub fn update_archive(zip_path: &Path, entries: &[ArchiveEntry]) -> Result<()> {
    let parent = match zip_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let staging = NamedTempFile::new_in(parent)
        .with_context(|| format!("create temporary archive in {}", parent.display()))?;
    let mut writer = ZipWriter::new(staging);

    let mut kept = 0usize;
    if zip_path.exists() {
        let file = File::open(zip_path).with_context(|| format!("open {}", zip_path.display()))?;
        let mut archive =
            ZipArchive::new(file).with_context(|| format!("read {}", zip_path.display()))?;
        for index in 0..archive.len() {
            let mut existing = archive.by_index(index)?;
            let name = existing.name().to_string();
            if entries.iter().any(|entry| entry.name == name) {
                debug!(entry = %name, "replacing archive entry");
                continue;
            }
            if existing.is_dir() {
                writer.add_directory(name, options)?;
            } else {
                let mut contents = Vec::new();
                existing
                    .read_to_end(&mut contents)
                    .with_context(|| format!("read {name} from {}", zip_path.display()))?;
                writer.start_file(name, options)?;
                writer.write_all(&contents)?;
            }
            kept += 1;
        }
    }

    for entry in entries {
        let contents = std::fs::read(&entry.path)
            .with_context(|| format!("read {}", entry.path.display()))?;
        writer.start_file(entry.name.as_str(), options)?;
        writer.write_all(&contents)?;
    }

    let staging = writer
        .finish()
        .with_context(|| format!("finish {}", zip_path.display()))?;
    staging
        .persist(zip_path)
        .map_err(|err| err.error)
        .with_context(|| format!("replace {}", zip_path.display()))?;

    info!(
        path = %zip_path.display(),
        added = entries.len(),
        kept,
        "archive updated"
    );
    Ok(())
}
