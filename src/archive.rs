//! Archive packager: bundles finished artifacts into one ZIP file.
//!
//! ## Layout
//!
//! ```text
//! cropped_images_16_9.zip
//! └── 16-9-images/
//!     ├── beach.jpg        # original filename, unmodified
//!     └── city.png         # name kept even though the bytes are JPEG
//! ```
//!
//! Entries are keyed by the item's original filename. When two done items
//! share a name the later one wins and the archive holds a single entry for
//! that name, in the position of the first occurrence.
//!
//! Packaging with nothing done yields a valid, empty archive. Callers decide
//! whether that is worth writing; the CLI skips it with a warning.

use crate::batch::{ItemStatus, WorkItem};
use crate::config::{ArchiveConfig, Compression};
use crate::resources::ResourceRegistry;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A serialized archive held in memory.
#[derive(Debug, Clone)]
pub struct Archive {
    pub bytes: Vec<u8>,
    /// Entry paths in archive order.
    pub entries: Vec<String>,
}

impl Archive {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

fn compression_method(compression: Compression) -> CompressionMethod {
    match compression {
        Compression::Stored => CompressionMethod::Stored,
        Compression::Deflated => CompressionMethod::Deflated,
    }
}

/// Path of an entry inside the archive.
fn entry_path(folder: &str, name: &str) -> String {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{folder}/{name}")
    }
}

/// Package the artifacts of every `done` item.
pub fn package(
    items: &[WorkItem],
    resources: &ResourceRegistry,
    config: &ArchiveConfig,
) -> Result<Archive, ArchiveError> {
    let mut selected: Vec<(&str, Arc<[u8]>)> = Vec::new();

    for item in items.iter().filter(|i| i.status() == ItemStatus::Done) {
        let Some(bytes) = item.artifact().and_then(|h| resources.resolve(h)) else {
            continue;
        };
        match selected.iter().position(|(name, _)| *name == item.name()) {
            Some(index) => {
                debug!(name = item.name(), "duplicate filename, keeping the later artifact");
                selected[index].1 = bytes;
            }
            None => selected.push((item.name(), bytes)),
        }
    }

    let options =
        SimpleFileOptions::default().compression_method(compression_method(config.compression));
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let mut entries = Vec::with_capacity(selected.len());

    for (name, bytes) in &selected {
        let path = entry_path(&config.folder, name);
        writer.start_file(path.as_str(), options)?;
        writer.write_all(bytes)?;
        entries.push(path);
    }

    let bytes = writer.finish()?.into_inner();
    info!(entries = entries.len(), bytes = bytes.len(), "archive packaged");
    Ok(Archive { bytes, entries })
}

/// Write `archive` into `dir` under the configured file name.
pub fn save_archive(
    archive: &Archive,
    dir: &Path,
    config: &ArchiveConfig,
) -> Result<PathBuf, ArchiveError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(&config.file_name);
    fs::write(&path, &archive.bytes)?;
    info!(path = %path.display(), "archive saved");
    Ok(path)
}
