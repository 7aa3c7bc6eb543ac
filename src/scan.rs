//! Input discovery for the CLI front end.
//!
//! Turns the paths given on the command line into [`SourceFile`]s:
//!
//! - **Files** are taken as given, whatever their extension. If one is not
//!   an image it simply fails to decode and is reported as an error item.
//! - **Directories** are walked recursively. Only files with a decodable
//!   extension are picked up, sorted by path so runs are reproducible.
//!
//! Each source keeps only its file name. That is the name the cropped image
//! gets inside the archive.

use crate::batch::SourceFile;
use crate::imaging::supported_input_extensions;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Input not found: {0}")]
    NotFound(PathBuf),
    #[error("No supported images found in the given inputs")]
    NoInputs,
}

/// Whether `path` has an extension we can decode (case-insensitive).
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            supported_input_extensions()
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(ext))
        })
}

/// Expand `inputs` into a flat, ordered list of image paths.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, ScanError> {
    let mut paths = Vec::new();

    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input).sort_by_file_name() {
                let entry = entry?;
                if entry.file_type().is_file() && is_supported_image(entry.path()) {
                    paths.push(entry.into_path());
                }
            }
        } else if input.is_file() {
            paths.push(input.clone());
        } else {
            return Err(ScanError::NotFound(input.clone()));
        }
    }

    if paths.is_empty() {
        return Err(ScanError::NoInputs);
    }
    Ok(paths)
}

/// Read each path into a [`SourceFile`] named after its file name.
pub fn read_sources(paths: &[PathBuf]) -> Result<Vec<SourceFile>, ScanError> {
    paths
        .iter()
        .map(|path| -> Result<SourceFile, ScanError> {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string_lossy().into_owned());
            Ok(SourceFile {
                name,
                bytes: fs::read(path)?,
            })
        })
        .collect()
}
