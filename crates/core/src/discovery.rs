//! Local file discovery
//!
//! Walks the working directory and keeps regular files whose key matches at
//! least one include pattern and no exclude pattern.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::pattern::{PatternSet, to_key};

/// Collect the files to upload from `working_directory`
///
/// Paths are returned in walk order (entries sorted by file name within each
/// directory). Exclusion wins over inclusion. Symlinks are not followed.
pub fn discover_files<S: AsRef<str>>(
    working_directory: &Path,
    include: &[S],
    exclude: &[S],
) -> Result<Vec<PathBuf>> {
    let include = PatternSet::new(include)?;
    let exclude = PatternSet::new(exclude)?;
    discover(working_directory, &include, &exclude)
}

/// Same as [`discover_files`] with already compiled pattern sets
pub fn discover(
    working_directory: &Path,
    include: &PatternSet,
    exclude: &PatternSet,
) -> Result<Vec<PathBuf>> {
    if !working_directory.is_dir() {
        return Err(Error::Discovery(format!(
            "Working directory not found: {}",
            working_directory.display()
        )));
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(working_directory)
        .follow_links(false)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
    {
        let entry = entry.map_err(|e| Error::Discovery(e.to_string()))?;

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(key) = to_key(working_directory, entry.path()) else {
            continue;
        };

        if !include.matches_any(&key) || exclude.matches_any(&key) {
            continue;
        }

        files.push(entry.into_path());
    }

    Ok(files)
}
