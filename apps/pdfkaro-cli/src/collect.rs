//! Turning command-line paths into selected files

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pdfkaro_core::project::read_project_file;
use pdfkaro_core::SelectedFile;
use tracing::debug;

pub fn read_files(paths: &[PathBuf]) -> Result<Vec<SelectedFile>> {
    paths
        .iter()
        .map(|path| {
            SelectedFile::from_path(path)
                .with_context(|| format!("Failed to read {}", path.display()))
        })
        .collect()
}

/// Gather text files for the project exporter.
///
/// Folders are walked recursively and their files keep the folder name as a
/// path prefix (`project/src/main.rs`); hidden entries and symlinks are
/// skipped, as are files that are not UTF-8.
pub fn project_files(paths: &[PathBuf]) -> Result<Vec<SelectedFile>> {
    let mut files = Vec::new();
    for path in paths {
        let root = path.parent();
        if path.is_dir() {
            walk(path, root, &mut files)?;
        } else {
            push_text_file(path, root, &mut files)?;
        }
    }
    Ok(files)
}

fn walk(dir: &Path, root: Option<&Path>, files: &mut Vec<SelectedFile>) -> Result<()> {
    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("Failed to list {}", dir.display()))?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("Failed to inspect {}", path.display()))?;
        if file_type.is_symlink() {
            debug!(path = %path.display(), "skipping symlink");
        } else if file_type.is_dir() {
            walk(&path, root, files)?;
        } else {
            push_text_file(&path, root, files)?;
        }
    }
    Ok(())
}

fn push_text_file(path: &Path, root: Option<&Path>, files: &mut Vec<SelectedFile>) -> Result<()> {
    match read_project_file(root, path)
        .with_context(|| format!("Failed to read {}", path.display()))?
    {
        Some((name, content)) => files.push(SelectedFile::new(name, None, content.into_bytes())),
        None => debug!(path = %path.display(), "skipping non-text file"),
    }
    Ok(())
}
