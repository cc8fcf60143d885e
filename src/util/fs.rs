//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use glob::glob;
use walkdir::WalkDir;

/// Extensions picked up when a header entry names a directory.
pub const HEADER_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx"];

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

pub fn is_header(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| HEADER_EXTENSIONS.contains(&e))
}

/// Expand header entries into files.
///
/// An entry is a file, a directory (walked for headers) or a glob pattern.
/// Relative entries are taken from `base`. The result is sorted and free of
/// duplicates.
pub fn collect_headers(base: &Path, entries: &[String]) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();

    for entry in entries {
        let full = base.join(entry);
        if full.is_dir() {
            results.extend(walk_headers(&full));
        } else if full.is_file() {
            results.push(full);
        } else {
            let pattern = full.to_string_lossy();
            let before = results.len();
            for path in glob(&pattern).with_context(|| format!("invalid glob pattern: {}", entry))? {
                match path {
                    Ok(path) if path.is_dir() => results.extend(walk_headers(&path)),
                    Ok(path) if path.is_file() => results.push(path),
                    Ok(_) => {}
                    Err(e) => tracing::warn!("glob error: {}", e),
                }
            }
            if results.len() == before {
                bail!("no headers match `{}`", entry);
            }
        }
    }

    results.sort();
    results.dedup();
    Ok(results)
}

fn walk_headers(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_header(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}
