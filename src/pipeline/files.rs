//! Input file discovery.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively list the files under `root` whose extension is `extension`
/// (compared case-insensitively, without the leading dot).
///
/// Paths are absolute and sorted, so runs over the same tree visit files in the
/// same order.
pub fn discover_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>, walkdir::Error> {
    let extension = extension.trim_start_matches('.');
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if matches {
            files.push(absolute(entry.path()));
        }
    }
    files.sort();
    Ok(files)
}

fn absolute(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
