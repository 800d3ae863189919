use anyhow::{bail, Context};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// A file is used as-is; a directory expands to its files with `extension`, sorted.
pub fn file_list(path: &Path, extension: &str) -> anyhow::Result<Vec<PathBuf>> {
    if path.is_file() {
        info!("Processing a single {} file", extension);
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        bail!("unsupported path/file type: {}", path.display());
    }

    let mut files = Vec::new();
    let entries = fs::read_dir(path).with_context(|| format!("listing {}", path.display()))?;
    for entry in entries {
        let entry_path = entry
            .with_context(|| format!("listing {}", path.display()))?
            .path();
        let matches = entry_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if matches && entry_path.is_file() {
            files.push(entry_path);
        }
    }
    files.sort();
    info!("Found {} {} files", files.len(), extension);
    Ok(files)
}
