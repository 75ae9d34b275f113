use std::path::{Path, PathBuf};

use crate::{Error, Result};

pub fn file_exists(p: &Path) -> bool {
    p.is_file()
}

/// The directory part of a path, `None` for bare file names.
pub fn directory_of(p: &Path) -> Option<&Path> {
    p.parent().filter(|dir| !dir.as_os_str().is_empty())
}

/// The file name without directory and extension.
pub fn core_name(p: &Path) -> String {
    p.file_stem().map(|stem| stem.to_string_lossy().to_string()).unwrap_or_default()
}

/// The lower cased extension without the leading dot.
pub fn suffix(p: &Path) -> String {
    p.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

pub fn replace_suffix(p: &Path, suffix: &str) -> PathBuf {
    p.with_extension(suffix)
}

pub fn create_directory_for_file(p: &Path) -> Result {
    if let Some(parent_dir) = directory_of(p) {
        std::fs::create_dir_all(parent_dir).map_err(|e| {
            Error::Runtime(format!(
                "Failed to create output directory for file '{}' ({e})",
                p.to_string_lossy()
            ))
        })?;
    }

    Ok(())
}
