use std::path::Path;

use walkdir::WalkDir;

use crate::domain::is_supported_item;
use crate::error::Result;

/// Names of the immediate subdirectories of `root`, sorted.
pub fn entity_dirs(root: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        match entry.file_name().to_str() {
            Some(name) => names.push(name.to_string()),
            None => log::warn!("skipping non UTF-8 directory {}", entry.path().display()),
        }
    }
    names.sort();
    Ok(names)
}

/// Names of the supported item files directly inside `dir`, sorted.
pub fn item_files(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_supported_item(entry.path()) {
            continue;
        }
        match entry.file_name().to_str() {
            Some(name) => names.push(name.to_string()),
            None => log::warn!("skipping non UTF-8 file {}", entry.path().display()),
        }
    }
    names.sort();
    Ok(names)
}
