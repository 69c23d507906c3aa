use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

/// Extension of the files picked up from an input directory.
pub const MAP_EXTENSION: &str = "map";

/// Suffixes removed, in order, from a map file name to get its bundle label.
pub const LABEL_SUFFIXES: &[&str] = &[".map", ".js"];

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("input path '{}' does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("input path '{}' is neither a file nor a directory", .0.display())]
    Unrecognized(PathBuf),
    #[error(transparent)]
    Walk(#[from] walkdir::Error),
}

/// Resolve the `--input` argument into the list of maps to decode.
///
/// A directory yields its regular `*.map` files (not recursive), sorted by
/// path; a file is returned as-is.
pub fn collect_source_maps<P: AsRef<Path>>(input: P) -> Result<Vec<PathBuf>, DiscoveryError> {
    let input = input.as_ref();
    if !input.exists() {
        return Err(DiscoveryError::NotFound(input.to_path_buf()));
    }

    if input.is_dir() {
        let mut maps = Vec::new();
        for entry in WalkDir::new(input).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry?;
            let is_map = entry
                .path()
                .extension()
                .is_some_and(|ext| ext == MAP_EXTENSION);
            if entry.file_type().is_file() && is_map {
                maps.push(entry.into_path());
            }
        }
        return Ok(maps);
    }

    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    Err(DiscoveryError::Unrecognized(input.to_path_buf()))
}

/// Name of the per-bundle output directory: `app.js.map` -> `app`.
pub fn bundle_label<P: AsRef<Path>>(map_path: P) -> String {
    let file_name = map_path
        .as_ref()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let label = LABEL_SUFFIXES
        .iter()
        .fold(file_name.as_str(), |name, suffix| name.strip_suffix(suffix).unwrap_or(name))
        .to_string();

    if label.is_empty() {
        file_name
    } else {
        label
    }
}
