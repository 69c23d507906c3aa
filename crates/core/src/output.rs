use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;

use serde::Serialize;

use crate::reporter::Reporter;

/// Ensure the given output directory exists. Creates missing parent directories as needed.
///
/// Returns an io::Error if creation fails or if a non-directory entity exists at the path.
pub fn ensure_output_dir<P: AsRef<Path>>(output_path: P) -> io::Result<()> {
    let path = output_path.as_ref();
    if path.exists() {
        if !path.is_dir() {
            return Err(io::Error::new(
                ErrorKind::AlreadyExists,
                format!("output path '{}' exists but is not a directory", path.display()),
            ));
        }
        return Ok(());
    }
    fs::create_dir_all(path)
}

/// Like [`ensure_output_dir`], but warns when the root is already there:
/// leftovers from an earlier run turn into `?dep2` duplicates.
pub fn prepare_output_root<P: AsRef<Path>>(output_path: P, reporter: &dyn Reporter) -> io::Result<()> {
    let path = output_path.as_ref();
    if path.is_dir() {
        reporter.warning(&format!(
            "output directory '{}' already exists, existing files will not be overwritten",
            path.display()
        ));
    }
    ensure_output_dir(path)
}

/// Write `value` as pretty-printed JSON.
pub fn write_json<P: AsRef<Path>, T: Serialize + ?Sized>(path: P, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)
}
