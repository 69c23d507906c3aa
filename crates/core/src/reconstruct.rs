use std::borrow::Cow;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::output::{ensure_output_dir, write_json};
use crate::path_map::PathMap;
use crate::reporter::Reporter;
use crate::safe_path::{SafePath, SafePathError};
use crate::source_map::DecodedBundle;

/// Paths containing any of these are never written.
pub const FORBIDDEN_SYMBOLS: &[char] = &['|', '{', '}', '$', '^'];

/// `(from, to)` replacements applied to every written path.
pub const RENAMED_SYMBOLS: &[(char, char)] = &[(' ', '_')];

/// Appended, followed by a counter starting at 2, to a path that is already taken.
pub const DEDUP_MARKER: &str = "?dep";

pub const FILES_DIR: &str = "files";
pub const STATISTIC_FILE: &str = "statistic.json";
pub const REPORT_FILE: &str = "decoder.json";

#[derive(Error, Debug)]
pub enum ReconstructError {
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Root(#[from] SafePathError),
}

impl ReconstructError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| ReconstructError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Contents of `decoder.json`: what was skipped, renamed and moved aside.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReconstructionReport {
    pub forbidden_paths: Vec<String>,
    pub renamed_paths: PathMap,
    /// Occupied path -> path the colliding content was written to instead.
    pub deduplicated: PathMap,
}

/// Write every file of `bundle` below `<output_root>/<label>/files` and store
/// `statistic.json` plus `decoder.json` next to that directory.
///
/// Files are processed sequentially in bundle order; collision detection
/// depends on seeing the files written before.
pub fn reconstruct(
    output_root: &Path,
    label: &str,
    bundle: &DecodedBundle,
    reporter: &dyn Reporter,
) -> Result<ReconstructionReport, ReconstructError> {
    let bundle_dir = output_root.join(label);
    let files_dir = bundle_dir.join(FILES_DIR);
    ensure_output_dir(&files_dir).map_err(ReconstructError::io(&files_dir))?;

    let root = SafePath::new(&files_dir)?;
    let anchor = anchor_dir(&bundle.statistic.source_map_path);
    let mut report = ReconstructionReport::default();

    for (source, content) in bundle.files.iter() {
        if is_forbidden(source) {
            reporter.info(&format!("file '{source}' skipped: path contains a forbidden symbol"));
            report.forbidden_paths.push(source.to_string());
            continue;
        }

        let sanitized = sanitize(source);
        if sanitized != source {
            reporter.info(&format!("file '{source}' renamed to '{sanitized}'"));
            report.renamed_paths.insert(source, &*sanitized);
        }

        let target = match root.join(anchor.join(strip_root(&sanitized))) {
            Ok(target) if target.is_boundary() || !names_file(target.path()) => {
                reporter.error(&format!("file '{source}' skipped: path does not name a file"));
                continue;
            }
            Ok(target) => target.into_path_buf(),
            Err(err) => {
                reporter.error(&format!("file '{source}' skipped: {err}"));
                continue;
            }
        };

        if let Some(parent) = target.parent() {
            if let Some(blocker) = blocking_file(parent) {
                reporter.error(&format!(
                    "file '{source}' skipped: '{}' is a file, not a directory",
                    blocker.display()
                ));
                continue;
            }
            fs::create_dir_all(parent).map_err(ReconstructError::io(parent))?;
        }

        let destination = match free_destination(&target) {
            Free::Vacant => target,
            Free::Alternate { occupied, alternate } => {
                reporter.info(&format!(
                    "file '{}' already exists, writing '{}'",
                    occupied.display(),
                    alternate.display()
                ));
                report
                    .deduplicated
                    .insert(occupied.to_string_lossy(), alternate.to_string_lossy());
                alternate
            }
        };

        fs::write(&destination, content).map_err(ReconstructError::io(&destination))?;
    }

    let statistic_path = bundle_dir.join(STATISTIC_FILE);
    write_json(&statistic_path, &bundle.statistic).map_err(ReconstructError::io(&statistic_path))?;
    let report_path = bundle_dir.join(REPORT_FILE);
    write_json(&report_path, &report).map_err(ReconstructError::io(&report_path))?;

    Ok(report)
}

/// Whether `path` contains a symbol from [`FORBIDDEN_SYMBOLS`].
pub fn is_forbidden(path: &str) -> bool {
    path.contains(FORBIDDEN_SYMBOLS)
}

/// Apply every [`RENAMED_SYMBOLS`] replacement.
pub fn sanitize(path: &str) -> Cow<'_, str> {
    RENAMED_SYMBOLS
        .iter()
        .fold(Cow::Borrowed(path), |path, &(from, to)| {
            if path.contains(from) {
                Cow::Owned(path.replace(from, &to.to_string()))
            } else {
                path
            }
        })
}

/// Drop every leading `/` so the path cannot be taken as filesystem-absolute.
pub fn strip_root(path: &str) -> &str {
    path.trim_start_matches('/')
}

/// `false` when the last segment of `path` is empty, `.` or `..`, i.e. the
/// path can only name a directory.
fn names_file(path: &Path) -> bool {
    let raw = path.to_string_lossy();
    let last = raw.rsplit(std::path::is_separator).next().unwrap_or_default();
    !matches!(last, "" | "." | "..")
}

/// First ancestor of `dir` that exists as something other than a directory.
fn blocking_file(dir: &Path) -> Option<&Path> {
    dir.ancestors().find(|ancestor| ancestor.is_file())
}

/// Directory the bundle was emitted to; sources are recorded relative to it.
fn anchor_dir(source_map_path: &str) -> PathBuf {
    Path::new(strip_root(source_map_path))
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

enum Free {
    Vacant,
    Alternate { occupied: PathBuf, alternate: PathBuf },
}

/// Find a path that does not exist yet: `target`, then `target?dep2`,
/// `target?dep3`, ...
fn free_destination(target: &Path) -> Free {
    if !is_occupied(target) {
        return Free::Vacant;
    }

    let mut occupied = target.to_path_buf();
    let mut counter = 2usize;
    loop {
        let alternate = with_marker(target, counter);
        if !is_occupied(&alternate) {
            return Free::Alternate { occupied, alternate };
        }
        occupied = alternate;
        counter += 1;
    }
}

fn with_marker(target: &Path, counter: usize) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(format!("{DEDUP_MARKER}{counter}"));
    PathBuf::from(name)
}

fn is_occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
