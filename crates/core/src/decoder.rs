use std::fs;
use std::path::{Path, PathBuf};

use crate::discovery::{bundle_label, collect_source_maps, DiscoveryError};
use crate::output::prepare_output_root;
use crate::reconstruct::{reconstruct, ReconstructError};
use crate::reporter::Reporter;
use crate::source_map::decode;

#[derive(thiserror::Error, Debug)]
pub enum DecoderError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    Reconstruct(#[from] ReconstructError),
    #[error("unable to prepare output directory '{}': {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Settings of one decoder run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderOptions {
    /// A `.map` file or a directory of them.
    pub input: PathBuf,
    /// Root receiving one sub-directory per bundle.
    pub output: PathBuf,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: PathBuf::from("output"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub decoded: usize,
    pub skipped: usize,
}

/// Decode every map found at `options.input` into `options.output`.
///
/// Maps are handled one after another. A map that fails to decode is reported
/// and skipped; discovery and filesystem failures end the run.
pub fn run_decoder(options: &DecoderOptions, reporter: &dyn Reporter) -> Result<RunSummary, DecoderError> {
    prepare_output_root(&options.output, reporter).map_err(|source| DecoderError::Output {
        path: options.output.clone(),
        source,
    })?;

    let maps = collect_source_maps(&options.input)?;
    let mut summary = RunSummary::default();

    for map in &maps {
        if decode_one(map, &options.output, reporter)? {
            summary.decoded += 1;
        } else {
            summary.skipped += 1;
        }
    }

    reporter.info(&format!(
        "decoded {} source map(s), skipped {}",
        summary.decoded, summary.skipped
    ));
    Ok(summary)
}

/// Returns `false` when the map was skipped.
fn decode_one(map: &Path, output: &Path, reporter: &dyn Reporter) -> Result<bool, DecoderError> {
    let content = fs::read_to_string(map).map_err(|source| DecoderError::Read {
        path: map.to_path_buf(),
        source,
    })?;

    let bundle = match decode(&content) {
        Ok(bundle) => bundle,
        Err(err) => {
            reporter.error(&format!("failed to decode '{}': {err}", map.display()));
            return Ok(false);
        }
    };

    let label = bundle_label(map);
    let report = reconstruct(output, &label, &bundle, reporter)?;
    reporter.info(&format!(
        "'{}' -> '{}': {} file(s), {} forbidden, {} renamed, {} deduplicated",
        map.display(),
        output.join(&label).display(),
        bundle.files.len(),
        report.forbidden_paths.len(),
        report.renamed_paths.len(),
        report.deduplicated.len()
    ));
    Ok(true)
}
