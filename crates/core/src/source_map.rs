use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::counter::FrequencyCounter;
use crate::path_map::PathMap;

/// Scheme prefixes removed from `sources` entries, applied in order.
pub const SOURCE_PREFIXES: &[&str] = &["webpack://"];

/// The only source map revision this decoder understands.
pub const SUPPORTED_VERSION: i64 = 3;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid JSON or sourcemap: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("missing or non-integral field `version`")]
    MissingVersion,
    #[error("source map version {0} is not supported")]
    UnsupportedVersion(i64),
    #[error("source #{index} has no entry in sourcesContent ({sources} sources, {contents} contents)")]
    MissingContent {
        index: usize,
        sources: usize,
        contents: usize,
    },
}

impl DecodeError {
    /// `true` for every failure caused by the document's shape rather than its version.
    pub fn is_parse_error(&self) -> bool {
        !matches!(self, DecodeError::UnsupportedVersion(_))
    }
}

/// Revision 3 source map as written by bundlers.
///
/// `mappings`, `names` and `sourceRoot` are carried through untouched.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourceMapDocument {
    pub version: i64,
    pub sources: Vec<String>,
    pub sources_content: Vec<String>,
    pub file: String,
    pub mappings: String,
    #[serde(default)]
    pub names: Option<Vec<String>>,
    #[serde(default)]
    pub source_root: Option<String>,
}

/// Contents of `statistic.json`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourceMapStatistic {
    /// `sources` exactly as recorded in the map.
    pub includes_files: Vec<String>,
    /// Extension -> occurrences, in first-seen order.
    pub files_statistics: FrequencyCounter,
    pub source_map_path: String,
}

/// Original files recovered from one map.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBundle {
    /// Normalized source path -> original text. A later duplicate path
    /// overwrites the earlier content.
    pub files: PathMap,
    pub statistic: SourceMapStatistic,
}

/// Parse the raw JSON text of a source map.
///
/// The version is checked before the rest of the structure so that any
/// document whose `version` is not 3 reports [`DecodeError::UnsupportedVersion`].
pub fn parse_document(content: &str) -> Result<SourceMapDocument, DecodeError> {
    let mut raw: Value = serde_json::from_str(content)?;
    let version = raw
        .get("version")
        .and_then(integral)
        .ok_or(DecodeError::MissingVersion)?;
    if version != SUPPORTED_VERSION {
        return Err(DecodeError::UnsupportedVersion(version));
    }
    // `3.0` is accepted; store it back as an integer for the typed pass.
    if let Some(object) = raw.as_object_mut() {
        object.insert("version".to_string(), Value::from(version));
    }
    Ok(serde_json::from_value(raw)?)
}

/// Integer value of a JSON number, accepting floats without a fractional part.
fn integral(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64)
            .map(|v| v as i64)
    })
}

/// Decode a source map into its embedded files plus extension statistics.
pub fn decode(content: &str) -> Result<DecodedBundle, DecodeError> {
    let document = parse_document(content)?;

    let mut files = PathMap::new();
    let mut extensions = FrequencyCounter::new();

    for (index, source) in document.sources.iter().enumerate() {
        let path = strip_source_prefix(source);
        let text = document
            .sources_content
            .get(index)
            .ok_or(DecodeError::MissingContent {
                index,
                sources: document.sources.len(),
                contents: document.sources_content.len(),
            })?;

        extensions.increment(file_extension(path));
        files.insert(path, text.as_str());
    }

    Ok(DecodedBundle {
        files,
        statistic: SourceMapStatistic {
            includes_files: document.sources,
            files_statistics: extensions,
            source_map_path: document.file,
        },
    })
}

/// Remove every recognized scheme prefix from a `sources` entry.
pub fn strip_source_prefix(source: &str) -> &str {
    SOURCE_PREFIXES
        .iter()
        .fold(source, |path, prefix| path.strip_prefix(prefix).unwrap_or(path))
}

/// Extension of the last path segment including the dot, with any query string
/// removed: `src/app.js?v=1` -> `.js`. Dot-files and names without a dot have
/// the empty extension.
pub fn file_extension(path: &str) -> &str {
    let path = path.split('?').next().unwrap_or_default();
    let name = path
        .split('/')
        .rev()
        .find(|segment| !segment.is_empty() && *segment != ".")
        .unwrap_or_default();

    match name.rfind('.') {
        Some(dot) if dot > 0 && dot < name.len() - 1 => &name[dot..],
        _ => "",
    }
}
