pub mod counter;
pub mod decoder;
pub mod discovery;
pub mod download_manager;
pub mod fetch;
pub mod output;
pub mod path_map;
pub mod reconstruct;
pub mod reporter;
pub mod safe_path;
pub mod source_map;
pub mod url_utils;

pub use counter::FrequencyCounter;
pub use decoder::{run_decoder, DecoderError, DecoderOptions, RunSummary};
pub use discovery::{bundle_label, collect_source_maps, DiscoveryError};
pub use download_manager::{run_downloader, DownloadError, DownloadOptions, DownloadSummary};
pub use fetch::{fetch_source_map, FetchError};
pub use output::{ensure_output_dir, prepare_output_root};
pub use path_map::PathMap;
pub use reconstruct::{reconstruct, ReconstructError, ReconstructionReport};
pub use reporter::{LogReporter, MemoryReporter, Reporter, Severity};
pub use safe_path::{safe_path_join, SafePath, SafePathError};
pub use source_map::{decode, DecodeError, DecodedBundle, SourceMapDocument, SourceMapStatistic};
pub use url_utils::MapUrlMode;
