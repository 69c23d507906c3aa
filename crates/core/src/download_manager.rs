use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use reqwest::Client;
use tokio::sync::{mpsc, Mutex};
use tokio::{fs, task};

use crate::fetch::{build_client, fetch_source_map, FetchError};
use crate::output::ensure_output_dir;
use crate::reporter::Reporter;
use crate::safe_path::{SafePath, SafePathError};
use crate::url_utils::{derive_map_urls, filename_from_url, filter_urls, MapUrlMode};

#[derive(thiserror::Error, Debug)]
pub enum DownloadError {
    #[error("url list '{}' does not exist", .0.display())]
    InputNotFound(PathBuf),
    #[error("invalid filter expression: {0}")]
    InvalidFilter(#[from] regex::Error),
    #[error(transparent)]
    Client(#[from] FetchError),
    #[error(transparent)]
    Output(#[from] SafePathError),
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Settings of one downloader run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Newline-delimited list of URLs.
    pub input: PathBuf,
    /// Regular expression a URL must match somewhere; empty keeps everything.
    pub filter: String,
    pub mode: MapUrlMode,
    /// Flat directory receiving the fetched maps.
    pub output: PathBuf,
    /// Number of parallel workers.
    pub concurrency: usize,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            filter: String::new(),
            mode: MapUrlMode::Auto,
            output: PathBuf::from("maps_files"),
            concurrency: 8,
        }
    }
}

/// Result of a download attempt
#[derive(Debug)]
pub struct DownloadResult {
    pub url: String,
    pub body: Result<String, FetchError>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub saved: usize,
    pub failed: usize,
}

/// Read the URL list, one URL per line.
pub async fn read_url_list<P: AsRef<Path>>(path: P) -> Result<Vec<String>, DownloadError> {
    let path = path.as_ref();
    match fs::read_to_string(path).await {
        Ok(text) => Ok(text.lines().map(str::to_string).collect()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(DownloadError::InputNotFound(path.to_path_buf()))
        }
        Err(source) => Err(DownloadError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Concurrently download a list of URLs using a worker pool.
/// Results come back in the order of `urls`.
pub async fn download_many(urls: Vec<String>, concurrency: usize) -> Result<Vec<DownloadResult>, FetchError> {
    let concurrency = concurrency.max(1);
    let (tx, rx) = mpsc::channel::<(usize, String)>(concurrency * 2);
    let (result_tx, mut result_rx) = mpsc::channel::<(usize, DownloadResult)>(concurrency * 2);
    let client = build_client()?;
    let rx = Arc::new(Mutex::new(rx));

    let mut handles = Vec::new();
    for _ in 0..concurrency {
        let rx = Arc::clone(&rx);
        let result_tx = result_tx.clone();
        let client: Client = client.clone();
        let handle = task::spawn(async move {
            loop {
                let job = {
                    let mut rx = rx.lock().await;
                    rx.recv().await
                };
                let (index, url) = match job {
                    Some(job) => job,
                    None => break,
                };
                let body = fetch_source_map(&client, &url).await;
                let _ = result_tx.send((index, DownloadResult { url, body })).await;
            }
        });
        handles.push(handle);
    }
    drop(result_tx);

    // Collect while feeding so a full result channel cannot stall the workers.
    let total = urls.len();
    let feeder = task::spawn(async move {
        for job in urls.into_iter().enumerate() {
            if tx.send(job).await.is_err() {
                break;
            }
        }
    });

    let mut results = Vec::with_capacity(total);
    while let Some(result) = result_rx.recv().await {
        results.push(result);
    }

    let _ = feeder.await;
    for handle in handles {
        let _ = handle.await;
    }

    results.sort_by_key(|(index, _)| *index);
    Ok(results.into_iter().map(|(_, result)| result).collect())
}

/// Write every successful download to `<output>/<last url segment>`.
/// Later URLs with the same file name replace earlier ones.
pub async fn save_downloads(
    results: &[DownloadResult],
    output: &Path,
    reporter: &dyn Reporter,
) -> Result<DownloadSummary, DownloadError> {
    ensure_output_dir(output).map_err(|source| DownloadError::Io {
        path: output.to_path_buf(),
        source,
    })?;
    let root = SafePath::new(output)?;
    let mut summary = DownloadSummary::default();

    for result in results {
        let body = match &result.body {
            Ok(body) => body,
            Err(err) => {
                reporter.error(&format!("failed to download '{}': {err}", result.url));
                summary.failed += 1;
                continue;
            }
        };

        let target = match filename_from_url(&result.url).map(|name| root.join(name)) {
            Some(Ok(target)) if !target.is_boundary() => target.into_path_buf(),
            Some(Err(err)) => {
                reporter.error(&format!("refusing to save '{}': {err}", result.url));
                summary.failed += 1;
                continue;
            }
            _ => {
                reporter.error(&format!("no file name in '{}'", result.url));
                summary.failed += 1;
                continue;
            }
        };

        fs::write(&target, body).await.map_err(|source| DownloadError::Io {
            path: target.clone(),
            source,
        })?;
        reporter.info(&format!("saved '{}' to '{}'", result.url, target.display()));
        summary.saved += 1;
    }

    Ok(summary)
}

/// Read, filter and derive the URL list, fetch every map and save it.
pub async fn run_downloader(options: &DownloadOptions, reporter: &dyn Reporter) -> Result<DownloadSummary, DownloadError> {
    let filter = Regex::new(&options.filter)?;
    let urls = read_url_list(&options.input).await?;
    let urls = derive_map_urls(filter_urls(&urls, &filter), options.mode);
    reporter.info(&format!("downloading {} source map(s)", urls.len()));

    let results = download_many(urls, options.concurrency).await?;
    save_downloads(&results, &options.output, reporter).await
}
