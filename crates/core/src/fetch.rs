use reqwest::{Client, Url};
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0 Safari/537.36";
const TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),
    #[error(transparent)]
    Network(#[from] reqwest::Error),
    #[error("response from {0} is not a source map")]
    NotSourceMap(String),
}

/// HTTP client shared by all downloads: desktop-like User-Agent, 30 second timeout.
pub fn build_client() -> Result<Client, FetchError> {
    Ok(Client::builder().timeout(TIMEOUT).user_agent(USER_AGENT).build()?)
}

/// Fetch `url` and return its body if it looks like a JSON source map
/// (first character `{`). Non-2xx responses are errors.
pub async fn fetch_source_map(client: &Client, url: &str) -> Result<String, FetchError> {
    let parsed = Url::parse(url)?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(FetchError::UnsupportedScheme(other.to_string())),
    }

    let body = client
        .get(parsed)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    if !body.starts_with('{') {
        return Err(FetchError::NotSourceMap(url.to_string()));
    }
    Ok(body)
}
