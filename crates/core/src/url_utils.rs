use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use url::Url;

/// What the URLs of a download list point at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MapUrlMode {
    /// Scripts; the map lives at `<url>.map`.
    Js,
    /// Already source maps.
    Map,
    /// Keep only URLs ending in `.js` and treat them as [`MapUrlMode::Js`].
    #[default]
    Auto,
}

impl fmt::Display for MapUrlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MapUrlMode::Js => "js",
            MapUrlMode::Map => "map",
            MapUrlMode::Auto => "auto",
        })
    }
}

impl FromStr for MapUrlMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "js" => Ok(MapUrlMode::Js),
            "map" => Ok(MapUrlMode::Map),
            "auto" => Ok(MapUrlMode::Auto),
            other => Err(format!("unknown url type '{other}', expected js, map or auto")),
        }
    }
}

/// Trim every line, drop blanks and duplicates, and keep the lines `filter`
/// matches somewhere. First occurrences keep their order.
pub fn filter_urls<I, S>(urls: I, filter: &Regex) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    for url in urls {
        let url = url.as_ref().trim();
        if url.is_empty() || !filter.is_match(url) {
            continue;
        }
        if seen.insert(url.to_string()) {
            kept.push(url.to_string());
        }
    }
    kept
}

/// Turn a filtered list into the URLs of the maps to fetch.
pub fn derive_map_urls(urls: Vec<String>, mode: MapUrlMode) -> Vec<String> {
    match mode {
        MapUrlMode::Map => urls,
        MapUrlMode::Js => urls.into_iter().map(|url| format!("{url}.map")).collect(),
        MapUrlMode::Auto => urls
            .into_iter()
            .filter(|url| url.ends_with(".js"))
            .map(|url| format!("{url}.map"))
            .collect(),
    }
}

/// Last segment of the URL path, used as the saved file name.
/// `None` when the URL cannot be parsed or its path ends in `/`.
pub fn filename_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let name = parsed.path_segments()?.next_back()?;
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
