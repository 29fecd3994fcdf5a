use std::thread;
use std::time::Duration;

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, warn};

use crate::app::{ProgressEvent, ProgressSink};
use crate::domain::SupplementaryUrl;
use crate::error::CmftError;
use crate::metadata::MetadataRecord;
use crate::pipeline::{ExtractedSources, join_extraction};

/// Lists file names in one directory of the remote file server.
pub trait ListingClient: Send + Sync {
    fn list(&self, path: &str) -> Result<Vec<String>, CmftError>;
}

/// Reads directory listings from the HTTPS mirror of the GEO file server.
#[derive(Clone)]
pub struct GeoHttpClient {
    client: Client,
    host: String,
    href: Regex,
}

impl GeoHttpClient {
    pub fn new(host: &str) -> Result<Self, CmftError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("kira-cmft/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| CmftError::ListingHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| CmftError::ListingHttp(err.to_string()))?;
        let href = Regex::new(r#"href="([^"?/][^"]*)""#)
            .map_err(|err| CmftError::ListingHttp(err.to_string()))?;
        Ok(Self {
            client,
            host: host.to_string(),
            href,
        })
    }

    pub fn listing_url(&self, path: &str) -> String {
        format!("https://{}/{}/", self.host, path.trim_matches('/'))
    }

    fn send_with_retries(&self, url: &str) -> Result<reqwest::blocking::Response, CmftError> {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(CmftError::ListingHttp(err.to_string()));
                }
            }
        }
    }
}

impl ListingClient for GeoHttpClient {
    fn list(&self, path: &str) -> Result<Vec<String>, CmftError> {
        let url = self.listing_url(path);
        let response = self.send_with_retries(&url)?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "listing request failed".to_string());
            return Err(CmftError::ListingStatus { status, message });
        }
        let body = response
            .text()
            .map_err(|err| CmftError::ListingHttp(err.to_string()))?;
        Ok(parse_listing(&self.href, &body))
    }
}

/// File names linked from an HTML directory index, in page order.
pub fn parse_listing(href: &Regex, body: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for capture in href.captures_iter(body) {
        let name = &capture[1];
        if name.contains('/') || name.contains(':') {
            continue;
        }
        if !names.iter().any(|seen| seen == name) {
            names.push(name.to_string());
        }
    }
    names
}

pub fn bed_files(names: Vec<String>, suffix: &str) -> Vec<String> {
    names
        .into_iter()
        .filter(|name| name.ends_with(suffix))
        .collect()
}

/// Download URL for `name` inside the directory `path` of `host`.
pub fn full_link(host: &str, path: &str, name: &str) -> String {
    format!("ftp://{}/{}/{}", host, path.trim_matches('/'), name)
}

/// Filename as it appears once downloaded and decompressed.
pub fn plain_name(name: &str) -> &str {
    name.strip_suffix(".gz").unwrap_or(name)
}

/// Lists the supplementary directory of every record and derives the row and
/// URL sequences from the listings.
///
/// Listings are fetched by up to `workers` threads and put back in record
/// order. Each record yields one row per matching file.
pub fn extract_sources<C: ListingClient>(
    records: &[MetadataRecord],
    client: &C,
    host: &str,
    bed_suffix: &str,
    workers: usize,
    sink: &dyn ProgressSink,
) -> Result<ExtractedSources, CmftError> {
    let urls = records
        .iter()
        .map(|record| record.url.parse::<SupplementaryUrl>())
        .collect::<Result<Vec<_>, _>>()?;

    sink.event(ProgressEvent {
        message: format!("phase=List; listing {} directories", urls.len()),
        elapsed: None,
    });
    let start = std::time::Instant::now();
    let listings = list_all(&urls, client, bed_suffix, workers)?;
    sink.event(ProgressEvent {
        message: format!("listing done latency_ms={}", start.elapsed().as_millis()),
        elapsed: Some(start.elapsed()),
    });

    for (record, listing) in records.iter().zip(&listings) {
        if listing.is_empty() {
            warn!(sample = %record.sample, url = %record.url, "no matching files in directory");
        }
    }

    let (manifest, columns) = thread::scope(|scope| {
        let url_pass = scope.spawn(|| manifest_urls(host, &urls, &listings));
        let row_pass = scope.spawn(|| row_columns(records, &listings));
        (url_pass.join(), row_pass.join())
    });
    let manifest = manifest.map_err(|_| worker_panicked("url extraction"))?;
    let columns = columns.map_err(|_| worker_panicked("file name extraction"))?;

    for url in &manifest {
        sink.event(ProgressEvent {
            message: format!("extracted full link >>> {url}"),
            elapsed: None,
        });
    }
    for name in &columns[2] {
        sink.event(ProgressEvent {
            message: format!("extracted file name >>> {name}"),
            elapsed: None,
        });
    }

    join_extraction(manifest, columns)
}

fn list_all<C: ListingClient>(
    urls: &[SupplementaryUrl],
    client: &C,
    bed_suffix: &str,
    workers: usize,
) -> Result<Vec<Vec<String>>, CmftError> {
    if urls.is_empty() {
        return Ok(Vec::new());
    }
    let chunk = urls.len().div_ceil(workers.max(1));

    thread::scope(|scope| {
        let handles = urls
            .chunks(chunk)
            .map(|part| {
                scope.spawn(move || {
                    part.iter()
                        .map(|url| {
                            debug!(path = url.path(), "listing directory");
                            client
                                .list(url.path())
                                .map(|names| bed_files(names, bed_suffix))
                        })
                        .collect::<Result<Vec<_>, CmftError>>()
                })
            })
            .collect::<Vec<_>>();

        let mut listings = Vec::with_capacity(urls.len());
        for handle in handles {
            let part = handle
                .join()
                .map_err(|_| worker_panicked("directory listing"))??;
            listings.extend(part);
        }
        Ok(listings)
    })
}

fn manifest_urls(host: &str, urls: &[SupplementaryUrl], listings: &[Vec<String>]) -> Vec<String> {
    urls.iter()
        .zip(listings)
        .flat_map(|(url, names)| names.iter().map(|name| full_link(host, url.path(), name)))
        .collect()
}

/// `sample`, `mark` and `filename` columns, one entry per listed file.
fn row_columns(records: &[MetadataRecord], listings: &[Vec<String>]) -> Vec<Vec<String>> {
    let mut samples = Vec::new();
    let mut marks = Vec::new();
    let mut filenames = Vec::new();
    for (record, names) in records.iter().zip(listings) {
        for name in names {
            samples.push(record.sample.clone());
            marks.push(record.mark.clone());
            filenames.push(plain_name(name).to_string());
        }
    }
    vec![samples, marks, filenames]
}

fn worker_panicked(task: &str) -> CmftError {
    CmftError::ListingHttp(format!("{task} worker panicked"))
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
