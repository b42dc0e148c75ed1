//! Manifest sources and fetchers.
//!
//! A source string is either `dir:<path>` (local directory of `*.json`
//! manifests) or `bucket:<bucket>/<prefix>` (anonymous S3 listing over
//! HTTPS). Anything else is a fatal configuration error at startup.
//! Filenames derive the search property tag; entries that do not look like
//! manifests are recorded as per-sync errors without aborting the sync.

use anyhow::{anyhow, bail, Context, Result};
use regex::Regex;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::{Duration, SystemTime};

use super::types::FetchedManifest;
use crate::timefmt::parse_iso8601;

static PROPERTY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^/]+)\.json$").unwrap());
static S3_CONTENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<Contents>.*?</Contents>").unwrap());
static S3_KEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<Key>([^<]+)</Key>").unwrap());
static S3_LAST_MODIFIED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<LastModified>([^<]+)</LastModified>").unwrap());
static S3_TRUNCATED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<IsTruncated>true</IsTruncated>").unwrap());

/// Derive the search property tag from a manifest path.
pub fn property_from_path(path: &str) -> Option<String> {
    PROPERTY_PATTERN
        .captures(path)
        .map(|caps| caps[1].to_string())
}

/// Where manifests come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    Dir(PathBuf),
    Bucket { bucket: String, prefix: String },
}

impl FromStr for ManifestSource {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<ManifestSource> {
        if let Some(path) = value.strip_prefix("dir:") {
            if path.is_empty() {
                bail!("Manifest source is missing a directory path: {}", value);
            }
            return Ok(ManifestSource::Dir(PathBuf::from(path)));
        }
        if let Some(rest) = value.strip_prefix("bucket:") {
            let (bucket, prefix) = rest
                .split_once('/')
                .ok_or_else(|| anyhow!("Bucket source needs a prefix: {}", value))?;
            if bucket.is_empty() || prefix.is_empty() {
                bail!("Bucket and prefix must be non-empty: {}", value);
            }
            return Ok(ManifestSource::Bucket {
                bucket: bucket.to_string(),
                prefix: prefix.to_string(),
            });
        }
        bail!("Unknown manifest source: {}", value)
    }
}

/// Result of one fetch pass: the manifests that listed cleanly plus the
/// per-entry errors accumulated along the way.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub manifests: Vec<FetchedManifest>,
    pub errors: Vec<String>,
}

/// Fetcher for a configured manifest source.
pub enum ManifestFetcher {
    Dir(DirFetcher),
    Bucket(BucketFetcher),
}

impl ManifestFetcher {
    pub fn for_source(source: &ManifestSource) -> ManifestFetcher {
        match source {
            ManifestSource::Dir(path) => ManifestFetcher::Dir(DirFetcher { path: path.clone() }),
            ManifestSource::Bucket { bucket, prefix } => ManifestFetcher::Bucket(BucketFetcher {
                bucket: bucket.clone(),
                prefix: prefix.clone(),
                client: reqwest::Client::new(),
            }),
        }
    }

    pub async fn fetch(&self) -> Result<FetchOutcome> {
        match self {
            ManifestFetcher::Dir(fetcher) => fetcher.fetch(),
            ManifestFetcher::Bucket(fetcher) => fetcher.fetch().await,
        }
    }
}

/// Local directory of manifests, one `<property>.json` per property.
pub struct DirFetcher {
    pub path: PathBuf,
}

impl DirFetcher {
    fn fetch(&self) -> Result<FetchOutcome> {
        let mut outcome = FetchOutcome::default();
        let entries = std::fs::read_dir(&self.path)
            .with_context(|| format!("Failed to list manifest directory {:?}", self.path))?;

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let name = path.to_string_lossy().to_string();

            let Some(property) = property_from_path(&name) else {
                outcome
                    .errors
                    .push(format!("Not a manifest filename: {}", name));
                continue;
            };

            match std::fs::read_to_string(&path) {
                Ok(body) => {
                    let last_modified = entry
                        .metadata()
                        .and_then(|meta| meta.modified())
                        .unwrap_or(SystemTime::UNIX_EPOCH);
                    outcome.manifests.push(FetchedManifest {
                        search_property: property,
                        body,
                        last_modified,
                    });
                }
                Err(err) => {
                    outcome
                        .errors
                        .push(format!("Failed to read {}: {}", name, err));
                }
            }
        }

        Ok(outcome)
    }
}

/// Anonymous S3 listing over plain HTTPS (ListObjectsV2).
pub struct BucketFetcher {
    pub bucket: String,
    pub prefix: String,
    client: reqwest::Client,
}

impl BucketFetcher {
    async fn fetch(&self) -> Result<FetchOutcome> {
        let listing_url = format!(
            "https://{}.s3.amazonaws.com/?list-type=2&prefix={}",
            self.bucket, self.prefix
        );
        let listing = self
            .get_with_retry(&listing_url, Duration::from_secs(10), 3)
            .await?
            .text()
            .await?;

        // Pagination is unsupported; a truncated listing means the prefix
        // outgrew one page and the sync must not silently drop manifests.
        if S3_TRUNCATED.is_match(&listing) {
            bail!(
                "Bucket listing for {}/{} is truncated (>1000 objects)",
                self.bucket,
                self.prefix
            );
        }

        let mut outcome = FetchOutcome::default();
        for contents in S3_CONTENTS.find_iter(&listing) {
            let block = contents.as_str();
            let Some(key) = S3_KEY.captures(block).map(|caps| caps[1].to_string()) else {
                continue;
            };
            let Some(property) = property_from_path(&key) else {
                outcome.errors.push(format!("Not a manifest key: {}", key));
                continue;
            };
            let last_modified = S3_LAST_MODIFIED
                .captures(block)
                .and_then(|caps| parse_iso8601(&caps[1]))
                .unwrap_or(SystemTime::UNIX_EPOCH);

            let object_url = format!("https://{}.s3.amazonaws.com/{}", self.bucket, key);
            match self
                .get_with_retry(&object_url, Duration::from_secs(30), 3)
                .await
            {
                Ok(response) => match response.text().await {
                    Ok(body) => outcome.manifests.push(FetchedManifest {
                        search_property: property,
                        body,
                        last_modified,
                    }),
                    Err(err) => outcome
                        .errors
                        .push(format!("Failed to read body of {}: {}", key, err)),
                },
                Err(err) => outcome
                    .errors
                    .push(format!("Failed to fetch {}: {}", key, err)),
            }
        }

        Ok(outcome)
    }

    async fn get_with_retry(
        &self,
        url: &str,
        timeout: Duration,
        attempts: usize,
    ) -> Result<reqwest::Response> {
        let mut delay_ms = 150u64;

        for attempt in 0..attempts {
            let response = self.client.get(url).timeout(timeout).send().await;

            match response {
                Ok(resp) if resp.status().is_success() => return Ok(resp),
                Ok(resp) => {
                    if attempt + 1 == attempts {
                        return Err(anyhow!("GET {} failed: {}", url, resp.status()));
                    }
                }
                Err(e) => {
                    if attempt + 1 == attempts {
                        return Err(anyhow!(e));
                    }
                }
            }

            let jitter = rand::random::<u64>() % 50;
            tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
            delay_ms = (delay_ms * 2).min(1200);
        }

        Err(anyhow!("Retry attempts exhausted for {}", url))
    }
}
