use crate::error::{FetchError, ReconcileError};
use crate::layout::StoreLayout;
use crate::manifest::{AssetIndex, VersionAssets};
use crate::validate::file_matches;
use std::fs::{self, File};
use std::path::Path;
use tracing::debug;

/// Transport boundary for retrieving the index document. The engine
/// never speaks a protocol itself; callers may substitute any source
/// (tests use an in-memory one).
pub trait IndexFetcher: Send + Sync {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}

/// Default fetcher over blocking reqwest.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self { client: reqwest::blocking::Client::new() }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexFetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let resp = self.client.get(url).send()?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }
        let bytes = resp.bytes()?;
        fs::write(dest, &bytes)?;
        Ok(())
    }
}

/// Obtain the parsed asset index for a version.
///
/// Returns `Ok(None)` when the version names no index at all (empty
/// asset id and empty url). Otherwise the cached copy is validated
/// against the version's index fingerprint and refetched through
/// `fetcher` when stale, then parsed. An absent cache with no url is
/// `ManifestUnavailable`; an unparsable one is `ManifestCorrupt`.
/// Neither is retried here.
pub fn load_index(
    layout: &StoreLayout,
    version: &VersionAssets,
    fetcher: &dyn IndexFetcher,
    verify_fingerprints: bool,
) -> Result<Option<AssetIndex>, ReconcileError> {
    if version.id.is_empty() && version.url.is_empty() {
        return Ok(None);
    }

    let cache = layout.index_path(&version.id);
    if !version.url.is_empty() {
        // An empty known fingerprint can never validate, so the cache
        // is refreshed whenever we cannot prove it current.
        let current = file_matches(&cache, &version.hash, verify_fingerprints);
        if !current {
            if let Some(parent) = cache.parent() {
                fs::create_dir_all(parent)
                    .map_err(|source| ReconcileError::Io { path: cache.clone(), source })?;
            }
            debug!(url = %version.url, cache = %cache.display(), "fetching asset index");
            fetcher
                .fetch(&version.url, &cache)
                .map_err(|source| ReconcileError::Fetch { url: version.url.clone(), source })?;
        }
    }

    if !cache.is_file() {
        return Err(ReconcileError::ManifestUnavailable { path: cache });
    }

    let f = File::open(&cache)
        .map_err(|source| ReconcileError::Io { path: cache.clone(), source })?;
    let index: AssetIndex = serde_json::from_reader(f)
        .map_err(|source| ReconcileError::ManifestCorrupt { path: cache.clone(), source })?;
    debug!(cache = %cache.display(), objects = index.object_count(), "asset index loaded");
    Ok(Some(index))
}
