use crate::error::ReconcileError;
use crate::layout::{resolve_placement, shard_name, StoreLayout};
use crate::loader::{load_index, IndexFetcher};
use crate::manifest::{AssetIndex, VersionAssets};
use crate::placement::{DownloadEntry, PlacementAction};
use crate::progress::{FileKind, ProgressEvent, ProgressSink};
use crate::validate::file_matches;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::debug;

/// Progress is reported once per this many processed entries, keeping
/// notification overhead bounded on large indices.
const PROGRESS_BATCH: usize = 50;

/// A fingerprint is only shardable when its first two bytes are ASCII
/// hex; anything else (too short, non-hex, multi-byte characters from
/// a hostile index) is malformed and must be skipped, not sliced.
fn has_shard_prefix(hash: &str) -> bool {
    hash.len() >= 2 && hash.as_bytes()[..2].iter().all(u8::is_ascii_hexdigit)
}

/// Cooperative cancellation flag, checked at every suspension point
/// (index fetch, per-entry validation, view copies). Safe to abandon a
/// pass mid-way: placement is idempotent and re-checked next run.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Engine settings. Held per reconciler so concurrently-reconciling
/// versions cannot observe each other's configuration.
#[derive(Clone, Debug)]
pub struct ReconcilerConfig {
    /// Base url objects are fetched from; always ends with '/'.
    pub asset_server: String,
    /// When false, existence alone marks a file valid (fast path).
    pub verify_fingerprints: bool,
}

impl ReconcilerConfig {
    pub fn new(asset_server: impl Into<String>, verify_fingerprints: bool) -> Self {
        let mut asset_server = asset_server.into();
        if !asset_server.ends_with('/') {
            asset_server.push('/');
        }
        Self { asset_server, verify_fingerprints }
    }
}

/// The reconciliation driver: walks an asset index, decides which
/// canonical objects need downloading, and keeps secondary view copies
/// current for objects that are already valid.
#[derive(Clone, Debug)]
pub struct Reconciler {
    config: ReconcilerConfig,
    layout: StoreLayout,
    cancel: CancelToken,
}

impl Reconciler {
    pub fn new(config: ReconcilerConfig, layout: StoreLayout) -> Self {
        Self { config, layout, cancel: CancelToken::new() }
    }

    /// Token that cancels this reconciler's passes.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Load the version's index and reconcile it. `Ok(None)` means the
    /// version defines no asset index or the index carries no object
    /// collection; either way there is nothing to check.
    pub fn check(
        &self,
        version: &VersionAssets,
        fetcher: &dyn IndexFetcher,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Option<Vec<DownloadEntry>>, ReconcileError> {
        if self.cancel.is_cancelled() {
            return Err(ReconcileError::Cancelled);
        }
        let Some(index) = load_index(&self.layout, version, fetcher, self.config.verify_fingerprints)?
        else {
            return Ok(None);
        };
        self.reconcile(&index, &version.id, progress)
    }

    /// Async drop-in for [`Reconciler::check`]: the whole pass runs on
    /// the blocking pool, outputs are identical.
    pub async fn check_async(
        &self,
        version: &VersionAssets,
        fetcher: Arc<dyn IndexFetcher>,
        progress: Option<Arc<dyn ProgressSink>>,
    ) -> Result<Option<Vec<DownloadEntry>>, ReconcileError> {
        let this = self.clone();
        let version = version.clone();
        tokio::task::spawn_blocking(move || {
            this.check(&version, fetcher.as_ref(), progress.as_deref())
        })
        .await
        .map_err(|_| ReconcileError::Worker)?
    }

    /// Reconcile an already-loaded index.
    ///
    /// Per entry: resolve placement, build the deferred view actions,
    /// validate the canonical object. Invalid objects yield a download
    /// descriptor carrying those actions; valid objects have their
    /// actions run on the spot and yield nothing. Descriptors sharing
    /// a (destination, url) identity collapse to one, with their
    /// deferred actions unioned so no name loses its view placement.
    pub fn reconcile(
        &self,
        index: &AssetIndex,
        asset_id: &str,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Option<Vec<DownloadEntry>>, ReconcileError> {
        let Some(objects) = index.objects.as_ref() else {
            return Ok(None);
        };

        let total = objects.len();
        let mut processed = 0usize;
        let mut pending: Vec<DownloadEntry> = Vec::new();
        let mut by_key: HashMap<(PathBuf, String), usize> = HashMap::new();
        let check = self.config.verify_fingerprints;

        for (name, object) in objects {
            if self.cancel.is_cancelled() {
                return Err(ReconcileError::Cancelled);
            }

            // Entries without a usable fingerprint are malformed, not
            // an error; a shard prefix needs at least two hex bytes.
            match object.hash.as_deref() {
                Some(h) if has_shard_prefix(h) => {
                    let placement = resolve_placement(&self.layout, index, asset_id, name, h);
                    let actions: Vec<PlacementAction> = placement
                        .views
                        .iter()
                        .map(|view| PlacementAction {
                            source: placement.canonical.clone(),
                            dest: view.clone(),
                            fingerprint: h.to_string(),
                        })
                        .collect();

                    if file_matches(&placement.canonical, h, check) {
                        for action in &actions {
                            if self.cancel.is_cancelled() {
                                return Err(ReconcileError::Cancelled);
                            }
                            action.apply(check);
                        }
                    } else {
                        let entry = DownloadEntry {
                            path: placement.canonical,
                            url: format!("{}{}", self.config.asset_server, shard_name(h)),
                            size: object.size,
                            kind: FileKind::Resource,
                            name: name.clone(),
                            after_download: actions,
                        };
                        match by_key.get(&entry.key()) {
                            Some(&i) => {
                                let merged = &mut pending[i].after_download;
                                for action in entry.after_download {
                                    if !merged.contains(&action) {
                                        merged.push(action);
                                    }
                                }
                            }
                            None => {
                                by_key.insert(entry.key(), pending.len());
                                pending.push(entry);
                            }
                        }
                    }
                }
                _ => {}
            }

            processed += 1;
            if processed % PROGRESS_BATCH == 0 {
                if let Some(sink) = progress {
                    sink.notify(ProgressEvent {
                        kind: FileKind::Resource,
                        done: false,
                        name: String::new(),
                        total,
                        processed,
                    });
                }
            }
        }

        debug!(total, pending = pending.len(), "reconciliation pass complete");
        Ok(Some(pending))
    }

    /// Async drop-in for [`Reconciler::reconcile`].
    pub async fn reconcile_async(
        &self,
        index: &AssetIndex,
        asset_id: &str,
        progress: Option<Arc<dyn ProgressSink>>,
    ) -> Result<Option<Vec<DownloadEntry>>, ReconcileError> {
        let this = self.clone();
        let index = index.clone();
        let asset_id = asset_id.to_string();
        tokio::task::spawn_blocking(move || {
            this.reconcile(&index, &asset_id, progress.as_deref())
        })
        .await
        .map_err(|_| ReconcileError::Worker)?
    }
}
