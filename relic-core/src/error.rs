use std::path::PathBuf;

/// Failures that escape the engine. Per-object problems never appear
/// here: a validation mismatch becomes a download descriptor and a
/// view-placement failure is logged and absorbed.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("asset index unavailable: no cached copy at {path} and no source url")]
    ManifestUnavailable { path: PathBuf },
    #[error("asset index at {path} is corrupt: {source}")]
    ManifestCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to fetch asset index from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("reconciliation cancelled")]
    Cancelled,
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("reconciliation worker terminated abnormally")]
    Worker,
}

/// Transport-level failure reported by an [`crate::loader::IndexFetcher`].
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered status {0}")]
    Status(u16),
    #[error("write to cache failed: {0}")]
    Io(#[from] std::io::Error),
}
