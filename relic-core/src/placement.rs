use crate::progress::FileKind;
use crate::validate::file_matches;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, warn};

/// One deferred view placement: once `source` (a canonical object) is
/// known valid, make sure `dest` holds the same bytes. Plain data so
/// the plan stays inspectable and serializable.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct PlacementAction {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub fingerprint: String,
}

impl PlacementAction {
    /// Verify-then-copy. A destination that already validates is left
    /// untouched. Copy failures are logged and absorbed: a broken view
    /// copy never fails the pass and never re-flags the canonical
    /// object for download.
    pub fn apply(&self, check_fingerprint: bool) {
        if file_matches(&self.dest, &self.fingerprint, check_fingerprint) {
            return;
        }
        if let Err(e) = self.copy() {
            warn!(
                source = %self.source.display(),
                dest = %self.dest.display(),
                error = %e,
                "view placement failed; continuing"
            );
        } else {
            debug!(dest = %self.dest.display(), "view copy placed");
        }
    }

    fn copy(&self) -> io::Result<()> {
        if let Some(parent) = self.dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&self.source, &self.dest)?;
        Ok(())
    }
}

/// One unit of pending download work. The external downloader writes
/// `path` from `url`, confirms the bytes, then runs every entry of
/// `after_download` before considering the descriptor complete.
#[derive(Serialize, Clone, Debug)]
pub struct DownloadEntry {
    pub path: PathBuf,
    pub url: String,
    pub size: u64,
    pub kind: FileKind,
    pub name: String,
    pub after_download: Vec<PlacementAction>,
}

impl DownloadEntry {
    /// Dedup identity: two index entries sharing a fingerprint resolve
    /// to the same destination and url and collapse to one descriptor.
    pub fn key(&self) -> (PathBuf, String) {
        (self.path.clone(), self.url.clone())
    }

    /// Run every deferred placement for this descriptor.
    pub fn run_after_download(&self, check_fingerprint: bool) {
        for action in &self.after_download {
            action.apply(check_fingerprint);
        }
    }
}
