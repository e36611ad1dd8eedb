use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Compute the lowercase-hex SHA-1 of a file's contents.
pub fn file_fingerprint(path: &Path) -> io::Result<String> {
    let mut f = File::open(path)?;
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = f.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Check a local file against an expected fingerprint.
///
/// A missing file is never valid. With `check_fingerprint` false,
/// existence alone is sufficient (the caller is trading correctness
/// for speed). Hex comparison is case-insensitive; any read failure
/// counts as a mismatch and drives a re-download instead of an error.
pub fn file_matches(path: &Path, fingerprint: &str, check_fingerprint: bool) -> bool {
    if !path.is_file() {
        return false;
    }
    if !check_fingerprint {
        return true;
    }
    match file_fingerprint(path) {
        Ok(actual) => actual.eq_ignore_ascii_case(fingerprint),
        Err(_) => false,
    }
}

/// Async variant of [`file_matches`] with identical semantics. The
/// digest runs on the blocking pool so an async caller never stalls
/// its executor on disk reads.
pub async fn file_matches_async(path: PathBuf, fingerprint: String, check_fingerprint: bool) -> bool {
    tokio::task::spawn_blocking(move || file_matches(&path, &fingerprint, check_fingerprint))
        .await
        .unwrap_or(false)
}
