use relic_core::validate::{file_fingerprint, file_matches, file_matches_async};
use std::fs;

const HELLO_SHA1: &str = "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed";

#[test]
fn fingerprint_known_vector() {
    let td = tempfile::tempdir().unwrap();
    let p = td.path().join("hello.txt");
    fs::write(&p, b"hello world").unwrap();
    assert_eq!(file_fingerprint(&p).unwrap(), HELLO_SHA1);
}

#[test]
fn matches_is_case_insensitive() {
    let td = tempfile::tempdir().unwrap();
    let p = td.path().join("hello.txt");
    fs::write(&p, b"hello world").unwrap();
    assert!(file_matches(&p, HELLO_SHA1, true));
    assert!(file_matches(&p, &HELLO_SHA1.to_uppercase(), true));
}

#[test]
fn missing_file_never_matches() {
    let td = tempfile::tempdir().unwrap();
    let p = td.path().join("absent.bin");
    assert!(!file_matches(&p, HELLO_SHA1, true));
    // Even in existence-only mode.
    assert!(!file_matches(&p, HELLO_SHA1, false));
}

#[test]
fn mismatch_detected_and_existence_fast_path() {
    let td = tempfile::tempdir().unwrap();
    let p = td.path().join("other.txt");
    fs::write(&p, b"different bytes").unwrap();
    assert!(!file_matches(&p, HELLO_SHA1, true));
    // With fingerprint checking off, existence alone is valid.
    assert!(file_matches(&p, HELLO_SHA1, false));
}

#[test]
fn large_file_streams() {
    let td = tempfile::tempdir().unwrap();
    let p = td.path().join("big.bin");
    fastrand::seed(0xDEC0DEu64);
    let mut buf = vec![0u8; 3 * 1024 * 1024 + 17];
    for b in &mut buf {
        *b = fastrand::u8(..);
    }
    fs::write(&p, &buf).unwrap();

    use sha1::{Digest, Sha1};
    let expected = hex::encode(Sha1::digest(&buf));
    assert_eq!(file_fingerprint(&p).unwrap(), expected);
    assert!(file_matches(&p, &expected, true));
}

#[tokio::test]
async fn async_variant_agrees_with_sync() {
    let td = tempfile::tempdir().unwrap();
    let p = td.path().join("hello.txt");
    fs::write(&p, b"hello world").unwrap();

    assert!(file_matches_async(p.clone(), HELLO_SHA1.into(), true).await);
    assert!(!file_matches_async(td.path().join("absent"), HELLO_SHA1.into(), true).await);
    let wrong = "0000000000000000000000000000000000000000".to_string();
    assert!(!file_matches_async(p.clone(), wrong.clone(), true).await);
    assert!(file_matches_async(p, wrong, false).await);
}
