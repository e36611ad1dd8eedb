use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

use relic_core::layout::StoreLayout;
use relic_core::loader::{load_index, HttpFetcher};
use relic_core::manifest::VersionAssets;
use relic_core::placement::DownloadEntry;
use relic_core::progress::{ProgressEvent, ProgressSink};
use relic_core::reconcile::{Reconciler, ReconcilerConfig};
use relic_core::validate::{file_fingerprint, file_matches};

#[derive(Parser)]
#[command(name = "relic", version, about = "content-addressed asset reconciliation")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Args, Clone)]
struct StoreArgs {
    /// Base directory holding the asset store (assets/ lives under it)
    #[arg(long, default_value = ".")]
    root: PathBuf,
    /// Asset index identifier for the version (may be empty)
    #[arg(long, default_value = "")]
    asset_id: String,
    /// Source url of the asset index (omit to use the cached copy)
    #[arg(long, default_value = "")]
    index_url: String,
    /// Expected fingerprint of the asset index
    #[arg(long, default_value = "")]
    index_hash: String,
    /// Base url objects are downloaded from
    #[arg(long, default_value = "https://resources.download.minecraft.net/")]
    server: String,
    /// Trust file existence instead of recomputing fingerprints
    #[arg(long, default_value_t = false)]
    no_verify: bool,
}

#[derive(Subcommand)]
enum Cmd {
    /// Reconcile the store against the index and print the download plan
    Check {
        #[command(flatten)]
        store: StoreArgs,
        /// Emit the plan as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
        #[arg(long, default_value_t = false)]
        progress: bool,
    },
    /// Reconcile, then download pending objects and place their views
    Sync {
        #[command(flatten)]
        store: StoreArgs,
        #[arg(long, default_value_t = false)]
        progress: bool,
    },
    /// Check one file against an expected fingerprint
    Validate { file: PathBuf, fingerprint: String },
    /// Summarize a cached asset index
    Index {
        #[arg(long, default_value = ".")]
        root: PathBuf,
        #[arg(long, default_value = "")]
        asset_id: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Check { store, json, progress } => check(&store, json, progress)?,
        Cmd::Sync { store, progress } => sync(&store, progress)?,
        Cmd::Validate { file, fingerprint } => validate(&file, &fingerprint)?,
        Cmd::Index { root, asset_id } => index_summary(&root, &asset_id)?,
    }
    Ok(())
}

fn build_reconciler(store: &StoreArgs) -> Reconciler {
    Reconciler::new(
        ReconcilerConfig::new(store.server.clone(), !store.no_verify),
        StoreLayout::under(&store.root),
    )
}

fn run_check(store: &StoreArgs, progress: bool) -> Result<Vec<DownloadEntry>> {
    let r = build_reconciler(store);
    let version = VersionAssets::new(
        store.asset_id.as_str(),
        store.index_url.as_str(),
        store.index_hash.as_str(),
    );
    let fetcher = HttpFetcher::new();
    let sink = |e: ProgressEvent| eprintln!("checked {}/{}", e.processed, e.total);
    let sink_ref: Option<&dyn ProgressSink> = if progress { Some(&sink) } else { None };
    let plan = r.check(&version, &fetcher, sink_ref)?;
    Ok(plan.unwrap_or_default())
}

fn check(store: &StoreArgs, json: bool, progress: bool) -> Result<()> {
    let plan = run_check(store, progress)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }
    for d in &plan {
        println!("{}  {}  {} bytes", d.name, d.url, d.size);
    }
    let total: u64 = plan.iter().map(|d| d.size).sum();
    eprintln!("{} object(s) pending, {} byte(s)", plan.len(), total);
    Ok(())
}

fn sync(store: &StoreArgs, progress: bool) -> Result<()> {
    let plan = run_check(store, progress)?;
    if plan.is_empty() {
        eprintln!("store is current");
        return Ok(());
    }

    let client = reqwest::blocking::Client::new();
    let check_fingerprint = !store.no_verify;
    let mut fetched = 0usize;
    let mut failed = 0usize;
    for d in &plan {
        match download_one(&client, d, check_fingerprint) {
            Ok(()) => {
                // Deferred placements run only once the bytes are
                // confirmed on disk.
                d.run_after_download(check_fingerprint);
                fetched += 1;
            }
            Err(e) => {
                warn!(name = %d.name, url = %d.url, error = %e, "download failed");
                failed += 1;
            }
        }
    }
    eprintln!("synced {fetched}/{} object(s)", plan.len());
    if failed > 0 {
        bail!("{failed} object(s) failed to download");
    }
    Ok(())
}

fn download_one(
    client: &reqwest::blocking::Client,
    d: &DownloadEntry,
    check_fingerprint: bool,
) -> Result<()> {
    let resp = client.get(&d.url).send().with_context(|| format!("get {}", d.url))?;
    if !resp.status().is_success() {
        bail!("server answered {}", resp.status());
    }
    let bytes = resp.bytes()?;
    if let Some(parent) = d.path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&d.path, &bytes).with_context(|| format!("write {}", d.path.display()))?;

    // Canonical filenames are the fingerprint itself.
    if let Some(expected) = d.path.file_name().and_then(|n| n.to_str()) {
        if !file_matches(&d.path, expected, check_fingerprint) {
            bail!("downloaded object failed validation: {}", d.path.display());
        }
    }
    Ok(())
}

fn validate(file: &PathBuf, fingerprint: &str) -> Result<()> {
    let actual = file_fingerprint(file).with_context(|| format!("read {}", file.display()))?;
    if actual.eq_ignore_ascii_case(fingerprint) {
        println!("ok {}", file.display());
        Ok(())
    } else {
        bail!("mismatch: expected {fingerprint}, found {actual}");
    }
}

fn index_summary(root: &PathBuf, asset_id: &str) -> Result<()> {
    let layout = StoreLayout::under(root);
    let version = VersionAssets::new(asset_id, "", "");
    let fetcher = HttpFetcher::new();
    match load_index(&layout, &version, &fetcher, true)? {
        None => println!("no asset index"),
        Some(index) => {
            let bytes: u64 = index
                .objects
                .iter()
                .flat_map(|m| m.values())
                .map(|o| o.size)
                .sum();
            println!(
                "objects={} bytes={} virtual={} map_to_resources={}",
                index.object_count(),
                bytes,
                index.is_virtual,
                index.map_to_resources
            );
        }
    }
    Ok(())
}
