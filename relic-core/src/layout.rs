use crate::manifest::AssetIndex;
use std::path::PathBuf;

/// Filesystem layout for one asset store. All methods are pure path
/// computation; nothing here touches the disk.
///
/// Persisted shape:
///   `<assets>/indexes/<id>.json`   cached index per asset id
///   `<assets>/objects/<h[0:2]>/<h>` canonical content-addressed object
///   `<assets>/virtual/<id>/<name>` legacy view copy
///   `<game>/resources/<name>`      resource-mirror view copy
#[derive(Clone, Debug)]
pub struct StoreLayout {
    pub assets_root: PathBuf,
    pub game_root: PathBuf,
}

impl StoreLayout {
    pub fn new(assets_root: impl Into<PathBuf>, game_root: impl Into<PathBuf>) -> Self {
        Self { assets_root: assets_root.into(), game_root: game_root.into() }
    }

    /// Both roots under one base directory.
    pub fn under(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self { assets_root: base.join("assets"), game_root: base }
    }

    /// Cache path for a version's asset index. An empty id falls back
    /// to a shared default cache file.
    pub fn index_path(&self, asset_id: &str) -> PathBuf {
        let name = if asset_id.is_empty() { "index" } else { asset_id };
        self.assets_root.join("indexes").join(format!("{name}.json"))
    }

    pub fn object_root(&self) -> PathBuf {
        self.assets_root.join("objects")
    }

    /// Per-version root for legacy per-name copies. Versions without
    /// an asset id share the "legacy" subroot.
    pub fn legacy_root(&self, asset_id: &str) -> PathBuf {
        let name = if asset_id.is_empty() { "legacy" } else { asset_id };
        self.assets_root.join("virtual").join(name)
    }

    pub fn resources_root(&self) -> PathBuf {
        self.game_root.join("resources")
    }
}

/// Relative shard path for a fingerprint: `<h[0:2]>/<h>`. This is both
/// the on-disk suffix under the object root and the URL suffix under
/// the asset server. The fingerprint must start with two ASCII bytes;
/// the driver skips entries that do not.
pub fn shard_name(fingerprint: &str) -> String {
    format!("{}/{}", &fingerprint[..2], fingerprint)
}

/// Where one object must live: its canonical content-addressed path
/// plus any secondary view paths that must also hold a copy.
#[derive(Clone, Debug)]
pub struct Placement {
    pub canonical: PathBuf,
    pub views: Vec<PathBuf>,
}

/// Resolve the placement for one index entry.
///
/// With an empty asset id the canonical path degrades to the bare
/// shard form (no version-scoped root), matching the legacy flat
/// store. View paths are added only under the index's `virtual` /
/// `map_to_resources` flags.
pub fn resolve_placement(
    layout: &StoreLayout,
    index: &AssetIndex,
    asset_id: &str,
    name: &str,
    fingerprint: &str,
) -> Placement {
    let shard = shard_name(fingerprint);
    let canonical = if asset_id.is_empty() {
        PathBuf::from(&shard)
    } else {
        layout.object_root().join(&shard)
    };

    let mut views = Vec::new();
    if index.is_virtual {
        views.push(layout.legacy_root(asset_id).join(name));
    }
    if index.map_to_resources {
        views.push(layout.resources_root().join(name));
    }

    Placement { canonical, views }
}
