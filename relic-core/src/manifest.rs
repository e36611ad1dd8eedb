use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// One record in the asset index: a logical name mapped to a
/// content fingerprint and an advisory byte length.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AssetObject {
    /// Lowercase-hex SHA-1 of the object's bytes. Entries without a
    /// hash are malformed and skipped during reconciliation.
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub size: u64,
}

/// The parsed asset index for one version. Immutable once loaded.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AssetIndex {
    /// Legacy per-name copies required under the version's legacy root.
    #[serde(default, rename = "virtual", deserialize_with = "loose_bool")]
    pub is_virtual: bool,
    /// Flat mirror copies required under the shared resources root.
    #[serde(default, rename = "map_to_resources", deserialize_with = "loose_bool")]
    pub map_to_resources: bool,
    /// name -> object. Absent or unparsable means "nothing to check".
    #[serde(default, deserialize_with = "loose_objects")]
    pub objects: Option<BTreeMap<String, AssetObject>>,
}

impl AssetIndex {
    pub fn object_count(&self) -> usize {
        self.objects.as_ref().map_or(0, BTreeMap::len)
    }
}

/// Version-descriptor inputs naming the asset index. Any field may be
/// empty; an empty id together with an empty url means the version
/// defines no asset index at all.
#[derive(Clone, Debug, Default)]
pub struct VersionAssets {
    pub id: String,
    pub url: String,
    pub hash: String,
}

impl VersionAssets {
    pub fn new(id: impl Into<String>, url: impl Into<String>, hash: impl Into<String>) -> Self {
        Self { id: id.into(), url: url.into(), hash: hash.into() }
    }
}

/// An index whose object collection has the wrong shape is reported
/// as "nothing to check" rather than failing the whole parse.
fn loose_objects<'de, D: Deserializer<'de>>(
    de: D,
) -> Result<Option<BTreeMap<String, AssetObject>>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Map(BTreeMap<String, AssetObject>),
        Other(serde::de::IgnoredAny),
    }
    Ok(match Option::<Loose>::deserialize(de)? {
        Some(Loose::Map(m)) => Some(m),
        _ => None,
    })
}

/// Upstream indices emit flags both as JSON booleans and as the
/// strings "true"/"false"; accept either.
fn loose_bool<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Bool(bool),
        Str(String),
    }
    Ok(match Loose::deserialize(de)? {
        Loose::Bool(b) => b,
        Loose::Str(s) => s.eq_ignore_ascii_case("true"),
    })
}
