use crate::tile::Tile;
use serde_json::Value;
use std::collections::BTreeMap;

/// Opaque extension payloads, keyed by extension name.
///
/// Preserved structurally through the codec, never interpreted here.
/// BTreeMap for deterministic iteration and encoding order.
pub type Extensions = BTreeMap<String, Value>;

/// Named numeric range over a per-feature property.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub minimum: f64,
    pub maximum: f64,
    pub extensions: Extensions,
    pub extras: Option<Value>,
}

impl Property {
    pub fn new(minimum: f64, maximum: f64) -> Self {
        Self {
            minimum,
            maximum,
            extensions: Extensions::new(),
            extras: None,
        }
    }
}

pub type Properties = BTreeMap<String, Property>;

/// Tileset asset metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    /// Schema version of the tile-set format.
    pub version: String,
    /// Version of this particular tileset instance.
    pub tileset_version: Option<String>,
    pub extensions: Extensions,
    pub extras: Option<Value>,
}

impl Default for Asset {
    fn default() -> Self {
        Self {
            version: "1.0".into(),
            tileset_version: None,
            extensions: Extensions::new(),
            extras: None,
        }
    }
}

/// Root container of a tile tree.
///
/// Constructed once from a decoded document; conceptually immutable except
/// for the resolution pass, which substitutes resolved subtrees in place.
/// After resolution the tree is final and safe for concurrent read-only
/// traversal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tileset {
    pub asset: Asset,
    pub properties: Properties,
    pub geometric_error: f64,
    pub root: Option<Tile>,
    /// Extensions referenced anywhere in this tileset.
    pub extensions_used: Vec<String>,
    /// Extensions required to correctly display this tileset.
    pub extensions_required: Vec<String>,
    pub extensions: Extensions,
    pub extras: Option<Value>,
}

impl Tileset {
    /// Total node count of the tile tree; zero when the tileset is empty.
    pub fn tree_size(&self) -> usize {
        self.root.as_ref().map_or(0, Tile::subtree_size)
    }
}
