use crate::tileset::Extensions;
use crate::volume::BoundingVolume;
use glam::DMat4;
use serde_json::Value;

/// Refinement policy: how child tiles relate to their parent's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refine {
    /// Children supplement the parent's content.
    Add,
    /// Children supersede the parent's content.
    Replace,
}

/// Reference to external geometry or another tile-set document.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    pub bounding_volume: Option<BoundingVolume>,
    pub uri: String,
    pub extensions: Extensions,
    pub extras: Option<Value>,
}

impl Content {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            bounding_volume: None,
            uri: uri.into(),
            extensions: Extensions::new(),
            extras: None,
        }
    }
}

/// A node in the tile tree.
///
/// Exclusively owns its children; the tree has no sharing and no cycles.
/// Geometric error decreases from root to leaves by convention ... consumers
/// assume it, the model does not enforce it.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub bounding_volume: BoundingVolume,
    pub viewer_request_volume: Option<BoundingVolume>,
    pub geometric_error: f64,
    pub refine: Option<Refine>,
    /// Affine transform applied to this subtree's local frame.
    /// Serialized column-major on the wire.
    pub transform: Option<DMat4>,
    pub content: Option<Content>,
    pub children: Vec<Tile>,
    pub extensions: Extensions,
    pub extras: Option<Value>,
}

impl Tile {
    pub fn new(bounding_volume: BoundingVolume, geometric_error: f64) -> Self {
        Self {
            bounding_volume,
            viewer_request_volume: None,
            geometric_error,
            refine: None,
            transform: None,
            content: None,
            children: Vec::new(),
            extensions: Extensions::new(),
            extras: None,
        }
    }

    /// Number of nodes in this subtree, including self, in pre-order.
    ///
    /// Used by callers to pre-size buffers or report progress.
    pub fn subtree_size(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(Tile::subtree_size)
            .sum::<usize>()
    }
}
