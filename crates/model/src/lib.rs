//! Tile-set data model: bounding volumes, tile tree, tileset container.
//!
//! # Invariants
//! - A bounding volume's kind (box, region, sphere) never changes; merging
//!   across kinds is an error, never coerced.
//! - A tile exclusively owns its children: the tree has no sharing and no
//!   cycles, so disjoint subtrees can be mutated from separate threads.
//! - Document order (self before children, children in list order) is the
//!   traversal order for every recursive operation; sibling order encodes
//!   streaming priority for consumers.

pub mod tile;
pub mod tileset;
pub mod volume;

pub use tile::{Content, Refine, Tile};
pub use tileset::{Asset, Extensions, Properties, Property, Tileset};
pub use volume::{BoundingVolume, OrientedBox, Region, Sphere, VolumeError, VolumeKind};
