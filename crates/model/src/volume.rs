use glam::{DMat3, DVec3};
use std::fmt;

/// Discriminant of a [`BoundingVolume`], used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeKind {
    Box,
    Region,
    Sphere,
}

impl fmt::Display for VolumeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeKind::Box => write!(f, "box"),
            VolumeKind::Region => write!(f, "region"),
            VolumeKind::Sphere => write!(f, "sphere"),
        }
    }
}

/// Errors from bounding-volume operations.
#[derive(Debug, thiserror::Error)]
pub enum VolumeError {
    #[error("cannot merge {left} bounding volume with {right} bounding volume")]
    KindMismatch { left: VolumeKind, right: VolumeKind },
}

/// Oriented bounding box: a center point plus three half-axis vectors.
///
/// The half-axes need not be axis-aligned or unit length; together they span
/// the box as `center ± x ± y ± z`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    pub center: DVec3,
    pub x: DVec3,
    pub y: DVec3,
    pub z: DVec3,
}

impl OrientedBox {
    /// Axis-aligned box from min/max corners.
    pub fn from_extents(min: DVec3, max: DVec3) -> Self {
        let center = (min + max) * 0.5;
        let half = (max - min) * 0.5;
        Self {
            center,
            x: DVec3::new(half.x, 0.0, 0.0),
            y: DVec3::new(0.0, half.y, 0.0),
            z: DVec3::new(0.0, 0.0, half.z),
        }
    }

    /// All eight corner points of the box.
    pub fn corners(&self) -> [DVec3; 8] {
        let c = self.center;
        [
            c - self.x - self.y - self.z,
            c - self.x - self.y + self.z,
            c - self.x + self.y - self.z,
            c - self.x + self.y + self.z,
            c + self.x - self.y - self.z,
            c + self.x - self.y + self.z,
            c + self.x + self.y - self.z,
            c + self.x + self.y + self.z,
        ]
    }

    /// Whether a point lies inside (or on the boundary of) the box.
    ///
    /// Degenerate boxes (a zero half-axis) only contain points on their
    /// supporting plane.
    pub fn contains(&self, p: DVec3) -> bool {
        let basis = DMat3::from_cols(self.x, self.y, self.z);
        if basis.determinant().abs() < f64::EPSILON {
            // Flat box: fall back to a corner-derived axis-aligned test.
            let (min, max) = point_extents(&self.corners());
            let eps = 1e-9;
            return p.cmpge(min - eps).all() && p.cmple(max + eps).all();
        }
        let local = basis.inverse() * (p - self.center);
        let eps = 1e-9;
        local.abs().cmple(DVec3::splat(1.0 + eps)).all()
    }

    /// Smallest axis-aligned box containing every corner of both inputs.
    ///
    /// A conservative superset: the result may be larger than the minimal
    /// oriented bound, but never smaller than either input.
    fn merged(&self, other: &OrientedBox) -> OrientedBox {
        let mut points = [DVec3::ZERO; 16];
        points[..8].copy_from_slice(&self.corners());
        points[8..].copy_from_slice(&other.corners());
        let (min, max) = point_extents(&points);
        OrientedBox::from_extents(min, max)
    }
}

fn point_extents(points: &[DVec3]) -> (DVec3, DVec3) {
    let mut min = DVec3::splat(f64::INFINITY);
    let mut max = DVec3::splat(f64::NEG_INFINITY);
    for p in points {
        min = min.min(*p);
        max = max.max(*p);
    }
    (min, max)
}

/// Geographic region: west/south/east/north in radians, heights in meters.
///
/// A freshly constructed region is the empty sentinel (inverted extents), the
/// identity under [`Region::merged`]. Tilesets start from this placeholder
/// before any geometry is observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
    pub min_height: f64,
    pub max_height: f64,
}

impl Region {
    /// The invalid/empty sentinel: lows at `+inf`, highs at `-inf`.
    pub const EMPTY: Region = Region {
        west: f64::INFINITY,
        south: f64::INFINITY,
        east: f64::NEG_INFINITY,
        north: f64::NEG_INFINITY,
        min_height: f64::INFINITY,
        max_height: f64::NEG_INFINITY,
    };

    pub fn new(
        west: f64,
        south: f64,
        east: f64,
        north: f64,
        min_height: f64,
        max_height: f64,
    ) -> Self {
        Self {
            west,
            south,
            east,
            north,
            min_height,
            max_height,
        }
    }

    /// Whether this region is the empty sentinel (or otherwise inverted).
    pub fn is_empty(&self) -> bool {
        self.west > self.east || self.south > self.north || self.min_height > self.max_height
    }

    /// Whether a (longitude, latitude, height) point lies inside the region.
    pub fn contains(&self, longitude: f64, latitude: f64, height: f64) -> bool {
        longitude >= self.west
            && longitude <= self.east
            && latitude >= self.south
            && latitude <= self.north
            && height >= self.min_height
            && height <= self.max_height
    }

    /// Smallest region containing both inputs. An empty operand is the
    /// identity.
    fn merged(&self, other: &Region) -> Region {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Region {
            west: self.west.min(other.west),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            north: self.north.max(other.north),
            min_height: self.min_height.min(other.min_height),
            max_height: self.max_height.max(other.max_height),
        }
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Bounding sphere: center point and non-negative radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: DVec3,
    pub radius: f64,
}

impl Sphere {
    pub fn new(center: DVec3, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Whether a point lies inside (or on the boundary of) the sphere.
    pub fn contains(&self, p: DVec3) -> bool {
        self.center.distance(p) <= self.radius + 1e-9
    }

    /// Smallest sphere containing both inputs.
    ///
    /// If one sphere already contains the other it is returned unchanged;
    /// otherwise the result is centered on the segment between the two
    /// centers with radius half the total span.
    fn merged(&self, other: &Sphere) -> Sphere {
        let d = self.center.distance(other.center);
        if d + other.radius <= self.radius {
            return *self;
        }
        if d + self.radius <= other.radius {
            return *other;
        }
        let radius = (d + self.radius + other.radius) * 0.5;
        let center = self.center + (other.center - self.center) * ((radius - self.radius) / d);
        Sphere { center, radius }
    }
}

/// Tagged union of the three bounding-volume shapes.
///
/// The kind set is closed; merge dispatch is an exhaustive match rather than
/// open-ended polymorphism.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundingVolume {
    Box(OrientedBox),
    Region(Region),
    Sphere(Sphere),
}

impl BoundingVolume {
    pub fn kind(&self) -> VolumeKind {
        match self {
            BoundingVolume::Box(_) => VolumeKind::Box,
            BoundingVolume::Region(_) => VolumeKind::Region,
            BoundingVolume::Sphere(_) => VolumeKind::Sphere,
        }
    }

    /// The smallest volume of `self`'s kind containing both inputs.
    ///
    /// Merging volumes of different kinds is a data-integrity error and
    /// always fails with [`VolumeError::KindMismatch`].
    pub fn merge(&self, other: &BoundingVolume) -> Result<BoundingVolume, VolumeError> {
        match (self, other) {
            (BoundingVolume::Box(a), BoundingVolume::Box(b)) => {
                Ok(BoundingVolume::Box(a.merged(b)))
            }
            (BoundingVolume::Region(a), BoundingVolume::Region(b)) => {
                Ok(BoundingVolume::Region(a.merged(b)))
            }
            (BoundingVolume::Sphere(a), BoundingVolume::Sphere(b)) => {
                Ok(BoundingVolume::Sphere(a.merged(b)))
            }
            (a, b) => Err(VolumeError::KindMismatch {
                left: a.kind(),
                right: b.kind(),
            }),
        }
    }

    /// Merge of optional volumes: a `None` operand is the identity.
    ///
    /// Used when combining a running aggregate with a newly discovered child
    /// volume.
    pub fn merge_opt(
        a: Option<&BoundingVolume>,
        b: Option<&BoundingVolume>,
    ) -> Result<Option<BoundingVolume>, VolumeError> {
        match (a, b) {
            (None, None) => Ok(None),
            (Some(a), None) => Ok(Some(*a)),
            (None, Some(b)) => Ok(Some(*b)),
            (Some(a), Some(b)) => a.merge(b).map(Some),
        }
    }
}
