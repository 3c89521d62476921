//! Shared types used throughout the library.

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

/// RGB color with one byte per channel.
pub type Color = [u8; 3];

/// Integer index of a block in the map's block grid.
///
/// Ordering is lexicographic on `(x, y, z)`, which is the order the bundled
/// map store enumerates blocks in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[i32; 3]", into = "[i32; 3]")]
pub struct BlockIndex {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockIndex {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn as_ivec3(&self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }

    /// Get the block containing a world-space point.
    pub fn containing(point: Vec3, block_size: f32) -> Self {
        let scaled = (point / block_size).floor();
        Self::new(scaled.x as i32, scaled.y as i32, scaled.z as i32)
    }
}

impl From<[i32; 3]> for BlockIndex {
    fn from(v: [i32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<BlockIndex> for [i32; 3] {
    fn from(idx: BlockIndex) -> Self {
        [idx.x, idx.y, idx.z]
    }
}

/// One voxel as seen by the exporter: its center and signed distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SdfSample {
    pub position: Vec3,
    pub distance: f32,
}

impl SdfSample {
    pub fn new(position: Vec3, distance: f32) -> Self {
        Self { position, distance }
    }
}

/// Axis-aligned box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// Smallest box holding every point, or `None` if there are none.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        points.into_iter().fold(None, |bounds, p| match bounds {
            Some(b) => Some(b.including(p)),
            None => Some(Self { min: p, max: p }),
        })
    }

    /// Grow the box to include `point`.
    pub fn including(self, point: Vec3) -> Self {
        Self {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }
}
