//! Fixed-size voxel blocks.

use crate::error::{ExportError, Result};
use crate::types::BlockIndex;
use glam::{UVec3, Vec3};
use serde::{Deserialize, Serialize};

/// A truncated signed distance voxel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TsdfVoxel {
    /// Signed distance to the nearest surface (negative inside).
    pub distance: f32,
    /// Accumulated observation weight. Zero means never observed.
    #[serde(default)]
    pub weight: f32,
}

impl TsdfVoxel {
    pub fn new(distance: f32, weight: f32) -> Self {
        Self { distance, weight }
    }
}

/// An occupancy voxel storing log-odds of being occupied.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OccupancyVoxel {
    pub log_odds: f32,
    #[serde(default)]
    pub observed: bool,
}

/// A cube of `voxels_per_side^3` voxels.
///
/// Voxels are stored by linear index `x + y * n + z * n * n`.
#[derive(Debug, Clone, PartialEq)]
pub struct Block<V> {
    index: BlockIndex,
    voxels_per_side: usize,
    voxel_size: f32,
    voxels: Vec<V>,
}

/// Number of voxels in a block with `voxels_per_side` voxels per edge, or
/// `None` if the count does not fit in `usize`.
pub fn voxels_in_block(voxels_per_side: usize) -> Option<usize> {
    voxels_per_side
        .checked_mul(voxels_per_side)?
        .checked_mul(voxels_per_side)
}

impl<V: Default + Clone> Block<V> {
    /// Create a block with every voxel set to its default.
    ///
    /// `voxels_per_side` must already be validated, as [`Layer::new`] does.
    ///
    /// [`Layer::new`]: super::Layer::new
    pub(crate) fn new(index: BlockIndex, voxels_per_side: usize, voxel_size: f32) -> Self {
        let count = voxels_per_side.pow(3);
        Self {
            index,
            voxels_per_side,
            voxel_size,
            voxels: vec![V::default(); count],
        }
    }
}

impl<V> Block<V> {
    /// Build a block from existing voxel data.
    pub fn from_voxels(
        index: BlockIndex,
        voxels_per_side: usize,
        voxel_size: f32,
        voxels: Vec<V>,
    ) -> Result<Self> {
        let expected = voxels_in_block(voxels_per_side).ok_or_else(|| {
            ExportError::InvalidMap(format!(
                "{} voxels per side overflows the block size",
                voxels_per_side
            ))
        })?;
        if voxels.len() != expected {
            return Err(ExportError::InvalidMap(format!(
                "block {:?} has {} voxels, expected {}",
                index,
                voxels.len(),
                expected
            )));
        }
        Ok(Self {
            index,
            voxels_per_side,
            voxel_size,
            voxels,
        })
    }

    pub fn index(&self) -> BlockIndex {
        self.index
    }

    pub fn voxels_per_side(&self) -> usize {
        self.voxels_per_side
    }

    pub fn voxel_size(&self) -> f32 {
        self.voxel_size
    }

    pub fn num_voxels(&self) -> usize {
        self.voxels.len()
    }

    pub fn voxels(&self) -> &[V] {
        &self.voxels
    }

    /// Edge length of the block in world units.
    pub fn block_size(&self) -> f32 {
        self.voxel_size * self.voxels_per_side as f32
    }

    /// World position of the block's minimum corner.
    pub fn origin(&self) -> Vec3 {
        self.index.as_ivec3().as_vec3() * self.block_size()
    }

    pub fn voxels_mut(&mut self) -> &mut [V] {
        &mut self.voxels
    }

    pub fn voxel_by_linear_index(&self, linear_index: usize) -> Option<&V> {
        self.voxels.get(linear_index)
    }

    pub fn voxel_by_linear_index_mut(&mut self, linear_index: usize) -> Option<&mut V> {
        self.voxels.get_mut(linear_index)
    }

    /// Split a linear index into per-axis voxel coordinates.
    pub fn voxel_index_from_linear(&self, linear_index: usize) -> UVec3 {
        let n = self.voxels_per_side;
        UVec3::new(
            (linear_index % n) as u32,
            ((linear_index / n) % n) as u32,
            (linear_index / (n * n)) as u32,
        )
    }

    pub fn linear_index(&self, voxel: UVec3) -> usize {
        let n = self.voxels_per_side;
        voxel.x as usize + voxel.y as usize * n + voxel.z as usize * n * n
    }

    /// World position of a voxel center.
    pub fn coordinates_of_voxel(&self, linear_index: usize) -> Vec3 {
        let voxel = self.voxel_index_from_linear(linear_index).as_vec3();
        self.origin() + (voxel + Vec3::splat(0.5)) * self.voxel_size
    }

    /// Iterate voxel centers paired with mutable voxels.
    pub fn iter_voxels_mut(&mut self) -> impl Iterator<Item = (Vec3, &mut V)> + '_ {
        let origin = self.origin();
        let n = self.voxels_per_side;
        let voxel_size = self.voxel_size;
        self.voxels.iter_mut().enumerate().map(move |(i, v)| {
            let voxel = Vec3::new((i % n) as f32, ((i / n) % n) as f32, (i / (n * n)) as f32);
            (origin + (voxel + Vec3::splat(0.5)) * voxel_size, v)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_index_round_trip() {
        let block: Block<TsdfVoxel> = Block::new(BlockIndex::new(0, 0, 0), 4, 0.1);
        assert_eq!(block.num_voxels(), 64);
        let v = block.voxel_index_from_linear(27);
        assert_eq!(v, UVec3::new(3, 2, 1));
        assert_eq!(block.linear_index(v), 27);
    }

    #[test]
    fn test_voxel_coordinates() {
        let block: Block<TsdfVoxel> = Block::new(BlockIndex::new(1, -1, 0), 2, 0.5);
        assert_eq!(block.origin(), Vec3::new(1.0, -1.0, 0.0));
        assert_eq!(block.coordinates_of_voxel(0), Vec3::new(1.25, -0.75, 0.25));
        assert_eq!(block.coordinates_of_voxel(7), Vec3::new(1.75, -0.25, 0.75));
    }

    #[test]
    fn test_iter_voxels_mut_matches_coordinates() {
        let mut block: Block<TsdfVoxel> = Block::new(BlockIndex::new(0, 2, 0), 3, 0.2);
        let positions: Vec<Vec3> = block.iter_voxels_mut().map(|(p, _)| p).collect();
        for (i, p) in positions.iter().enumerate() {
            assert_eq!(*p, block.coordinates_of_voxel(i));
        }
    }

    #[test]
    fn test_from_voxels_rejects_wrong_length() {
        let result = Block::from_voxels(BlockIndex::new(0, 0, 0), 2, 0.1, vec![TsdfVoxel::default(); 7]);
        assert!(matches!(result, Err(ExportError::InvalidMap(_))));
    }

    #[test]
    fn test_from_voxels_rejects_overflowing_side() {
        let result: Result<Block<TsdfVoxel>> =
            Block::from_voxels(BlockIndex::new(0, 0, 0), 1 << 22, 0.1, Vec::new());
        assert!(matches!(result, Err(ExportError::InvalidMap(_))));
        assert_eq!(voxels_in_block(1 << 22), None);
        assert_eq!(voxels_in_block(16), Some(4096));
    }
}
