//! Truncated signed distance field map.

use super::{Block, DistanceField, Layer, TsdfVoxel};
use crate::error::Result;
use crate::types::{BlockIndex, SdfSample};
use glam::Vec3;

/// Resolution settings for a [`TsdfMap`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TsdfMapConfig {
    /// Voxel edge length in world units.
    pub voxel_size: f32,
    /// Voxels along each block edge.
    pub voxels_per_side: usize,
}

impl Default for TsdfMapConfig {
    fn default() -> Self {
        Self {
            voxel_size: 0.2,
            voxels_per_side: 16,
        }
    }
}

/// A map of TSDF voxels.
#[derive(Debug, Clone, PartialEq)]
pub struct TsdfMap {
    layer: Layer<TsdfVoxel>,
}

impl TsdfMap {
    pub fn new(config: TsdfMapConfig) -> Result<Self> {
        Ok(Self {
            layer: Layer::new(config.voxel_size, config.voxels_per_side)?,
        })
    }

    pub fn from_layer(layer: Layer<TsdfVoxel>) -> Self {
        Self { layer }
    }

    pub fn layer(&self) -> &Layer<TsdfVoxel> {
        &self.layer
    }

    pub fn layer_mut(&mut self) -> &mut Layer<TsdfVoxel> {
        &mut self.layer
    }

    pub fn config(&self) -> TsdfMapConfig {
        TsdfMapConfig {
            voxel_size: self.layer.voxel_size(),
            voxels_per_side: self.layer.voxels_per_side(),
        }
    }

    pub fn allocate_block(&mut self, index: BlockIndex) -> &mut Block<TsdfVoxel> {
        self.layer.allocate_block(index)
    }

    /// Allocate a block and set every voxel from an analytic distance function.
    ///
    /// Distances are clamped to `[-truncation, truncation]` and each voxel
    /// gets unit weight.
    pub fn fill_block<F>(&mut self, index: BlockIndex, truncation: f32, sdf: F)
    where
        F: Fn(Vec3) -> f32,
    {
        let block = self.layer.allocate_block(index);
        for (center, voxel) in block.iter_voxels_mut() {
            voxel.distance = sdf(center).clamp(-truncation, truncation);
            voxel.weight = 1.0;
        }
    }

    /// Build a map of a sphere, allocating every block that intersects the
    /// truncation band around its surface.
    pub fn sphere(config: TsdfMapConfig, center: Vec3, radius: f32, truncation: f32) -> Result<Self> {
        let mut map = Self::new(config)?;
        let block_size = map.layer.block_size();
        let reach = Vec3::splat(radius + truncation);
        let min = BlockIndex::containing(center - reach, block_size);
        let max = BlockIndex::containing(center + reach, block_size);
        let half_diagonal = block_size * 3f32.sqrt() * 0.5;

        for z in min.z..=max.z {
            for y in min.y..=max.y {
                for x in min.x..=max.x {
                    let index = BlockIndex::new(x, y, z);
                    let block_center = (index.as_ivec3().as_vec3() + Vec3::splat(0.5)) * block_size;
                    let surface_distance = (block_center.distance(center) - radius).abs();
                    if surface_distance <= truncation + half_diagonal {
                        map.fill_block(index, truncation, |p| p.distance(center) - radius);
                    }
                }
            }
        }
        Ok(map)
    }
}

impl DistanceField for TsdfMap {
    fn num_allocated_blocks(&self) -> usize {
        self.layer.num_allocated_blocks()
    }

    fn voxels_per_block(&self) -> usize {
        self.layer.voxels_per_block()
    }

    fn allocated_blocks(&self) -> Vec<BlockIndex> {
        self.layer.allocated_blocks()
    }

    fn sample_at(&self, block: BlockIndex, linear_index: usize) -> Option<SdfSample> {
        let block = self.layer.block(block)?;
        let voxel = block.voxel_by_linear_index(linear_index)?;
        Some(SdfSample::new(
            block.coordinates_of_voxel(linear_index),
            voxel.distance,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> TsdfMapConfig {
        TsdfMapConfig {
            voxel_size: 0.25,
            voxels_per_side: 4,
        }
    }

    #[test]
    fn test_sample_at() {
        let mut map = TsdfMap::new(small_config()).unwrap();
        let block = map.allocate_block(BlockIndex::new(0, 0, 0));
        block.voxel_by_linear_index_mut(5).unwrap().distance = -0.3;

        let sample = map.sample_at(BlockIndex::new(0, 0, 0), 5).unwrap();
        assert_eq!(sample.distance, -0.3);
        assert_eq!(sample.position, Vec3::new(0.375, 0.375, 0.125));

        assert!(map.sample_at(BlockIndex::new(0, 0, 0), 64).is_none());
        assert!(map.sample_at(BlockIndex::new(1, 0, 0), 0).is_none());
    }

    #[test]
    fn test_zero_weight_voxels_are_still_samples() {
        let mut map = TsdfMap::new(small_config()).unwrap();
        map.allocate_block(BlockIndex::new(2, 2, 2));
        assert_eq!(map.num_allocated_blocks(), 1);
        assert_eq!(map.voxels_per_block(), 64);
        let sample = map.sample_at(BlockIndex::new(2, 2, 2), 0).unwrap();
        assert_eq!(sample.distance, 0.0);
    }

    #[test]
    fn test_fill_block_clamps_to_truncation() {
        let mut map = TsdfMap::new(small_config()).unwrap();
        map.fill_block(BlockIndex::new(0, 0, 0), 0.1, |p| p.x - 0.5);
        let block = map.layer().block(BlockIndex::new(0, 0, 0)).unwrap();
        for voxel in block.voxels() {
            assert!(voxel.distance.abs() <= 0.1);
            assert_eq!(voxel.weight, 1.0);
        }
    }

    #[test]
    fn test_sphere_allocates_surface_blocks() {
        let map = TsdfMap::sphere(small_config(), Vec3::ZERO, 1.0, 0.3).unwrap();
        assert!(map.num_allocated_blocks() > 0);
        // the block straddling the surface on +x must be present
        assert!(map.layer().block(BlockIndex::new(0, 0, 0)).is_some());
        let inside = map.sample_at(BlockIndex::new(0, 0, 0), 0).unwrap();
        assert!(inside.distance < 0.0);
    }
}
