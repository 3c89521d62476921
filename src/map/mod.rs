//! Block-hashed volumetric maps.
//!
//! Maps are stored as a sparse set of fixed-size blocks. The exporter only
//! reads them through the [`DistanceField`] trait, and selects a handler by
//! matching on [`MapRepresentation`].

pub mod block;
pub mod file;
pub mod occupancy;
pub mod tsdf;

pub use block::{voxels_in_block, Block, OccupancyVoxel, TsdfVoxel};
pub use file::{load_map_file, save_map_file};
pub use occupancy::OccupancyMap;
pub use tsdf::{TsdfMap, TsdfMapConfig};

use crate::error::{ExportError, Result};
use crate::types::{BlockIndex, BoundingBox, SdfSample};
use glam::Vec3;
use std::collections::BTreeMap;

/// Read-only query interface over a map that stores signed distance.
pub trait DistanceField {
    /// Number of blocks currently allocated.
    fn num_allocated_blocks(&self) -> usize;

    /// Number of voxels in every block.
    fn voxels_per_block(&self) -> usize;

    /// Indices of all allocated blocks, in the map's enumeration order.
    fn allocated_blocks(&self) -> Vec<BlockIndex>;

    /// Get a voxel's center and distance, or `None` if the block is not
    /// allocated or the index is out of range.
    fn sample_at(&self, block: BlockIndex, linear_index: usize) -> Option<SdfSample>;
}

/// A borrowed map tagged with its representation.
#[derive(Clone, Copy)]
pub enum MapRepresentation<'a> {
    /// Per-voxel signed distance (TSDF and friends).
    DistanceField(&'a dyn DistanceField),
    /// Per-voxel occupancy log-odds.
    Occupancy(&'a OccupancyMap),
}

impl<'a> MapRepresentation<'a> {
    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            MapRepresentation::DistanceField(_) => "distance-field",
            MapRepresentation::Occupancy(_) => "occupancy",
        }
    }
}

impl<'a> From<&'a TsdfMap> for MapRepresentation<'a> {
    fn from(map: &'a TsdfMap) -> Self {
        MapRepresentation::DistanceField(map)
    }
}

impl<'a> From<&'a OccupancyMap> for MapRepresentation<'a> {
    fn from(map: &'a OccupancyMap) -> Self {
        MapRepresentation::Occupancy(map)
    }
}

/// An owned map of any supported storage type.
#[derive(Debug, Clone)]
pub enum VolumetricMap {
    Tsdf(TsdfMap),
    Occupancy(OccupancyMap),
}

impl VolumetricMap {
    pub fn representation(&self) -> MapRepresentation<'_> {
        match self {
            VolumetricMap::Tsdf(map) => map.into(),
            VolumetricMap::Occupancy(map) => map.into(),
        }
    }

    pub fn voxel_size(&self) -> f32 {
        match self {
            VolumetricMap::Tsdf(map) => map.layer().voxel_size(),
            VolumetricMap::Occupancy(map) => map.layer().voxel_size(),
        }
    }

    pub fn voxels_per_side(&self) -> usize {
        match self {
            VolumetricMap::Tsdf(map) => map.layer().voxels_per_side(),
            VolumetricMap::Occupancy(map) => map.layer().voxels_per_side(),
        }
    }

    pub fn num_allocated_blocks(&self) -> usize {
        match self {
            VolumetricMap::Tsdf(map) => map.layer().num_allocated_blocks(),
            VolumetricMap::Occupancy(map) => map.layer().num_allocated_blocks(),
        }
    }

    pub fn total_voxels(&self) -> usize {
        match self {
            VolumetricMap::Tsdf(map) => map.layer().total_voxels(),
            VolumetricMap::Occupancy(map) => map.layer().total_voxels(),
        }
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        match self {
            VolumetricMap::Tsdf(map) => map.layer().bounds(),
            VolumetricMap::Occupancy(map) => map.layer().bounds(),
        }
    }
}

/// Sparse grid of blocks sharing one voxel size and block resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer<V> {
    voxel_size: f32,
    voxels_per_side: usize,
    voxels_per_block: usize,
    blocks: BTreeMap<BlockIndex, Block<V>>,
}

impl<V> Layer<V> {
    /// Create an empty layer.
    ///
    /// `voxel_size` must be positive and finite, and `voxels_per_side`
    /// nonzero with `voxels_per_side^3` representable as `usize`.
    pub fn new(voxel_size: f32, voxels_per_side: usize) -> Result<Self> {
        if !(voxel_size.is_finite() && voxel_size > 0.0) {
            return Err(ExportError::InvalidMap(format!(
                "voxel size must be positive, got {}",
                voxel_size
            )));
        }
        if voxels_per_side == 0 {
            return Err(ExportError::InvalidMap(
                "voxels per side must be nonzero".to_string(),
            ));
        }
        let voxels_per_block = voxels_in_block(voxels_per_side).ok_or_else(|| {
            ExportError::InvalidMap(format!(
                "{} voxels per side overflows the block size",
                voxels_per_side
            ))
        })?;
        Ok(Self {
            voxel_size,
            voxels_per_side,
            voxels_per_block,
            blocks: BTreeMap::new(),
        })
    }

    pub fn voxel_size(&self) -> f32 {
        self.voxel_size
    }

    pub fn voxels_per_side(&self) -> usize {
        self.voxels_per_side
    }

    pub fn voxels_per_block(&self) -> usize {
        self.voxels_per_block
    }

    pub fn block_size(&self) -> f32 {
        self.voxel_size * self.voxels_per_side as f32
    }

    pub fn num_allocated_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn total_voxels(&self) -> usize {
        self.num_allocated_blocks() * self.voxels_per_block()
    }

    /// Indices of all allocated blocks in ascending order.
    pub fn allocated_blocks(&self) -> Vec<BlockIndex> {
        self.blocks.keys().copied().collect()
    }

    pub fn block(&self, index: BlockIndex) -> Option<&Block<V>> {
        self.blocks.get(&index)
    }

    pub fn block_mut(&mut self, index: BlockIndex) -> Option<&mut Block<V>> {
        self.blocks.get_mut(&index)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block<V>> {
        self.blocks.values()
    }

    /// Insert a prebuilt block, replacing any block at the same index.
    pub fn insert_block(&mut self, block: Block<V>) -> Result<()> {
        if block.voxels_per_side() != self.voxels_per_side || block.voxel_size() != self.voxel_size {
            return Err(ExportError::InvalidMap(format!(
                "block {:?} resolution does not match layer",
                block.index()
            )));
        }
        self.blocks.insert(block.index(), block);
        Ok(())
    }

    pub fn remove_block(&mut self, index: BlockIndex) -> Option<Block<V>> {
        self.blocks.remove(&index)
    }

    /// Box covering every allocated block, or `None` for an empty layer.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let size = Vec3::splat(self.block_size());
        BoundingBox::from_points(self.blocks.values().flat_map(|block| {
            let origin = block.origin();
            [origin, origin + size]
        }))
    }

    /// Get the index of the block containing a world-space point.
    pub fn block_index_for_point(&self, point: Vec3) -> BlockIndex {
        BlockIndex::containing(point, self.block_size())
    }
}

impl<V: Default + Clone> Layer<V> {
    /// Get a block, allocating it with default voxels if needed.
    pub fn allocate_block(&mut self, index: BlockIndex) -> &mut Block<V> {
        let voxels_per_side = self.voxels_per_side;
        let voxel_size = self.voxel_size;
        self.blocks
            .entry(index)
            .or_insert_with(|| Block::new(index, voxels_per_side, voxel_size))
    }

    /// Get the voxel containing a world-space point, allocating its block.
    pub fn voxel_at_point_mut(&mut self, point: Vec3) -> &mut V {
        let index = self.block_index_for_point(point);
        let voxel_size = self.voxel_size;
        let n = self.voxels_per_side as u32;
        let block = self.allocate_block(index);
        let local = ((point - block.origin()) / voxel_size)
            .floor()
            .as_uvec3()
            .min(glam::UVec3::splat(n - 1));
        let linear = block.linear_index(local);
        // linear < n^3 after the clamp above
        &mut block.voxels_mut()[linear]
    }
}
