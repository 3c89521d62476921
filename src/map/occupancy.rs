//! Occupancy map.
//!
//! Stores occupancy log-odds per voxel. It carries no signed distance, so it
//! has no point-cloud export handler.

use super::{Layer, OccupancyVoxel};
use crate::error::Result;
use crate::types::BlockIndex;
use glam::Vec3;

/// A map of occupancy voxels.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyMap {
    layer: Layer<OccupancyVoxel>,
}

impl OccupancyMap {
    pub fn new(voxel_size: f32, voxels_per_side: usize) -> Result<Self> {
        Ok(Self {
            layer: Layer::new(voxel_size, voxels_per_side)?,
        })
    }

    pub fn from_layer(layer: Layer<OccupancyVoxel>) -> Self {
        Self { layer }
    }

    pub fn layer(&self) -> &Layer<OccupancyVoxel> {
        &self.layer
    }

    pub fn layer_mut(&mut self) -> &mut Layer<OccupancyVoxel> {
        &mut self.layer
    }

    /// Add a log-odds observation to the voxel containing `point`.
    pub fn observe(&mut self, point: Vec3, log_odds_delta: f32) {
        let voxel = self.layer.voxel_at_point_mut(point);
        voxel.log_odds += log_odds_delta;
        voxel.observed = true;
    }

    pub fn is_allocated(&self, index: BlockIndex) -> bool {
        self.layer.block(index).is_some()
    }
}
