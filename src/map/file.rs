//! JSON map files.
//!
//! ```json
//! {
//!   "representation": "tsdf",
//!   "voxel_size": 0.1,
//!   "voxels_per_side": 2,
//!   "blocks": [
//!     { "index": [0, 0, 0], "voxels": [{ "distance": 0.1, "weight": 1.0 }, ...] }
//!   ]
//! }
//! ```

use super::{Block, Layer, OccupancyMap, TsdfMap, VolumetricMap};
use crate::error::Result;
use crate::types::BlockIndex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Serialize, Deserialize)]
#[serde(tag = "representation", rename_all = "lowercase")]
enum MapFile<T, O> {
    Tsdf(LayerFile<T>),
    Occupancy(LayerFile<O>),
}

#[derive(Serialize, Deserialize)]
struct LayerFile<V> {
    voxel_size: f32,
    voxels_per_side: usize,
    blocks: Vec<BlockFile<V>>,
}

#[derive(Serialize, Deserialize)]
struct BlockFile<V> {
    index: BlockIndex,
    voxels: Vec<V>,
}

type OwnedMapFile = MapFile<super::TsdfVoxel, super::OccupancyVoxel>;

impl<V> LayerFile<V> {
    fn into_layer(self) -> Result<Layer<V>> {
        let mut layer = Layer::new(self.voxel_size, self.voxels_per_side)?;
        for block in self.blocks {
            layer.insert_block(Block::from_voxels(
                block.index,
                self.voxels_per_side,
                self.voxel_size,
                block.voxels,
            )?)?;
        }
        Ok(layer)
    }
}

impl<V: Clone> LayerFile<V> {
    fn from_layer(layer: &Layer<V>) -> Self {
        Self {
            voxel_size: layer.voxel_size(),
            voxels_per_side: layer.voxels_per_side(),
            blocks: layer
                .blocks()
                .map(|b| BlockFile {
                    index: b.index(),
                    voxels: b.voxels().to_vec(),
                })
                .collect(),
        }
    }
}

/// Parse a map from JSON text.
pub fn map_from_json(json: &str) -> Result<VolumetricMap> {
    let file: OwnedMapFile = serde_json::from_str(json)?;
    Ok(match file {
        MapFile::Tsdf(layer) => VolumetricMap::Tsdf(TsdfMap::from_layer(layer.into_layer()?)),
        MapFile::Occupancy(layer) => {
            VolumetricMap::Occupancy(OccupancyMap::from_layer(layer.into_layer()?))
        }
    })
}

/// Serialize a map to JSON text.
pub fn map_to_json(map: &VolumetricMap) -> Result<String> {
    let file: OwnedMapFile = match map {
        VolumetricMap::Tsdf(m) => MapFile::Tsdf(LayerFile::from_layer(m.layer())),
        VolumetricMap::Occupancy(m) => MapFile::Occupancy(LayerFile::from_layer(m.layer())),
    };
    Ok(serde_json::to_string(&file)?)
}

/// Load a map from a JSON file.
pub fn load_map_file<P: AsRef<Path>>(path: P) -> Result<VolumetricMap> {
    let contents = std::fs::read_to_string(path)?;
    map_from_json(&contents)
}

/// Write a map to a JSON file.
pub fn save_map_file<P: AsRef<Path>>(path: P, map: &VolumetricMap) -> Result<()> {
    std::fs::write(path, map_to_json(map)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;
    use crate::map::{DistanceField, TsdfMapConfig};
    use crate::map::MapRepresentation;

    #[test]
    fn test_parse_tsdf_map() {
        let json = r#"{
            "representation": "tsdf",
            "voxel_size": 0.5,
            "voxels_per_side": 1,
            "blocks": [
                { "index": [0, 0, 0], "voxels": [{ "distance": -0.2, "weight": 2.0 }] },
                { "index": [1, 0, 0], "voxels": [{ "distance": 0.4 }] }
            ]
        }"#;
        let map = map_from_json(json).unwrap();
        assert_eq!(map.num_allocated_blocks(), 2);
        match map.representation() {
            MapRepresentation::DistanceField(field) => {
                let s = field.sample_at(BlockIndex::new(1, 0, 0), 0).unwrap();
                assert_eq!(s.distance, 0.4);
                assert_eq!(s.position.x, 0.75);
            }
            MapRepresentation::Occupancy(_) => panic!("expected distance field"),
        }
    }

    #[test]
    fn test_parse_occupancy_map() {
        let json = r#"{
            "representation": "occupancy",
            "voxel_size": 0.5,
            "voxels_per_side": 1,
            "blocks": [{ "index": [0, 0, 0], "voxels": [{ "log_odds": 1.0 }] }]
        }"#;
        let map = map_from_json(json).unwrap();
        assert!(matches!(map, VolumetricMap::Occupancy(_)));
        assert_eq!(map.representation().name(), "occupancy");
    }

    #[test]
    fn test_rejects_short_block() {
        let json = r#"{
            "representation": "tsdf",
            "voxel_size": 0.5,
            "voxels_per_side": 2,
            "blocks": [{ "index": [0, 0, 0], "voxels": [{ "distance": 0.0 }] }]
        }"#;
        assert!(matches!(map_from_json(json), Err(ExportError::InvalidMap(_))));
    }

    #[test]
    fn test_rejects_overflowing_block_resolution() {
        let json = r#"{"representation":"tsdf","voxel_size":0.5,"voxels_per_side":4294967296,"blocks":[]}"#;
        assert!(matches!(map_from_json(json), Err(ExportError::InvalidMap(_))));

        // (2^22)^3 wraps to zero in 64 bits, so an empty block must not pass
        let json = r#"{
            "representation": "occupancy",
            "voxel_size": 0.5,
            "voxels_per_side": 4194304,
            "blocks": [{ "index": [0, 0, 0], "voxels": [] }]
        }"#;
        assert!(matches!(map_from_json(json), Err(ExportError::InvalidMap(_))));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.json");

        let config = TsdfMapConfig {
            voxel_size: 0.5,
            voxels_per_side: 2,
        };
        let mut tsdf = TsdfMap::new(config).unwrap();
        tsdf.fill_block(BlockIndex::new(0, -1, 0), 1.0, |p| p.y);
        let map = VolumetricMap::Tsdf(tsdf.clone());

        save_map_file(&path, &map).unwrap();
        match load_map_file(&path).unwrap() {
            VolumetricMap::Tsdf(loaded) => assert_eq!(loaded, tsdf),
            VolumetricMap::Occupancy(_) => panic!("expected tsdf map"),
        }
    }
}
