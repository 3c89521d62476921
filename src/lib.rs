//! # SDF PLY
//!
//! Export volumetric signed distance field maps as PLY point clouds, with
//! each voxel colored by its distance.
//!
//! ## Overview
//!
//! A map is a sparse set of fixed-size voxel blocks. Exporting walks every
//! allocated voxel (observed or not), maps its signed distance to a color
//! (red inside, blue outside, saturating at a configurable distance) and
//! streams the points into a PLY file whose header declares the exact
//! vertex count.
//!
//! ## Quick Start
//!
//! ```ignore
//! use sdf_ply::{export_map, ExportConfig, ExportMode, TsdfMap, TsdfMapConfig};
//! use glam::Vec3;
//!
//! let map = TsdfMap::sphere(TsdfMapConfig::default(), Vec3::ZERO, 1.0, 0.3)?;
//! let summary = export_map(
//!     (&map).into(),
//!     "sphere.ply",
//!     ExportMode::DistanceColor,
//!     &ExportConfig::default(),
//! )?;
//! println!("wrote {} points", summary.vertex_count);
//! ```
//!
//! ## Custom Maps and Sinks
//!
//! Any storage can be exported by implementing [`DistanceField`] and
//! wrapping it in [`MapRepresentation::DistanceField`]. Any output can be
//! targeted by implementing [`VertexSink`] and calling [`export_to_sink`].

pub mod error;
pub mod types;
pub mod map;
pub mod ply;
pub mod export;

// Re-export main types for convenience
pub use error::{ErrorKind, ExportError, Result};
pub use types::{BlockIndex, BoundingBox, Color, SdfSample};
pub use map::{
    Block, DistanceField, Layer, MapRepresentation, OccupancyMap, OccupancyVoxel, TsdfMap,
    TsdfMapConfig, TsdfVoxel, VolumetricMap,
};
pub use ply::{read_ply, read_ply_file, PlyCloud, PlyFormat, PlyPoint, PlyWriter, VertexSink};
pub use export::{
    distance_to_color, export_map, export_map_bytes, export_to_sink, ExportConfig, ExportMode,
    ExportSummary, VoxelEnumerator, DEFAULT_MAX_DISTANCE,
};

/// Load a map from a JSON file.
pub fn load_map<P: AsRef<std::path::Path>>(path: P) -> Result<VolumetricMap> {
    map::load_map_file(path)
}

/// Save a map to a JSON file.
pub fn save_map<P: AsRef<std::path::Path>>(path: P, map: &VolumetricMap) -> Result<()> {
    map::save_map_file(path, map)
}
