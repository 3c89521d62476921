//! Map export.
//!
//! Streams every allocated voxel of a distance field into a PLY point cloud,
//! colored by signed distance. All preconditions are checked before the
//! output is opened, and the output is closed on every exit path once it
//! has been opened.

pub mod color;
pub mod enumerator;

pub use color::{distance_to_color, DEFAULT_MAX_DISTANCE};
pub use enumerator::VoxelEnumerator;

use crate::error::{ExportError, Result};
use crate::map::{DistanceField, MapRepresentation};
use crate::ply::{PlyFormat, PlyWriter, VertexSink};
use log::{debug, info, log, Level};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

/// What to export from a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// Every allocated voxel as a point colored by its distance.
    DistanceColor,
    /// The zero-level isosurface. Not implemented.
    Isosurface,
}

/// Export configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportConfig {
    /// Distance at which color saturates.
    pub max_distance: f32,
    /// PLY body encoding.
    pub format: PlyFormat,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
            format: PlyFormat::Ascii,
        }
    }
}

impl ExportConfig {
    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_format(mut self, format: PlyFormat) -> Self {
        self.format = format;
        self
    }

    /// Check that the saturation distance is usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.max_distance.is_finite() && self.max_distance > 0.0) {
            return Err(ExportError::InvalidConfig(format!(
                "max distance must be positive and finite, got {}",
                self.max_distance
            )));
        }
        Ok(())
    }
}

/// Outcome of a successful export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    /// Vertices declared in the header and written to the body.
    pub vertex_count: usize,
    /// Blocks enumerated.
    pub block_count: usize,
    /// Destination file, if the export went to disk.
    pub path: Option<PathBuf>,
}

/// Closes the wrapped sink when dropped unless already closed.
struct SinkGuard<'s, S: VertexSink + ?Sized> {
    sink: &'s mut S,
    closed: bool,
}

impl<'s, S: VertexSink + ?Sized> SinkGuard<'s, S> {
    fn new(sink: &'s mut S) -> Self {
        Self {
            sink,
            closed: false,
        }
    }

    fn close(mut self) -> Result<()> {
        self.closed = true;
        self.sink.close()
    }
}

impl<S: VertexSink + ?Sized> Deref for SinkGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        &*self.sink
    }
}

impl<S: VertexSink + ?Sized> DerefMut for SinkGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut *self.sink
    }
}

impl<S: VertexSink + ?Sized> Drop for SinkGuard<'_, S> {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.sink.close() {
                log!(
                    aborted_close_level(&e),
                    "closing sink after aborted export: {}",
                    e
                );
            }
        }
    }
}

/// A short body is the expected result of closing mid-export, so only other
/// close failures are worth a warning.
fn aborted_close_level(err: &ExportError) -> Level {
    match err {
        ExportError::Integrity(_) => Level::Debug,
        _ => Level::Warn,
    }
}

fn supported_field(map: MapRepresentation<'_>) -> Result<&dyn DistanceField> {
    match map {
        MapRepresentation::DistanceField(field) => Ok(field),
        MapRepresentation::Occupancy(_) => {
            Err(ExportError::UnsupportedRepresentation(map.name().to_string()))
        }
    }
}

fn check_mode(mode: ExportMode) -> Result<()> {
    match mode {
        ExportMode::DistanceColor => Ok(()),
        ExportMode::Isosurface => Err(ExportError::UnsupportedMode(mode)),
    }
}

/// Validate everything that can be checked without touching the output.
fn prepare<'a>(
    map: MapRepresentation<'a>,
    mode: ExportMode,
    config: &ExportConfig,
) -> Result<VoxelEnumerator<'a>> {
    debug!("export: validating {} representation", map.name());
    let field = supported_field(map)?;
    debug!("export: validating mode {:?}", mode);
    check_mode(mode)?;
    config.validate()?;
    let enumerator = VoxelEnumerator::new(field)?;
    debug!(
        "export: {} blocks, {} vertices",
        enumerator.num_blocks(),
        enumerator.total()
    );
    Ok(enumerator)
}

fn stream<S: VertexSink + ?Sized>(
    enumerator: VoxelEnumerator<'_>,
    sink: &mut S,
    config: &ExportConfig,
) -> Result<ExportSummary> {
    let total = enumerator.total();
    let block_count = enumerator.num_blocks();

    let mut sink = SinkGuard::new(sink);
    sink.declare_vertices(total, true);
    sink.write_header()?;
    debug!("export: header written");

    let mut written = 0usize;
    for sample in enumerator {
        let sample = sample?;
        let color = distance_to_color(sample.distance, config.max_distance);
        sink.write_vertex(sample.position, Some(color))?;
        written += 1;
    }
    if written != total {
        return Err(ExportError::Integrity(format!(
            "declared {} vertices but enumerated {}",
            total, written
        )));
    }

    sink.close()?;
    debug!("export: sink closed");
    Ok(ExportSummary {
        vertex_count: written,
        block_count,
        path: None,
    })
}

/// Export a map to a PLY file at `path`.
///
/// Nothing is created on disk if the representation or mode is unsupported,
/// the config is invalid, or the map's block list is inconsistent. A failure
/// while streaming leaves a closed, truncated file behind.
pub fn export_map<P: AsRef<Path>>(
    map: MapRepresentation<'_>,
    path: P,
    mode: ExportMode,
    config: &ExportConfig,
) -> Result<ExportSummary> {
    let path = path.as_ref();
    let enumerator = prepare(map, mode, config)?;

    let mut writer = PlyWriter::create(path, config.format)?;
    debug!("export: opened {:?}", path);
    let mut summary = stream(enumerator, &mut writer, config)?;
    summary.path = Some(path.to_path_buf());

    info!(
        "Exported {} vertices from {} blocks to {:?}",
        summary.vertex_count, summary.block_count, path
    );
    Ok(summary)
}

/// Export a map into a caller-provided sink.
///
/// The sink is left untouched if validation fails, and closed on every other
/// exit path.
pub fn export_to_sink<S: VertexSink + ?Sized>(
    map: MapRepresentation<'_>,
    sink: &mut S,
    mode: ExportMode,
    config: &ExportConfig,
) -> Result<ExportSummary> {
    let enumerator = prepare(map, mode, config)?;
    stream(enumerator, sink, config)
}

/// Export a map to PLY bytes in memory.
pub fn export_map_bytes(
    map: MapRepresentation<'_>,
    mode: ExportMode,
    config: &ExportConfig,
) -> Result<Vec<u8>> {
    let enumerator = prepare(map, mode, config)?;
    let mut writer = PlyWriter::new(Vec::new(), config.format);
    stream(enumerator, &mut writer, config)?;
    Ok(writer.into_inner())
}
