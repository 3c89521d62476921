//! PLY point cloud encoding.
//!
//! Only the subset needed for colored point clouds is supported: a single
//! `vertex` element with float `x`/`y`/`z` and optional uchar
//! `red`/`green`/`blue`.

pub mod reader;
pub mod writer;

pub use reader::{read_ply, read_ply_file, PlyCloud, PlyPoint};
pub use writer::PlyWriter;

use crate::error::Result;
use crate::types::Color;
use glam::Vec3;

/// Body encoding of a PLY file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlyFormat {
    #[default]
    Ascii,
    BinaryLittleEndian,
}

impl PlyFormat {
    /// Value of the `format` header line.
    pub fn header_name(&self) -> &'static str {
        match self {
            PlyFormat::Ascii => "ascii",
            PlyFormat::BinaryLittleEndian => "binary_little_endian",
        }
    }

    pub fn from_header_name(name: &str) -> Option<Self> {
        match name {
            "ascii" => Some(PlyFormat::Ascii),
            "binary_little_endian" => Some(PlyFormat::BinaryLittleEndian),
            _ => None,
        }
    }
}

/// Destination for a stream of vertices whose count is known up front.
///
/// Call order is `declare_vertices`, `write_header`, then exactly the
/// declared number of `write_vertex` calls, then `close`.
pub trait VertexSink {
    /// Declare how many vertices follow and whether they carry color.
    fn declare_vertices(&mut self, count: usize, with_color: bool);

    /// Emit the header for the declared vertices.
    fn write_header(&mut self) -> Result<()>;

    /// Write one vertex. `color` must be present iff color was declared.
    fn write_vertex(&mut self, position: Vec3, color: Option<Color>) -> Result<()>;

    /// Flush and release the underlying resource.
    fn close(&mut self) -> Result<()>;
}
