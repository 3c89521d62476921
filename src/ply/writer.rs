//! Streaming PLY writer.

use super::{PlyFormat, VertexSink};
use crate::error::{ExportError, Result};
use crate::types::Color;
use glam::Vec3;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes a PLY vertex element to any `Write`.
pub struct PlyWriter<W: Write> {
    out: W,
    format: PlyFormat,
    vertex_count: usize,
    with_color: bool,
    header_written: bool,
    vertices_written: usize,
    closed: bool,
}

impl PlyWriter<BufWriter<File>> {
    /// Create (or truncate) a PLY file at `path`.
    pub fn create<P: AsRef<Path>>(path: P, format: PlyFormat) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| ExportError::ResourceOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufWriter::new(file), format))
    }
}

impl<W: Write> PlyWriter<W> {
    pub fn new(out: W, format: PlyFormat) -> Self {
        Self {
            out,
            format,
            vertex_count: 0,
            with_color: false,
            header_written: false,
            vertices_written: 0,
            closed: false,
        }
    }

    pub fn format(&self) -> PlyFormat {
        self.format
    }

    pub fn vertices_written(&self) -> usize {
        self.vertices_written
    }

    /// Unwrap the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(ExportError::Write("PLY writer already closed".to_string()));
        }
        Ok(())
    }
}

fn write_err(what: &str, e: std::io::Error) -> ExportError {
    ExportError::Write(format!("{}: {}", what, e))
}

impl<W: Write> VertexSink for PlyWriter<W> {
    fn declare_vertices(&mut self, count: usize, with_color: bool) {
        self.vertex_count = count;
        self.with_color = with_color;
    }

    fn write_header(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.header_written {
            return Err(ExportError::Write("PLY header already written".to_string()));
        }

        let mut header = String::with_capacity(256);
        header.push_str("ply\n");
        header.push_str(&format!("format {} 1.0\n", self.format.header_name()));
        header.push_str("comment generated by sdf-ply\n");
        header.push_str(&format!("element vertex {}\n", self.vertex_count));
        header.push_str("property float x\n");
        header.push_str("property float y\n");
        header.push_str("property float z\n");
        if self.with_color {
            header.push_str("property uchar red\n");
            header.push_str("property uchar green\n");
            header.push_str("property uchar blue\n");
        }
        header.push_str("end_header\n");

        self.out
            .write_all(header.as_bytes())
            .map_err(|e| write_err("failed to write PLY header", e))?;
        self.header_written = true;
        Ok(())
    }

    fn write_vertex(&mut self, position: Vec3, color: Option<Color>) -> Result<()> {
        self.ensure_open()?;
        if !self.header_written {
            return Err(ExportError::Write(
                "vertex written before PLY header".to_string(),
            ));
        }
        if self.vertices_written >= self.vertex_count {
            return Err(ExportError::Write(format!(
                "more vertices than the {} declared",
                self.vertex_count
            )));
        }
        let color = match (self.with_color, color) {
            (true, Some(c)) => Some(c),
            (false, None) => None,
            (declared, _) => {
                return Err(ExportError::Write(format!(
                    "vertex color does not match declaration (color declared: {})",
                    declared
                )))
            }
        };

        let result = match self.format {
            PlyFormat::Ascii => match color {
                Some([r, g, b]) => writeln!(
                    self.out,
                    "{} {} {} {} {} {}",
                    position.x, position.y, position.z, r, g, b
                ),
                None => writeln!(self.out, "{} {} {}", position.x, position.y, position.z),
            },
            PlyFormat::BinaryLittleEndian => {
                let mut record = [0u8; 15];
                record[0..4].copy_from_slice(&position.x.to_le_bytes());
                record[4..8].copy_from_slice(&position.y.to_le_bytes());
                record[8..12].copy_from_slice(&position.z.to_le_bytes());
                let len = match color {
                    Some(c) => {
                        record[12..15].copy_from_slice(&c);
                        15
                    }
                    None => 12,
                };
                self.out.write_all(&record[..len])
            }
        };
        result.map_err(|e| write_err("failed to write PLY vertex", e))?;
        self.vertices_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.out
            .flush()
            .map_err(|e| write_err("failed to flush PLY output", e))?;
        if self.header_written && self.vertices_written != self.vertex_count {
            return Err(ExportError::Integrity(format!(
                "header declares {} vertices but {} were written",
                self.vertex_count, self.vertices_written
            )));
        }
        Ok(())
    }
}
