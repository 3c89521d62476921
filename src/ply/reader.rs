//! PLY point cloud reader.
//!
//! Reads back the files produced by [`PlyWriter`](super::PlyWriter).

use super::PlyFormat;
use crate::error::{ExportError, Result};
use crate::types::Color;
use glam::Vec3;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// One vertex read from a PLY file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlyPoint {
    pub position: Vec3,
    pub color: Option<Color>,
}

/// A parsed PLY point cloud.
#[derive(Debug, Clone, PartialEq)]
pub struct PlyCloud {
    pub format: PlyFormat,
    pub has_color: bool,
    pub points: Vec<PlyPoint>,
}

impl PlyCloud {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

struct Header {
    format: PlyFormat,
    vertex_count: usize,
    has_color: bool,
}

/// Upper bound on vertices preallocated from the header's declared count.
const MAX_PREALLOCATED_POINTS: usize = 1 << 16;

fn malformed(msg: impl Into<String>) -> ExportError {
    ExportError::MalformedPly(msg.into())
}

fn next_line<R: BufRead>(reader: &mut R, line: &mut String) -> Result<bool> {
    line.clear();
    Ok(reader.read_line(line)? > 0)
}

fn read_header<R: BufRead>(reader: &mut R) -> Result<Header> {
    let mut line = String::new();
    if !next_line(reader, &mut line)? || line.trim_end() != "ply" {
        return Err(malformed("missing 'ply' magic"));
    }

    let mut format = None;
    let mut vertex_count = None;
    let mut properties: Vec<(String, String)> = Vec::new();

    loop {
        if !next_line(reader, &mut line)? {
            return Err(malformed("unexpected end of header"));
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["end_header"] => break,
            ["comment", ..] | ["obj_info", ..] | [] => {}
            ["format", name, "1.0"] => {
                format = Some(
                    PlyFormat::from_header_name(name)
                        .ok_or_else(|| malformed(format!("unsupported format '{}'", name)))?,
                );
            }
            ["element", "vertex", count] => {
                if vertex_count.is_some() {
                    return Err(malformed("duplicate vertex element"));
                }
                vertex_count = Some(
                    count
                        .parse::<usize>()
                        .map_err(|_| malformed(format!("bad vertex count '{}'", count)))?,
                );
            }
            ["element", name, _] => {
                return Err(malformed(format!("unsupported element '{}'", name)));
            }
            ["property", ty, name] => {
                if vertex_count.is_none() {
                    return Err(malformed("property before vertex element"));
                }
                properties.push((ty.to_string(), name.to_string()));
            }
            _ => return Err(malformed(format!("unexpected header line '{}'", line.trim_end()))),
        }
    }

    let format = format.ok_or_else(|| malformed("missing format line"))?;
    let vertex_count = vertex_count.ok_or_else(|| malformed("missing vertex element"))?;

    let names: Vec<(&str, &str)> = properties
        .iter()
        .map(|(t, n)| (t.as_str(), n.as_str()))
        .collect();
    let xyz = [("float", "x"), ("float", "y"), ("float", "z")];
    let rgb = [("uchar", "red"), ("uchar", "green"), ("uchar", "blue")];
    let has_color = if names == xyz {
        false
    } else if names.len() == 6 && names[..3] == xyz && names[3..] == rgb {
        true
    } else {
        return Err(malformed(format!("unsupported vertex properties {:?}", names)));
    };

    Ok(Header {
        format,
        vertex_count,
        has_color,
    })
}

fn parse_ascii_point(line: &str, has_color: bool) -> Result<PlyPoint> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let expected = if has_color { 6 } else { 3 };
    if fields.len() != expected {
        return Err(malformed(format!(
            "expected {} values per vertex, got {}",
            expected,
            fields.len()
        )));
    }
    let float = |s: &str| {
        s.parse::<f32>()
            .map_err(|_| malformed(format!("bad float '{}'", s)))
    };
    let byte = |s: &str| {
        s.parse::<u8>()
            .map_err(|_| malformed(format!("bad color channel '{}'", s)))
    };
    let position = Vec3::new(float(fields[0])?, float(fields[1])?, float(fields[2])?);
    let color = if has_color {
        Some([byte(fields[3])?, byte(fields[4])?, byte(fields[5])?])
    } else {
        None
    };
    Ok(PlyPoint { position, color })
}

fn read_ascii_body<R: BufRead>(reader: &mut R, header: &Header) -> Result<Vec<PlyPoint>> {
    let mut points = Vec::with_capacity(header.vertex_count.min(MAX_PREALLOCATED_POINTS));
    let mut line = String::new();
    while points.len() < header.vertex_count {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(malformed(format!(
                "body ended after {} of {} vertices",
                points.len(),
                header.vertex_count
            )));
        }
        if line.trim().is_empty() {
            continue;
        }
        points.push(parse_ascii_point(&line, header.has_color)?);
    }
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        if !line.trim().is_empty() {
            return Err(malformed("trailing data after last vertex"));
        }
    }
    Ok(points)
}

fn read_binary_body<R: BufRead>(reader: &mut R, header: &Header) -> Result<Vec<PlyPoint>> {
    let record_len = if header.has_color { 15 } else { 12 };
    let mut points = Vec::with_capacity(header.vertex_count.min(MAX_PREALLOCATED_POINTS));
    let mut record = [0u8; 15];
    for i in 0..header.vertex_count {
        reader.read_exact(&mut record[..record_len]).map_err(|_| {
            malformed(format!(
                "body ended after {} of {} vertices",
                i, header.vertex_count
            ))
        })?;
        let f = |o: usize| f32::from_le_bytes([record[o], record[o + 1], record[o + 2], record[o + 3]]);
        let position = Vec3::new(f(0), f(4), f(8));
        let color = header.has_color.then(|| [record[12], record[13], record[14]]);
        points.push(PlyPoint { position, color });
    }
    let mut rest = [0u8; 1];
    if reader.read(&mut rest)? != 0 {
        return Err(malformed("trailing data after last vertex"));
    }
    Ok(points)
}

/// Read a PLY point cloud.
pub fn read_ply<R: BufRead>(mut reader: R) -> Result<PlyCloud> {
    let header = read_header(&mut reader)?;
    let points = match header.format {
        PlyFormat::Ascii => read_ascii_body(&mut reader, &header)?,
        PlyFormat::BinaryLittleEndian => read_binary_body(&mut reader, &header)?,
    };
    Ok(PlyCloud {
        format: header.format,
        has_color: header.has_color,
        points,
    })
}

/// Read a PLY point cloud from a file.
pub fn read_ply_file<P: AsRef<Path>>(path: P) -> Result<PlyCloud> {
    read_ply(BufReader::new(File::open(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ply::{PlyWriter, VertexSink};

    fn write_points(format: PlyFormat, points: &[(Vec3, Color)]) -> Vec<u8> {
        let mut writer = PlyWriter::new(Vec::new(), format);
        writer.declare_vertices(points.len(), true);
        writer.write_header().unwrap();
        for (p, c) in points {
            writer.write_vertex(*p, Some(*c)).unwrap();
        }
        writer.close().unwrap();
        writer.into_inner()
    }

    #[test]
    fn test_reads_writer_output_in_both_formats() {
        let points = vec![
            (Vec3::new(0.1, 0.2, 0.3), [255, 0, 0]),
            (Vec3::new(-1.0e-3, 7.25, -12.5), [0, 0, 128]),
        ];
        for format in [PlyFormat::Ascii, PlyFormat::BinaryLittleEndian] {
            let bytes = write_points(format, &points);
            let cloud = read_ply(bytes.as_slice()).unwrap();
            assert_eq!(cloud.format, format);
            assert!(cloud.has_color);
            assert_eq!(cloud.len(), 2);
            for (read, (p, c)) in cloud.points.iter().zip(&points) {
                assert_eq!(read.position, *p);
                assert_eq!(read.color, Some(*c));
            }
        }
    }

    #[test]
    fn test_reads_uncolored_cloud() {
        let text = "ply\nformat ascii 1.0\nelement vertex 1\n\
                    property float x\nproperty float y\nproperty float z\nend_header\n1 2 3\n";
        let cloud = read_ply(text.as_bytes()).unwrap();
        assert!(!cloud.has_color);
        assert_eq!(cloud.points[0].position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(cloud.points[0].color, None);
    }

    #[test]
    fn test_rejects_short_body() {
        let text = "ply\nformat ascii 1.0\nelement vertex 2\n\
                    property float x\nproperty float y\nproperty float z\nend_header\n1 2 3\n";
        assert!(matches!(read_ply(text.as_bytes()), Err(ExportError::MalformedPly(_))));
    }

    #[test]
    fn test_huge_declared_count_is_malformed() {
        for count in ["18446744073709551615", "10000000000"] {
            let text = format!(
                "ply\nformat ascii 1.0\nelement vertex {}\n\
                 property float x\nproperty float y\nproperty float z\nend_header\n1 2 3\n",
                count
            );
            assert!(matches!(read_ply(text.as_bytes()), Err(ExportError::MalformedPly(_))));

            let mut bytes = format!(
                "ply\nformat binary_little_endian 1.0\nelement vertex {}\n\
                 property float x\nproperty float y\nproperty float z\nend_header\n",
                count
            )
            .into_bytes();
            bytes.extend_from_slice(&[0u8; 12]);
            assert!(matches!(read_ply(&bytes[..]), Err(ExportError::MalformedPly(_))));
        }
    }

    #[test]
    fn test_rejects_unknown_format_and_properties() {
        let text = "ply\nformat binary_big_endian 1.0\nelement vertex 0\nend_header\n";
        assert!(read_ply(text.as_bytes()).is_err());

        let text = "ply\nformat ascii 1.0\nelement vertex 0\nproperty double x\nend_header\n";
        assert!(read_ply(text.as_bytes()).is_err());

        assert!(read_ply("not a ply".as_bytes()).is_err());
    }
}
