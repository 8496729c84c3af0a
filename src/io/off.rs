//! Object File Format (OFF) reader and writer for triangulated surfaces.
//!
//! Only the geometry section is interpreted: vertex coordinates and polygon index lists.
//! Polygons with more than three corners are fan-triangulated from their first corner, and
//! per-face colour columns trailing the index list are ignored.

use crate::io::error::Error;
use crate::model::types::Point;
use std::io::{BufRead, Write};

/// Raw vertex and triangle arrays decoded from an OFF stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OffData {
    pub vertices: Vec<Point>,
    pub faces: Vec<[usize; 3]>,
}

struct Tokens {
    items: Vec<(usize, String)>,
    cursor: usize,
}

impl Tokens {
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut items = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| Error::from_io(e, None))?;
            let content = line.split('#').next().unwrap_or("");
            items.extend(
                content
                    .split_whitespace()
                    .map(|tok| (idx + 1, tok.to_string())),
            );
        }
        Ok(Self { items, cursor: 0 })
    }

    fn line(&self) -> usize {
        self.items
            .get(self.cursor)
            .or_else(|| self.items.last())
            .map(|(line, _)| *line)
            .unwrap_or(0)
    }

    fn next_str(&mut self, what: &str) -> Result<&str, Error> {
        let line = self.line();
        let token = self
            .items
            .get(self.cursor)
            .ok_or_else(|| Error::parse("OFF", None, line, format!("unexpected end of file, expected {}", what)))?;
        self.cursor += 1;
        Ok(token.1.as_str())
    }

    fn next<T: std::str::FromStr>(&mut self, what: &str) -> Result<T, Error> {
        let line = self.line();
        let token = self.next_str(what)?;
        token
            .parse::<T>()
            .map_err(|_| Error::parse("OFF", None, line, format!("invalid {} '{}'", what, token)))
    }
}

/// Reads an OFF stream into vertex and triangle arrays.
pub fn read<R: BufRead>(reader: R) -> Result<OffData, Error> {
    let mut tokens = Tokens::from_reader(reader)?;

    let header = tokens.next_str("header")?;
    if !header.ends_with("OFF") {
        return Err(Error::parse("OFF", None, 1, format!("missing OFF header, found '{}'", header)));
    }

    let num_vertices: usize = tokens.next("vertex count")?;
    let num_faces: usize = tokens.next("face count")?;
    let _num_edges: usize = tokens.next("edge count")?;

    // Header counts are untrusted; every vertex needs three tokens and every face at least four.
    let remaining = tokens.items.len() - tokens.cursor;
    let mut vertices = Vec::with_capacity(num_vertices.min(remaining / 3));
    for _ in 0..num_vertices {
        let line = tokens.line();
        let x: f64 = tokens.next("vertex coordinate")?;
        let y: f64 = tokens.next("vertex coordinate")?;
        let z: f64 = tokens.next("vertex coordinate")?;
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return Err(Error::parse(
                "OFF",
                None,
                line,
                format!("non-finite vertex coordinate ({}, {}, {})", x, y, z),
            ));
        }
        vertices.push(Point::new(x, y, z));
    }

    let remaining = tokens.items.len() - tokens.cursor;
    let mut faces = Vec::with_capacity(num_faces.min(remaining / 4));
    for _ in 0..num_faces {
        let line = tokens.line();
        let corners: usize = tokens.next("polygon size")?;
        if corners < 3 {
            return Err(Error::parse("OFF", None, line, format!("polygon with {} corners", corners)));
        }

        let mut polygon = Vec::with_capacity(corners.min(tokens.items.len() - tokens.cursor));
        for _ in 0..corners {
            let index: usize = tokens.next("vertex index")?;
            if index >= num_vertices {
                return Err(Error::inconsistent_data(
                    "OFF",
                    None,
                    format!("face on line {} references vertex {} of {}", line, index, num_vertices),
                ));
            }
            polygon.push(index);
        }

        while tokens.cursor < tokens.items.len() && tokens.items[tokens.cursor].0 == line {
            tokens.cursor += 1;
        }

        for k in 1..corners - 1 {
            faces.push([polygon[0], polygon[k], polygon[k + 1]]);
        }
    }

    Ok(OffData { vertices, faces })
}

/// Writes vertices and triangles as an OFF stream.
pub fn write<W: Write>(mut writer: W, vertices: &[Point], faces: &[[usize; 3]]) -> Result<(), Error> {
    let io_err = |e| Error::from_io(e, None);

    writeln!(writer, "OFF").map_err(io_err)?;
    writeln!(writer, "{} {} 0", vertices.len(), faces.len()).map_err(io_err)?;
    for v in vertices {
        writeln!(writer, "{} {} {}", v.x, v.y, v.z).map_err(io_err)?;
    }
    for f in faces {
        writeln!(writer, "3 {} {} {}", f[0], f[1], f[2]).map_err(io_err)?;
    }
    writer.flush().map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_parses_vertices_and_faces() {
        let text = "OFF\n# tetrahedron\n4 4 6\n0 0 0\n1 0 0\n0 1 0\n0 0 1\n3 0 1 2\n3 0 1 3\n3 0 2 3\n3 1 2 3\n";
        let data = read(Cursor::new(text)).unwrap();

        assert_eq!(data.vertices.len(), 4);
        assert_eq!(data.vertices[3], Point::new(0.0, 0.0, 1.0));
        assert_eq!(data.faces, vec![[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]]);
    }

    #[test]
    fn read_fan_triangulates_polygons_and_skips_colours() {
        let text = "OFF\n4 1 0\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n4 0 1 2 3 255 0 0\n";
        let data = read(Cursor::new(text)).unwrap();

        assert_eq!(data.faces, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn read_rejects_out_of_range_indices() {
        let text = "OFF\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 5\n";
        let err = read(Cursor::new(text)).unwrap_err();

        assert!(matches!(err, Error::InconsistentData { .. }));
    }

    #[test]
    fn read_rejects_missing_header() {
        let err = read(Cursor::new("PLY\n")).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn read_reports_truncated_streams() {
        let err = read(Cursor::new("OFF\n3 1 0\n0 0 0\n")).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn read_rejects_oversized_header_counts_without_allocating() {
        let err = read(Cursor::new("OFF\n18446744073709551615 0 0\n")).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));

        let err = read(Cursor::new("OFF\n3 18446744073709551615 0\n0 0 0\n1 0 0\n0 1 0\n")).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));

        let err = read(Cursor::new("OFF\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n18446744073709551615 0 1 2\n")).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn read_rejects_non_finite_coordinates() {
        for bad in ["nan", "inf", "-inf"] {
            let text = format!("OFF\n3 1 0\n{} 0 0\n1 0 0\n0 1 0\n3 0 1 2\n", bad);
            let err = read(Cursor::new(text)).unwrap_err();
            assert!(matches!(err, Error::Parse { line_number: 3, .. }), "{}", bad);
        }
    }

    #[test]
    fn write_then_read_preserves_geometry() {
        let vertices = vec![
            Point::new(0.5, -1.25, 3.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2]];

        let mut buffer = Vec::new();
        write(&mut buffer, &vertices, &faces).unwrap();
        let data = read(Cursor::new(buffer)).unwrap();

        assert_eq!(data.vertices, vertices);
        assert_eq!(data.faces, faces);
    }
}
