//! OpenDX scalar grid reader.
//!
//! Reads the regular-grid subset of the format written by Poisson-Boltzmann solvers: one
//! `gridpositions` object with an origin and three axis-aligned deltas, and one data array
//! listed with the z index varying fastest.

use crate::io::error::Error;
use crate::model::types::Point;
use nalgebra::Vector3;
use std::io::BufRead;

/// Scalar values on a regular axis-aligned lattice.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarGrid {
    pub origin: Point,
    pub delta: Vector3<f64>,
    pub counts: [usize; 3],
    values: Vec<f64>,
}

impl ScalarGrid {
    pub fn new(
        origin: Point,
        delta: Vector3<f64>,
        counts: [usize; 3],
        values: Vec<f64>,
    ) -> Result<Self, Error> {
        let expected = counts[0]
            .checked_mul(counts[1])
            .and_then(|n| n.checked_mul(counts[2]))
            .ok_or_else(|| {
                Error::inconsistent_data(
                    "DX",
                    None,
                    format!("grid {}x{}x{} is too large", counts[0], counts[1], counts[2]),
                )
            })?;
        if expected == 0 || values.len() != expected {
            return Err(Error::inconsistent_data(
                "DX",
                None,
                format!(
                    "grid {}x{}x{} requires {} values, found {}",
                    counts[0],
                    counts[1],
                    counts[2],
                    expected,
                    values.len()
                ),
            ));
        }
        if delta.iter().any(|d| !(*d > 0.0)) {
            return Err(Error::inconsistent_data("DX", None, "grid spacing must be positive"));
        }
        Ok(Self {
            origin,
            delta,
            counts,
            values,
        })
    }

    pub fn value(&self, i: usize, j: usize, k: usize) -> f64 {
        self.values[(i * self.counts[1] + j) * self.counts[2] + k]
    }

    /// Trilinear interpolation at an arbitrary point.
    ///
    /// Points outside the lattice are clamped onto its boundary.
    pub fn interpolate(&self, p: &Point) -> f64 {
        let mut base = [0usize; 3];
        let mut frac = [0.0f64; 3];

        for axis in 0..3 {
            let n = self.counts[axis];
            let f = ((p[axis] - self.origin[axis]) / self.delta[axis]).clamp(0.0, (n - 1) as f64);
            if n == 1 {
                continue;
            }
            let i0 = (f.floor() as usize).min(n - 2);
            base[axis] = i0;
            frac[axis] = f - i0 as f64;
        }

        let mut acc = 0.0;
        for corner in 0..8usize {
            let mut weight = 1.0;
            let mut idx = [0usize; 3];
            for axis in 0..3 {
                let upper = (corner >> axis) & 1 == 1;
                if upper && self.counts[axis] == 1 {
                    weight = 0.0;
                    break;
                }
                idx[axis] = base[axis] + upper as usize;
                weight *= if upper { frac[axis] } else { 1.0 - frac[axis] };
            }
            if weight != 0.0 {
                acc += weight * self.value(idx[0], idx[1], idx[2]);
            }
        }
        acc
    }
}

/// Parses an OpenDX scalar grid.
pub fn read<R: BufRead>(reader: R) -> Result<ScalarGrid, Error> {
    let mut counts: Option<[usize; 3]> = None;
    let mut origin: Option<Point> = None;
    let mut deltas: Vec<Vector3<f64>> = Vec::new();
    let mut expected_items: Option<usize> = None;
    let mut values: Vec<f64> = Vec::new();
    let mut in_data = false;

    for (idx, line) in reader.lines().enumerate() {
        let line_num = idx + 1;
        let line = line.map_err(|e| Error::from_io(e, None))?;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if in_data {
            let first = trimmed.chars().next().unwrap_or(' ');
            if first.is_ascii_alphabetic() {
                in_data = false;
            } else {
                for tok in trimmed.split_whitespace() {
                    let v = tok.parse::<f64>().map_err(|_| {
                        Error::parse("DX", None, line_num, format!("invalid data value '{}'", tok))
                    })?;
                    values.push(v);
                }
                continue;
            }
        }

        let words: Vec<&str> = trimmed.split_whitespace().collect();
        match words.first().copied() {
            Some("object") if trimmed.contains("gridpositions") => {
                counts = Some(parse_counts(&words, line_num)?);
            }
            Some("object") if trimmed.contains("class array") => {
                expected_items = words
                    .iter()
                    .position(|w| *w == "items")
                    .and_then(|p| words.get(p + 1))
                    .and_then(|w| w.parse().ok());
                in_data = trimmed.contains("data follows");
            }
            Some("origin") => {
                let v = parse_triplet(&words[1..], line_num)?;
                origin = Some(Point::from(v));
            }
            Some("delta") => {
                deltas.push(parse_triplet(&words[1..], line_num)?);
            }
            _ => {}
        }
    }

    let counts = counts.ok_or_else(|| Error::inconsistent_data("DX", None, "missing gridpositions object"))?;
    let origin = origin.ok_or_else(|| Error::inconsistent_data("DX", None, "missing grid origin"))?;
    if deltas.len() != 3 {
        return Err(Error::inconsistent_data(
            "DX",
            None,
            format!("expected 3 delta lines, found {}", deltas.len()),
        ));
    }
    for (axis, d) in deltas.iter().enumerate() {
        let off_axis = (0..3).filter(|a| *a != axis).any(|a| d[a] != 0.0);
        if off_axis {
            return Err(Error::inconsistent_data("DX", None, "only axis-aligned grids are supported"));
        }
    }
    if let Some(items) = expected_items {
        if items != values.len() {
            return Err(Error::inconsistent_data(
                "DX",
                None,
                format!("array declares {} items, found {}", items, values.len()),
            ));
        }
    }

    let delta = Vector3::new(deltas[0].x, deltas[1].y, deltas[2].z);
    ScalarGrid::new(origin, delta, counts, values)
}

fn parse_counts(words: &[&str], line_num: usize) -> Result<[usize; 3], Error> {
    let pos = words
        .iter()
        .position(|w| *w == "counts")
        .ok_or_else(|| Error::parse("DX", None, line_num, "gridpositions without counts"))?;
    let mut counts = [0usize; 3];
    for (axis, slot) in counts.iter_mut().enumerate() {
        *slot = words
            .get(pos + 1 + axis)
            .and_then(|w| w.parse().ok())
            .ok_or_else(|| Error::parse("DX", None, line_num, "invalid grid counts"))?;
    }
    Ok(counts)
}

fn parse_triplet(words: &[&str], line_num: usize) -> Result<Vector3<f64>, Error> {
    if words.len() < 3 {
        return Err(Error::parse("DX", None, line_num, "expected three components"));
    }
    let mut v = Vector3::zeros();
    for axis in 0..3 {
        v[axis] = words[axis]
            .parse()
            .map_err(|_| Error::parse("DX", None, line_num, format!("invalid number '{}'", words[axis])))?;
    }
    Ok(v)
}
