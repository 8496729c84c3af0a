//! Incremental QuickHull over a point cloud.

use crate::model::types::Point;
use nalgebra::Vector3;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
struct Facet {
    corners: [usize; 3],
    normal: Vector3<f64>,
    offset: f64,
}

impl Facet {
    /// Facet through three points, oriented so that `interior` lies on its negative side.
    fn new(mut corners: [usize; 3], points: &[Point], interior: &Point) -> Option<Self> {
        let normal = |c: &[usize; 3]| (points[c[1]] - points[c[0]]).cross(&(points[c[2]] - points[c[0]]));
        let mut n = normal(&corners);
        if n.dot(&(*interior - points[corners[0]])) > 0.0 {
            corners.swap(0, 1);
            n = normal(&corners);
        }
        let n = n.try_normalize(1e-12)?;
        Some(Self {
            corners,
            offset: -n.dot(&points[corners[0]].coords),
            normal: n,
        })
    }

    fn signed_distance(&self, p: &Point) -> f64 {
        self.normal.dot(&p.coords) + self.offset
    }
}

/// Convex hull as outward-oriented triangular facets.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexHull {
    facets: Vec<Facet>,
}

impl ConvexHull {
    /// Builds the hull of `points`, or `None` when they do not span a volume.
    pub fn new(points: &[Point]) -> Option<Self> {
        if points.len() < 4 {
            return None;
        }
        let ext = extreme_points(points);
        let extent = (0..3)
            .map(|axis| points[ext[2 * axis + 1]][axis] - points[ext[2 * axis]][axis])
            .fold(0.0, f64::max);
        let epsilon = 1e-9 * extent.max(1.0);

        let [a, b, c, d] = initial_simplex(points, &ext, epsilon)?;
        let interior = Point::from((points[a].coords + points[b].coords + points[c].coords + points[d].coords) / 4.0);

        let mut facets: Vec<Facet> = [[a, b, c], [a, b, d], [a, c, d], [b, c, d]]
            .into_iter()
            .filter_map(|corners| Facet::new(corners, points, &interior))
            .collect();

        for (idx, p) in points.iter().enumerate() {
            if [a, b, c, d].contains(&idx) {
                continue;
            }
            let visible: Vec<bool> = facets.iter().map(|f| f.signed_distance(p) > epsilon).collect();
            if !visible.contains(&true) {
                continue;
            }

            let mut edges: HashMap<(usize, usize), usize> = HashMap::new();
            for (facet, _) in facets.iter().zip(&visible).filter(|(_, v)| **v) {
                let k = facet.corners;
                for (u, v) in [(k[0], k[1]), (k[1], k[2]), (k[2], k[0])] {
                    *edges.entry((u.min(v), u.max(v))).or_default() += 1;
                }
            }

            let mut keep = visible.iter();
            facets.retain(|_| keep.next().is_some_and(|v| !v));
            let mut horizon: Vec<(usize, usize)> = edges
                .into_iter()
                .filter(|&(_, count)| count == 1)
                .map(|(edge, _)| edge)
                .collect();
            horizon.sort_unstable();
            facets.extend(
                horizon
                    .into_iter()
                    .filter_map(|(u, v)| Facet::new([u, v, idx], points, &interior)),
            );
        }

        Some(Self { facets })
    }

    pub fn num_facets(&self) -> usize {
        self.facets.len()
    }

    /// Corner indices of each facet, wound counter-clockwise seen from outside.
    pub fn facets(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.facets.iter().map(|f| f.corners)
    }

    /// Distance from `p` to the hull boundary when `p` is inside, zero otherwise.
    pub fn depth(&self, p: &Point) -> f64 {
        self.facets
            .iter()
            .map(|f| -f.signed_distance(p))
            .fold(f64::INFINITY, f64::min)
            .max(0.0)
    }
}

/// Indices of the points with minimal and maximal x, y, and z.
fn extreme_points(points: &[Point]) -> [usize; 6] {
    let mut ext = [0usize; 6];
    for (i, p) in points.iter().enumerate() {
        for axis in 0..3 {
            if p[axis] < points[ext[2 * axis]][axis] {
                ext[2 * axis] = i;
            }
            if p[axis] > points[ext[2 * axis + 1]][axis] {
                ext[2 * axis + 1] = i;
            }
        }
    }
    ext
}

/// Four affinely independent points grown from the widest pair of extremes.
fn initial_simplex(points: &[Point], ext: &[usize; 6], epsilon: f64) -> Option<[usize; 4]> {
    let (a, b) = ext
        .iter()
        .flat_map(|&a| ext.iter().map(move |&b| (a, b)))
        .max_by(|x, y| {
            nalgebra::distance_squared(&points[x.0], &points[x.1])
                .total_cmp(&nalgebra::distance_squared(&points[y.0], &points[y.1]))
        })?;
    if nalgebra::distance(&points[a], &points[b]) <= epsilon {
        return None;
    }

    let ab = points[b] - points[a];
    let c = farthest(points, |p| ab.cross(&(*p - points[a])).norm() / ab.norm(), epsilon)?;
    let normal = ab.cross(&(points[c] - points[a])).normalize();
    let d = farthest(points, |p| normal.dot(&(*p - points[a])).abs(), epsilon)?;
    Some([a, b, c, d])
}

fn farthest<F: Fn(&Point) -> f64>(points: &[Point], distance: F, epsilon: f64) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, distance(p)))
        .filter(|&(_, d)| d > epsilon)
        .max_by(|x, y| x.1.total_cmp(&y.1))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Unit octahedron followed by two interior points.
    fn octahedron_with_interior() -> Vec<Point> {
        vec![
            Point::new(1.0, 0.0, 0.0),
            Point::new(-1.0, 0.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
            Point::new(0.0, -1.0, 0.0),
            Point::new(0.0, 0.0, 0.5),
            Point::new(0.0, 0.0, 1.0),
            Point::new(0.0, 0.0, -1.0),
            Point::origin(),
        ]
    }

    #[test]
    fn hull_of_octahedron_has_eight_outward_facets() {
        let points = octahedron_with_interior();
        let hull = ConvexHull::new(&points).unwrap();

        assert_eq!(hull.num_facets(), 8);
        for [a, b, c] in hull.facets() {
            assert!(![4, 7].contains(&a) && ![4, 7].contains(&b) && ![4, 7].contains(&c));
            let n = (points[b] - points[a]).cross(&(points[c] - points[a]));
            assert!(n.dot(&points[a].coords) > 0.0);
        }
    }

    #[test]
    fn depth_measures_distance_to_nearest_facet() {
        let hull = ConvexHull::new(&octahedron_with_interior()).unwrap();
        let sqrt3 = 3.0_f64.sqrt();

        assert!((hull.depth(&Point::origin()) - 1.0 / sqrt3).abs() < 1e-12);
        assert!((hull.depth(&Point::new(0.0, 0.0, 0.5)) - 0.5 / sqrt3).abs() < 1e-12);
        assert!(hull.depth(&Point::new(0.0, 1.0, 0.0)).abs() < 1e-12);
        assert_eq!(hull.depth(&Point::new(3.0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn degenerate_point_sets_have_no_hull() {
        let planar: Vec<Point> = (0..6).map(|i| Point::new(i as f64, (i % 2) as f64, 0.0)).collect();
        assert!(ConvexHull::new(&planar).is_none());

        let collinear: Vec<Point> = (0..5).map(|i| Point::new(i as f64, 0.0, 0.0)).collect();
        assert!(ConvexHull::new(&collinear).is_none());

        assert!(ConvexHull::new(&[Point::origin(); 3]).is_none());
    }
}
