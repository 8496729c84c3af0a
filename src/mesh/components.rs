//! Connected-component pruning applied when a mesh is constructed.

use crate::model::types::Point;

struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
    }
}

/// Outcome of keeping only the largest connected component.
pub(super) struct Pruned {
    pub vertices: Vec<Point>,
    pub faces: Vec<[usize; 3]>,
    pub dropped_vertices: usize,
    pub dropped_components: usize,
}

/// Keeps the connected component with the most vertices.
///
/// Connectivity is defined by shared faces; vertices referenced by no face form singleton
/// components. Among equally large components, the one containing the lowest vertex index
/// wins. Surviving vertices and faces keep their relative order and are reindexed densely.
pub(super) fn keep_largest_component(vertices: Vec<Point>, faces: Vec<[usize; 3]>) -> Pruned {
    let n = vertices.len();
    let mut sets = DisjointSet::new(n);
    for f in &faces {
        sets.union(f[0], f[1]);
        sets.union(f[1], f[2]);
    }

    let mut best_root = None;
    let mut best_size = 0;
    let mut roots_seen = vec![false; n];
    let mut num_components = 0;
    for v in 0..n {
        let root = sets.find(v);
        if roots_seen[root] {
            continue;
        }
        roots_seen[root] = true;
        num_components += 1;
        let size = sets.size[root];
        if size > best_size {
            best_size = size;
            best_root = Some(root);
        }
    }

    let Some(best_root) = best_root else {
        return Pruned {
            vertices,
            faces,
            dropped_vertices: 0,
            dropped_components: 0,
        };
    };

    if best_size == n {
        return Pruned {
            vertices,
            faces,
            dropped_vertices: 0,
            dropped_components: 0,
        };
    }

    let mut remap = vec![usize::MAX; n];
    let mut kept = Vec::with_capacity(best_size);
    for (v, point) in vertices.into_iter().enumerate() {
        if sets.find(v) == best_root {
            remap[v] = kept.len();
            kept.push(point);
        }
    }

    let faces = faces
        .into_iter()
        .filter(|f| remap[f[0]] != usize::MAX)
        .map(|f| [remap[f[0]], remap[f[1]], remap[f[2]]])
        .collect();

    Pruned {
        dropped_vertices: n - kept.len(),
        dropped_components: num_components - 1,
        vertices: kept,
        faces,
    }
}
