//! All-pairs shortest paths (Floyd–Warshall) with predecessor reconstruction,
//! run over a [`Graph`]'s vertices and a caller-supplied edge-weight
//! function.

use std::collections::HashMap;
use std::hash::Hash;

use crate::graph::Graph;

/// Square-matrix state for one Floyd–Warshall run: distances (`NaN` is the
/// absent/unreachable marker) and next-hop indices for path reconstruction.
///
/// The edge set is derived directly from `weight`: any pair `(u, v)` for
/// which `weight(u, v)` is finite is treated as an edge, rather than
/// requiring the graph's own edges and `weight`'s domain to be kept in sync
/// by the caller.
pub struct FloydWarshall<V> {
    vertices: Vec<V>,
    index_of: HashMap<V, usize>,
    dist: Vec<Vec<f64>>,
    next: Vec<Vec<Option<usize>>>,
}

impl<V: Clone + Eq + Hash> FloydWarshall<V> {
    /// Build the initial state from `graph`'s vertices (in insertion order)
    /// and `weight`. Does not run the algorithm yet; call [`Self::run`].
    pub fn new(graph: &Graph<V>, weight: impl Fn(&V, &V) -> f64) -> Self {
        let vertices: Vec<V> = graph.vertices().cloned().collect();
        let n = vertices.len();
        let index_of: HashMap<V, usize> = vertices
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, v)| (v, i))
            .collect();

        let mut dist = vec![vec![f64::NAN; n]; n];
        let mut next: Vec<Vec<Option<usize>>> = vec![vec![None; n]; n];

        for i in 0..n {
            dist[i][i] = 0.0;
            next[i][i] = Some(i);
        }

        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let w = weight(&vertices[i], &vertices[j]);
                if w.is_finite() {
                    dist[i][j] = w;
                    next[i][j] = Some(j);
                }
            }
        }

        Self {
            vertices,
            index_of,
            dist,
            next,
        }
    }

    /// Run the classical triple loop, relaxing `dist`/`next` in place.
    pub fn run(&mut self) {
        let n = self.vertices.len();
        for k in 0..n {
            for i in 0..n {
                if self.dist[i][k].is_nan() {
                    continue;
                }
                for j in 0..n {
                    if self.dist[k][j].is_nan() {
                        continue;
                    }
                    let via = self.dist[i][k] + self.dist[k][j];
                    if via < self.dist[i][j] || self.dist[i][j].is_nan() {
                        self.dist[i][j] = via;
                        self.next[i][j] = self.next[i][k];
                    }
                }
            }
        }
    }

    /// Shortest-path distance from `u` to `v`, or `NaN` if either vertex is
    /// unknown or no path exists.
    pub fn dist(&self, u: &V, v: &V) -> f64 {
        match (self.index_of.get(u), self.index_of.get(v)) {
            (Some(&i), Some(&j)) => self.dist[i][j],
            _ => f64::NAN,
        }
    }

    /// The shortest path from `u` to `v` as `[u, ..., v]`, or empty if none
    /// exists.
    pub fn path(&self, u: &V, v: &V) -> Vec<V> {
        let (Some(&i), Some(&j)) = (self.index_of.get(u), self.index_of.get(v)) else {
            return Vec::new();
        };
        if self.dist[i][j].is_nan() {
            return Vec::new();
        }

        let mut path = vec![self.vertices[i].clone()];
        let mut cur = i;
        while cur != j {
            let Some(next) = self.next[cur][j] else {
                return Vec::new();
            };
            path.push(self.vertices[next].clone());
            cur = next;
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use pretty_assertions::assert_eq;

    use super::*;

    // Fixture mirrors the upstream Floyd-Warshall test: a 4-vertex signed
    // graph where `NAN` marks a non-edge.
    fn weights() -> [[f64; 4]; 4] {
        [
            [f64::NAN, f64::NAN, -2.0, f64::NAN],
            [4.0, f64::NAN, 3.0, f64::NAN],
            [f64::NAN, f64::NAN, f64::NAN, 2.0],
            [f64::NAN, -1.0, f64::NAN, f64::NAN],
        ]
    }

    fn build() -> FloydWarshall<i32> {
        let weights = weights();
        let mut g: Graph<i32> = Graph::new();
        for v in 0..4 {
            g.ins_vertex(v);
        }
        for i in 0..4 {
            for j in 0..4 {
                if !weights[i as usize][j as usize].is_nan() {
                    g.ins_edge(&i, &j);
                }
            }
        }
        assert_eq!(g.vcount(), 4);
        assert_eq!(g.ecount(), 5);

        FloydWarshall::new(&g, move |u, v| weights[*u as usize][*v as usize])
    }

    #[test]
    fn matches_reference_distance_matrix() {
        let mut fw = build();
        fw.run();

        let expected = [
            [0.0, -1.0, -2.0, 0.0],
            [4.0, 0.0, 2.0, 4.0],
            [5.0, 1.0, 0.0, 2.0],
            [3.0, -1.0, 1.0, 0.0],
        ];

        for i in 0..4 {
            for j in 0..4 {
                assert!(
                    approx_eq!(f64, fw.dist(&i, &j), expected[i as usize][j as usize], ulps = 4),
                    "dist({i},{j}) = {} != {}",
                    fw.dist(&i, &j),
                    expected[i as usize][j as usize]
                );
            }
        }
    }

    #[test]
    fn reconstructs_path() {
        let mut fw = build();
        fw.run();

        assert_eq!(fw.path(&2, &0), vec![2, 3, 1, 0]);
    }

    #[test]
    fn unknown_vertices_are_absent() {
        let mut fw = build();
        fw.run();

        assert!(fw.dist(&100, &100).is_nan());
        assert!(fw.path(&100, &0).is_empty());
    }

    #[test]
    fn triangle_inequality_holds_everywhere_present() {
        let mut fw = build();
        fw.run();

        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    let (dij, dik, dkj) = (fw.dist(&i, &j), fw.dist(&i, &k), fw.dist(&k, &j));
                    if !dij.is_nan() && !dik.is_nan() && !dkj.is_nan() {
                        assert!(dij <= dik + dkj + 1e-9);
                    }
                }
            }
        }
    }
}
