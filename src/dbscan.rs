//! Density-based spatial clustering (DBSCAN, Ester et al. 1996) over 1D
//! closed intervals, using the midpoint of each interval as its coordinate.

use crate::interval::IntervalIndex;

/// Label assigned to a point over the course of one clustering pass.
///
/// Transitions are monotone along `Undefined -> Noise -> Reachable -> Core`;
/// the discriminants double as the `label` contract of the `clustering`
/// store table (`Noise=1, Reachable=2, Core=3`); `Undefined` never appears
/// on an emitted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Label {
    Undefined = 0,
    Noise = 1,
    Reachable = 2,
    Core = 3,
}

/// One point known to the engine: an interval, its current label/cluster id,
/// the size of its last-computed neighborhood, and an owned payload.
pub struct Point<T> {
    low: i64,
    high: i64,
    label: Label,
    id: i32,
    neighbors: i32,
    data: T,
}

impl<T> Point<T> {
    pub fn low(&self) -> i64 {
        self.low
    }

    pub fn high(&self) -> i64 {
        self.high
    }

    pub fn label(&self) -> Label {
        self.label
    }

    /// Cluster id, `0` iff `label() == Label::Noise`.
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn neighbors(&self) -> i32 {
        self.neighbors
    }

    pub fn data(&self) -> &T {
        &self.data
    }
}

/// A DBSCAN engine over a fixed collection of points, reusable across
/// parameter sweeps of the same dataset.
pub struct Dbscan<T> {
    points: Vec<Point<T>>,
    index: IntervalIndex<usize>,
}

impl<T> Dbscan<T> {
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            index: IntervalIndex::new(),
        }
    }

    /// Insert a point with interval `[low, high]` and an owned payload.
    pub fn insert_point(&mut self, low: i64, high: i64, data: T) {
        let idx = self.points.len();
        self.points.push(Point {
            low,
            high,
            label: Label::Undefined,
            id: 0,
            neighbors: 0,
            data,
        });
        self.index.insert(low, high, idx);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn reset(&mut self) {
        for p in &mut self.points {
            p.label = Label::Undefined;
            p.id = 0;
        }
    }

    /// The eps-neighborhood of point `i`: the midpoint of its interval,
    /// widened by `eps` on each side and clamped to not go below 1 (the
    /// store's coordinates are 1-based).
    fn range_query(&mut self, i: usize, eps: i64) -> Vec<usize> {
        let (low, high) = (self.points[i].low, self.points[i].high);
        let center = (low + high) / 2;
        let qlow = (center - eps).max(1);
        let qhigh = center + eps;

        let mut hits = Vec::new();
        self.index
            .lookup(qlow, qhigh, |_, _, &payload| hits.push(payload));
        hits
    }

    /// Run one clustering pass with the given parameters, invoking `visitor`
    /// once per point in seed order as each cluster (or noise point) is
    /// finalized, and returning the number of clusters found.
    ///
    /// Resets every point to `Undefined` first, so the engine may be reused
    /// with different `eps`/`min_pts` on the same inserted points. `visitor`
    /// may fail (e.g. because it writes to a store); the first failure
    /// aborts the pass and is returned to the caller.
    pub fn cluster<E>(
        &mut self,
        eps: i64,
        min_pts: i32,
        mut visitor: impl FnMut(&Point<T>) -> Result<(), E>,
    ) -> Result<usize, E> {
        assert!(min_pts >= 3, "min_pts must be at least 3");

        self.reset();

        let n = self.points.len();
        let mut in_seed = vec![false; n];
        let mut cluster_count = 0i32;

        for i in 0..n {
            if self.points[i].label != Label::Undefined {
                continue;
            }

            let neighbors = self.range_query(i, eps);
            self.points[i].neighbors = neighbors.len() as i32;

            if (neighbors.len() as i32) < min_pts {
                self.points[i].label = Label::Noise;
                continue;
            }

            cluster_count += 1;
            self.points[i].label = Label::Core;
            self.points[i].id = cluster_count;

            let mut seed = neighbors;
            for &idx in &seed {
                in_seed[idx] = true;
            }

            let mut cursor = 0;
            while cursor < seed.len() {
                let q = seed[cursor];
                cursor += 1;

                match self.points[q].label {
                    Label::Noise => {
                        self.points[q].label = Label::Reachable;
                        self.points[q].id = cluster_count;
                    }
                    Label::Undefined => {
                        self.points[q].label = Label::Reachable;
                        self.points[q].id = cluster_count;

                        let q_neighbors = self.range_query(q, eps);
                        self.points[q].neighbors = q_neighbors.len() as i32;

                        if (q_neighbors.len() as i32) >= min_pts {
                            self.points[q].label = Label::Core;
                            for idx in q_neighbors {
                                if !in_seed[idx] {
                                    in_seed[idx] = true;
                                    seed.push(idx);
                                }
                            }
                        }
                    }
                    Label::Reachable | Label::Core => {}
                }
            }

            for &idx in &seed {
                visitor(&self.points[idx])?;
            }

            for idx in seed {
                in_seed[idx] = false;
            }
        }

        Ok(cluster_count as usize)
    }
}

impl<T> Default for Dbscan<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn infallible<T>(_: &Point<T>) -> Result<(), std::convert::Infallible> {
        Ok(())
    }

    #[test]
    fn three_tight_plus_one_far() {
        let mut db = Dbscan::new();
        db.insert_point(100, 150, 1);
        db.insert_point(140, 200, 2);
        db.insert_point(180, 240, 3);
        db.insert_point(10000, 10050, 4);

        let mut labels = Vec::new();
        let clusters = db
            .cluster(100, 3, |p| {
                labels.push((*p.data(), p.label(), p.id()));
                Ok::<(), std::convert::Infallible>(())
            })
            .unwrap();

        assert_eq!(clusters, 1);
        assert_eq!(labels.len(), 4);

        let far = labels.iter().find(|(d, _, _)| *d == 4).unwrap();
        assert_eq!(far.1, Label::Noise);
        assert_eq!(far.2, 0);

        for d in [1, 2, 3] {
            let (_, label, id) = labels.iter().find(|(x, _, _)| *x == d).unwrap();
            assert_ne!(*label, Label::Noise);
            assert_eq!(*id, 1);
        }
        assert!(labels
            .iter()
            .filter(|(d, _, _)| *d != 4)
            .any(|(_, label, _)| *label == Label::Core));
    }

    #[test]
    fn two_isolated_singletons_are_noise() {
        let mut db = Dbscan::new();
        db.insert_point(0, 10, "a");
        db.insert_point(1000, 1010, "b");

        let mut seen = Vec::new();
        let clusters = db
            .cluster(50, 3, |p| {
                seen.push(p.label());
                Ok::<(), std::convert::Infallible>(())
            })
            .unwrap();

        assert_eq!(clusters, 0);
        assert_eq!(seen, vec![Label::Noise, Label::Noise]);
    }

    #[test]
    fn label_is_never_undefined_on_emission() {
        let mut db = Dbscan::new();
        for i in 0..20 {
            db.insert_point(i * 10, i * 10 + 5, i);
        }
        db.cluster(3, 3, |p| {
            assert_ne!(p.label(), Label::Undefined);
            assert_eq!(p.id() == 0, p.label() == Label::Noise);
            infallible(p)
        })
        .unwrap();
    }

    #[test]
    fn reusable_across_parameter_sweeps() {
        let mut db = Dbscan::new();
        db.insert_point(100, 150, 1);
        db.insert_point(140, 200, 2);
        db.insert_point(180, 240, 3);

        let loose = db.cluster(100, 3, infallible).unwrap();
        assert_eq!(loose, 1);

        let tight = db.cluster(1, 3, infallible).unwrap();
        assert_eq!(tight, 0);
    }

    #[test]
    fn visitor_failure_aborts_and_propagates() {
        let mut db = Dbscan::new();
        db.insert_point(0, 5, 1);
        db.insert_point(1, 6, 2);
        db.insert_point(2, 7, 3);

        let result: Result<usize, &'static str> = db.cluster(10, 3, |_| Err("store exploded"));
        assert_eq!(result, Err("store exploded"));
    }
}
