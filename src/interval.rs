//! Augmented interval index supporting overlap queries with a visitor callback.
//!
//! Backed by [`bio::data_structures::interval_tree::ArrayBackedIntervalTree`],
//! which is the interval tree this codebase already reaches for elsewhere
//! (see e.g. `strucvars::query::genes`). The tree must be indexed once after
//! all inserts and before the first query; `lookup` takes care of that
//! lazily so callers never have to remember to call it themselves.

use bio::data_structures::interval_tree::ArrayBackedIntervalTree;

/// An interval index over half-open ranges keyed by `[low, high)`, storing an
/// opaque payload per interval and reporting overlaps to a visitor.
pub struct IntervalIndex<T> {
    tree: ArrayBackedIntervalTree<i64, T>,
    indexed: bool,
}

impl<T> IntervalIndex<T> {
    pub fn new() -> Self {
        Self {
            tree: ArrayBackedIntervalTree::new(),
            indexed: false,
        }
    }

    /// Insert the closed interval `[low, high]` with the given payload.
    ///
    /// Must not be called again after `lookup` has been invoked once.
    pub fn insert(&mut self, low: i64, high: i64, payload: T) {
        debug_assert!(low <= high, "low must not exceed high");
        debug_assert!(!self.indexed, "cannot insert after the index has been built");
        self.tree.insert(low..(high + 1), payload);
    }

    /// Invoke `visitor` once per stored interval overlapping the closed
    /// range `[qlow, qhigh]`, returning the number of invocations.
    pub fn lookup(&mut self, qlow: i64, qhigh: i64, mut visitor: impl FnMut(i64, i64, &T)) -> usize {
        if !self.indexed {
            self.tree.index();
            self.indexed = true;
        }

        let mut count = 0;
        for entry in self.tree.find(qlow..(qhigh + 1)) {
            let range = entry.interval();
            visitor(range.start, range.end - 1, entry.data());
            count += 1;
        }
        count
    }
}

impl<T> Default for IntervalIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}
