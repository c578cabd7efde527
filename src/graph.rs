//! A directed, optionally multi-edge graph keyed by opaque vertex identity.
//!
//! Forward (`adjacent`) and reverse (`parent`) adjacency lists are kept in
//! sync on every edge insert/remove. Vertex identity is whatever the
//! vertex type's own `Eq`/`Hash` implementation says it is — in this
//! codebase vertices are almost always small, cheaply-cloned ids (alignment
//! ids, cluster ids), so the graph simply owns its own copies rather than
//! threading through a caller-supplied destructor as a C implementation
//! would need to.

use std::hash::Hash;

use indexmap::IndexMap;

struct AdjList<V> {
    adjacent: Vec<V>,
    parent: Vec<V>,
}

/// A directed graph over vertices of type `V`, iterating vertices and
/// adjacency lists in insertion order.
pub struct Graph<V> {
    adjlists: IndexMap<V, AdjList<V>>,
    ecount: usize,
}

impl<V: Clone + Eq + Hash> Graph<V> {
    pub fn new() -> Self {
        Self {
            adjlists: IndexMap::new(),
            ecount: 0,
        }
    }

    pub fn vcount(&self) -> usize {
        self.adjlists.len()
    }

    pub fn ecount(&self) -> usize {
        self.ecount
    }

    /// Iterate vertices in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = &V> {
        self.adjlists.keys()
    }

    pub fn contains_vertex(&self, v: &V) -> bool {
        self.adjlists.contains_key(v)
    }

    /// Insert `v` if not already present. Returns whether it was inserted.
    pub fn ins_vertex(&mut self, v: V) -> bool {
        if self.adjlists.contains_key(&v) {
            return false;
        }
        self.adjlists.insert(
            v,
            AdjList {
                adjacent: Vec::new(),
                parent: Vec::new(),
            },
        );
        true
    }

    fn ins_edge_impl(&mut self, u: &V, v: &V, is_multi: bool) -> bool {
        if !self.adjlists.contains_key(u) || !self.adjlists.contains_key(v) {
            return false;
        }

        if !is_multi && self.adjlists[u].adjacent.contains(v) {
            return false;
        }

        self.adjlists.get_mut(u).unwrap().adjacent.push(v.clone());
        self.adjlists.get_mut(v).unwrap().parent.push(u.clone());
        self.ecount += 1;

        true
    }

    /// Insert the edge `(u, v)`, rejecting it if it already exists.
    pub fn ins_edge(&mut self, u: &V, v: &V) -> bool {
        self.ins_edge_impl(u, v, false)
    }

    /// Insert the edge `(u, v)`, allowing parallel edges between the same pair.
    pub fn ins_multi_edge(&mut self, u: &V, v: &V) -> bool {
        self.ins_edge_impl(u, v, true)
    }

    pub fn is_adjacent(&self, u: &V, v: &V) -> bool {
        self.adjlists
            .get(u)
            .map(|adj| adj.adjacent.contains(v))
            .unwrap_or(false)
    }

    pub fn adjacent(&self, v: &V) -> &[V] {
        self.adjlists
            .get(v)
            .map(|adj| adj.adjacent.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, v: &V) -> &[V] {
        self.adjlists
            .get(v)
            .map(|adj| adj.parent.as_slice())
            .unwrap_or(&[])
    }

    /// Remove `v` if it has no incoming or outgoing edges, returning the
    /// owned vertex on success.
    pub fn rem_vertex(&mut self, v: &V) -> Option<V> {
        let adj = self.adjlists.get(v)?;
        if !adj.adjacent.is_empty() || !adj.parent.is_empty() {
            return None;
        }
        self.adjlists.shift_remove_entry(v).map(|(v, _)| v)
    }

    /// Remove the first `(u, v)` edge. Returns whether one was found.
    pub fn rem_edge(&mut self, u: &V, v: &V) -> bool {
        let found_forward = self
            .adjlists
            .get(u)
            .and_then(|adj| adj.adjacent.iter().position(|x| x == v));
        let found_backward = self
            .adjlists
            .get(v)
            .and_then(|adj| adj.parent.iter().position(|x| x == u));

        match (found_forward, found_backward) {
            (Some(fi), Some(bi)) => {
                self.adjlists.get_mut(u).unwrap().adjacent.remove(fi);
                self.adjlists.get_mut(v).unwrap().parent.remove(bi);
                self.ecount -= 1;
                true
            }
            _ => false,
        }
    }
}

impl<V: Clone + Eq + Hash> Default for Graph<V> {
    fn default() -> Self {
        Self::new()
    }
}
