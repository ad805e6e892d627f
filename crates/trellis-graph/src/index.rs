// SPDX-License-Identifier: Apache-2.0
//! Incrementally maintained counted transitive closure over a DAG multigraph.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use thiserror::Error;

use crate::multiset::{Count, MultiSet};

/// Bounds required of a vertex key in the index.
///
/// Blanket-implemented; callers never implement this directly. `Ord` drives
/// the deterministic container layout, `Debug` the error messages.
pub trait NodeKey: Clone + Ord + fmt::Debug {}

impl<T: Clone + Ord + fmt::Debug> NodeKey for T {}

/// Domain errors for index mutations.
///
/// Every precondition is validated before the first mutation, so a returned
/// error guarantees the index is unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError<N: NodeKey> {
    /// The two endpoints of an edge must be distinct.
    #[error("self-edge rejected at {0:?}")]
    SelfEdge(N),
    /// The edge would close a directed cycle.
    #[error("{from:?} is reachable from {to:?}, adding this edge would create a cycle")]
    CycleWouldBeCreated {
        /// Source endpoint of the rejected edge.
        from: N,
        /// Target endpoint of the rejected edge.
        to: N,
    },
    /// No direct edge with positive multiplicity exists between the
    /// endpoints.
    #[error("{from:?} has no direct edge to {to:?}, cannot remove nonexistent edge")]
    EdgeNotFound {
        /// Source endpoint of the missing edge.
        from: N,
        /// Target endpoint of the missing edge.
        to: N,
    },
    /// The node has no incident edge and is therefore not in the index.
    #[error("node {0:?} is not present in the index")]
    NodeNotFound(N),
}

/// Signed direction of a closure update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    Credit,
    Debit,
}

/// Counted transitive-closure index over a directed acyclic multigraph.
///
/// For every ordered pair of vertices the index tracks the number of
/// distinct directed paths between them (direct edges count as length-1
/// paths), which is what makes online deletion sound: removing one of
/// several parallel edges debits path counts without severing reachability
/// that still holds through other routes. Acyclicity is enforced
/// structurally; an edge whose insertion would close a cycle is rejected
/// up front with an O(1) lookup.
///
/// Reachability queries are O(1) hash/tree lookups against the inverse
/// support map. Mutations cost O(|B(u)|·|F(v)|) where `B` and `F` are the
/// backward and forward closure neighborhoods of the spliced edge; dense
/// closures make writes expensive, never incorrect.
///
/// Vertices exist only while an incident direct edge does: they are created
/// implicitly on first insertion and vanish from every container when their
/// last incident edge is removed. Path counts saturate at `u64::MAX` (see
/// [`Count`]).
///
/// Two indexes compare equal exactly when they hold the same direct-edge
/// multiset, which makes the state a pure function of the multiset of
/// surviving insertions, independent of operation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachabilityIndex<N: NodeKey> {
    /// Direct edge multiplicities (the multigraph itself).
    direct: MultiSet<(N, N)>,
    /// For each source, the count of distinct paths to every reachable
    /// vertex.
    paths_fwd: BTreeMap<N, MultiSet<N>>,
    /// Inverse support: for each target, the set of sources with at least
    /// one path to it.
    paths_inv: BTreeMap<N, BTreeSet<N>>,
    /// Incident direct-edge count per vertex (multiplicity included).
    ref_counts: MultiSet<N>,
}

impl<N: NodeKey> ReachabilityIndex<N> {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            direct: MultiSet::new(),
            paths_fwd: BTreeMap::new(),
            paths_inv: BTreeMap::new(),
            ref_counts: MultiSet::new(),
        }
    }

    // ---
    // Queries
    // ---

    /// Returns `true` if at least one directed path leads from `from` to
    /// `to`.
    ///
    /// Read-only and O(log n); answered from the inverse support map.
    #[must_use]
    pub fn is_reachable(&self, from: &N, to: &N) -> bool {
        self.paths_inv
            .get(to)
            .is_some_and(|sources| sources.contains(from))
    }

    /// Number of distinct directed paths from `from` to `to` (zero when
    /// unreachable).
    #[must_use]
    pub fn path_count(&self, from: &N, to: &N) -> Count {
        self.paths_fwd
            .get(from)
            .map_or(0, |row| row.get(to))
    }

    /// Multiplicity of the direct edge `from -> to` (zero when absent).
    #[must_use]
    pub fn direct_count(&self, from: &N, to: &N) -> Count {
        self.direct.get(&(from.clone(), to.clone()))
    }

    /// Iterates over every vertex reachable from `from`, in key order.
    pub fn reachable_from<'a>(&'a self, from: &N) -> impl Iterator<Item = &'a N> {
        self.paths_fwd
            .get(from)
            .into_iter()
            .flat_map(MultiSet::keys)
    }

    /// Iterates over every vertex that reaches `to`, in key order.
    pub fn reaching<'a>(&'a self, to: &N) -> impl Iterator<Item = &'a N> {
        self.paths_inv.get(to).into_iter().flatten()
    }

    /// Returns `true` if `node` has at least one incident direct edge.
    #[must_use]
    pub fn contains_node(&self, node: &N) -> bool {
        self.ref_counts.contains(node)
    }

    /// Number of direct edges incident on `node`, multiplicity included.
    #[must_use]
    pub fn incident_edge_count(&self, node: &N) -> Count {
        self.ref_counts.get(node)
    }

    /// Iterates over every vertex present in the index, in key order.
    pub fn nodes(&self) -> impl Iterator<Item = &N> + '_ {
        self.ref_counts.keys()
    }

    /// Number of vertices with at least one incident direct edge.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.ref_counts.len()
    }

    /// Iterates over distinct direct edges with their multiplicities.
    pub fn direct_edges(&self) -> impl Iterator<Item = (&(N, N), Count)> + '_ {
        self.direct.iter()
    }

    /// Number of distinct direct edges (parallel copies counted once).
    #[must_use]
    pub fn direct_edge_count(&self) -> usize {
        self.direct.len()
    }

    /// Returns `true` if the index holds no edges (and therefore no
    /// vertices).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.direct.is_empty()
    }

    // ---
    // Mutations
    // ---

    /// Inserts one copy of the direct edge `from -> to`.
    ///
    /// Parallel copies are allowed and only raise counts; the closure's
    /// reachable *set* is unchanged by a re-insertion. Fails with
    /// [`GraphError::SelfEdge`] when the endpoints coincide and
    /// [`GraphError::CycleWouldBeCreated`] when `from` is already reachable
    /// from `to`; in both cases the index is untouched.
    pub fn add_edge(&mut self, from: N, to: N) -> Result<(), GraphError<N>> {
        if from == to {
            return Err(GraphError::SelfEdge(from));
        }
        if self.is_reachable(&to, &from) {
            return Err(GraphError::CycleWouldBeCreated { from, to });
        }
        self.shift_direct_edge(&from, &to, Sign::Credit);
        self.debug_check_invariants();
        Ok(())
    }

    /// Removes one copy of the direct edge `from -> to`.
    ///
    /// Only the paths this copy participated in are debited; reachability
    /// that survives through parallel copies or longer routes is preserved.
    /// Fails with [`GraphError::SelfEdge`] or [`GraphError::EdgeNotFound`]
    /// without touching the index.
    pub fn remove_edge(&mut self, from: &N, to: &N) -> Result<(), GraphError<N>> {
        if from == to {
            return Err(GraphError::SelfEdge(from.clone()));
        }
        if self.direct_count(from, to) == 0 {
            return Err(GraphError::EdgeNotFound {
                from: from.clone(),
                to: to.clone(),
            });
        }
        self.shift_direct_edge(from, to, Sign::Debit);
        self.debug_check_invariants();
        Ok(())
    }

    /// Removes every direct edge incident on `node` and debits every path
    /// into, out of, or through it.
    ///
    /// This removes one *vertex*; higher layers that fold several vertices
    /// into one logical entity remove each of them in turn. Fails with
    /// [`GraphError::NodeNotFound`] when the vertex has no incident edge.
    pub fn remove_node(&mut self, node: &N) -> Result<(), GraphError<N>> {
        if !self.contains_node(node) {
            return Err(GraphError::NodeNotFound(node.clone()));
        }
        self.shift_direct_edge(node, node, Sign::Debit);
        self.debug_check_invariants();
        Ok(())
    }

    // ---
    // Closure maintenance
    // ---

    /// Splices one direct edge in or out of the closure.
    ///
    /// The `from == to` instance is vertex removal: every incident direct
    /// edge is dropped wholesale and the same product delta then debits all
    /// paths touching the vertex.
    ///
    /// Ordering is load-bearing. On credit the closure delta lands before
    /// the direct multiplicity rises; on debit the direct multiplicity (and
    /// the edge's own length-1 path) falls first. Either way the closure
    /// never transiently under-counts a recorded direct edge.
    fn shift_direct_edge(&mut self, from: &N, to: &N, sign: Sign) {
        let vertex_removal = from == to;

        if !vertex_removal && sign == Sign::Debit {
            self.direct.sub(&(from.clone(), to.clone()), 1);
            self.ref_counts.sub(from, 1);
            self.ref_counts.sub(to, 1);
            self.shift_paths(from, to, 1, Sign::Debit);
        }

        if vertex_removal {
            debug_assert_eq!(sign, Sign::Debit, "vertices are only ever spliced out");
            let incident: Vec<((N, N), Count)> = self
                .direct
                .iter()
                .filter(|((a, b), _)| a == from || b == from)
                .map(|(edge, count)| (edge.clone(), count))
                .collect();
            for ((a, b), count) in incident {
                self.direct.remove(&(a.clone(), b.clone()));
                self.ref_counts.sub(&a, count);
                self.ref_counts.sub(&b, count);
            }
        }

        // Snapshot both closure neighborhoods before mutating path counts:
        // B = everything that reaches `from`, F = everything `to` reaches.
        let back = self.reachable_backwards(from);
        let fwd = self.reachable_forwards(to);
        debug_assert_eq!(back.get(to), 0, "cycle precondition violated");
        debug_assert_eq!(fwd.get(from), 0, "cycle precondition violated");

        // Every x ⇝ from -> to ⇝ y combination, weighted by the product of
        // the participating path counts.
        for (x, x_count) in back.iter() {
            for (y, y_count) in fwd.iter() {
                self.shift_paths(x, y, x_count.saturating_mul(y_count), sign);
            }
        }
        // from ⇝ y for everything beyond `to`.
        for (y, y_count) in fwd.iter() {
            self.shift_paths(from, y, y_count, sign);
        }
        // x ⇝ to for everything that reaches `from`.
        for (x, x_count) in back.iter() {
            self.shift_paths(x, to, x_count, sign);
        }

        if !vertex_removal && sign == Sign::Credit {
            self.shift_paths(from, to, 1, Sign::Credit);
            self.direct.add((from.clone(), to.clone()), 1);
            self.ref_counts.add(from.clone(), 1);
            self.ref_counts.add(to.clone(), 1);
        }
    }

    /// Credits or debits `amount` paths `from ⇝ to`, keeping the inverse
    /// support map in lockstep as the count crosses zero.
    fn shift_paths(&mut self, from: &N, to: &N, amount: Count, sign: Sign) {
        if amount == 0 {
            return;
        }
        debug_assert_ne!(from, to, "a self-path delta would break acyclicity");
        match sign {
            Sign::Credit => {
                self.paths_fwd
                    .entry(from.clone())
                    .or_default()
                    .add(to.clone(), amount);
                self.paths_inv
                    .entry(to.clone())
                    .or_default()
                    .insert(from.clone());
            }
            Sign::Debit => {
                let Some(row) = self.paths_fwd.get_mut(from) else {
                    unreachable!("closure row missing while debiting {amount} paths")
                };
                let remaining = row.sub(to, amount);
                if row.is_empty() {
                    self.paths_fwd.remove(from);
                }
                if remaining == 0 {
                    let Some(sources) = self.paths_inv.get_mut(to) else {
                        unreachable!("inverse support missing while debiting paths")
                    };
                    sources.remove(from);
                    if sources.is_empty() {
                        self.paths_inv.remove(to);
                    }
                }
            }
        }
    }

    /// Path counts of everything that reaches `node` (the backward closure
    /// neighborhood, keyed by source).
    fn reachable_backwards(&self, node: &N) -> MultiSet<N> {
        let mut counts = MultiSet::new();
        if let Some(sources) = self.paths_inv.get(node) {
            for source in sources {
                let count = self
                    .paths_fwd
                    .get(source)
                    .map_or(0, |row| row.get(node));
                debug_assert!(count > 0, "inverse support entry without forward paths");
                counts.insert(source.clone(), count);
            }
        }
        counts
    }

    /// Path counts of everything reachable from `node` (the forward closure
    /// neighborhood, keyed by target).
    fn reachable_forwards(&self, node: &N) -> MultiSet<N> {
        self.paths_fwd.get(node).cloned().unwrap_or_default()
    }

    // ---
    // Invariants
    // ---

    /// Verifies the structural invariants of the index, aborting on the
    /// first violation.
    ///
    /// Checked automatically after every mutation in debug builds; kept
    /// public so randomized tests can interrogate release-mode state too.
    ///
    /// # Panics
    ///
    /// Panics when any invariant fails: a self-path, a forward/inverse
    /// mismatch, a non-positive stored count, a direct edge the closure
    /// under-counts, or an incident-edge tally out of sync with the direct
    /// edge multiset. A violation means the index is corrupt and must not
    /// continue serving queries.
    pub fn assert_invariants(&self) {
        for (from, row) in &self.paths_fwd {
            assert!(!row.is_empty(), "empty closure row for {from:?}");
            assert_eq!(row.get(from), 0, "self-path recorded at {from:?}");
            for (to, count) in row.iter() {
                assert!(count > 0, "zero path count {from:?} -> {to:?}");
                assert!(
                    self.paths_inv
                        .get(to)
                        .is_some_and(|sources| sources.contains(from)),
                    "forward path {from:?} -> {to:?} missing inverse support"
                );
            }
        }
        for (to, sources) in &self.paths_inv {
            assert!(!sources.is_empty(), "empty inverse support for {to:?}");
            for from in sources {
                assert!(
                    self.path_count(from, to) > 0,
                    "inverse support {from:?} -> {to:?} without forward paths"
                );
            }
        }
        let mut recounted = MultiSet::new();
        for ((from, to), count) in self.direct.iter() {
            assert!(count > 0, "zero direct multiplicity {from:?} -> {to:?}");
            assert!(
                self.path_count(from, to) >= count,
                "direct edge {from:?} -> {to:?} under-counted by the closure"
            );
            recounted.add(from.clone(), count);
            recounted.add(to.clone(), count);
        }
        assert!(
            recounted == self.ref_counts,
            "incident-edge tally out of sync with the direct edge multiset"
        );
    }

    fn debug_check_invariants(&self) {
        if cfg!(debug_assertions) {
            self.assert_invariants();
        }
    }
}

impl<N: NodeKey> Default for ReachabilityIndex<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn self_edges_are_rejected() {
        let mut index = ReachabilityIndex::new();
        assert_eq!(index.add_edge("a", "a"), Err(GraphError::SelfEdge("a")));
        assert!(index.is_empty());
    }

    #[test]
    fn parallel_edges_raise_counts_not_reachability() {
        let mut index = ReachabilityIndex::new();
        index.add_edge("a", "b").unwrap();
        index.add_edge("a", "b").unwrap();
        assert_eq!(index.direct_count(&"a", &"b"), 2);
        assert_eq!(index.path_count(&"a", &"b"), 2);
        assert_eq!(index.reachable_from(&"a").count(), 1);
    }

    #[test]
    fn removing_an_absent_edge_fails_cleanly() {
        let mut index = ReachabilityIndex::new();
        index.add_edge("a", "b").unwrap();
        let before = index.clone();
        assert_eq!(
            index.remove_edge(&"b", &"a"),
            Err(GraphError::EdgeNotFound { from: "b", to: "a" })
        );
        assert_eq!(index, before);
    }

    #[test]
    fn vertex_removal_requires_presence() {
        let mut index: ReachabilityIndex<&str> = ReachabilityIndex::new();
        assert_eq!(
            index.remove_node(&"ghost"),
            Err(GraphError::NodeNotFound("ghost"))
        );
    }

    #[test]
    fn vertex_removal_clears_paths_through_it() {
        let mut index = ReachabilityIndex::new();
        index.add_edge("a", "b").unwrap();
        index.add_edge("b", "c").unwrap();
        index.add_edge("a", "c").unwrap();
        index.remove_node(&"b").unwrap();
        assert!(!index.contains_node(&"b"));
        assert_eq!(index.path_count(&"a", &"c"), 1);
        assert!(index.is_reachable(&"a", &"c"));
        index.assert_invariants();
    }
}
