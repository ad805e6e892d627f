// SPDX-License-Identifier: Apache-2.0
//! The authorization engine façade.
use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;
use tracing::debug;

use trellis_graph::{GraphError, ReachabilityIndex};

use crate::rule::{ExpandError, RuleSet};
use crate::storage::{IndexMutation, MutationBatch, NullStorageSink, StorageSink};
use crate::tuple::{Entity, Node, RelationalTriple};

/// Default bound on the number of tuples one assertion may imply.
pub const DEFAULT_SATURATION_LIMIT: usize = 1000;

/// Engine tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Hard cap on the closed tuple set produced by expanding one
    /// assertion. Exceeding it fails the call with
    /// [`ExpandError::SaturationLimitExceeded`] instead of chasing a
    /// runaway schema.
    pub saturation_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            saturation_limit: DEFAULT_SATURATION_LIMIT,
        }
    }
}

/// Errors emitted by the engine.
///
/// Every variant is a caller-visible condition reported before or instead
/// of mutating state; internal invariant violations abort rather than
/// surface here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The tuple is already recorded; re-asserting it is almost always a
    /// caller race.
    #[error("tuple already asserted: {0}")]
    Duplicate(RelationalTriple),
    /// The tuple was never recorded, so there is nothing to delete.
    #[error("tuple was never asserted: {0}")]
    NotFound(RelationalTriple),
    /// The entity has no vertex in the index and no explicit declaration.
    #[error("entity {0} is not present")]
    EntityNotFound(Entity),
    /// Admission or saturation failure from the rewrite layer.
    #[error(transparent)]
    Schema(#[from] ExpandError),
    /// Domain error from the reachability index.
    #[error(transparent)]
    Graph(#[from] GraphError<Node>),
    /// The shared engine lock was poisoned by a panicked writer.
    #[error("engine lock poisoned by a panicked writer")]
    Poisoned,
}

/// Relationship authorization engine.
///
/// Compiled schema in, relationship tuples in and out. A `write` expands
/// the asserted tuple through the schema's rewrite rules and inserts every
/// implied tuple as an edge of the counted reachability index; a `check`
/// is then a single closure-membership lookup. `delete` debits exactly
/// what the matching `write` credited, so revocation never severs access
/// that other assertions still support.
///
/// All methods run to completion on the calling thread; wrap the engine in
/// [`crate::SharedEngine`] for a readers-writer discipline across threads.
pub struct Engine {
    rules: RuleSet,
    config: EngineConfig,
    index: ReachabilityIndex<Node>,
    asserted: BTreeSet<RelationalTriple>,
    explicit_nodes: BTreeSet<Node>,
    sink: Box<dyn StorageSink>,
}

impl Engine {
    /// Creates an engine with default tunables and no persistence mirror.
    #[must_use]
    pub fn new(rules: RuleSet) -> Self {
        Self::with_config(rules, EngineConfig::default())
    }

    /// Creates an engine with explicit tunables and no persistence mirror.
    #[must_use]
    pub fn with_config(rules: RuleSet, config: EngineConfig) -> Self {
        Self::with_storage(rules, config, Box::new(NullStorageSink))
    }

    /// Creates an engine mirrored into `sink`.
    #[must_use]
    pub fn with_storage(
        rules: RuleSet,
        config: EngineConfig,
        sink: Box<dyn StorageSink>,
    ) -> Self {
        Self {
            rules,
            config,
            index: ReachabilityIndex::new(),
            asserted: BTreeSet::new(),
            explicit_nodes: BTreeSet::new(),
            sink,
        }
    }

    /// The compiled schema this engine enforces.
    #[must_use]
    pub fn rule_set(&self) -> &RuleSet {
        &self.rules
    }

    /// The engine's tunables.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Read access to the underlying reachability index.
    #[must_use]
    pub fn index(&self) -> &ReachabilityIndex<Node> {
        &self.index
    }

    /// Iterates over recorded assertions in canonical order.
    pub fn triples(&self) -> impl Iterator<Item = &RelationalTriple> + '_ {
        self.asserted.iter()
    }

    // ---
    // Mutations
    // ---

    /// Records `triple` and inserts every tuple it implies into the index.
    ///
    /// Fails without any state change on a duplicate assertion, an
    /// inadmissible tuple, a saturation overrun, or an index rejection
    /// (self-edge or cycle); in the index case the already-inserted prefix
    /// of the batch is rolled back in reverse order first.
    pub fn write(&mut self, triple: RelationalTriple) -> Result<(), EngineError> {
        if self.asserted.contains(&triple) {
            return Err(EngineError::Duplicate(triple));
        }
        let implied = self.rules.expand(&triple, self.config.saturation_limit)?;

        let mut batch = MutationBatch::new();
        let mut inserted: Vec<(Node, Node)> = Vec::new();
        for tuple in &implied {
            let from = tuple.source_node();
            let to = tuple.target_node();
            if let Err(error) = self.index.add_edge(from.clone(), to.clone()) {
                self.roll_back_inserts(&inserted);
                return Err(error.into());
            }
            batch.push(IndexMutation::EdgeAdded {
                from: from.clone(),
                to: to.clone(),
            });
            inserted.push((from, to));
        }

        self.asserted.insert(triple.clone());
        batch.push(IndexMutation::TripleAsserted {
            triple: triple.clone(),
        });
        debug!(%triple, implied = implied.len(), "asserted relationship tuple");
        self.sink.commit(&batch);
        Ok(())
    }

    /// Retracts `triple` and removes every tuple it implies from the
    /// index.
    ///
    /// The expansion is recomputed, so a delete debits exactly the edges
    /// the matching write credited. Fails without any state change when
    /// the tuple was never asserted.
    pub fn delete(&mut self, triple: &RelationalTriple) -> Result<(), EngineError> {
        if !self.asserted.contains(triple) {
            return Err(EngineError::NotFound(triple.clone()));
        }
        let implied = self.rules.expand(triple, self.config.saturation_limit)?;

        let mut batch = MutationBatch::new();
        let mut removed: Vec<(Node, Node)> = Vec::new();
        for tuple in &implied {
            let from = tuple.source_node();
            let to = tuple.target_node();
            if let Err(error) = self.index.remove_edge(&from, &to) {
                self.roll_back_removals(&removed);
                return Err(error.into());
            }
            batch.push(IndexMutation::EdgeRemoved {
                from: from.clone(),
                to: to.clone(),
            });
            removed.push((from, to));
        }

        self.asserted.remove(triple);
        batch.push(IndexMutation::TripleRetracted {
            triple: triple.clone(),
        });
        debug!(%triple, implied = implied.len(), "retracted relationship tuple");
        self.sink.commit(&batch);
        Ok(())
    }

    /// Removes every vertex of `entity` (all facets) from the index and
    /// retracts every recorded assertion that mentions the entity.
    ///
    /// Returns the number of vertices removed. This is entity removal;
    /// single-vertex removal is an index-level operation
    /// ([`ReachabilityIndex::remove_node`]).
    pub fn remove_entity(&mut self, entity: &Entity) -> Result<usize, EngineError> {
        let victims: Vec<Node> = self
            .index
            .nodes()
            .filter(|node| node.is_of(entity))
            .cloned()
            .collect();
        let declared = self
            .explicit_nodes
            .iter()
            .any(|node| node.is_of(entity));
        if victims.is_empty() && !declared {
            return Err(EngineError::EntityNotFound(entity.clone()));
        }

        let mut batch = MutationBatch::new();
        for node in &victims {
            // Earlier removals may have already collected this facet (its
            // only edges linked two facets of the same entity).
            if !self.index.contains_node(node) {
                continue;
            }
            self.index.remove_node(node)?;
            batch.push(IndexMutation::NodeRemoved { node: node.clone() });
        }

        let dropped: Vec<RelationalTriple> = self
            .asserted
            .iter()
            .filter(|t| t.subject == *entity || t.object == *entity)
            .cloned()
            .collect();
        for triple in dropped {
            self.asserted.remove(&triple);
            batch.push(IndexMutation::TripleRetracted { triple });
        }
        self.explicit_nodes.retain(|node| !node.is_of(entity));

        debug!(%entity, vertices = victims.len(), "removed entity");
        self.sink.commit(&batch);
        Ok(victims.len())
    }

    /// Declares a vertex explicitly.
    ///
    /// Implicit vertices are garbage the moment their incident-edge count
    /// reaches zero; declared vertices are reported as present (and kept
    /// by mirrors) even with no edges.
    pub fn declare_node(&mut self, node: Node) {
        self.explicit_nodes.insert(node);
    }

    /// Withdraws an explicit declaration. Returns `true` if it existed.
    pub fn retract_node(&mut self, node: &Node) -> bool {
        self.explicit_nodes.remove(node)
    }

    // ---
    // Queries
    // ---

    /// Returns `true` if the schema-expanded state grants `triple`.
    ///
    /// A pure closure-membership lookup; never mutates, never consults the
    /// rewrite rules.
    #[must_use]
    pub fn check(&self, triple: &RelationalTriple) -> bool {
        self.index
            .is_reachable(&triple.source_node(), &triple.target_node())
    }

    /// The full set of tuples `triple` would imply, sorted. Debugging aid.
    pub fn expand(
        &self,
        triple: &RelationalTriple,
    ) -> Result<Vec<RelationalTriple>, EngineError> {
        Ok(self
            .rules
            .expand(triple, self.config.saturation_limit)?
            .into_iter()
            .collect())
    }

    /// Every vertex reachable from `node`, sorted.
    #[must_use]
    pub fn list_reachable(&self, node: &Node) -> Vec<Node> {
        self.index.reachable_from(node).cloned().collect()
    }

    /// Every vertex that reaches `node`, sorted.
    #[must_use]
    pub fn list_reverse(&self, node: &Node) -> Vec<Node> {
        self.index.reaching(node).cloned().collect()
    }

    /// Returns `true` if `node` is declared or has incident edges.
    #[must_use]
    pub fn contains_node(&self, node: &Node) -> bool {
        self.explicit_nodes.contains(node) || self.index.contains_node(node)
    }

    // ---
    // Rollback
    // ---

    /// Removes a just-inserted prefix, newest first. Infallible by
    /// construction: each edge was inserted moments ago and nothing else
    /// ran in between.
    fn roll_back_inserts(&mut self, inserted: &[(Node, Node)]) {
        for (from, to) in inserted.iter().rev() {
            if self.index.remove_edge(from, to).is_err() {
                unreachable!("rollback of a fresh edge cannot fail")
            }
        }
    }

    /// Re-inserts a just-removed prefix, newest first. Infallible for the
    /// symmetric reason: each edge existed moments ago, so re-adding it
    /// cannot close a cycle.
    fn roll_back_removals(&mut self, removed: &[(Node, Node)]) {
        for (from, to) in removed.iter().rev() {
            if self.index.add_edge(from.clone(), to.clone()).is_err() {
                unreachable!("rollback of a fresh removal cannot fail")
            }
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("asserted", &self.asserted.len())
            .field("vertices", &self.index.node_count())
            .finish_non_exhaustive()
    }
}
