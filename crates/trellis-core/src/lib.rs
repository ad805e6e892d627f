// SPDX-License-Identifier: Apache-2.0
//! trellis-core: Zanzibar-style relationship authorization over a counted
//! reachability index.
//!
//! A compiled relationship schema — admission filters plus if/then rewrite
//! rules — expands each asserted `(subject, relation, object)` tuple into
//! the full set of tuples it implies. Every implied tuple becomes one edge
//! of the counted transitive-closure index in `trellis-graph`, with
//! relations and subject predicates folded into vertex identity. A
//! permission check is then a single O(1) reachability lookup, and
//! retracting an assertion debits exactly the paths it credited, so access
//! that other assertions still support survives revocation.

mod engine_impl;
mod pattern;
mod rule;
pub mod schema;
mod shared;
mod storage;
mod tuple;

/// The authorization engine façade, its tunables, and its errors.
pub use engine_impl::{Engine, EngineConfig, EngineError, DEFAULT_SATURATION_LIMIT};
/// Match-and-substitute patterns over triples.
pub use pattern::{EntityPattern, PatternField, TriplePattern};
/// Schema clauses and fixpoint expansion.
pub use rule::{Clause, ExpandError, Filter, Rule, RuleSet};
/// Readers-writer façade for cross-thread sharing.
pub use shared::SharedEngine;
/// Persistence mirror interface.
pub use storage::{IndexMutation, MutationBatch, NullStorageSink, StorageSink};
/// Relationship data model and index vertices.
pub use tuple::{Entity, Node, Predicate, RelationalTriple, WILDCARD_NAME};

/// Re-exported index primitives for callers that work below the façade.
pub use trellis_graph::{Count, GraphError, MultiSet, ReachabilityIndex};
