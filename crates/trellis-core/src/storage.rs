// SPDX-License-Identifier: Apache-2.0
//! Persistence mirror interface.
//!
//! The engine can mirror its state into an external store (a relational
//! `node`/`edge` pair of tables, a changelog, anything). Implementations
//! live outside this crate; the contract here is only the shape of one
//! transaction: every successful public mutation hands the mirror a single
//! [`MutationBatch`], already in application order, and failed calls hand
//! it nothing.

use serde::{Deserialize, Serialize};

use crate::tuple::{Node, RelationalTriple};

/// One element of a mirror transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexMutation {
    /// A direct edge gained one copy.
    EdgeAdded {
        /// Source vertex of the edge.
        from: Node,
        /// Target vertex of the edge.
        to: Node,
    },
    /// A direct edge lost one copy.
    EdgeRemoved {
        /// Source vertex of the edge.
        from: Node,
        /// Target vertex of the edge.
        to: Node,
    },
    /// A vertex was dropped along with every incident edge.
    NodeRemoved {
        /// The dropped vertex.
        node: Node,
    },
    /// A caller assertion was recorded.
    TripleAsserted {
        /// The recorded assertion.
        triple: RelationalTriple,
    },
    /// A caller assertion was retracted.
    TripleRetracted {
        /// The retracted assertion.
        triple: RelationalTriple,
    },
}

/// All mutations of one successful public engine call, in application
/// order.
///
/// Mirrors should apply a batch atomically; the engine guarantees it never
/// emits a batch for a call that failed partway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationBatch {
    mutations: Vec<IndexMutation>,
}

impl MutationBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one mutation.
    pub fn push(&mut self, mutation: IndexMutation) {
        self.mutations.push(mutation);
    }

    /// The mutations in application order.
    #[must_use]
    pub fn mutations(&self) -> &[IndexMutation] {
        &self.mutations
    }

    /// Number of mutations in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Returns `true` for a batch with no mutations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

/// Write side of a persistence mirror.
///
/// `commit` receives one transaction's worth of mutations. Mirrors must not
/// fail the engine: persistence problems are theirs to retry or report out
/// of band, which is why the method returns nothing.
pub trait StorageSink: Send + Sync {
    /// Applies one transaction.
    fn commit(&mut self, batch: &MutationBatch);
}

/// Mirror that drops every batch. The default when no mirror is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStorageSink;

impl StorageSink for NullStorageSink {
    fn commit(&mut self, _batch: &MutationBatch) {}
}
