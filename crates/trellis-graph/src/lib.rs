// SPDX-License-Identifier: Apache-2.0
//! trellis-graph: counted transitive-closure index over a DAG multigraph.
//!
//! The index answers "is `v` reachable from `u`?" in O(1) while staying
//! correct under online edge insertion and deletion. The trick is counting:
//! for every ordered pair it tracks how many distinct directed paths
//! connect the two vertices, so deleting one of several parallel routes
//! debits counts without severing reachability the other routes still
//! support. Acyclicity is enforced at insertion time.
//!
//! The crate is deliberately free of I/O, logging, and serialization; it is
//! a pure data structure over caller-supplied vertex keys.

mod index;
mod multiset;

/// Reachability index, its vertex-key bound, and its domain errors.
pub use index::{GraphError, NodeKey, ReachabilityIndex};
/// Counting container used for edge multiplicities and path counts.
pub use multiset::{Count, MultiSet};
