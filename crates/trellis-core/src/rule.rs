// SPDX-License-Identifier: Apache-2.0
//! Admission filters, rewrite rules, and fixpoint expansion.
use std::collections::BTreeSet;
use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pattern::TriplePattern;
use crate::tuple::RelationalTriple;

/// Admission predicate: a triple may be asserted iff some filter matches
/// it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Pattern an admissible triple must satisfy.
    pub pattern: TriplePattern,
}

impl Filter {
    /// Creates a filter from its pattern.
    #[must_use]
    pub fn new(pattern: TriplePattern) -> Self {
        Self { pattern }
    }

    /// Returns `true` if `triple` satisfies the filter.
    #[must_use]
    pub fn admits(&self, triple: &RelationalTriple) -> bool {
        self.pattern.matches(triple)
    }
}

/// If/then rewrite: a triple matching `when` implies the `then` rewrite of
/// itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Pattern the input triple must satisfy.
    pub when: TriplePattern,
    /// Pattern applied to produce the implied triple.
    pub then: TriplePattern,
}

impl Rule {
    /// Creates a rule from its two patterns.
    #[must_use]
    pub fn new(when: TriplePattern, then: TriplePattern) -> Self {
        Self { when, then }
    }

    /// The implied triple, or `None` when `triple` does not match.
    #[must_use]
    pub fn apply(&self, triple: &RelationalTriple) -> Option<RelationalTriple> {
        self.when
            .matches(triple)
            .then(|| self.then.replace(triple))
    }
}

/// One clause of a compiled relationship schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Clause {
    /// Admission filter.
    Admit(Filter),
    /// Rewrite rule.
    Rewrite(Rule),
}

/// Errors from rewrite expansion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExpandError {
    /// No filter matched the asserted triple; the schema does not even
    /// consider it a legal assertion.
    #[error("no filter admits {0}")]
    NotAdmissible(RelationalTriple),
    /// Saturation produced more tuples than the configured bound allows;
    /// the schema almost certainly contains a productive rewrite cycle.
    #[error("rewrite saturation exceeded the {limit}-tuple bound")]
    SaturationLimitExceeded {
        /// The bound that was exceeded.
        limit: usize,
    },
}

/// An ordered list of clauses compiled from a relationship schema.
///
/// The order carries no semantics — admission is "any filter matches" and
/// saturation is confluent because rules only ever add tuples — but keeping
/// the compiler's output order makes round-trips with schema tooling exact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    clauses: Vec<Clause>,
}

impl RuleSet {
    /// Creates a rule set from clauses in schema order.
    pub fn new(clauses: impl IntoIterator<Item = Clause>) -> Self {
        Self {
            clauses: clauses.into_iter().collect(),
        }
    }

    /// Appends a clause.
    pub fn push(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    /// The clauses in schema order.
    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Returns `true` when the schema has no clauses (and therefore admits
    /// nothing).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Returns `true` if at least one filter matches `triple`.
    #[must_use]
    pub fn admits(&self, triple: &RelationalTriple) -> bool {
        self.clauses
            .iter()
            .any(|clause| matches!(clause, Clause::Admit(filter) if filter.admits(triple)))
    }

    /// The full set of tuples `triple` implies under this schema,
    /// including `triple` itself.
    ///
    /// Saturates a deduplicating worklist to fixpoint: every rule is
    /// applied to every not-yet-processed tuple until nothing new appears.
    /// The result does not depend on processing order. `limit` bounds the
    /// size of the closed set; exceeding it reports
    /// [`ExpandError::SaturationLimitExceeded`] instead of looping on a
    /// schema whose rewrites feed each other forever.
    pub fn expand(
        &self,
        triple: &RelationalTriple,
        limit: usize,
    ) -> Result<BTreeSet<RelationalTriple>, ExpandError> {
        if !self.admits(triple) {
            return Err(ExpandError::NotAdmissible(triple.clone()));
        }
        let mut seen: FxHashSet<RelationalTriple> = FxHashSet::default();
        let mut queue: VecDeque<RelationalTriple> = VecDeque::new();
        seen.insert(triple.clone());
        queue.push_back(triple.clone());
        while let Some(current) = queue.pop_front() {
            for clause in &self.clauses {
                let Clause::Rewrite(rule) = clause else {
                    continue;
                };
                let Some(derived) = rule.apply(&current) else {
                    continue;
                };
                if seen.insert(derived.clone()) {
                    if seen.len() > limit {
                        return Err(ExpandError::SaturationLimitExceeded { limit });
                    }
                    queue.push_back(derived);
                }
            }
        }
        Ok(seen.into_iter().collect())
    }
}

impl FromIterator<Clause> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Clause>>(clauses: I) -> Self {
        Self::new(clauses)
    }
}
