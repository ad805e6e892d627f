// SPDX-License-Identifier: Apache-2.0
//! Programmatic construction of compiled schemas.
//!
//! A textual schema language and its parser are external collaborators;
//! their output is a [`RuleSet`]. This module builds the same clause lists
//! by hand for the common OpenFGA-style forms: direct type restrictions
//! (`[user]`), userset restrictions (`[group#member]`), public-access
//! wildcards (`[user:*]`), and computed-userset implications (`define
//! reader: ... or writer`).
//!
//! Hierarchy joins (`viewer from parent`) need no rewrite clause at all in
//! this system: a userset subject becomes its own index vertex, and the
//! reachability closure performs the join transitively.

use crate::pattern::TriplePattern;
use crate::rule::{Clause, Filter, Rule, RuleSet};
use crate::tuple::{Predicate, WILDCARD_NAME};

/// Accumulates schema clauses and finishes into a [`RuleSet`].
///
/// ```
/// use trellis_core::schema::SchemaBuilder;
///
/// let rules = SchemaBuilder::new()
///     .allow("document", "reader", "user")
///     .allow("document", "writer", "user")
///     .implies("document", "writer", "reader")
///     .build();
/// assert_eq!(rules.clauses().len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    clauses: Vec<Clause>,
}

impl SchemaBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct type restriction: subjects of `subject_ty` (themselves, not a
    /// userset) may hold `relation` on `object_ty` objects. The `[user]`
    /// form.
    #[must_use]
    pub fn allow(
        mut self,
        object_ty: impl Into<String>,
        relation: impl Into<String>,
        subject_ty: impl Into<String>,
    ) -> Self {
        self.clauses.push(Clause::Admit(Filter::new(
            TriplePattern::any()
                .subject_ty(subject_ty)
                .relation(relation)
                .object_ty(object_ty)
                .subject_predicate(Predicate::SelfRef),
        )));
        self
    }

    /// Userset restriction: `subject_ty#subject_predicate` subjects may
    /// hold `relation` on `object_ty` objects. The `[group#member]` form.
    #[must_use]
    pub fn allow_userset(
        mut self,
        object_ty: impl Into<String>,
        relation: impl Into<String>,
        subject_ty: impl Into<String>,
        subject_predicate: impl Into<String>,
    ) -> Self {
        self.clauses.push(Clause::Admit(Filter::new(
            TriplePattern::any()
                .subject_ty(subject_ty)
                .relation(relation)
                .object_ty(object_ty)
                .subject_predicate(Predicate::named(subject_predicate)),
        )));
        self
    }

    /// Public-access restriction: the wildcard subject `subject_ty:*` may
    /// hold `relation` on `object_ty` objects. The `[user:*]` form.
    ///
    /// This needs its own clause because ordinary restrictions never match
    /// the wildcard name.
    #[must_use]
    pub fn allow_wildcard(
        mut self,
        object_ty: impl Into<String>,
        relation: impl Into<String>,
        subject_ty: impl Into<String>,
    ) -> Self {
        self.clauses.push(Clause::Admit(Filter::new(
            TriplePattern::any()
                .subject_ty(subject_ty)
                .subject_name(WILDCARD_NAME)
                .relation(relation)
                .object_ty(object_ty)
                .subject_predicate(Predicate::SelfRef),
        )));
        self
    }

    /// Computed userset: holding `stronger` on an `object_ty` object
    /// implies holding `weaker` on it too. The `define weaker: ... or
    /// stronger` form.
    #[must_use]
    pub fn implies(
        mut self,
        object_ty: impl Into<String>,
        stronger: impl Into<String>,
        weaker: impl Into<String>,
    ) -> Self {
        self.clauses.push(Clause::Rewrite(Rule::new(
            TriplePattern::any()
                .relation(stronger)
                .object_ty(object_ty),
            TriplePattern::any().relation(weaker),
        )));
        self
    }

    /// Appends an arbitrary clause for forms the named helpers do not
    /// cover.
    #[must_use]
    pub fn clause(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    /// Finishes into a rule set.
    #[must_use]
    pub fn build(self) -> RuleSet {
        RuleSet::new(self.clauses)
    }
}
