// SPDX-License-Identifier: Apache-2.0
//! Match-and-substitute patterns over relationship triples.
use serde::{Deserialize, Serialize};

use crate::tuple::{Entity, Predicate, RelationalTriple};

/// One position of a pattern: a hole or an exact required value.
///
/// A distinct sum type rather than `Option` so that "no constraint" can
/// never be confused with an empty-string constraint at a use site.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PatternField<T> {
    /// Matches anything; passes the triple's value through on rewrite.
    Any,
    /// Matches only the given value; overrides the triple's value on
    /// rewrite.
    Exact(T),
}

impl<T> PatternField<T> {
    /// Returns the exact value, if this position is constrained.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Any => None,
            Self::Exact(value) => Some(value),
        }
    }
}

impl<T: PartialEq> PatternField<T> {
    /// Returns `true` if `value` satisfies this position.
    #[must_use]
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(want) => want == value,
        }
    }
}

impl<T: Clone> PatternField<T> {
    /// The pattern's value when constrained, otherwise `fallback`.
    fn resolve(&self, fallback: &T) -> T {
        match self {
            Self::Any => fallback.clone(),
            Self::Exact(value) => value.clone(),
        }
    }
}

/// Name-position matching with wildcard agreement.
///
/// The literal entity name `*` ("everyone") and a pattern hole are
/// different concepts and must not satisfy each other: a hole matches any
/// ordinary name but refuses `*`, while `*` is only matched by a pattern
/// that names it exactly. Without this rule a clause written for ordinary
/// subjects would silently pick up a grant-to-everyone tuple and rewrite
/// it into grants it never meant to imply.
fn name_matches(field: &PatternField<String>, name: &str) -> bool {
    match field {
        PatternField::Any => name != crate::tuple::WILDCARD_NAME,
        PatternField::Exact(want) => want == name,
    }
}

/// Matches or rewrites one entity position of a triple.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityPattern {
    /// Constraint on the entity type.
    pub ty: PatternField<String>,
    /// Constraint on the entity name (wildcard-aware, see
    /// [`EntityPattern::matches`]).
    pub name: PatternField<String>,
}

impl EntityPattern {
    /// Pattern with both positions unconstrained.
    #[must_use]
    pub fn any() -> Self {
        Self {
            ty: PatternField::Any,
            name: PatternField::Any,
        }
    }

    /// Constrains the entity type.
    #[must_use]
    pub fn ty(mut self, ty: impl Into<String>) -> Self {
        self.ty = PatternField::Exact(ty.into());
        self
    }

    /// Constrains the entity name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = PatternField::Exact(name.into());
        self
    }

    /// Returns `true` if `entity` satisfies both positions.
    ///
    /// Name matching is wildcard-aware: a hole refuses the literal `*`
    /// name, so "everyone" tuples only match patterns that ask for them
    /// explicitly.
    #[must_use]
    pub fn matches(&self, entity: &Entity) -> bool {
        self.ty.matches(&entity.ty) && name_matches(&self.name, &entity.name)
    }

    /// Rewrites `entity`: constrained positions override, holes pass
    /// through.
    #[must_use]
    pub fn replace(&self, entity: &Entity) -> Entity {
        Entity {
            ty: self.ty.resolve(&entity.ty),
            name: self.name.resolve(&entity.name),
        }
    }
}

impl Default for EntityPattern {
    fn default() -> Self {
        Self::any()
    }
}

/// Matches or rewrites whole triples, position by position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TriplePattern {
    /// Constraint on the subject's type.
    pub subject_ty: PatternField<String>,
    /// Constraint on the subject's name (wildcard-aware).
    pub subject_name: PatternField<String>,
    /// Constraint on the relation.
    pub relation: PatternField<String>,
    /// Constraint on the object's type.
    pub object_ty: PatternField<String>,
    /// Constraint on the object's name (wildcard-aware).
    pub object_name: PatternField<String>,
    /// Constraint on the subject predicate.
    pub subject_predicate: PatternField<Predicate>,
}

impl TriplePattern {
    /// Pattern with every position unconstrained.
    #[must_use]
    pub fn any() -> Self {
        Self {
            subject_ty: PatternField::Any,
            subject_name: PatternField::Any,
            relation: PatternField::Any,
            object_ty: PatternField::Any,
            object_name: PatternField::Any,
            subject_predicate: PatternField::Any,
        }
    }

    /// Constrains the subject's type.
    #[must_use]
    pub fn subject_ty(mut self, ty: impl Into<String>) -> Self {
        self.subject_ty = PatternField::Exact(ty.into());
        self
    }

    /// Constrains the subject's name.
    #[must_use]
    pub fn subject_name(mut self, name: impl Into<String>) -> Self {
        self.subject_name = PatternField::Exact(name.into());
        self
    }

    /// Constrains the relation.
    #[must_use]
    pub fn relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = PatternField::Exact(relation.into());
        self
    }

    /// Constrains the object's type.
    #[must_use]
    pub fn object_ty(mut self, ty: impl Into<String>) -> Self {
        self.object_ty = PatternField::Exact(ty.into());
        self
    }

    /// Constrains the object's name.
    #[must_use]
    pub fn object_name(mut self, name: impl Into<String>) -> Self {
        self.object_name = PatternField::Exact(name.into());
        self
    }

    /// Constrains the subject predicate.
    #[must_use]
    pub fn subject_predicate(mut self, predicate: Predicate) -> Self {
        self.subject_predicate = PatternField::Exact(predicate);
        self
    }

    /// The subject-side entity pattern.
    #[must_use]
    pub fn subject(&self) -> EntityPattern {
        EntityPattern {
            ty: self.subject_ty.clone(),
            name: self.subject_name.clone(),
        }
    }

    /// The object-side entity pattern.
    #[must_use]
    pub fn object(&self) -> EntityPattern {
        EntityPattern {
            ty: self.object_ty.clone(),
            name: self.object_name.clone(),
        }
    }

    /// Returns `true` if every constrained position of this pattern equals
    /// the corresponding position of `triple`.
    #[must_use]
    pub fn matches(&self, triple: &RelationalTriple) -> bool {
        self.subject_predicate.matches(&triple.subject_predicate)
            && self.subject().matches(&triple.subject)
            && self.relation.matches(&triple.relation)
            && self.object().matches(&triple.object)
    }

    /// Rewrites `triple`: constrained positions override, holes pass
    /// through.
    #[must_use]
    pub fn replace(&self, triple: &RelationalTriple) -> RelationalTriple {
        RelationalTriple {
            subject: self.subject().replace(&triple.subject),
            relation: self.relation.resolve(&triple.relation),
            object: self.object().replace(&triple.object),
            subject_predicate: self.subject_predicate.resolve(&triple.subject_predicate),
        }
    }
}

impl Default for TriplePattern {
    fn default() -> Self {
        Self::any()
    }
}
