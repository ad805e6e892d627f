// SPDX-License-Identifier: Apache-2.0
//! Relationship data model: entities, triples, and index vertices.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Literal entity name standing for "everyone" in a schema.
///
/// The wildcard is a schema-layer concept: patterns treat it specially (see
/// [`crate::EntityPattern`]), the reachability index never does.
pub const WILDCARD_NAME: &str = "*";

/// A typed, named object in the relationship graph.
///
/// `user:alice`, `group:eng`, `document:readme` are all entities. Identity
/// is structural; ordering is `(ty, name)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Entity {
    /// Entity type, e.g. `user` or `document`.
    pub ty: String,
    /// Entity name, unique within its type.
    pub name: String,
}

impl Entity {
    /// Creates an entity from its type and name.
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
        }
    }

    /// Returns `true` if the name is the literal `*` wildcard.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.name == WILDCARD_NAME
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ty, self.name)
    }
}

/// Which facet of a subject a relationship speaks about.
///
/// `SelfRef` means the subject entity itself. `Named` refers to the
/// subject's userset under that relation — `group:eng#member` as the writer
/// of a document grants access to whoever reaches the group's `member`
/// facet, not to the group entity. Modeled as a sum type so no magic
/// string can collide with a real relation name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Predicate {
    /// The subject itself.
    SelfRef,
    /// The subject's userset under the named relation.
    Named(String),
}

impl Predicate {
    /// Creates a named userset predicate.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Returns `true` for the self predicate.
    #[must_use]
    pub fn is_self(&self) -> bool {
        matches!(self, Self::SelfRef)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfRef => f.write_str("..."),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// A relationship assertion: `subject` stands in `relation` to `object`.
///
/// The written notation is Zanzibar's,
/// `object#relation@subject[#predicate]`; e.g.
/// `document:readme#writer@group:eng#member`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelationalTriple {
    /// Entity being granted (or granting, via a userset) the relation.
    pub subject: Entity,
    /// Relation name on the object, e.g. `reader`.
    pub relation: String,
    /// Entity the relation is held on.
    pub object: Entity,
    /// Facet of the subject the assertion speaks about.
    pub subject_predicate: Predicate,
}

impl RelationalTriple {
    /// Asserts that `subject` itself stands in `relation` to `object`.
    pub fn new(subject: Entity, relation: impl Into<String>, object: Entity) -> Self {
        Self {
            subject,
            relation: relation.into(),
            object,
            subject_predicate: Predicate::SelfRef,
        }
    }

    /// Re-keys the assertion to the subject's userset under `predicate`
    /// (e.g. `group:eng#member` rather than `group:eng`).
    #[must_use]
    pub fn via(mut self, predicate: impl Into<String>) -> Self {
        self.subject_predicate = Predicate::named(predicate);
        self
    }

    /// Index vertex for the asserting side of this triple.
    #[must_use]
    pub fn source_node(&self) -> Node {
        Node {
            ty: self.subject.ty.clone(),
            name: self.subject.name.clone(),
            predicate: self.subject_predicate.clone(),
        }
    }

    /// Index vertex for the granted side of this triple.
    ///
    /// The relation is folded into the vertex identity, so the index only
    /// ever sees unlabeled edges between `(ty, name, predicate)` vertices.
    #[must_use]
    pub fn target_node(&self) -> Node {
        Node {
            ty: self.object.ty.clone(),
            name: self.object.name.clone(),
            predicate: Predicate::named(self.relation.clone()),
        }
    }
}

impl fmt::Display for RelationalTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.object, self.relation, self.subject)?;
        if let Predicate::Named(name) = &self.subject_predicate {
            write!(f, "#{name}")?;
        }
        Ok(())
    }
}

/// Vertex type of the reachability index.
///
/// A triple maps to the edge `source_node -> target_node`; relations and
/// subject predicates live inside vertex identity rather than on edge
/// labels, which is what lets a plain reachability query answer a
/// relationship check.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Node {
    /// Entity type of the underlying entity.
    pub ty: String,
    /// Entity name of the underlying entity.
    pub name: String,
    /// Facet of the entity this vertex stands for.
    pub predicate: Predicate,
}

impl Node {
    /// Creates a vertex from its three components.
    pub fn new(ty: impl Into<String>, name: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
            predicate,
        }
    }

    /// Vertex for an entity itself (the self facet).
    pub fn entity(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(ty, name, Predicate::SelfRef)
    }

    /// Vertex for an entity's userset under `relation`.
    pub fn userset(
        ty: impl Into<String>,
        name: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self::new(ty, name, Predicate::named(relation))
    }

    /// Returns `true` if this vertex belongs to `entity` (any facet).
    #[must_use]
    pub fn is_of(&self, entity: &Entity) -> bool {
        self.ty == entity.ty && self.name == entity.name
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ty, self.name)?;
        if let Predicate::Named(name) = &self.predicate {
            write!(f, "#{name}")?;
        }
        Ok(())
    }
}
