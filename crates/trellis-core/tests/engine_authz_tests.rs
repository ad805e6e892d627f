// SPDX-License-Identifier: Apache-2.0

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used)]
use trellis_core::schema::SchemaBuilder;
use trellis_core::{
    Clause, Engine, EngineError, Entity, ExpandError, GraphError, Node, RelationalTriple, Rule,
    RuleSet, TriplePattern,
};

fn user(name: &str) -> Entity {
    Entity::new("user", name)
}

fn doc(name: &str) -> Entity {
    Entity::new("document", name)
}

fn group(name: &str) -> Entity {
    Entity::new("group", name)
}

/// `document#reader [user]`, `document#writer [user]`, `reader: ... or
/// writer`, plus group membership grantable to documents via
/// `[group#member]`.
fn document_schema() -> RuleSet {
    SchemaBuilder::new()
        .allow("document", "reader", "user")
        .allow("document", "writer", "user")
        .allow("group", "member", "user")
        .allow_userset("document", "writer", "group", "member")
        .implies("document", "writer", "reader")
        .build()
}

#[test]
fn writing_writer_grants_reader_too() {
    let mut engine = Engine::new(document_schema());
    engine
        .write(RelationalTriple::new(user("alice"), "writer", doc("doc1")))
        .unwrap();

    assert!(engine.check(&RelationalTriple::new(user("alice"), "writer", doc("doc1"))));
    assert!(engine.check(&RelationalTriple::new(user("alice"), "reader", doc("doc1"))));
    assert!(!engine.check(&RelationalTriple::new(user("bob"), "reader", doc("doc1"))));
    assert!(!engine.check(&RelationalTriple::new(user("alice"), "writer", doc("doc2"))));
}

#[test]
fn group_membership_chains_through_the_index() {
    let mut engine = Engine::new(document_schema());
    engine
        .write(RelationalTriple::new(user("alice"), "member", group("g1")))
        .unwrap();
    engine
        .write(RelationalTriple::new(group("g1"), "writer", doc("doc1")).via("member"))
        .unwrap();

    // No rewrite rule mentions groups; the closure joins the two hops.
    assert!(engine.check(&RelationalTriple::new(user("alice"), "writer", doc("doc1"))));
    assert!(engine.check(&RelationalTriple::new(user("alice"), "reader", doc("doc1"))));
    assert!(!engine.check(&RelationalTriple::new(user("bob"), "writer", doc("doc1"))));
}

#[test]
fn revoking_membership_revokes_derived_access() {
    let mut engine = Engine::new(document_schema());
    let membership = RelationalTriple::new(user("alice"), "member", group("g1"));
    engine.write(membership.clone()).unwrap();
    engine
        .write(RelationalTriple::new(group("g1"), "writer", doc("doc1")).via("member"))
        .unwrap();

    engine.delete(&membership).unwrap();
    assert!(!engine.check(&RelationalTriple::new(user("alice"), "writer", doc("doc1"))));

    // Re-asserting restores exactly the revoked access.
    engine.write(membership).unwrap();
    assert!(engine.check(&RelationalTriple::new(user("alice"), "writer", doc("doc1"))));
}

#[test]
fn access_survives_revocation_while_another_route_exists() {
    let mut engine = Engine::new(document_schema());
    let membership = RelationalTriple::new(user("alice"), "member", group("g1"));
    let direct = RelationalTriple::new(user("alice"), "writer", doc("doc1"));
    engine.write(membership).unwrap();
    engine
        .write(RelationalTriple::new(group("g1"), "writer", doc("doc1")).via("member"))
        .unwrap();
    engine.write(direct.clone()).unwrap();

    // Two independent routes to writer; dropping the direct one keeps the
    // group route.
    engine.delete(&direct).unwrap();
    assert!(engine.check(&RelationalTriple::new(user("alice"), "writer", doc("doc1"))));
    assert!(engine.check(&RelationalTriple::new(user("alice"), "reader", doc("doc1"))));
}

#[test]
fn overlapping_implications_are_counted_not_clobbered() {
    let rules = SchemaBuilder::new()
        .allow("document", "owner", "user")
        .allow("document", "writer", "user")
        .allow("document", "reader", "user")
        .implies("document", "owner", "writer")
        .implies("document", "writer", "reader")
        .build();
    let mut engine = Engine::new(rules);

    let as_owner = RelationalTriple::new(user("alice"), "owner", doc("doc1"));
    let as_writer = RelationalTriple::new(user("alice"), "writer", doc("doc1"));
    engine.write(as_owner.clone()).unwrap();
    engine.write(as_writer).unwrap();

    // Both assertions imply reader; deleting one must debit its copy only.
    engine.delete(&as_owner).unwrap();
    assert!(engine.check(&RelationalTriple::new(user("alice"), "reader", doc("doc1"))));
    assert!(engine.check(&RelationalTriple::new(user("alice"), "writer", doc("doc1"))));
    assert!(!engine.check(&RelationalTriple::new(user("alice"), "owner", doc("doc1"))));
}

#[test]
fn duplicate_assertions_are_rejected() {
    let mut engine = Engine::new(document_schema());
    let triple = RelationalTriple::new(user("alice"), "writer", doc("doc1"));
    engine.write(triple.clone()).unwrap();
    assert_eq!(
        engine.write(triple.clone()),
        Err(EngineError::Duplicate(triple))
    );
    assert_eq!(engine.triples().count(), 1);
}

#[test]
fn deleting_an_unasserted_tuple_is_an_error() {
    let mut engine = Engine::new(document_schema());
    let triple = RelationalTriple::new(user("alice"), "writer", doc("doc1"));
    assert_eq!(
        engine.delete(&triple),
        Err(EngineError::NotFound(triple))
    );
}

#[test]
fn inadmissible_tuples_never_reach_the_index() {
    let mut engine = Engine::new(document_schema());
    let triple = RelationalTriple::new(user("alice"), "archiver", doc("doc1"));
    assert_eq!(
        engine.write(triple.clone()),
        Err(EngineError::Schema(ExpandError::NotAdmissible(triple)))
    );
    assert!(engine.index().is_empty());
}

#[test]
fn a_wildcard_grant_requires_its_own_clause() {
    let mut engine = Engine::new(document_schema());
    // document_schema has no [user:*] clause, so "everyone" is refused.
    let everyone = RelationalTriple::new(user("*"), "reader", doc("doc1"));
    assert!(matches!(
        engine.write(everyone),
        Err(EngineError::Schema(ExpandError::NotAdmissible(_)))
    ));

    let rules = SchemaBuilder::new()
        .allow_wildcard("document", "reader", "user")
        .build();
    let mut engine = Engine::new(rules);
    engine
        .write(RelationalTriple::new(user("*"), "reader", doc("doc1")))
        .unwrap();
    assert!(engine.check(&RelationalTriple::new(user("*"), "reader", doc("doc1"))));
}

#[test]
fn membership_self_grants_are_self_edges() {
    let rules = SchemaBuilder::new()
        .allow_userset("group", "member", "group", "member")
        .build();
    let mut engine = Engine::new(rules);
    // group:g1#member as a member of group:g1 maps both tuple ends to the
    // same vertex.
    let triple = RelationalTriple::new(group("g1"), "member", group("g1")).via("member");
    assert!(matches!(
        engine.write(triple),
        Err(EngineError::Graph(GraphError::SelfEdge(_)))
    ));
    assert!(engine.index().is_empty());
}

#[test]
fn nested_group_cycles_are_rejected() {
    let rules = SchemaBuilder::new()
        .allow_userset("group", "member", "group", "member")
        .build();
    let mut engine = Engine::new(rules);
    engine
        .write(RelationalTriple::new(group("g1"), "member", group("g2")).via("member"))
        .unwrap();
    let closing = RelationalTriple::new(group("g2"), "member", group("g1")).via("member");
    assert!(matches!(
        engine.write(closing.clone()),
        Err(EngineError::Graph(GraphError::CycleWouldBeCreated { .. }))
    ));
    // The rejected write left nothing behind.
    assert!(!engine.triples().any(|t| *t == closing));
    assert_eq!(engine.triples().count(), 1);
}

#[test]
fn a_mid_batch_rejection_rolls_the_whole_write_back() {
    // One assertion that expands to two edges, the second of which closes
    // a cycle against pre-existing state. The first edge must be rolled
    // back before the error is reported.
    let duplicate_into_c = Clause::Rewrite(Rule::new(
        TriplePattern::any().relation("member").object_name("b"),
        TriplePattern::any().object_name("c"),
    ));
    let rules = SchemaBuilder::new()
        .allow_userset("group", "member", "group", "member")
        .clause(duplicate_into_c)
        .build();
    let mut engine = Engine::new(rules);

    engine
        .write(RelationalTriple::new(group("c"), "member", group("a")).via("member"))
        .unwrap();

    let doomed = RelationalTriple::new(group("a"), "member", group("b")).via("member");
    let result = engine.write(doomed.clone());
    assert!(matches!(
        result,
        Err(EngineError::Graph(GraphError::CycleWouldBeCreated { .. }))
    ));

    // Neither the recorded assertion nor the first (a -> b) edge survives.
    assert!(!engine.triples().any(|t| *t == doomed));
    assert!(!engine.check(&doomed));
    assert_eq!(
        engine
            .index()
            .direct_count(&Node::userset("group", "a", "member"), &Node::userset("group", "b", "member")),
        0
    );
}

#[test]
fn entity_removal_drops_every_facet_and_assertion() {
    let mut engine = Engine::new(document_schema());
    engine
        .write(RelationalTriple::new(user("alice"), "member", group("g1")))
        .unwrap();
    engine
        .write(RelationalTriple::new(group("g1"), "writer", doc("doc1")).via("member"))
        .unwrap();
    engine
        .write(RelationalTriple::new(user("bob"), "writer", doc("doc1")))
        .unwrap();

    let removed = engine.remove_entity(&group("g1")).unwrap();
    assert!(removed >= 1);

    assert!(!engine.check(&RelationalTriple::new(user("alice"), "writer", doc("doc1"))));
    // Assertions mentioning g1 are gone; bob's direct grant survives.
    assert_eq!(engine.triples().count(), 1);
    assert!(engine.check(&RelationalTriple::new(user("bob"), "writer", doc("doc1"))));

    assert_eq!(
        engine.remove_entity(&group("g1")),
        Err(EngineError::EntityNotFound(group("g1")))
    );
}

#[test]
fn listings_walk_the_closure_in_both_directions() {
    let mut engine = Engine::new(document_schema());
    engine
        .write(RelationalTriple::new(user("alice"), "member", group("g1")))
        .unwrap();
    engine
        .write(RelationalTriple::new(group("g1"), "writer", doc("doc1")).via("member"))
        .unwrap();

    let from_alice = engine.list_reachable(&Node::entity("user", "alice"));
    assert_eq!(
        from_alice,
        [
            Node::userset("document", "doc1", "reader"),
            Node::userset("document", "doc1", "writer"),
            Node::userset("group", "g1", "member"),
        ]
    );

    let to_writer = engine.list_reverse(&Node::userset("document", "doc1", "writer"));
    assert_eq!(
        to_writer,
        [
            Node::userset("group", "g1", "member"),
            Node::entity("user", "alice"),
        ]
    );
}

#[test]
fn declared_vertices_survive_with_zero_edges() {
    let mut engine = Engine::new(document_schema());
    let lobby = Node::entity("group", "lobby");
    assert!(!engine.contains_node(&lobby));

    engine.declare_node(lobby.clone());
    assert!(engine.contains_node(&lobby));

    // Implicit vertices vanish with their last edge; declared ones stay.
    let membership = RelationalTriple::new(user("alice"), "member", group("g1"));
    engine.write(membership.clone()).unwrap();
    let g1_member = Node::userset("group", "g1", "member");
    assert!(engine.contains_node(&g1_member));
    engine.delete(&membership).unwrap();
    assert!(!engine.contains_node(&g1_member));
    assert!(engine.contains_node(&lobby));

    assert!(engine.retract_node(&lobby));
    assert!(!engine.contains_node(&lobby));
}
