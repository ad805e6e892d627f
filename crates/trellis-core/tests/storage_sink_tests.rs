// SPDX-License-Identifier: Apache-2.0

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]
use std::sync::{Arc, Mutex};

use trellis_core::schema::SchemaBuilder;
use trellis_core::{
    Engine, EngineConfig, Entity, IndexMutation, MutationBatch, RelationalTriple, StorageSink,
};

/// Mirror that captures every committed batch for inspection.
#[derive(Debug, Clone, Default)]
struct RecordingSink {
    batches: Arc<Mutex<Vec<MutationBatch>>>,
}

impl RecordingSink {
    fn batches(&self) -> Vec<MutationBatch> {
        self.batches.lock().unwrap().clone()
    }
}

impl StorageSink for RecordingSink {
    fn commit(&mut self, batch: &MutationBatch) {
        self.batches.lock().unwrap().push(batch.clone());
    }
}

fn engine_with_sink() -> (Engine, RecordingSink) {
    let rules = SchemaBuilder::new()
        .allow("document", "writer", "user")
        .allow("document", "reader", "user")
        .implies("document", "writer", "reader")
        .build();
    let sink = RecordingSink::default();
    let engine = Engine::with_storage(rules, EngineConfig::default(), Box::new(sink.clone()));
    (engine, sink)
}

fn grant() -> RelationalTriple {
    RelationalTriple::new(
        Entity::new("user", "alice"),
        "writer",
        Entity::new("document", "doc1"),
    )
}

#[test]
fn each_successful_call_commits_exactly_one_batch() {
    let (mut engine, sink) = engine_with_sink();
    engine.write(grant()).unwrap();
    engine.delete(&grant()).unwrap();

    let batches = sink.batches();
    assert_eq!(batches.len(), 2);
}

#[test]
fn a_write_batch_carries_its_edges_and_the_assertion() {
    let (mut engine, sink) = engine_with_sink();
    engine.write(grant()).unwrap();

    let batches = sink.batches();
    let mutations = batches[0].mutations();
    // Two implied tuples (writer and reader) plus the assertion record.
    assert_eq!(mutations.len(), 3);
    assert!(matches!(mutations[0], IndexMutation::EdgeAdded { .. }));
    assert!(matches!(mutations[1], IndexMutation::EdgeAdded { .. }));
    assert_eq!(
        mutations[2],
        IndexMutation::TripleAsserted { triple: grant() }
    );
}

#[test]
fn a_delete_batch_mirrors_the_write_batch() {
    let (mut engine, sink) = engine_with_sink();
    engine.write(grant()).unwrap();
    engine.delete(&grant()).unwrap();

    let batches = sink.batches();
    let mutations = batches[1].mutations();
    assert_eq!(mutations.len(), 3);
    assert!(matches!(mutations[0], IndexMutation::EdgeRemoved { .. }));
    assert!(matches!(mutations[1], IndexMutation::EdgeRemoved { .. }));
    assert_eq!(
        mutations[2],
        IndexMutation::TripleRetracted { triple: grant() }
    );
}

#[test]
fn failed_calls_commit_nothing() {
    let (mut engine, sink) = engine_with_sink();
    engine.write(grant()).unwrap();

    // Duplicate write, unasserted delete, inadmissible write.
    let _ = engine.write(grant());
    let _ = engine.delete(&RelationalTriple::new(
        Entity::new("user", "bob"),
        "writer",
        Entity::new("document", "doc1"),
    ));
    let _ = engine.write(RelationalTriple::new(
        Entity::new("user", "alice"),
        "archiver",
        Entity::new("document", "doc1"),
    ));

    assert_eq!(sink.batches().len(), 1);
}

#[test]
fn entity_removal_commits_vertex_drops_and_retractions() {
    let (mut engine, sink) = engine_with_sink();
    engine.write(grant()).unwrap();
    engine
        .remove_entity(&Entity::new("document", "doc1"))
        .unwrap();

    let batches = sink.batches();
    let mutations = batches[1].mutations();
    assert!(mutations
        .iter()
        .any(|m| matches!(m, IndexMutation::NodeRemoved { .. })));
    assert!(mutations
        .iter()
        .any(|m| matches!(m, IndexMutation::TripleRetracted { .. })));
}
