//! Shared fixtures.

use std::sync::Once;
use tracing::Level;
use wish_core::{
    AtomKind, AtomRef, AttributeType, EntityType, GraphResult, GraphSlice, RelationType,
    TargetGraph, Value, ValueKind,
};
use wish_graph::Graph;

static TRACING: Once = Once::new();

/// Send `tracing` output to the test harness. Safe to call from every test.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(Level::DEBUG)
            .try_init();
    });
}

/// Create a person with one string attribute per `(relation, value)` pair.
pub fn person_with_names(graph: &mut Graph, names: &[(&str, &str)]) -> GraphResult<AtomRef> {
    let (person, _) = graph.transact(|tx| -> GraphResult<AtomRef> {
        let person = tx.create_entity(&EntityType::new("Person"), None)?;
        for (rt, value) in names {
            let attr = tx.create_attribute(&AttributeType::new(ValueKind::String), None)?;
            tx.set_value(&attr, &Value::from(*value))?;
            tx.create_relation(&RelationType::new(*rt), &person, &attr, None)?;
        }
        Ok(person)
    })?;
    Ok(person)
}

/// Current values at the end of `source`'s outgoing `rt` relations, in relation order.
pub fn attribute_targets(graph: &Graph, source: &AtomRef, rt: &str) -> Vec<Value> {
    let slice = graph.slice();
    slice
        .outgoing(&source.uid, &RelationType::new(rt))
        .into_iter()
        .filter_map(|relation| match relation.kind() {
            AtomKind::Relation { target, .. } => slice.record(target),
            _ => None,
        })
        .filter_map(|target| target.current_value().cloned())
        .collect()
}
