//! Batch executor - runs a compiled batch inside one engine transaction.
//!
//! The executor delegates each command to `ops/`. Any error drops the transaction, so
//! a batch either commits as a whole or leaves the graph untouched.

use tracing::{info, warn};
use wish_compiler::{Command, CommandBatch};
use wish_core::{
    AnyId, AtomRef, ChangeSet, GraphSlice, SliceMarker, TargetGraph, Transaction,
};

use crate::error::{TransactionError, TransactionResult};
use crate::names::Names;
use crate::ops;
use crate::receipt::Receipt;

/// The outcome of executing one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub receipt: Receipt,
    /// The slice after execution.
    pub marker: SliceMarker,
    pub changes: ChangeSet,
}

/// Fail if `graph` is not at the slice `batch` was compiled against.
pub fn check_slice<G: TargetGraph>(batch: &CommandBatch, graph: &G) -> TransactionResult<()> {
    let current = SliceMarker::new(graph.uid(), graph.current_write_head());
    if current != batch.slice {
        warn!(planned = %batch.slice, current = %current, "rejecting stale batch");
        return Err(TransactionError::stale(batch.slice, current));
    }
    Ok(())
}

/// Execute `batch` against `graph` and build the receipt.
///
/// Internal ids appear in the receipt only when `retain_internal_ids` is set.
pub fn execute<G: TargetGraph>(
    batch: &CommandBatch,
    graph: &mut G,
    retain_internal_ids: bool,
) -> TransactionResult<Applied> {
    execute_with(batch, graph, retain_internal_ids, &[])
}

/// Like [`execute`], and the receipt also holds every live identity in `wanted`,
/// including value and delegate ids.
pub fn execute_with<G: TargetGraph>(
    batch: &CommandBatch,
    graph: &mut G,
    retain_internal_ids: bool,
    wanted: &[AnyId],
) -> TransactionResult<Applied> {
    check_slice(batch, graph)?;

    // nothing to write: answer from the slice without advancing the head
    if batch.is_empty() {
        let slice = graph.slice();
        let receipt = build_receipt(
            |id| slice.lookup(id),
            &Names::new(),
            batch,
            retain_internal_ids,
            wanted,
        );
        return Ok(Applied {
            receipt,
            marker: batch.slice,
            changes: ChangeSet::new(),
        });
    }

    let (receipt, commit) = graph.transact(|tx| -> TransactionResult<Receipt> {
        let mut names = Names::new();
        for cmd in &batch.commands {
            execute_command(tx, &mut names, cmd)?;
        }
        Ok(build_receipt(
            |id| tx.lookup(id),
            &names,
            batch,
            retain_internal_ids,
            wanted,
        ))
    })?;

    info!(
        slice = %commit.marker,
        commands = batch.len(),
        created = commit.changes.created().len(),
        updated = commit.changes.updated().len(),
        removed = commit.changes.removed().len(),
        "batch committed"
    );
    Ok(Applied {
        receipt,
        marker: commit.marker,
        changes: commit.changes,
    })
}

fn execute_command(
    tx: &mut dyn Transaction,
    names: &mut Names,
    cmd: &Command,
) -> TransactionResult<AtomRef> {
    match cmd {
        Command::Instantiate { .. } => ops::execute_instantiate(tx, names, cmd),
        Command::Assign { .. } => ops::execute_assign(tx, names, cmd),
        Command::Terminate { .. } => ops::execute_terminate(tx, names, cmd),
        // claims and aliases never survive compilation
        other => Err(TransactionError::UnexpectedCommand(other.to_string())),
    }
}

/// Collect every externally visible name whose record is still alive.
fn build_receipt(
    lookup: impl Fn(&AnyId) -> Option<AtomRef>,
    names: &Names,
    batch: &CommandBatch,
    retain_internal_ids: bool,
    wanted: &[AnyId],
) -> Receipt {
    let visible = |id: &AnyId| match id {
        AnyId::Eternal(_) | AnyId::Variable(_) => true,
        AnyId::Internal(_) => retain_internal_ids,
        AnyId::Value(_) | AnyId::Delegate(_) => false,
    };
    let alive = |reference: &AtomRef| lookup(&reference.id()).is_some();
    let resolve = |id: &AnyId| match names.get(id) {
        Some(reference) => Some(reference.clone()),
        None => lookup(id),
    };

    let mut receipt = Receipt::new();
    for (id, reference) in names.iter() {
        if visible(id) && alive(reference) {
            receipt.insert(id.clone(), reference.clone());
        }
    }
    for (var, id) in &batch.resolved_variables {
        if let Some(reference) = resolve(id).filter(|r| alive(r)) {
            receipt.insert(AnyId::Variable(var.clone()), reference);
        }
    }
    if retain_internal_ids {
        for (internal, id) in &batch.resolved_internal_ids {
            if let Some(reference) = resolve(id).filter(|r| alive(r)) {
                receipt.insert(AnyId::Internal(internal.clone()), reference);
            }
        }
    }
    for uid in &batch.eternal_ids {
        let id = AnyId::Eternal(*uid);
        if let Some(reference) = lookup(&id) {
            receipt.insert(id, reference);
        }
    }
    for id in wanted {
        if receipt.contains(id) {
            continue;
        }
        if let Some(reference) = resolve(id).filter(|r| alive(r)) {
            receipt.insert(id.clone(), reference);
        }
    }
    receipt
}

#[cfg(test)]
mod tests {
    use super::*;
    use wish_compiler::{compile_items, EntityLiteral, RelationLiteral, ResolveOptions, WishItem};
    use wish_core::{GraphUid, WriteHead};
    use wish_graph::Graph;

    fn options() -> ResolveOptions {
        ResolveOptions::new().with_salt("x")
    }

    fn joe_items() -> Vec<WishItem> {
        vec![
            EntityLiteral::new("Person").named("joe").into(),
            WishItem::triple(WishItem::var("joe"), RelationLiteral::new("FirstName"), "Joe"),
        ]
    }

    #[test]
    fn test_execute_commits_and_binds_variables() {
        // GIVEN a batch compiled against an empty graph
        let mut graph = Graph::new(GraphUid::new(1));
        let batch = compile_items(joe_items(), &graph.slice(), &options()).unwrap();

        // WHEN it is executed
        let applied = execute(&batch, &mut graph, false).unwrap();

        // THEN the head advances and joe is in the receipt
        assert_eq!(applied.marker.head, WriteHead(1));
        assert_eq!(graph.state().entity_count(), 1);
        assert_eq!(graph.state().relation_count(), 1);
        let joe = applied.receipt.var("joe").unwrap();
        assert_eq!(joe.kind.name(), "entity");
        assert!(applied.receipt.iter().all(|(id, _)| !matches!(id, AnyId::Internal(_))));
    }

    #[test]
    fn test_retained_internal_ids_appear_in_receipt() {
        let mut graph = Graph::new(GraphUid::new(1));
        let batch = compile_items(joe_items(), &graph.slice(), &options()).unwrap();
        let applied = execute(&batch, &mut graph, true).unwrap();
        assert!(applied.receipt.iter().any(|(id, _)| matches!(id, AnyId::Internal(_))));
    }

    #[test]
    fn test_stale_batch_is_rejected_before_writing() {
        // GIVEN a batch compiled before another commit landed
        let mut graph = Graph::new(GraphUid::new(1));
        let batch = compile_items(joe_items(), &graph.slice(), &options()).unwrap();
        let other = compile_items(joe_items(), &graph.slice(), &options()).unwrap();
        execute(&other, &mut graph, false).unwrap();

        // WHEN the stale batch runs
        let err = execute(&batch, &mut graph, false).unwrap_err();

        // THEN it is rejected and nothing more is written
        assert!(err.is_stale());
        assert_eq!(graph.state().entity_count(), 1);
        assert_eq!(graph.current_write_head(), WriteHead(1));
    }

    #[test]
    fn test_batch_for_other_graph_is_stale() {
        let graph_a = Graph::new(GraphUid::new(1));
        let mut graph_b = Graph::new(GraphUid::new(2));
        let batch = compile_items(joe_items(), &graph_a.slice(), &options()).unwrap();
        assert!(execute(&batch, &mut graph_b, false).unwrap_err().is_stale());
    }

    #[test]
    fn test_empty_batch_keeps_head() {
        // GIVEN joe already on the graph
        let mut graph = Graph::new(GraphUid::new(1));
        let first = compile_items(joe_items(), &graph.slice(), &options()).unwrap();
        let joe = execute(&first, &mut graph, false)
            .unwrap()
            .receipt
            .var("joe")
            .cloned()
            .unwrap();

        // WHEN a wish that only refers to joe runs
        let items = vec![EntityLiteral::new("Person").with_name(joe.id()).named("j").into()];
        let batch = compile_items(items, &graph.slice(), &options()).unwrap();
        let applied = execute(&batch, &mut graph, false).unwrap();

        // THEN nothing is committed and the variable still resolves
        assert!(batch.is_empty());
        assert_eq!(graph.current_write_head(), WriteHead(1));
        assert_eq!(applied.receipt.var("j"), Some(&joe));
        assert_eq!(applied.receipt.get(&joe.id()), Some(&joe));
    }
}
