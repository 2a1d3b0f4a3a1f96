//! The target graph: a write head plus the current state.

use crate::{GraphState, GraphTransaction, Slice};
use std::sync::Arc;
use tracing::{debug, warn};
use wish_core::{Commit, GraphError, GraphUid, SliceMarker, TargetGraph, Transaction, WriteHead};

/// An in-memory graph.
///
/// Every commit produces a new immutable state; slices taken earlier keep seeing the
/// version they were taken at.
#[derive(Debug)]
pub struct Graph {
    uid: GraphUid,
    head: WriteHead,
    state: Arc<GraphState>,
}

impl Graph {
    /// Create a new empty graph.
    pub fn new(uid: GraphUid) -> Self {
        Self {
            uid,
            head: WriteHead(0),
            state: Arc::new(GraphState::new(uid)),
        }
    }

    pub fn marker(&self) -> SliceMarker {
        SliceMarker::new(self.uid, self.head)
    }

    /// The current state, for inspection.
    pub fn state(&self) -> &GraphState {
        &self.state
    }
}

impl TargetGraph for Graph {
    type Slice = Slice;

    fn uid(&self) -> GraphUid {
        self.uid
    }

    fn current_write_head(&self) -> WriteHead {
        self.head
    }

    fn slice(&self) -> Slice {
        Slice::new(self.marker(), Arc::clone(&self.state))
    }

    fn transact<T, E, F>(&mut self, body: F) -> Result<(T, Commit), E>
    where
        E: From<GraphError>,
        F: FnOnce(&mut dyn Transaction) -> Result<T, E>,
    {
        let mut txn = GraphTransaction::new((*self.state).clone());
        match body(&mut txn) {
            Ok(output) => {
                let (state, changes) = txn.into_parts();
                self.head = self.head.next();
                self.state = Arc::new(state);
                debug!(
                    graph = %self.uid,
                    head = %self.head,
                    created = changes.created().len(),
                    updated = changes.updated().len(),
                    removed = changes.removed().len(),
                    "transaction committed"
                );
                let commit = Commit {
                    marker: self.marker(),
                    changes,
                };
                Ok((output, commit))
            }
            Err(err) => {
                warn!(graph = %self.uid, head = %self.head, "transaction rolled back");
                Err(err)
            }
        }
    }
}
