//! Immutable snapshots.

use crate::GraphState;
use std::sync::Arc;
use wish_core::{
    AtomRef, DelegateRef, EternalUid, GraphSlice, Record, RelationType, SliceMarker, WrappedValue,
};

/// One version of a graph. Cheap to clone; never changes.
#[derive(Debug, Clone)]
pub struct Slice {
    marker: SliceMarker,
    state: Arc<GraphState>,
}

impl Slice {
    pub(crate) fn new(marker: SliceMarker, state: Arc<GraphState>) -> Self {
        Self { marker, state }
    }

    /// Direct access to the stored state, for inspection.
    pub fn state(&self) -> &GraphState {
        &self.state
    }
}

impl GraphSlice for Slice {
    fn marker(&self) -> SliceMarker {
        self.marker
    }

    fn record(&self, uid: &EternalUid) -> Option<Record> {
        self.state.get(uid).cloned()
    }

    fn outgoing(&self, source: &EternalUid, rt: &RelationType) -> Vec<Record> {
        self.state.outgoing(source, rt).into_iter().cloned().collect()
    }

    fn find_delegate(&self, delegate: &DelegateRef) -> Option<AtomRef> {
        self.state
            .find_delegate(delegate)
            .map(|r| r.reference.clone())
    }

    fn find_value(&self, value: &WrappedValue) -> Option<AtomRef> {
        self.state.find_value(value).map(|r| r.reference.clone())
    }
}
