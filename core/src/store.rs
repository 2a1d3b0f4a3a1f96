//! Capabilities the pipeline consumes from a storage engine.
//!
//! - `GraphSlice`: read access to one immutable snapshot
//! - `Transaction`: write primitives inside one transaction scope
//! - `TargetGraph`: a graph that hands out slices and runs transactions

use crate::{
    AnyId, AtomRef, AttributeType, Commit, DelegateRef, EntityType, EternalUid, GraphError,
    GraphResult, GraphUid, Record, RelationType, SliceMarker, Value, WrappedValue, WriteHead,
};

/// An immutable snapshot of a graph at a transaction boundary.
pub trait GraphSlice {
    /// The graph and write head this slice was taken at.
    fn marker(&self) -> SliceMarker;

    /// Look up a live record by uid.
    fn record(&self, uid: &EternalUid) -> Option<Record>;

    /// Live outgoing relations of one type, in ascending uid order.
    fn outgoing(&self, source: &EternalUid, rt: &RelationType) -> Vec<Record>;

    /// Find the interned node for a delegate.
    fn find_delegate(&self, delegate: &DelegateRef) -> Option<AtomRef>;

    /// Find the interned node for a value.
    fn find_value(&self, value: &WrappedValue) -> Option<AtomRef>;

    fn current_write_head(&self) -> WriteHead {
        self.marker().head
    }

    fn graph(&self) -> GraphUid {
        self.marker().graph
    }

    /// Resolve a permanent identity. Placeholders never resolve on a slice.
    fn lookup(&self, id: &AnyId) -> Option<AtomRef> {
        match id {
            AnyId::Eternal(uid) => self.record(uid).map(|r| r.reference),
            AnyId::Delegate(d) => self.find_delegate(d),
            AnyId::Value(v) => self.find_value(v),
            AnyId::Variable(_) | AnyId::Internal(_) => None,
        }
    }

    fn contains(&self, id: &AnyId) -> bool {
        self.lookup(id).is_some()
    }
}

/// Write primitives available inside one transaction.
///
/// Every primitive returns the concrete reference it created or touched.
pub trait Transaction {
    /// The graph being written.
    fn graph(&self) -> GraphUid;

    /// Resolve a permanent identity, including records created earlier in this transaction.
    fn lookup(&self, id: &AnyId) -> Option<AtomRef>;

    fn create_entity(
        &mut self,
        ty: &EntityType,
        origin: Option<&EternalUid>,
    ) -> GraphResult<AtomRef>;

    fn create_attribute(
        &mut self,
        ty: &AttributeType,
        origin: Option<&EternalUid>,
    ) -> GraphResult<AtomRef>;

    fn create_relation(
        &mut self,
        rt: &RelationType,
        source: &AtomRef,
        target: &AtomRef,
        origin: Option<&EternalUid>,
    ) -> GraphResult<AtomRef>;

    /// Get or create the node for a delegate.
    fn create_delegate(&mut self, delegate: &DelegateRef) -> GraphResult<AtomRef>;

    /// Get or create the node for a value.
    fn create_value_node(&mut self, value: &WrappedValue) -> GraphResult<AtomRef>;

    fn set_value(&mut self, target: &AtomRef, value: &Value) -> GraphResult<AtomRef>;

    fn remove(&mut self, target: &AtomRef) -> GraphResult<AtomRef>;
}

/// A graph that can be written to.
pub trait TargetGraph {
    type Slice: GraphSlice;

    fn uid(&self) -> GraphUid;

    fn current_write_head(&self) -> WriteHead;

    /// Snapshot of the current state.
    fn slice(&self) -> Self::Slice;

    /// Run `body` inside one transaction.
    ///
    /// On `Ok` the changes are committed and the write head advances. On `Err` nothing
    /// the body did is visible afterwards.
    fn transact<T, E, F>(&mut self, body: F) -> Result<(T, Commit), E>
    where
        E: From<GraphError>,
        F: FnOnce(&mut dyn Transaction) -> Result<T, E>;
}
