//! Write primitives over a private copy of the graph state.

use crate::GraphState;
use tracing::trace;
use wish_core::{
    AnyId, AtomKind, AtomRef, AttributeType, ChangeSet, DelegateRef, EntityType, EternalUid,
    GraphResult, GraphUid, RelationType, Transaction, Value, WrappedValue,
};

/// An open transaction. Changes become visible only when the owning graph commits it.
#[derive(Debug)]
pub struct GraphTransaction {
    state: GraphState,
    changes: ChangeSet,
}

impl GraphTransaction {
    pub(crate) fn new(state: GraphState) -> Self {
        Self {
            state,
            changes: ChangeSet::new(),
        }
    }

    pub(crate) fn into_parts(self) -> (GraphState, ChangeSet) {
        (self.state, self.changes)
    }

    fn create(&mut self, kind: AtomKind, origin: Option<&EternalUid>) -> GraphResult<AtomRef> {
        let reference = self.state.insert(kind, origin)?;
        trace!(record = %reference, "created");
        self.changes.record_create(reference.clone());
        Ok(reference)
    }

    fn intern_delegate(&mut self, delegate: &DelegateRef) -> GraphResult<AtomRef> {
        // relation delegates need their endpoint delegates first
        if let Some((source, target)) = delegate.endpoints() {
            self.intern_delegate(&source)?;
            self.intern_delegate(&target)?;
        }
        let (reference, created) = self.state.intern_delegate(delegate)?;
        if created {
            self.changes.record_create(reference.clone());
        }
        Ok(reference)
    }
}

impl Transaction for GraphTransaction {
    fn graph(&self) -> GraphUid {
        self.state.uid()
    }

    fn lookup(&self, id: &AnyId) -> Option<AtomRef> {
        let record = match id {
            AnyId::Eternal(uid) => self.state.get(uid),
            AnyId::Delegate(d) => self.state.find_delegate(d),
            AnyId::Value(v) => self.state.find_value(v),
            AnyId::Variable(_) | AnyId::Internal(_) => None,
        };
        record.map(|r| r.reference.clone())
    }

    fn create_entity(
        &mut self,
        ty: &EntityType,
        origin: Option<&EternalUid>,
    ) -> GraphResult<AtomRef> {
        self.create(AtomKind::Entity(ty.clone()), origin)
    }

    fn create_attribute(
        &mut self,
        ty: &AttributeType,
        origin: Option<&EternalUid>,
    ) -> GraphResult<AtomRef> {
        self.create(AtomKind::Attribute(*ty), origin)
    }

    fn create_relation(
        &mut self,
        rt: &RelationType,
        source: &AtomRef,
        target: &AtomRef,
        origin: Option<&EternalUid>,
    ) -> GraphResult<AtomRef> {
        let kind = AtomKind::Relation {
            rt: rt.clone(),
            source: source.uid,
            target: target.uid,
        };
        self.create(kind, origin)
    }

    fn create_delegate(&mut self, delegate: &DelegateRef) -> GraphResult<AtomRef> {
        self.intern_delegate(delegate)
    }

    fn create_value_node(&mut self, value: &WrappedValue) -> GraphResult<AtomRef> {
        let (reference, created) = self.state.intern_value(value)?;
        if created {
            self.changes.record_create(reference.clone());
        }
        Ok(reference)
    }

    fn set_value(&mut self, target: &AtomRef, value: &Value) -> GraphResult<AtomRef> {
        let stored = match &target.kind {
            AtomKind::Attribute(ty) => ty.widen(value.clone()),
            _ => value.clone(),
        };
        let old = self.state.set_value(&target.uid, value.clone())?;
        // assigned values are interned like any other value
        self.create_value_node(&WrappedValue(stored.clone()))?;
        trace!(target = %target, value = %stored, "assigned");
        self.changes.record_update(target.uid, old, stored);
        Ok(target.clone())
    }

    fn remove(&mut self, target: &AtomRef) -> GraphResult<AtomRef> {
        for removed in self.state.remove(&target.uid)? {
            trace!(record = %removed, "removed");
            self.changes.record_remove(removed);
        }
        Ok(target.clone())
    }
}
