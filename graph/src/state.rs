//! Record storage for one version of a graph.

use crate::index::{AdjacencyIndex, ContentIndex, TypeIndex};
use wish_core::{
    AtomKind, AtomRef, DelegateRef, EntityType, EternalUid, GraphError, GraphResult, GraphUid,
    Record, RelationType, Value, WrappedValue,
};
use std::collections::HashMap;

/// All live records of a graph plus their indexes.
///
/// A state is cloned at the start of every transaction and replaced wholesale on commit.
#[derive(Debug, Clone)]
pub struct GraphState {
    uid: GraphUid,
    /// Record storage
    records: HashMap<EternalUid, Record>,
    /// Next blob number to allocate
    next_blob: u64,
    /// Entity type index
    type_index: TypeIndex,
    /// Adjacency index
    adj_index: AdjacencyIndex,
    /// Value and delegate index
    content_index: ContentIndex,
}

impl GraphState {
    /// Create a new empty state.
    pub fn new(uid: GraphUid) -> Self {
        Self {
            uid,
            records: HashMap::new(),
            next_blob: 1,
            type_index: TypeIndex::new(),
            adj_index: AdjacencyIndex::new(),
            content_index: ContentIndex::new(),
        }
    }

    pub fn uid(&self) -> GraphUid {
        self.uid
    }

    // ==================== Record Operations ====================

    /// Get a live record by uid.
    pub fn get(&self, uid: &EternalUid) -> Option<&Record> {
        self.records.get(uid)
    }

    pub fn contains(&self, uid: &EternalUid) -> bool {
        self.records.contains_key(uid)
    }

    /// Store a new record of the given kind.
    ///
    /// With an origin the record takes that uid, which must belong to this graph and
    /// must not be alive. Relation endpoints must be live records of this graph.
    pub fn insert(&mut self, kind: AtomKind, origin: Option<&EternalUid>) -> GraphResult<AtomRef> {
        if let AtomKind::Relation { source, target, .. } = &kind {
            self.ensure_local(source)?;
            self.ensure_local(target)?;
        }

        let uid = match origin {
            Some(origin) => {
                if origin.graph != self.uid {
                    return Err(GraphError::ForeignOrigin {
                        uid: *origin,
                        graph: self.uid,
                    });
                }
                if self.records.contains_key(origin) {
                    return Err(GraphError::AlreadyExists(*origin));
                }
                self.next_blob = self.next_blob.max(origin.blob + 1);
                *origin
            }
            None => self.alloc_uid(),
        };

        let reference = AtomRef::new(uid, kind);

        // Update indexes
        match &reference.kind {
            AtomKind::Entity(ty) => self.type_index.insert(ty.clone(), uid),
            AtomKind::Relation { rt, source, target } => {
                self.adj_index.insert(uid, rt, *source, *target)
            }
            AtomKind::Value(value) => self.content_index.insert_value(value.content_hash(), uid),
            AtomKind::Delegate(delegate) => {
                self.content_index.insert_delegate(delegate.clone(), uid)
            }
            AtomKind::Attribute(_) => {}
        }

        self.records.insert(uid, Record::new(reference.clone()));
        Ok(reference)
    }

    /// Get or create the value node for `value`. Returns whether it was created.
    pub fn intern_value(&mut self, value: &WrappedValue) -> GraphResult<(AtomRef, bool)> {
        if let Some(existing) = self.find_value(value) {
            return Ok((existing.reference.clone(), false));
        }
        let reference = self.insert(AtomKind::Value(value.clone()), None)?;
        Ok((reference, true))
    }

    /// Get or create the node for a delegate. Returns whether it was created.
    pub fn intern_delegate(&mut self, delegate: &DelegateRef) -> GraphResult<(AtomRef, bool)> {
        if let Some(uid) = self.content_index.delegate(delegate) {
            if let Some(record) = self.records.get(&uid) {
                return Ok((record.reference.clone(), false));
            }
        }
        let reference = self.insert(AtomKind::Delegate(delegate.clone()), None)?;
        Ok((reference, true))
    }

    /// Set the value of an attribute. Returns the previous value.
    pub fn set_value(&mut self, uid: &EternalUid, value: Value) -> GraphResult<Option<Value>> {
        let record = self.records.get_mut(uid).ok_or(GraphError::NotFound(*uid))?;
        let ty = match &record.reference.kind {
            AtomKind::Attribute(ty) => *ty,
            _ => return Err(GraphError::NotAnAttribute(*uid)),
        };
        if !ty.can_assign(&value) {
            return Err(GraphError::TypeMismatch {
                expected: ty,
                actual: value.type_name(),
            });
        }
        let old = record.value.clone();
        record.set_value(ty.widen(value));
        Ok(old)
    }

    /// Remove a record and every relation touching it. Returns everything removed.
    pub fn remove(&mut self, uid: &EternalUid) -> GraphResult<Vec<AtomRef>> {
        let record = self.records.get(uid).ok_or(GraphError::NotFound(*uid))?;
        if matches!(
            record.reference.kind,
            AtomKind::Value(_) | AtomKind::Delegate(_)
        ) {
            return Err(GraphError::Immutable(*uid));
        }

        // First, remove all relations touching this record
        let mut removed = Vec::new();
        for relation in self.adj_index.relations_involving(*uid) {
            if self.records.contains_key(&relation) {
                removed.extend(self.remove(&relation)?);
            }
        }

        // Now remove the record
        let record = self.records.remove(uid).ok_or(GraphError::NotFound(*uid))?;

        // Update indexes
        match &record.reference.kind {
            AtomKind::Entity(ty) => self.type_index.remove(ty, *uid),
            AtomKind::Relation { rt, source, target } => {
                self.adj_index.remove(*uid, rt, *source, *target)
            }
            _ => {}
        }

        removed.push(record.reference);
        Ok(removed)
    }

    // ==================== Query Operations ====================

    /// Live relations of one type leaving `source`, ascending by uid.
    pub fn outgoing(&self, source: &EternalUid, rt: &RelationType) -> Vec<&Record> {
        self.adj_index
            .relations_from(*source, rt)
            .filter_map(|uid| self.records.get(&uid))
            .collect()
    }

    /// Live relations of one type arriving at `target`, ascending by uid.
    pub fn incoming(&self, target: &EternalUid, rt: &RelationType) -> Vec<&Record> {
        self.adj_index
            .relations_to(*target, rt)
            .filter_map(|uid| self.records.get(&uid))
            .collect()
    }

    pub fn find_value(&self, value: &WrappedValue) -> Option<&Record> {
        self.content_index
            .value(&value.content_hash())
            .and_then(|uid| self.records.get(&uid))
    }

    pub fn find_delegate(&self, delegate: &DelegateRef) -> Option<&Record> {
        self.content_index
            .delegate(delegate)
            .and_then(|uid| self.records.get(&uid))
    }

    /// Entities of a type, ascending by uid.
    pub fn entities_of_type(&self, ty: &EntityType) -> Vec<&Record> {
        self.type_index
            .get(ty)
            .filter_map(|uid| self.records.get(&uid))
            .collect()
    }

    // ==================== Statistics ====================

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn entity_count(&self) -> usize {
        self.count_where(|kind| matches!(kind, AtomKind::Entity(_)))
    }

    pub fn relation_count(&self) -> usize {
        self.count_where(AtomKind::is_relation)
    }

    pub fn value_node_count(&self) -> usize {
        self.count_where(|kind| matches!(kind, AtomKind::Value(_)))
    }

    fn count_where(&self, pred: impl Fn(&AtomKind) -> bool) -> usize {
        self.records
            .values()
            .filter(|r| pred(&r.reference.kind))
            .count()
    }

    fn alloc_uid(&mut self) -> EternalUid {
        let uid = EternalUid::new(self.next_blob, self.uid);
        self.next_blob += 1;
        uid
    }

    fn ensure_local(&self, uid: &EternalUid) -> GraphResult<()> {
        if uid.graph != self.uid {
            return Err(GraphError::CrossGraph {
                uid: *uid,
                graph: self.uid,
            });
        }
        if !self.records.contains_key(uid) {
            return Err(GraphError::NotFound(*uid));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wish_core::{AttributeType, ValueKind};

    fn person() -> AtomKind {
        AtomKind::Entity(EntityType::new("Person"))
    }

    fn knows(source: EternalUid, target: EternalUid) -> AtomKind {
        AtomKind::Relation {
            rt: RelationType::new("Knows"),
            source,
            target,
        }
    }

    #[test]
    fn test_insert_allocates_unique_uids() {
        // GIVEN empty state
        let mut state = GraphState::new(GraphUid::new(1));

        // WHEN insert two entities
        let a = state.insert(person(), None).unwrap();
        let b = state.insert(person(), None).unwrap();

        // THEN uids differ and both are on this graph
        assert_ne!(a.uid, b.uid);
        assert_eq!(a.graph(), GraphUid::new(1));
        assert_eq!(state.entity_count(), 2);
    }

    #[test]
    fn test_remove_cascades_to_relations() {
        // GIVEN entities A, B and relation A -> B, plus a relation on that relation
        let mut state = GraphState::new(GraphUid::new(1));
        let a = state.insert(person(), None).unwrap();
        let b = state.insert(person(), None).unwrap();
        let rel = state.insert(knows(a.uid, b.uid), None).unwrap();
        let meta = state.insert(knows(rel.uid, b.uid), None).unwrap();

        // WHEN remove A
        let removed = state.remove(&a.uid).unwrap();

        // THEN A, the relation and the relation about it are gone
        assert_eq!(removed.len(), 3);
        assert!(!state.contains(&a.uid));
        assert!(!state.contains(&rel.uid));
        assert!(!state.contains(&meta.uid));
        assert!(state.contains(&b.uid));
        assert!(state.incoming(&b.uid, &RelationType::new("Knows")).is_empty());
    }

    #[test]
    fn test_origin_must_be_local_and_dead() {
        let mut state = GraphState::new(GraphUid::new(1));
        let foreign = EternalUid::new(10, GraphUid::new(2));
        assert!(matches!(
            state.insert(person(), Some(&foreign)),
            Err(GraphError::ForeignOrigin { .. })
        ));

        let local = EternalUid::new(10, GraphUid::new(1));
        state.insert(person(), Some(&local)).unwrap();
        assert!(matches!(
            state.insert(person(), Some(&local)),
            Err(GraphError::AlreadyExists(_))
        ));

        // fresh allocations never collide with an explicit origin
        let next = state.insert(person(), None).unwrap();
        assert_eq!(next.uid.blob, 11);
    }

    #[test]
    fn test_relation_endpoints_must_be_local() {
        let mut state = GraphState::new(GraphUid::new(1));
        let a = state.insert(person(), None).unwrap();
        let elsewhere = EternalUid::new(1, GraphUid::new(2));
        assert!(matches!(
            state.insert(knows(a.uid, elsewhere), None),
            Err(GraphError::CrossGraph { .. })
        ));
    }

    #[test]
    fn test_values_are_interned() {
        let mut state = GraphState::new(GraphUid::new(1));
        let (first, created) = state.intern_value(&WrappedValue::new(5)).unwrap();
        assert!(created);
        let (second, created) = state.intern_value(&WrappedValue::new(5)).unwrap();
        assert!(!created);
        assert_eq!(first, second);
        state.intern_value(&WrappedValue::new(6)).unwrap();
        assert_eq!(state.value_node_count(), 2);
        assert!(matches!(
            state.remove(&first.uid),
            Err(GraphError::Immutable(_))
        ));
    }

    #[test]
    fn test_set_value_checks_kind() {
        let mut state = GraphState::new(GraphUid::new(1));
        let attr = state
            .insert(AtomKind::Attribute(AttributeType::new(ValueKind::Float)), None)
            .unwrap();
        assert_eq!(state.set_value(&attr.uid, Value::Int(2)).unwrap(), None);
        assert_eq!(
            state.get(&attr.uid).unwrap().current_value(),
            Some(&Value::Float(2.0))
        );
        assert!(matches!(
            state.set_value(&attr.uid, Value::from("x")),
            Err(GraphError::TypeMismatch { .. })
        ));

        let entity = state.insert(person(), None).unwrap();
        assert!(matches!(
            state.set_value(&entity.uid, Value::Int(1)),
            Err(GraphError::NotAnAttribute(_))
        ));
    }
}
