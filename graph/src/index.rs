//! Indexes for efficient graph lookups.

use wish_core::{DelegateRef, EntityType, EternalUid, RelationType, ValueHash};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Type index: EntityType -> Set<EternalUid>
#[derive(Debug, Clone, Default)]
pub struct TypeIndex {
    index: HashMap<EntityType, BTreeSet<EternalUid>>,
}

impl TypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ty: EntityType, uid: EternalUid) {
        self.index.entry(ty).or_default().insert(uid);
    }

    pub fn remove(&mut self, ty: &EntityType, uid: EternalUid) {
        if let Some(set) = self.index.get_mut(ty) {
            set.remove(&uid);
            if set.is_empty() {
                self.index.remove(ty);
            }
        }
    }

    pub fn get(&self, ty: &EntityType) -> impl Iterator<Item = EternalUid> + '_ {
        self.index
            .get(ty)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }
}

/// Adjacency index: uid -> { outbound: Map<RelationType, Set<uid>>, inbound: ... }
///
/// Sets are ordered so relation listings come out in ascending uid order.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyIndex {
    /// Relations where the record is the source
    outbound: HashMap<EternalUid, BTreeMap<RelationType, BTreeSet<EternalUid>>>,
    /// Relations where the record is the target
    inbound: HashMap<EternalUid, BTreeMap<RelationType, BTreeSet<EternalUid>>>,
}

impl AdjacencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        relation: EternalUid,
        rt: &RelationType,
        source: EternalUid,
        target: EternalUid,
    ) {
        self.outbound
            .entry(source)
            .or_default()
            .entry(rt.clone())
            .or_default()
            .insert(relation);
        self.inbound
            .entry(target)
            .or_default()
            .entry(rt.clone())
            .or_default()
            .insert(relation);
    }

    pub fn remove(
        &mut self,
        relation: EternalUid,
        rt: &RelationType,
        source: EternalUid,
        target: EternalUid,
    ) {
        Self::remove_from(&mut self.outbound, source, rt, relation);
        Self::remove_from(&mut self.inbound, target, rt, relation);
    }

    fn remove_from(
        index: &mut HashMap<EternalUid, BTreeMap<RelationType, BTreeSet<EternalUid>>>,
        key: EternalUid,
        rt: &RelationType,
        relation: EternalUid,
    ) {
        if let Some(type_map) = index.get_mut(&key) {
            if let Some(set) = type_map.get_mut(rt) {
                set.remove(&relation);
                if set.is_empty() {
                    type_map.remove(rt);
                }
            }
            if type_map.is_empty() {
                index.remove(&key);
            }
        }
    }

    /// Relations of one type leaving `source`.
    pub fn relations_from(
        &self,
        source: EternalUid,
        rt: &RelationType,
    ) -> impl Iterator<Item = EternalUid> + '_ {
        self.outbound
            .get(&source)
            .and_then(|type_map| type_map.get(rt))
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Relations of one type arriving at `target`.
    pub fn relations_to(
        &self,
        target: EternalUid,
        rt: &RelationType,
    ) -> impl Iterator<Item = EternalUid> + '_ {
        self.inbound
            .get(&target)
            .and_then(|type_map| type_map.get(rt))
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// All relations touching a record, either end.
    pub fn relations_involving(&self, uid: EternalUid) -> BTreeSet<EternalUid> {
        [&self.outbound, &self.inbound]
            .into_iter()
            .filter_map(|index| index.get(&uid))
            .flat_map(|type_map| type_map.values())
            .flat_map(|set| set.iter().copied())
            .collect()
    }
}

/// Content index for interned records: value hashes and delegates.
#[derive(Debug, Clone, Default)]
pub struct ContentIndex {
    values: HashMap<ValueHash, EternalUid>,
    delegates: HashMap<DelegateRef, EternalUid>,
}

impl ContentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_value(&mut self, hash: ValueHash, uid: EternalUid) {
        self.values.insert(hash, uid);
    }

    pub fn value(&self, hash: &ValueHash) -> Option<EternalUid> {
        self.values.get(hash).copied()
    }

    pub fn insert_delegate(&mut self, delegate: DelegateRef, uid: EternalUid) {
        self.delegates.insert(delegate, uid);
    }

    pub fn delegate(&self, delegate: &DelegateRef) -> Option<EternalUid> {
        self.delegates.get(delegate).copied()
    }
}
