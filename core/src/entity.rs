//! Records and references.
//!
//! An `AtomRef` is a concrete reference to a record on a graph. A `Record` is the
//! reference plus the current value of an attribute, as seen from one slice.

use crate::{
    AnyId, AttributeType, DelegateRef, EntityType, EternalUid, GraphUid, ObjectType,
    RelationType, Value, WrappedValue,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic write counter of a graph. Every commit advances it by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WriteHead(pub u64);

impl WriteHead {
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for WriteHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}

/// Names one slice: a graph at a write head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SliceMarker {
    pub graph: GraphUid,
    pub head: WriteHead,
}

impl SliceMarker {
    pub fn new(graph: GraphUid, head: WriteHead) -> Self {
        Self { graph, head }
    }
}

impl fmt::Display for SliceMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.graph, self.head)
    }
}

/// What kind of record a reference points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AtomKind {
    Entity(EntityType),
    Attribute(AttributeType),
    Relation {
        rt: RelationType,
        source: EternalUid,
        target: EternalUid,
    },
    Delegate(DelegateRef),
    Value(WrappedValue),
}

impl AtomKind {
    /// Returns the entity or attribute type, if this is one of those.
    pub fn object_type(&self) -> Option<ObjectType> {
        match self {
            AtomKind::Entity(ty) => Some(ObjectType::Entity(ty.clone())),
            AtomKind::Attribute(ty) => Some(ObjectType::Attribute(*ty)),
            _ => None,
        }
    }

    pub fn is_relation(&self) -> bool {
        matches!(self, AtomKind::Relation { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            AtomKind::Entity(_) => "entity",
            AtomKind::Attribute(_) => "attribute",
            AtomKind::Relation { .. } => "relation",
            AtomKind::Delegate(_) => "delegate",
            AtomKind::Value(_) => "value node",
        }
    }
}

/// A concrete reference to a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AtomRef {
    pub uid: EternalUid,
    pub kind: AtomKind,
}

impl AtomRef {
    pub fn new(uid: EternalUid, kind: AtomKind) -> Self {
        Self { uid, kind }
    }

    /// The graph this record lives on.
    pub fn graph(&self) -> GraphUid {
        self.uid.graph
    }

    /// The identity a command would use to name this record.
    ///
    /// Delegates and value nodes are named by content, everything else by uid.
    pub fn id(&self) -> AnyId {
        match &self.kind {
            AtomKind::Delegate(d) => AnyId::Delegate(d.clone()),
            AtomKind::Value(v) => AnyId::Value(v.clone()),
            _ => AnyId::Eternal(self.uid),
        }
    }

    /// Source and target uids, if this is a relation.
    pub fn endpoints(&self) -> Option<(EternalUid, EternalUid)> {
        match &self.kind {
            AtomKind::Relation { source, target, .. } => Some((*source, *target)),
            _ => None,
        }
    }
}

impl fmt::Display for AtomRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<{}>", self.kind.name(), self.uid)
    }
}

/// A record as seen from one slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub reference: AtomRef,
    /// Current value, for attributes that have been assigned one.
    pub value: Option<Value>,
    /// Bumped on every assignment.
    pub version: u64,
}

impl Record {
    pub fn new(reference: AtomRef) -> Self {
        Self {
            reference,
            value: None,
            version: 1,
        }
    }

    pub fn uid(&self) -> EternalUid {
        self.reference.uid
    }

    pub fn kind(&self) -> &AtomKind {
        &self.reference.kind
    }

    /// The value this record carries: an attribute's current value or a value node's content.
    pub fn current_value(&self) -> Option<&Value> {
        match &self.reference.kind {
            AtomKind::Value(v) => Some(v.value()),
            _ => self.value.as_ref(),
        }
    }

    /// Set the value of an attribute.
    pub fn set_value(&mut self, value: Value) {
        self.value = Some(value);
        self.version += 1;
    }
}
