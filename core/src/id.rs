//! Identity kinds for wish commands.
//!
//! A command may name its target in five ways:
//! - `EternalUid`: stable identity of a record across time and graphs
//! - `DelegateRef`: identity derived from a type (schema node)
//! - `WrappedValue`: identity derived from a value's content hash
//! - `Variable`: a placeholder name chosen by the caller
//! - `InternalId`: a placeholder minted by the compiler
//!
//! The first three are permanent, the last two only live for one resolution call.

use crate::{AttributeType, EntityType, ParseIdError, RelationType, Value, ValueHash};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GraphUid(pub u64);

impl GraphUid {
    /// Create a new GraphUid from a raw value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for GraphUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Stable identity of a record: the blob it was created as, on the graph it was created on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EternalUid {
    pub blob: u64,
    pub graph: GraphUid,
}

impl EternalUid {
    pub fn new(blob: u64, graph: GraphUid) -> Self {
        Self { blob, graph }
    }
}

impl fmt::Display for EternalUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}:{}", self.blob, self.graph)
    }
}

impl FromStr for EternalUid {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let re = regex_lite::Regex::new(r"^([0-9a-f]{16}):([0-9a-f]{16})$")
            .map_err(|e| ParseIdError::new(s, e.to_string()))?;
        let caps = re
            .captures(s)
            .ok_or_else(|| ParseIdError::new(s, "expected <blob hex16>:<graph hex16>"))?;
        let blob = u64::from_str_radix(&caps[1], 16)
            .map_err(|e| ParseIdError::new(s, e.to_string()))?;
        let graph = u64::from_str_radix(&caps[2], 16)
            .map_err(|e| ParseIdError::new(s, e.to_string()))?;
        Ok(Self::new(blob, GraphUid(graph)))
    }
}

/// A caller-chosen placeholder name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Variable(pub String);

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// A compiler-minted placeholder, unique per salt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InternalId {
    pub salt: String,
    pub counter: u64,
}

impl InternalId {
    pub fn new(salt: impl Into<String>, counter: u64) -> Self {
        Self {
            salt: salt.into(),
            counter,
        }
    }
}

impl fmt::Display for InternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_{}_{}", self.salt, self.counter)
    }
}

/// The type a delegate stands for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DelegateItem {
    Entity(EntityType),
    Attribute(AttributeType),
    Relation {
        source: Box<DelegateItem>,
        rt: RelationType,
        target: Box<DelegateItem>,
    },
}

impl fmt::Display for DelegateItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelegateItem::Entity(ty) => write!(f, "{}", ty),
            DelegateItem::Attribute(ty) => write!(f, "{}", ty),
            DelegateItem::Relation { source, rt, target } => {
                write!(f, "({}, {}, {})", source, rt, target)
            }
        }
    }
}

/// Identity of a delegate: a schema node whose identity is the type itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DelegateRef {
    pub order: u32,
    pub item: DelegateItem,
}

impl DelegateRef {
    pub fn new(order: u32, item: DelegateItem) -> Self {
        Self { order, item }
    }

    /// The delegates of a relation delegate's endpoints, which must exist first.
    pub fn endpoints(&self) -> Option<(DelegateRef, DelegateRef)> {
        match &self.item {
            DelegateItem::Relation { source, target, .. } => Some((
                DelegateRef::new(self.order, (**source).clone()),
                DelegateRef::new(self.order, (**target).clone()),
            )),
            _ => None,
        }
    }
}

impl fmt::Display for DelegateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{}[{}]", self.order, self.item)
    }
}

/// A value standing in for the value node holding it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WrappedValue(pub Value);

impl WrappedValue {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn content_hash(&self) -> ValueHash {
        self.0.content_hash()
    }
}

impl fmt::Display for WrappedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Val({})", self.0)
    }
}

/// Any identity a command may carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnyId {
    Eternal(EternalUid),
    Delegate(DelegateRef),
    Value(WrappedValue),
    Variable(Variable),
    Internal(InternalId),
}

impl AnyId {
    /// Merge priority: permanent identities beat caller names, which beat minted names.
    pub fn rank(&self) -> u8 {
        match self {
            AnyId::Eternal(_) | AnyId::Delegate(_) | AnyId::Value(_) => 2,
            AnyId::Variable(_) => 1,
            AnyId::Internal(_) => 0,
        }
    }

    /// Returns true for identities that outlive a resolution call.
    pub fn is_permanent(&self) -> bool {
        self.rank() == 2
    }

    /// Returns true for Variable and InternalId.
    pub fn is_placeholder(&self) -> bool {
        !self.is_permanent()
    }

    pub fn as_eternal(&self) -> Option<&EternalUid> {
        match self {
            AnyId::Eternal(uid) => Some(uid),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            AnyId::Variable(var) => Some(var),
            _ => None,
        }
    }

    /// Shorthand for a variable id.
    pub fn var(name: impl Into<String>) -> Self {
        AnyId::Variable(Variable::new(name))
    }

    /// Shorthand for a value id.
    pub fn val(value: impl Into<Value>) -> Self {
        AnyId::Value(WrappedValue::new(value))
    }
}

impl fmt::Display for AnyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyId::Eternal(id) => id.fmt(f),
            AnyId::Delegate(id) => id.fmt(f),
            AnyId::Value(id) => id.fmt(f),
            AnyId::Variable(id) => id.fmt(f),
            AnyId::Internal(id) => id.fmt(f),
        }
    }
}

impl From<EternalUid> for AnyId {
    fn from(id: EternalUid) -> Self {
        AnyId::Eternal(id)
    }
}

impl From<DelegateRef> for AnyId {
    fn from(id: DelegateRef) -> Self {
        AnyId::Delegate(id)
    }
}

impl From<WrappedValue> for AnyId {
    fn from(id: WrappedValue) -> Self {
        AnyId::Value(id)
    }
}

impl From<Variable> for AnyId {
    fn from(id: Variable) -> Self {
        AnyId::Variable(id)
    }
}

impl From<InternalId> for AnyId {
    fn from(id: InternalId) -> Self {
        AnyId::Internal(id)
    }
}
