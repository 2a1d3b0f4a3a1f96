//! Atom types: the schema-level names entities, attributes and relations carry.

use crate::{Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of an entity, e.g. `Person`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityType(pub String);

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ET.{}", self.0)
    }
}

/// Type of an attribute entity: the kind of value it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeType(pub ValueKind);

impl AttributeType {
    pub fn new(kind: ValueKind) -> Self {
        Self(kind)
    }

    /// The attribute type a bare scalar of this value would be stored in.
    pub fn of(value: &Value) -> Self {
        Self(value.kind())
    }

    pub fn kind(&self) -> ValueKind {
        self.0
    }

    /// Returns true if `value` may be assigned to an attribute of this type.
    pub fn can_assign(&self, value: &Value) -> bool {
        self.0.accepts(value)
    }

    /// The form `value` takes once stored in an attribute of this type.
    pub fn widen(&self, value: Value) -> Value {
        match (self.0, value) {
            (ValueKind::Float, Value::Int(i)) => Value::Float(i as f64),
            (_, value) => value,
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AET.{}", self.0)
    }
}

/// Type of a relation, e.g. `FirstName`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationType(pub String);

impl RelationType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RT.{}", self.0)
    }
}

/// Type of an entity or attribute: the two kinds of standalone records a template describes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectType {
    Entity(EntityType),
    Attribute(AttributeType),
}

impl From<EntityType> for ObjectType {
    fn from(ty: EntityType) -> Self {
        ObjectType::Entity(ty)
    }
}

impl From<AttributeType> for ObjectType {
    fn from(ty: AttributeType) -> Self {
        ObjectType::Attribute(ty)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectType::Entity(ty) => ty.fmt(f),
            ObjectType::Attribute(ty) => ty.fmt(f),
        }
    }
}
