//! Raw wish input: the shapes a caller may hand to the compiler.

use crate::{Field, FieldValue, Level2Command, ObjectNotation};
use std::collections::BTreeMap;
use wish_core::{
    AnyId, AtomRef, AttributeType, DelegateRef, EntityType, RelationType, Value, ValueKind,
    WrappedValue,
};

/// An entity to create, optionally named.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityLiteral {
    pub ty: EntityType,
    pub names: Vec<AnyId>,
}

impl EntityLiteral {
    pub fn new(ty: impl Into<String>) -> Self {
        Self {
            ty: EntityType::new(ty),
            names: Vec::new(),
        }
    }

    /// Add a variable name.
    pub fn named(self, name: impl Into<String>) -> Self {
        self.with_name(AnyId::var(name))
    }

    pub fn with_name(mut self, id: AnyId) -> Self {
        self.names.push(id);
        self
    }
}

/// An attribute to create, optionally named and holding a value.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeLiteral {
    pub ty: AttributeType,
    pub names: Vec<AnyId>,
    pub value: Option<Value>,
}

impl AttributeLiteral {
    pub fn new(kind: ValueKind) -> Self {
        Self {
            ty: AttributeType::new(kind),
            names: Vec::new(),
            value: None,
        }
    }

    pub fn named(self, name: impl Into<String>) -> Self {
        self.with_name(AnyId::var(name))
    }

    pub fn with_name(mut self, id: AnyId) -> Self {
        self.names.push(id);
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// The relation part of a triple.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationLiteral {
    pub rt: RelationType,
    pub names: Vec<AnyId>,
    /// Fields set on the relation itself.
    pub fields: BTreeMap<RelationType, Field>,
}

impl RelationLiteral {
    pub fn new(rt: impl Into<String>) -> Self {
        Self {
            rt: RelationType::new(rt),
            names: Vec::new(),
            fields: BTreeMap::new(),
        }
    }

    pub fn named(self, name: impl Into<String>) -> Self {
        self.with_name(AnyId::var(name))
    }

    pub fn with_name(mut self, id: AnyId) -> Self {
        self.names.push(id);
        self
    }

    pub fn with_field(mut self, rt: impl Into<String>, field: Field) -> Self {
        self.fields.insert(RelationType::new(rt), field);
        self
    }
}

/// `(source, relation, target)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Triple {
    pub source: WishItem,
    pub relation: RelationLiteral,
    pub target: WishItem,
}

/// Every source related to every target.
#[derive(Debug, Clone, PartialEq)]
pub struct Fanout {
    pub sources: Vec<WishItem>,
    pub relation: RelationLiteral,
    pub targets: Vec<WishItem>,
}

/// One step of an object pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOp {
    /// Focus a field for the next `Assign`.
    Field(RelationType),
    /// Set the focused field to one value, or an attribute's own value when unfocused.
    Assign(FieldValue),
    /// Replace a field's desired set.
    SetField(RelationType, Vec<FieldValue>),
    /// Remove the subject.
    Terminate,
}

/// A subject followed by edits to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub subject: WishItem,
    pub ops: Vec<PipelineOp>,
}

impl Pipeline {
    pub fn new(subject: impl Into<WishItem>) -> Self {
        Self {
            subject: subject.into(),
            ops: Vec::new(),
        }
    }

    pub fn then(mut self, op: PipelineOp) -> Self {
        self.ops.push(op);
        self
    }

    pub fn set_field(self, rt: &str, value: impl Into<FieldValue>) -> Self {
        self.then(PipelineOp::Field(RelationType::new(rt)))
            .then(PipelineOp::Assign(value.into()))
    }

    pub fn terminate(self) -> Self {
        self.then(PipelineOp::Terminate)
    }

    pub fn ends_in_terminate(&self) -> bool {
        matches!(self.ops.last(), Some(PipelineOp::Terminate))
    }
}

/// Any raw input item.
#[derive(Debug, Clone, PartialEq)]
pub enum WishItem {
    Entity(EntityLiteral),
    Attribute(AttributeLiteral),
    Triple(Box<Triple>),
    Fanout(Box<Fanout>),
    Sequence(Vec<WishItem>),
    Object(ObjectNotation),
    /// A reference to a record that exists on some graph.
    Reference(AtomRef),
    Id(AnyId),
    /// A bare scalar, stored in a new attribute of the scalar's kind.
    Scalar(Value),
    /// A value node.
    Value(WrappedValue),
    Delegate(DelegateRef),
    Pipeline(Box<Pipeline>),
    Command(Level2Command),
}

/// Discriminant of a wish item, the key of the interpretation rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeKind {
    Entity,
    Attribute,
    Triple,
    Fanout,
    Sequence,
    Object,
    Reference,
    Id,
    Scalar,
    Value,
    Delegate,
    Pipeline,
    Command,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 13] = [
        ShapeKind::Entity,
        ShapeKind::Attribute,
        ShapeKind::Triple,
        ShapeKind::Fanout,
        ShapeKind::Sequence,
        ShapeKind::Object,
        ShapeKind::Reference,
        ShapeKind::Id,
        ShapeKind::Scalar,
        ShapeKind::Value,
        ShapeKind::Delegate,
        ShapeKind::Pipeline,
        ShapeKind::Command,
    ];
}

impl WishItem {
    pub fn shape(&self) -> ShapeKind {
        match self {
            WishItem::Entity(_) => ShapeKind::Entity,
            WishItem::Attribute(_) => ShapeKind::Attribute,
            WishItem::Triple(_) => ShapeKind::Triple,
            WishItem::Fanout(_) => ShapeKind::Fanout,
            WishItem::Sequence(_) => ShapeKind::Sequence,
            WishItem::Object(_) => ShapeKind::Object,
            WishItem::Reference(_) => ShapeKind::Reference,
            WishItem::Id(_) => ShapeKind::Id,
            WishItem::Scalar(_) => ShapeKind::Scalar,
            WishItem::Value(_) => ShapeKind::Value,
            WishItem::Delegate(_) => ShapeKind::Delegate,
            WishItem::Pipeline(_) => ShapeKind::Pipeline,
            WishItem::Command(_) => ShapeKind::Command,
        }
    }

    pub fn triple(
        source: impl Into<WishItem>,
        relation: RelationLiteral,
        target: impl Into<WishItem>,
    ) -> Self {
        WishItem::Triple(Box::new(Triple {
            source: source.into(),
            relation,
            target: target.into(),
        }))
    }

    pub fn fanout(
        sources: Vec<WishItem>,
        relation: RelationLiteral,
        targets: Vec<WishItem>,
    ) -> Self {
        WishItem::Fanout(Box::new(Fanout {
            sources,
            relation,
            targets,
        }))
    }

    pub fn var(name: impl Into<String>) -> Self {
        WishItem::Id(AnyId::var(name))
    }

    pub fn value(value: impl Into<Value>) -> Self {
        WishItem::Value(WrappedValue::new(value))
    }
}

impl From<EntityLiteral> for WishItem {
    fn from(lit: EntityLiteral) -> Self {
        WishItem::Entity(lit)
    }
}

impl From<AttributeLiteral> for WishItem {
    fn from(lit: AttributeLiteral) -> Self {
        WishItem::Attribute(lit)
    }
}

impl From<ObjectNotation> for WishItem {
    fn from(object: ObjectNotation) -> Self {
        WishItem::Object(object)
    }
}

impl From<AtomRef> for WishItem {
    fn from(reference: AtomRef) -> Self {
        WishItem::Reference(reference)
    }
}

impl From<AnyId> for WishItem {
    fn from(id: AnyId) -> Self {
        WishItem::Id(id)
    }
}

impl From<Value> for WishItem {
    fn from(value: Value) -> Self {
        WishItem::Scalar(value)
    }
}

impl From<&str> for WishItem {
    fn from(value: &str) -> Self {
        WishItem::Scalar(Value::from(value))
    }
}

impl From<i64> for WishItem {
    fn from(value: i64) -> Self {
        WishItem::Scalar(Value::Int(value))
    }
}

impl From<i32> for WishItem {
    fn from(value: i32) -> Self {
        WishItem::Scalar(Value::Int(value as i64))
    }
}

impl From<Pipeline> for WishItem {
    fn from(pipeline: Pipeline) -> Self {
        WishItem::Pipeline(Box::new(pipeline))
    }
}

impl From<Level2Command> for WishItem {
    fn from(cmd: Level2Command) -> Self {
        WishItem::Command(cmd)
    }
}

impl From<crate::Command> for WishItem {
    fn from(cmd: crate::Command) -> Self {
        WishItem::Command(Level2Command::Command(cmd))
    }
}

impl From<Vec<WishItem>> for WishItem {
    fn from(items: Vec<WishItem>) -> Self {
        WishItem::Sequence(items)
    }
}
