//! Wish commands.
//!
//! Level-1 commands (`Command`) are what the executor consumes. Level-2 commands add
//! object notation, which Preparation expands into level-1 commands against a slice.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use wish_core::{
    AnyId, AttributeType, DelegateRef, EntityType, EternalUid, ObjectType, RelationType, Value,
    WrappedValue,
};

/// What an `Instantiate` creates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Atom {
    Entity(EntityType),
    Attribute(AttributeType),
    Relation {
        rt: RelationType,
        source: AnyId,
        target: AnyId,
    },
    Delegate(DelegateRef),
    Value(WrappedValue),
}

impl Atom {
    pub fn relation(rt: RelationType, source: AnyId, target: AnyId) -> Self {
        Atom::Relation { rt, source, target }
    }

    pub fn is_relation(&self) -> bool {
        matches!(self, Atom::Relation { .. })
    }

    /// The content identity of delegate and value atoms.
    pub fn content_id(&self) -> Option<AnyId> {
        match self {
            Atom::Delegate(d) => Some(AnyId::Delegate(d.clone())),
            Atom::Value(v) => Some(AnyId::Value(v.clone())),
            _ => None,
        }
    }
}

impl From<ObjectType> for Atom {
    fn from(ty: ObjectType) -> Self {
        match ty {
            ObjectType::Entity(ty) => Atom::Entity(ty),
            ObjectType::Attribute(ty) => Atom::Attribute(ty),
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Entity(ty) => ty.fmt(f),
            Atom::Attribute(ty) => ty.fmt(f),
            Atom::Relation { rt, source, target } => write!(f, "({}, {}, {})", source, rt, target),
            Atom::Delegate(d) => d.fmt(f),
            Atom::Value(v) => v.fmt(f),
        }
    }
}

/// A claim about the relations of one type leaving (or arriving at) a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationClaim {
    pub target: AnyId,
    pub rel_ids: Vec<AnyId>,
    /// The listed relations are all of them, not just some.
    pub exact: bool,
    pub rt: RelationType,
}

impl RelationClaim {
    pub fn new(target: AnyId, rel_ids: Vec<AnyId>, exact: bool, rt: RelationType) -> Self {
        Self {
            target,
            rel_ids,
            exact,
            rt,
        }
    }
}

/// A level-1 command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Command {
    Instantiate {
        atom: Atom,
        origin_uid: Option<EternalUid>,
        internal_ids: Vec<AnyId>,
    },
    Assign {
        target: AnyId,
        value: Value,
        /// Yields to any non-droppable assignment of the same target.
        droppable: bool,
    },
    Terminate {
        target: AnyId,
    },
    Alias {
        ids: BTreeSet<AnyId>,
    },
    BeSource(RelationClaim),
    BeTarget(RelationClaim),
    MustLive {
        target: AnyId,
    },
}

/// Discriminant of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandKind {
    Instantiate,
    Assign,
    Terminate,
    Alias,
    BeSource,
    BeTarget,
    MustLive,
}

impl Command {
    pub fn instantiate(atom: Atom, internal_ids: Vec<AnyId>) -> Self {
        Command::Instantiate {
            atom,
            origin_uid: None,
            internal_ids,
        }
    }

    pub fn instantiate_at(atom: Atom, origin_uid: EternalUid) -> Self {
        Command::Instantiate {
            atom,
            origin_uid: Some(origin_uid),
            internal_ids: Vec::new(),
        }
    }

    pub fn assign(target: AnyId, value: impl Into<Value>) -> Self {
        Command::Assign {
            target,
            value: value.into(),
            droppable: false,
        }
    }

    pub fn terminate(target: AnyId) -> Self {
        Command::Terminate { target }
    }

    pub fn alias(ids: impl IntoIterator<Item = AnyId>) -> Self {
        Command::Alias {
            ids: ids.into_iter().collect(),
        }
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Instantiate { .. } => CommandKind::Instantiate,
            Command::Assign { .. } => CommandKind::Assign,
            Command::Terminate { .. } => CommandKind::Terminate,
            Command::Alias { .. } => CommandKind::Alias,
            Command::BeSource(_) => CommandKind::BeSource,
            Command::BeTarget(_) => CommandKind::BeTarget,
            Command::MustLive { .. } => CommandKind::MustLive,
        }
    }

    /// Returns true for an `Instantiate` of a relation.
    pub fn is_relation_instantiate(&self) -> bool {
        matches!(self, Command::Instantiate { atom, .. } if atom.is_relation())
    }

    /// Every identity this command is known by, most authoritative first.
    ///
    /// For an `Instantiate` these are the names of the thing it creates; for the other
    /// commands they are the identity the command is about.
    pub fn names(&self) -> Vec<AnyId> {
        match self {
            Command::Instantiate {
                atom,
                origin_uid,
                internal_ids,
            } => {
                let mut names: Vec<AnyId> = Vec::new();
                names.extend(atom.content_id());
                names.extend(origin_uid.map(AnyId::Eternal));
                names.extend(internal_ids.iter().cloned());
                names
            }
            Command::Assign { target, .. }
            | Command::Terminate { target }
            | Command::MustLive { target } => vec![target.clone()],
            Command::BeSource(claim) | Command::BeTarget(claim) => vec![claim.target.clone()],
            Command::Alias { ids } => ids.iter().cloned().collect(),
        }
    }

    /// Every identity this command needs to exist, other than its own names.
    pub fn dependencies(&self) -> Vec<AnyId> {
        match self {
            Command::Instantiate {
                atom: Atom::Relation { source, target, .. },
                ..
            } => vec![source.clone(), target.clone()],
            Command::Assign { target, .. } | Command::Terminate { target } => {
                vec![target.clone()]
            }
            _ => Vec::new(),
        }
    }

    /// Rewrite every identity through `f`.
    ///
    /// An `Instantiate` whose names resolve to an eternal uid takes that uid as its
    /// origin. Duplicate names collapse.
    pub fn relabel(&self, f: &mut impl FnMut(&AnyId) -> AnyId) -> Command {
        match self {
            Command::Instantiate {
                atom,
                origin_uid,
                internal_ids,
            } => {
                let atom = match atom {
                    Atom::Relation { rt, source, target } => Atom::Relation {
                        rt: rt.clone(),
                        source: f(source),
                        target: f(target),
                    },
                    other => other.clone(),
                };
                let mut origin_uid = *origin_uid;
                let mut names = Vec::new();
                for id in internal_ids {
                    match f(id) {
                        AnyId::Eternal(uid) if origin_uid.is_none() => origin_uid = Some(uid),
                        AnyId::Eternal(uid) if origin_uid == Some(uid) => {}
                        mapped => push_unique(&mut names, mapped),
                    }
                }
                Command::Instantiate {
                    atom,
                    origin_uid,
                    internal_ids: names,
                }
            }
            Command::Assign {
                target,
                value,
                droppable,
            } => Command::Assign {
                target: f(target),
                value: value.clone(),
                droppable: *droppable,
            },
            Command::Terminate { target } => Command::Terminate { target: f(target) },
            Command::MustLive { target } => Command::MustLive { target: f(target) },
            Command::Alias { ids } => Command::Alias {
                ids: ids.iter().map(|id| f(id)).collect(),
            },
            Command::BeSource(claim) => Command::BeSource(relabel_claim(claim, f)),
            Command::BeTarget(claim) => Command::BeTarget(relabel_claim(claim, f)),
        }
    }
}

fn relabel_claim(claim: &RelationClaim, f: &mut impl FnMut(&AnyId) -> AnyId) -> RelationClaim {
    let mut rel_ids = Vec::new();
    for id in &claim.rel_ids {
        push_unique(&mut rel_ids, f(id));
    }
    RelationClaim {
        target: f(&claim.target),
        rel_ids,
        exact: claim.exact,
        rt: claim.rt.clone(),
    }
}

pub(crate) fn push_unique(ids: &mut Vec<AnyId>, id: AnyId) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Instantiate {
                atom,
                origin_uid,
                internal_ids,
            } => {
                write!(f, "Instantiate({}", atom)?;
                if let Some(uid) = origin_uid {
                    write!(f, " @{}", uid)?;
                }
                for id in internal_ids {
                    write!(f, " {}", id)?;
                }
                write!(f, ")")
            }
            Command::Assign {
                target,
                value,
                droppable,
            } => {
                let marker = if *droppable { "?" } else { "" };
                write!(f, "Assign{}({} := {})", marker, target, value)
            }
            Command::Terminate { target } => write!(f, "Terminate({})", target),
            Command::Alias { ids } => {
                let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
                write!(f, "Alias({})", ids.join(" = "))
            }
            Command::BeSource(claim) => write!(f, "BeSource{}", ClaimDisplay(claim)),
            Command::BeTarget(claim) => write!(f, "BeTarget{}", ClaimDisplay(claim)),
            Command::MustLive { target } => write!(f, "MustLive({})", target),
        }
    }
}

struct ClaimDisplay<'a>(&'a RelationClaim);

impl fmt::Display for ClaimDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let claim = self.0;
        let exact = if claim.exact { " exact" } else { "" };
        let ids: Vec<String> = claim.rel_ids.iter().map(ToString::to_string).collect();
        write!(f, "({} {} [{}]{})", claim.target, claim.rt, ids.join(", "), exact)
    }
}

// ==================== Object Notation ====================

/// One desired target of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    /// A scalar stored in a new or reused attribute.
    Value(Value),
    /// An existing or batch-local record.
    Id(AnyId),
    /// A nested described object.
    Object(ObjectNotation),
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Value(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Value(Value::from(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Value(Value::Int(value))
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Value(Value::Int(value as i64))
    }
}

impl From<AnyId> for FieldValue {
    fn from(id: AnyId) -> Self {
        FieldValue::Id(id)
    }
}

impl From<ObjectNotation> for FieldValue {
    fn from(object: ObjectNotation) -> Self {
        FieldValue::Object(object)
    }
}

/// The complete desired set of outgoing relations of one type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Name for the relation, when the field holds exactly one value.
    pub name: Option<AnyId>,
    pub values: Vec<FieldValue>,
    /// Fields to apply to every resulting relation.
    pub relation_fields: BTreeMap<RelationType, Field>,
}

impl Field {
    pub fn new(values: Vec<FieldValue>) -> Self {
        Self {
            name: None,
            values,
            relation_fields: BTreeMap::new(),
        }
    }

    pub fn single(value: impl Into<FieldValue>) -> Self {
        Self::new(vec![value.into()])
    }

    pub fn named(mut self, name: AnyId) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_relation_field(mut self, rt: RelationType, field: Field) -> Self {
        self.relation_fields.insert(rt, field);
        self
    }
}

/// A described object: a typed template with desired field sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectNotation {
    pub ty: Option<ObjectType>,
    pub id: Option<AnyId>,
    pub fields: BTreeMap<RelationType, Field>,
}

impl ObjectNotation {
    pub fn new(ty: impl Into<ObjectType>) -> Self {
        Self {
            ty: Some(ty.into()),
            id: None,
            fields: BTreeMap::new(),
        }
    }

    /// An object known only by identity: it exists already or is created elsewhere.
    pub fn of(id: AnyId) -> Self {
        Self {
            ty: None,
            id: Some(id),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: AnyId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn field(mut self, rt: RelationType, field: Field) -> Self {
        self.fields.insert(rt, field);
        self
    }

    pub fn set(self, rt: &str, values: Vec<FieldValue>) -> Self {
        self.field(RelationType::new(rt), Field::new(values))
    }
}

/// A level-2 command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level2Command {
    Command(Command),
    Object(ObjectNotation),
}

impl From<Command> for Level2Command {
    fn from(cmd: Command) -> Self {
        Level2Command::Command(cmd)
    }
}

impl From<ObjectNotation> for Level2Command {
    fn from(object: ObjectNotation) -> Self {
        Level2Command::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wish_core::{GraphUid, InternalId};

    fn internal(n: u64) -> AnyId {
        AnyId::Internal(InternalId::new("t", n))
    }

    #[test]
    fn test_instantiate_names_put_content_and_origin_first() {
        let uid = EternalUid::new(1, GraphUid::new(1));
        let cmd = Command::Instantiate {
            atom: Atom::Entity(EntityType::new("Person")),
            origin_uid: Some(uid),
            internal_ids: vec![AnyId::var("joe")],
        };
        assert_eq!(cmd.names(), vec![AnyId::Eternal(uid), AnyId::var("joe")]);

        let value = Command::instantiate(Atom::Value(WrappedValue::new(5)), vec![internal(1)]);
        assert_eq!(value.names(), vec![AnyId::val(5), internal(1)]);
    }

    #[test]
    fn test_relabel_promotes_eternal_name_to_origin() {
        let uid = EternalUid::new(7, GraphUid::new(1));
        let cmd = Command::instantiate(
            Atom::Entity(EntityType::new("Person")),
            vec![AnyId::var("joe"), internal(1)],
        );
        let relabelled = cmd.relabel(&mut |id| {
            if *id == AnyId::var("joe") {
                AnyId::Eternal(uid)
            } else {
                id.clone()
            }
        });
        assert_eq!(
            relabelled,
            Command::Instantiate {
                atom: Atom::Entity(EntityType::new("Person")),
                origin_uid: Some(uid),
                internal_ids: vec![internal(1)],
            }
        );
    }

    #[test]
    fn test_relabel_collapses_duplicate_relation_ids() {
        let claim = Command::BeSource(RelationClaim::new(
            AnyId::var("joe"),
            vec![internal(1), internal(2)],
            true,
            RelationType::new("Knows"),
        ));
        let relabelled = claim.relabel(&mut |_| internal(1));
        match relabelled {
            Command::BeSource(claim) => assert_eq!(claim.rel_ids, vec![internal(1)]),
            other => panic!("unexpected {}", other),
        }
    }

    #[test]
    fn test_command_display() {
        let cmd = Command::assign(AnyId::var("age"), 5);
        assert_eq!(cmd.to_string(), "Assign($age := 5)");
        let cmd = Command::alias([AnyId::var("a"), AnyId::var("b")]);
        assert_eq!(cmd.to_string(), "Alias($a = $b)");
    }
}
