//! Preparation: expand object notation into level-1 commands against a slice.
//!
//! A described object lists the complete desired set of each field. Preparation compares
//! that set with the relations already on the slice and keeps, reassigns, creates or
//! terminates relations so the two agree.

use crate::{
    Atom, Command, CompileError, CompileResult, Field, FieldValue, GenerationState,
    Level2Command, ObjectNotation, RelationClaim,
};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, trace};
use wish_core::{
    AnyId, AtomKind, AttributeType, EternalUid, GraphSlice, Record, RelationType, Value,
};

/// Expand level-2 commands until only level-1 commands remain.
pub fn prepare(
    level2: Vec<Level2Command>,
    slice: &dyn GraphSlice,
    gen: &mut GenerationState,
) -> CompileResult<Vec<Command>> {
    let bound = bound_records(&level2, slice);
    let mut todo: VecDeque<Level2Command> = level2.into();
    let mut out = Vec::new();

    while let Some(cmd) = todo.pop_front() {
        match cmd {
            Level2Command::Command(cmd) if cmd.is_relation_instantiate() => {
                out.extend(prepare_relation(cmd, gen));
            }
            Level2Command::Command(cmd) => out.push(cmd),
            Level2Command::Object(object) => {
                let (cmds, nested) = prepare_object(object, slice, &bound, gen)?;
                out.extend(cmds);
                for object in nested.into_iter().rev() {
                    todo.push_front(Level2Command::Object(object));
                }
            }
        }
    }

    let out = widen_assignments(out, slice);
    debug!(commands = out.len(), "prepared");
    Ok(out)
}

/// Rewrite every assigned value into the form its attribute stores, so later stages
/// compare like with like.
fn widen_assignments(cmds: Vec<Command>, slice: &dyn GraphSlice) -> Vec<Command> {
    let mut declared: BTreeMap<AnyId, AttributeType> = BTreeMap::new();
    for cmd in &cmds {
        if let Command::Instantiate {
            atom: Atom::Attribute(ty),
            ..
        } = cmd
        {
            for name in cmd.names() {
                declared.insert(name, *ty);
            }
        }
    }
    cmds.into_iter()
        .map(|cmd| match cmd {
            Command::Assign {
                target,
                value,
                droppable,
            } => {
                let ty = declared.get(&target).copied().or_else(|| {
                    match slice.lookup(&target).map(|reference| reference.kind) {
                        Some(AtomKind::Attribute(ty)) => Some(ty),
                        _ => None,
                    }
                });
                let value = match ty {
                    Some(ty) => ty.widen(value),
                    None => value,
                };
                Command::Assign {
                    target,
                    value,
                    droppable,
                }
            }
            other => other,
        })
        .collect()
}

/// Placeholders the wish itself binds to records already on the slice.
///
/// An `Instantiate` with a live origin binds every name it carries, and an alias binds its
/// placeholders to the live eternal uid it lists.
pub fn bound_records(
    level2: &[Level2Command],
    slice: &dyn GraphSlice,
) -> BTreeMap<AnyId, EternalUid> {
    let mut bound = BTreeMap::new();
    for cmd in level2 {
        let Level2Command::Command(cmd) = cmd else {
            continue;
        };
        let (uid, names) = match cmd {
            Command::Instantiate {
                origin_uid: Some(uid),
                internal_ids,
                ..
            } => (Some(*uid), internal_ids.iter().collect::<Vec<_>>()),
            Command::Alias { ids } => (
                ids.iter().filter_map(AnyId::as_eternal).next().copied(),
                ids.iter().collect(),
            ),
            _ => continue,
        };
        let Some(uid) = uid.filter(|uid| slice.record(uid).is_some()) else {
            continue;
        };
        for name in names.into_iter().filter(|name| name.is_placeholder()) {
            bound.insert(name.clone(), uid);
        }
    }
    bound
}

/// Name a bare relation and claim it on both endpoints.
fn prepare_relation(cmd: Command, gen: &mut GenerationState) -> Vec<Command> {
    match cmd {
        Command::Instantiate {
            atom: Atom::Relation { rt, source, target },
            origin_uid,
            mut internal_ids,
        } => {
            let rel_id = match (origin_uid, internal_ids.first()) {
                (Some(uid), _) => AnyId::Eternal(uid),
                (None, Some(id)) => id.clone(),
                (None, None) => {
                    let id = gen.next_id();
                    internal_ids.push(id.clone());
                    id
                }
            };
            let be_source = Command::BeSource(RelationClaim::new(
                source.clone(),
                vec![rel_id.clone()],
                false,
                rt.clone(),
            ));
            let be_target = Command::BeTarget(RelationClaim::new(
                target.clone(),
                vec![rel_id],
                false,
                rt.clone(),
            ));
            vec![
                Command::Instantiate {
                    atom: Atom::Relation { rt, source, target },
                    origin_uid,
                    internal_ids,
                },
                be_source,
                be_target,
            ]
        }
        other => vec![other],
    }
}

/// Expand one described object. Returns its commands and the nested objects still to expand.
///
/// `bound` maps placeholders to the live records they stand for, so an object described
/// through a variable is reconciled against that record's relations.
pub fn prepare_object(
    object: ObjectNotation,
    slice: &dyn GraphSlice,
    bound: &BTreeMap<AnyId, EternalUid>,
    gen: &mut GenerationState,
) -> CompileResult<(Vec<Command>, Vec<ObjectNotation>)> {
    let ObjectNotation { ty, id, fields } = object;
    let id = id.unwrap_or_else(|| gen.next_id());
    if matches!(id, AnyId::Value(_) | AnyId::Delegate(_)) {
        return Err(CompileError::shape(format!(
            "{} is content-addressed and has no fields",
            id
        )));
    }

    let mut cmds = Vec::new();
    let existing = slice.lookup(&id).or_else(|| {
        let uid = bound.get(&id)?;
        slice.lookup(&AnyId::Eternal(*uid))
    });
    match (&existing, ty) {
        (Some(reference), Some(ty)) => {
            if reference.kind.object_type().as_ref() != Some(&ty) {
                return Err(CompileError::conflict(format!(
                    "{} is a {}, not a {}",
                    id,
                    reference.kind.name(),
                    ty
                )));
            }
        }
        (Some(_), None) => {}
        (None, Some(ty)) => {
            let cmd = match &id {
                AnyId::Eternal(uid) => Command::instantiate_at(Atom::from(ty), *uid),
                other => Command::instantiate(Atom::from(ty), vec![other.clone()]),
            };
            cmds.push(cmd);
        }
        (None, None) => {
            if let AnyId::Eternal(uid) = &id {
                return Err(CompileError::shape(format!(
                    "{} is not on the slice and the object gives no type to create it with",
                    uid
                )));
            }
        }
    }

    let mut nested = Vec::new();
    for (rt, field) in fields {
        let current: Vec<Existing> = match &existing {
            Some(reference) => slice
                .outgoing(&reference.uid, &rt)
                .into_iter()
                .filter_map(|relation| {
                    let (_, target) = relation.reference.endpoints()?;
                    let target = slice.record(&target)?;
                    Some(Existing { relation, target })
                })
                .collect(),
            None => Vec::new(),
        };
        prepare_field(&id, &rt, field, &current, gen, &mut cmds, &mut nested)?;
    }
    Ok((cmds, nested))
}

/// An existing relation of a field, with the record it points at.
struct Existing {
    relation: Record,
    target: Record,
}

/// What happens to one desired value of a field.
enum Placement {
    /// An existing relation already points at it.
    Keep(usize),
    /// An existing relation's attribute is reassigned to it.
    Assign(usize),
    Create,
}

fn prepare_field(
    id: &AnyId,
    rt: &RelationType,
    field: Field,
    current: &[Existing],
    gen: &mut GenerationState,
    cmds: &mut Vec<Command>,
    nested: &mut Vec<ObjectNotation>,
) -> CompileResult<()> {
    let Field {
        name,
        values,
        relation_fields,
    } = field;
    if name.is_some() && values.len() != 1 {
        return Err(CompileError::shape(format!(
            "field {} of {} is named but holds {} values",
            rt,
            id,
            values.len()
        )));
    }

    // exact matches first, so a value never steals a relation another value matches
    let mut used = vec![false; current.len()];
    let mut placements: Vec<Option<Placement>> = values
        .iter()
        .map(|value| {
            let index = current
                .iter()
                .enumerate()
                .position(|(i, existing)| !used[i] && points_at(&existing.target, value))?;
            used[index] = true;
            Some(Placement::Keep(index))
        })
        .collect();
    for (value, placement) in values.iter().zip(placements.iter_mut()) {
        if placement.is_some() {
            continue;
        }
        let reusable = match value {
            FieldValue::Value(v) => current
                .iter()
                .enumerate()
                .position(|(i, existing)| !used[i] && can_reassign(&existing.target, v)),
            _ => None,
        };
        *placement = Some(match reusable {
            Some(index) => {
                used[index] = true;
                Placement::Assign(index)
            }
            None => Placement::Create,
        });
    }

    let mut rel_ids = Vec::new();
    for (value, placement) in values.into_iter().zip(placements) {
        let rel_id = match placement.unwrap_or(Placement::Create) {
            Placement::Keep(index) => {
                let relation = current[index].relation.uid();
                trace!(field = %rt, relation = %relation, "keep");
                if let FieldValue::Object(object) = value {
                    nested.push(object);
                }
                AnyId::Eternal(relation)
            }
            Placement::Assign(index) => {
                let Existing { relation, target } = &current[index];
                trace!(field = %rt, relation = %relation.uid(), "reassign");
                if let FieldValue::Value(v) = value {
                    cmds.push(Command::assign(AnyId::Eternal(target.uid()), v));
                }
                AnyId::Eternal(relation.uid())
            }
            Placement::Create => {
                let target = match value {
                    FieldValue::Value(v) => {
                        let attribute = gen.next_id();
                        cmds.push(Command::instantiate(
                            Atom::Attribute(AttributeType::of(&v)),
                            vec![attribute.clone()],
                        ));
                        cmds.push(Command::assign(attribute.clone(), v));
                        attribute
                    }
                    FieldValue::Id(target) => {
                        if matches!(target, AnyId::Value(_) | AnyId::Delegate(_)) {
                            cmds.extend(content_instantiate(&target));
                        }
                        target
                    }
                    FieldValue::Object(mut object) => {
                        let target = object.id.get_or_insert_with(|| gen.next_id()).clone();
                        nested.push(object);
                        target
                    }
                };
                let rel_id = match &name {
                    Some(name) => name.clone(),
                    None => gen.next_id(),
                };
                let atom = Atom::relation(rt.clone(), id.clone(), target);
                cmds.push(match &rel_id {
                    AnyId::Eternal(uid) => Command::instantiate_at(atom, *uid),
                    other => Command::instantiate(atom, vec![other.clone()]),
                });
                rel_id
            }
        };
        if let (Some(name), AnyId::Eternal(_)) = (&name, &rel_id) {
            if *name != rel_id {
                cmds.push(Command::alias([name.clone(), rel_id.clone()]));
            }
        }
        rel_ids.push(rel_id);
    }

    for (existing, used) in current.iter().zip(used) {
        if !used {
            let relation = existing.relation.uid();
            trace!(field = %rt, relation = %relation, "terminate");
            cmds.push(Command::terminate(AnyId::Eternal(relation)));
        }
    }

    if !relation_fields.is_empty() {
        for rel_id in &rel_ids {
            nested.push(ObjectNotation {
                ty: None,
                id: Some(rel_id.clone()),
                fields: relation_fields.clone(),
            });
        }
    }
    cmds.push(Command::BeSource(RelationClaim::new(
        id.clone(),
        rel_ids,
        true,
        rt.clone(),
    )));
    Ok(())
}

/// Returns true if a relation whose target is `target` already satisfies `value`.
fn points_at(target: &Record, value: &FieldValue) -> bool {
    let same = |id: &AnyId| {
        id.is_permanent() && (*id == AnyId::Eternal(target.uid()) || *id == target.reference.id())
    };
    match value {
        FieldValue::Id(id) => same(id),
        FieldValue::Object(ObjectNotation { id: Some(id), .. }) => same(id),
        FieldValue::Object(_) => false,
        FieldValue::Value(v) => match target.kind() {
            AtomKind::Attribute(ty) => target.current_value() == Some(&ty.widen(v.clone())),
            _ => target.current_value() == Some(v),
        },
    }
}

/// Returns true if `target` is an attribute that could be reassigned to `value`.
fn can_reassign(target: &Record, value: &Value) -> bool {
    match target.kind() {
        AtomKind::Attribute(ty) => ty.can_assign(value),
        _ => false,
    }
}

fn content_instantiate(id: &AnyId) -> Option<Command> {
    match id {
        AnyId::Value(v) => Some(Command::instantiate(Atom::Value(v.clone()), Vec::new())),
        AnyId::Delegate(d) => Some(Command::instantiate(Atom::Delegate(d.clone()), Vec::new())),
        _ => None,
    }
}

/// Add a `MustLive` for every endpoint a relation instantiate needs.
///
/// Endpoints that are existing relations pull in their own endpoints too. Value and
/// delegate endpoints are interned on demand and never need protecting.
pub fn insert_must_live(cmds: Vec<Command>, slice: &dyn GraphSlice) -> Vec<Command> {
    let mut out = Vec::with_capacity(cmds.len());
    let mut seen: BTreeSet<AnyId> = BTreeSet::new();
    for cmd in cmds {
        let endpoints = match &cmd {
            Command::Instantiate {
                atom: Atom::Relation { source, target, .. },
                ..
            } => vec![source.clone(), target.clone()],
            _ => Vec::new(),
        };
        out.push(cmd);

        let mut stack = endpoints;
        while let Some(id) = stack.pop() {
            if matches!(id, AnyId::Value(_) | AnyId::Delegate(_)) || !seen.insert(id.clone()) {
                continue;
            }
            if let Some(AtomKind::Relation { source, target, .. }) =
                slice.lookup(&id).map(|reference| reference.kind)
            {
                stack.push(AnyId::Eternal(source));
                stack.push(AnyId::Eternal(target));
            }
            out.push(Command::MustLive { target: id });
        }
    }
    out
}
