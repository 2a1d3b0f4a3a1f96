//! Interpretation: raw wish items to level-2 commands.
//!
//! A work-list loop hands every item to the rule registered for its shape. A rule
//! emits level-2 commands and follow-up items; follow-ups are interpreted next, ahead
//! of the rest of the input, so nested literals expand in place.

use crate::pipeline;
use crate::tagging::ensure_tag;
use crate::{
    Atom, AttributeLiteral, Command, CompileError, CompileResult, EntityLiteral, Fanout,
    GenerationState, Level2Command, ObjectNotation, ShapeKind, Triple, WishItem,
};
use std::collections::{BTreeMap, VecDeque};
use tracing::debug;
use wish_core::{AnyId, AtomKind, AtomRef, AttributeType, EternalUid};

/// Output of one interpretation rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interpreted {
    pub commands: Vec<Level2Command>,
    pub follow_ups: Vec<WishItem>,
}

impl Interpreted {
    fn command(cmd: impl Into<Level2Command>) -> Self {
        Self {
            commands: vec![cmd.into()],
            follow_ups: Vec::new(),
        }
    }

    fn follow(items: Vec<WishItem>) -> Self {
        Self {
            commands: Vec::new(),
            follow_ups: items,
        }
    }
}

/// A handler for one item shape.
pub type InterpretRule = fn(WishItem, &mut GenerationState) -> CompileResult<Interpreted>;

/// The table of interpretation rules, keyed by item shape.
#[derive(Debug, Clone)]
pub struct InterpretationRules {
    rules: BTreeMap<ShapeKind, InterpretRule>,
}

impl Default for InterpretationRules {
    fn default() -> Self {
        Self::standard()
    }
}

impl InterpretationRules {
    /// A table with no rules at all.
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// The table covering every shape.
    pub fn standard() -> Self {
        Self::empty()
            .with(ShapeKind::Entity, interpret_entity)
            .with(ShapeKind::Attribute, interpret_attribute)
            .with(ShapeKind::Triple, interpret_triple)
            .with(ShapeKind::Fanout, interpret_fanout)
            .with(ShapeKind::Sequence, interpret_sequence)
            .with(ShapeKind::Object, interpret_object)
            .with(ShapeKind::Reference, interpret_reference)
            .with(ShapeKind::Id, interpret_id)
            .with(ShapeKind::Scalar, interpret_scalar)
            .with(ShapeKind::Value, interpret_value)
            .with(ShapeKind::Delegate, interpret_delegate)
            .with(ShapeKind::Pipeline, interpret_pipeline)
            .with(ShapeKind::Command, interpret_command)
    }

    /// Register (or replace) the rule for a shape.
    pub fn with(mut self, shape: ShapeKind, rule: InterpretRule) -> Self {
        self.rules.insert(shape, rule);
        self
    }

    /// Drop the rule for a shape; items of that shape become shape errors.
    pub fn without(mut self, shape: ShapeKind) -> Self {
        self.rules.remove(&shape);
        self
    }

    pub fn get(&self, shape: ShapeKind) -> Option<InterpretRule> {
        self.rules.get(&shape).copied()
    }

    pub fn covers(&self, shape: ShapeKind) -> bool {
        self.rules.contains_key(&shape)
    }
}

/// Interpret `items` into level-2 commands.
pub fn interpret(
    items: Vec<WishItem>,
    rules: &InterpretationRules,
    gen: &mut GenerationState,
) -> CompileResult<Vec<Level2Command>> {
    let mut todo: VecDeque<WishItem> = items.into();
    let mut out = Vec::new();

    while let Some(item) = todo.pop_front() {
        let shape = item.shape();
        let rule = rules.get(shape).ok_or_else(|| {
            CompileError::shape(format!("no interpretation rule for {:?} items", shape))
        })?;
        let Interpreted {
            commands,
            follow_ups,
        } = rule(item, gen)?;
        out.extend(commands);
        for follow_up in follow_ups.into_iter().rev() {
            todo.push_front(follow_up);
        }
    }

    debug!(commands = out.len(), generated = gen.counter(), "interpreted");
    Ok(out)
}

// ==================== Rules ====================

/// Split a literal's names into an origin uid and the remaining placeholders.
fn split_names(names: Vec<AnyId>) -> CompileResult<(Option<EternalUid>, Vec<AnyId>)> {
    let mut origin: Option<EternalUid> = None;
    let mut rest = Vec::new();
    for name in names {
        match name {
            AnyId::Eternal(uid) => match origin {
                Some(existing) if existing != uid => {
                    return Err(CompileError::shape(format!(
                        "literal carries two eternal uids {} and {}",
                        existing, uid
                    )))
                }
                _ => origin = Some(uid),
            },
            AnyId::Value(_) | AnyId::Delegate(_) => {
                return Err(CompileError::shape(format!(
                    "{} is a content identity and cannot name a literal",
                    name
                )))
            }
            placeholder => crate::command::push_unique(&mut rest, placeholder),
        }
    }
    Ok((origin, rest))
}

fn instantiate_named(
    atom: Atom,
    names: Vec<AnyId>,
    gen: &mut GenerationState,
) -> CompileResult<(Command, AnyId)> {
    let (origin_uid, mut internal_ids) = split_names(names)?;
    let id = match (origin_uid, internal_ids.first()) {
        (Some(uid), _) => AnyId::Eternal(uid),
        (None, Some(id)) => id.clone(),
        (None, None) => {
            let id = gen.next_id();
            internal_ids.push(id.clone());
            id
        }
    };
    let cmd = Command::Instantiate {
        atom,
        origin_uid,
        internal_ids,
    };
    Ok((cmd, id))
}

fn interpret_entity(item: WishItem, gen: &mut GenerationState) -> CompileResult<Interpreted> {
    let WishItem::Entity(EntityLiteral { ty, names }) = item else {
        return Err(mismatch(ShapeKind::Entity));
    };
    let (cmd, _) = instantiate_named(Atom::Entity(ty), names, gen)?;
    Ok(Interpreted::command(cmd))
}

fn interpret_attribute(item: WishItem, gen: &mut GenerationState) -> CompileResult<Interpreted> {
    let WishItem::Attribute(AttributeLiteral { ty, names, value }) = item else {
        return Err(mismatch(ShapeKind::Attribute));
    };
    let (cmd, id) = instantiate_named(Atom::Attribute(ty), names, gen)?;
    let mut out = Interpreted::command(cmd);
    if let Some(value) = value {
        if !ty.can_assign(&value) {
            return Err(CompileError::shape(format!(
                "{} cannot hold {} value {}",
                ty,
                value.type_name(),
                value
            )));
        }
        out.commands.push(Command::assign(id, value).into());
    }
    Ok(out)
}

fn interpret_triple(item: WishItem, gen: &mut GenerationState) -> CompileResult<Interpreted> {
    let WishItem::Triple(triple) = item else {
        return Err(mismatch(ShapeKind::Triple));
    };
    let Triple {
        source,
        relation,
        target,
    } = *triple;

    let (source_item, source_id) = ensure_tag(source, gen)?;
    let (target_item, target_id) = ensure_tag(target, gen)?;
    let atom = Atom::relation(relation.rt, source_id, target_id);
    let (cmd, rel_id) = instantiate_named(atom, relation.names, gen)?;

    let mut out = Interpreted::command(cmd);
    out.follow_ups.extend(source_item);
    out.follow_ups.extend(target_item);
    if !relation.fields.is_empty() {
        out.commands.push(
            ObjectNotation {
                ty: None,
                id: Some(rel_id),
                fields: relation.fields,
            }
            .into(),
        );
    }
    Ok(out)
}

fn interpret_fanout(item: WishItem, gen: &mut GenerationState) -> CompileResult<Interpreted> {
    let WishItem::Fanout(fanout) = item else {
        return Err(mismatch(ShapeKind::Fanout));
    };
    let Fanout {
        sources,
        relation,
        targets,
    } = *fanout;

    let pairs = sources.len() * targets.len();
    if !relation.names.is_empty() && pairs > 1 {
        return Err(CompileError::shape(format!(
            "a named {} relation cannot stand for {} relations",
            relation.rt, pairs
        )));
    }

    // every endpoint is created once, however many relations touch it
    let mut out = Interpreted::default();
    let mut tag_all = |items: Vec<WishItem>, out: &mut Interpreted| -> CompileResult<Vec<AnyId>> {
        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            let (item, id) = ensure_tag(item, gen)?;
            out.follow_ups.extend(item);
            ids.push(id);
        }
        Ok(ids)
    };
    let source_ids = tag_all(sources, &mut out)?;
    let target_ids = tag_all(targets, &mut out)?;

    for source in &source_ids {
        for target in &target_ids {
            out.follow_ups.push(WishItem::triple(
                WishItem::Id(source.clone()),
                relation.clone(),
                WishItem::Id(target.clone()),
            ));
        }
    }
    Ok(out)
}

fn interpret_sequence(item: WishItem, _gen: &mut GenerationState) -> CompileResult<Interpreted> {
    let WishItem::Sequence(items) = item else {
        return Err(mismatch(ShapeKind::Sequence));
    };
    Ok(Interpreted::follow(items))
}

fn interpret_object(item: WishItem, _gen: &mut GenerationState) -> CompileResult<Interpreted> {
    let WishItem::Object(object) = item else {
        return Err(mismatch(ShapeKind::Object));
    };
    Ok(Interpreted::command(object))
}

fn interpret_reference(item: WishItem, _gen: &mut GenerationState) -> CompileResult<Interpreted> {
    let WishItem::Reference(reference) = item else {
        return Err(mismatch(ShapeKind::Reference));
    };
    Ok(Interpreted::command(reference_command(reference)))
}

/// The `Instantiate` a reference stands for. It culls away when the record is on the slice.
fn reference_command(reference: AtomRef) -> Command {
    let AtomRef { uid, kind } = reference;
    match kind {
        AtomKind::Entity(ty) => Command::instantiate_at(Atom::Entity(ty), uid),
        AtomKind::Attribute(ty) => Command::instantiate_at(Atom::Attribute(ty), uid),
        AtomKind::Relation { rt, source, target } => Command::instantiate_at(
            Atom::relation(rt, AnyId::Eternal(source), AnyId::Eternal(target)),
            uid,
        ),
        AtomKind::Delegate(delegate) => Command::instantiate(Atom::Delegate(delegate), Vec::new()),
        AtomKind::Value(value) => Command::instantiate(Atom::Value(value), Vec::new()),
    }
}

fn interpret_id(item: WishItem, _gen: &mut GenerationState) -> CompileResult<Interpreted> {
    let WishItem::Id(id) = item else {
        return Err(mismatch(ShapeKind::Id));
    };
    Ok(match id {
        AnyId::Value(value) => {
            Interpreted::command(Command::instantiate(Atom::Value(value), Vec::new()))
        }
        AnyId::Delegate(delegate) => {
            Interpreted::command(Command::instantiate(Atom::Delegate(delegate), Vec::new()))
        }
        // a bare name creates nothing by itself
        _ => Interpreted::default(),
    })
}

fn interpret_scalar(item: WishItem, _gen: &mut GenerationState) -> CompileResult<Interpreted> {
    let WishItem::Scalar(value) = item else {
        return Err(mismatch(ShapeKind::Scalar));
    };
    let lit = AttributeLiteral {
        ty: AttributeType::of(&value),
        names: Vec::new(),
        value: Some(value),
    };
    Ok(Interpreted::follow(vec![WishItem::Attribute(lit)]))
}

fn interpret_value(item: WishItem, _gen: &mut GenerationState) -> CompileResult<Interpreted> {
    let WishItem::Value(value) = item else {
        return Err(mismatch(ShapeKind::Value));
    };
    Ok(Interpreted::command(Command::instantiate(Atom::Value(value), Vec::new())))
}

fn interpret_delegate(item: WishItem, _gen: &mut GenerationState) -> CompileResult<Interpreted> {
    let WishItem::Delegate(delegate) = item else {
        return Err(mismatch(ShapeKind::Delegate));
    };
    Ok(Interpreted::command(Command::instantiate(
        Atom::Delegate(delegate),
        Vec::new(),
    )))
}

fn interpret_pipeline(item: WishItem, gen: &mut GenerationState) -> CompileResult<Interpreted> {
    let WishItem::Pipeline(p) = item else {
        return Err(mismatch(ShapeKind::Pipeline));
    };
    pipeline::evaluate(*p, gen)
}

fn interpret_command(item: WishItem, _gen: &mut GenerationState) -> CompileResult<Interpreted> {
    let WishItem::Command(cmd) = item else {
        return Err(mismatch(ShapeKind::Command));
    };
    if let Level2Command::Command(Command::Instantiate {
        atom: atom @ (Atom::Value(_) | Atom::Delegate(_)),
        origin_uid: Some(uid),
        ..
    }) = &cmd
    {
        return Err(CompileError::shape(format!(
            "{} is content-addressed and cannot take origin {}",
            atom, uid
        )));
    }
    Ok(Interpreted::command(cmd))
}

fn mismatch(expected: ShapeKind) -> CompileError {
    CompileError::shape(format!("rule for {:?} items got another shape", expected))
}
