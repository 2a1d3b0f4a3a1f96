//! Recombination: merge commands that turn out to be about the same identity.
//!
//! Each pass unions the names every command is known by, rewrites all commands through
//! the alias table, groups them by canonical identity and reduces every group pairwise.
//! Passes repeat until one changes nothing.

use crate::{
    AliasTable, Atom, Command, CommandKind, CompileError, CompileResult, GenerationState,
    RelationClaim,
};
use std::collections::BTreeMap;
use tracing::{debug, trace};
use wish_core::{AnyId, RelationType};

/// Merge commands to a fixed point.
///
/// Fails with a conflict if two commands contradict each other, or if the commands have
/// not settled after `max_passes` passes.
pub fn recombine(
    cmds: Vec<Command>,
    aliases: &mut AliasTable,
    gen: &mut GenerationState,
    max_passes: usize,
) -> CompileResult<Vec<Command>> {
    let mut current = distinguish(cmds, gen);
    for pass in 1..=max_passes {
        let unions = aliases.union_count();
        let next = recombine_pass(current.clone(), aliases)?;
        if next == current && aliases.union_count() == unions {
            debug!(passes = pass, commands = next.len(), "recombined");
            return Ok(next);
        }
        current = next;
    }
    Err(CompileError::conflict(format!(
        "commands did not settle after {} recombination passes",
        max_passes
    )))
}

/// Give every anonymous `Instantiate` a fresh name so it can be grouped.
fn distinguish(cmds: Vec<Command>, gen: &mut GenerationState) -> Vec<Command> {
    cmds.into_iter()
        .map(|cmd| match cmd {
            Command::Instantiate {
                atom,
                origin_uid: None,
                internal_ids,
            } if internal_ids.is_empty() && atom.content_id().is_none() => Command::Instantiate {
                atom,
                origin_uid: None,
                internal_ids: vec![gen.next_id()],
            },
            other => other,
        })
        .collect()
}

/// Commands in one group may be reduced into one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    kind: CommandKind,
    id: AnyId,
    rt: Option<RelationType>,
}

fn recombine_pass(cmds: Vec<Command>, aliases: &mut AliasTable) -> CompileResult<Vec<Command>> {
    // union names
    let mut rest = Vec::with_capacity(cmds.len());
    for cmd in cmds {
        match cmd {
            Command::Alias { ids } => aliases.union_all(&ids)?,
            cmd => {
                if matches!(cmd, Command::Instantiate { .. }) {
                    aliases.union_all(&cmd.names())?;
                }
                rest.push(cmd);
            }
        }
    }

    // relabel and group, keeping first-appearance order
    let mut order: Vec<GroupKey> = Vec::new();
    let mut groups: BTreeMap<GroupKey, Command> = BTreeMap::new();
    for cmd in rest {
        let cmd = canonical(cmd.relabel(&mut |id: &AnyId| aliases.find(id)));
        let key = group_key(&cmd);
        match groups.remove(&key) {
            Some(existing) => {
                trace!(left = %existing, right = %cmd, "merge");
                let merged = reduce(existing, cmd, aliases)?;
                groups.insert(key, merged);
            }
            None => {
                order.push(key.clone());
                groups.insert(key, cmd);
            }
        }
    }

    check_terminations(&groups)?;
    Ok(order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .collect())
}

/// Drop names an `Instantiate` is already known by through its atom or origin.
fn canonical(cmd: Command) -> Command {
    match cmd {
        Command::Instantiate {
            atom,
            origin_uid,
            mut internal_ids,
        } => {
            let content = atom.content_id();
            internal_ids.retain(|id| {
                Some(id) != content.as_ref()
                    && origin_uid.map_or(true, |uid| id.as_eternal() != Some(&uid))
            });
            Command::Instantiate {
                atom,
                origin_uid,
                internal_ids,
            }
        }
        other => other,
    }
}

fn group_key(cmd: &Command) -> GroupKey {
    let id = cmd
        .names()
        .into_iter()
        .next()
        .unwrap_or_else(|| AnyId::var(""));
    let rt = match cmd {
        Command::BeSource(claim) | Command::BeTarget(claim) => Some(claim.rt.clone()),
        _ => None,
    };
    GroupKey {
        kind: cmd.kind(),
        id,
        rt,
    }
}

/// A terminated identity cannot also be created, assigned, claimed or kept alive.
fn check_terminations(groups: &BTreeMap<GroupKey, Command>) -> CompileResult<()> {
    for (key, terminate) in groups {
        if key.kind != CommandKind::Terminate {
            continue;
        }
        if let Some((_, other)) = groups
            .iter()
            .find(|(other, _)| other.id == key.id && other.kind != CommandKind::Terminate)
        {
            return Err(CompileError::contradiction(
                format!("{} is terminated and used in the same batch", key.id),
                terminate,
                other,
            ));
        }
    }
    Ok(())
}

// ==================== Pairwise Reduction ====================

/// Reduce two commands of one group into one.
fn reduce(a: Command, b: Command, aliases: &mut AliasTable) -> CompileResult<Command> {
    if a == b {
        return Ok(a);
    }
    match (&a, &b) {
        (Command::Instantiate { .. }, Command::Instantiate { .. }) => {
            reduce_instantiate(a, b, aliases)
        }
        (Command::Assign { .. }, Command::Assign { .. }) => reduce_assign(a, b),
        (Command::BeSource(x), Command::BeSource(y)) => {
            Ok(Command::BeSource(reduce_claims(x, y, aliases, (&a, &b))?))
        }
        (Command::BeTarget(x), Command::BeTarget(y)) => {
            Ok(Command::BeTarget(reduce_claims(x, y, aliases, (&a, &b))?))
        }
        // same target after relabelling
        (Command::Terminate { .. }, Command::Terminate { .. })
        | (Command::MustLive { .. }, Command::MustLive { .. }) => Ok(a),
        _ => Err(CompileError::contradiction(
            "commands of different kinds cannot merge",
            &a,
            &b,
        )),
    }
}

fn reduce_instantiate(a: Command, b: Command, aliases: &mut AliasTable) -> CompileResult<Command> {
    let (
        Command::Instantiate {
            atom: atom_a,
            origin_uid: origin_a,
            internal_ids: ids_a,
        },
        Command::Instantiate {
            atom: atom_b,
            origin_uid: origin_b,
            internal_ids: ids_b,
        },
    ) = (&a, &b)
    else {
        return Err(CompileError::contradiction("expected two instantiates", &a, &b));
    };

    let origin_uid = match (origin_a, origin_b) {
        (Some(x), Some(y)) if x != y => {
            return Err(CompileError::contradiction(
                format!("one record cannot have origins {} and {}", x, y),
                &a,
                &b,
            ))
        }
        (x, y) => x.or(*y),
    };

    let atom = match (atom_a, atom_b) {
        (
            Atom::Relation {
                rt: rt_a,
                source: source_a,
                target: target_a,
            },
            Atom::Relation {
                rt: rt_b,
                source: source_b,
                target: target_b,
            },
        ) => {
            if rt_a != rt_b {
                return Err(CompileError::contradiction(
                    format!("one relation cannot be both {} and {}", rt_a, rt_b),
                    &a,
                    &b,
                ));
            }
            let source = union_or_contradict(aliases, source_a, source_b, &a, &b)?;
            let target = union_or_contradict(aliases, target_a, target_b, &a, &b)?;
            Atom::relation(rt_a.clone(), source, target)
        }
        (x, y) if x == y => x.clone(),
        (x, y) => {
            return Err(CompileError::contradiction(
                format!("one record cannot be both {} and {}", x, y),
                &a,
                &b,
            ))
        }
    };

    let mut internal_ids = ids_a.clone();
    for id in ids_b {
        crate::command::push_unique(&mut internal_ids, id.clone());
    }
    Ok(Command::Instantiate {
        atom,
        origin_uid,
        internal_ids,
    })
}

fn union_or_contradict(
    aliases: &mut AliasTable,
    x: &AnyId,
    y: &AnyId,
    a: &Command,
    b: &Command,
) -> CompileResult<AnyId> {
    aliases.union(x, y).map_err(|err| match err {
        CompileError::Conflict { message, .. } => CompileError::contradiction(message, a, b),
        other => other,
    })
}

fn reduce_assign(a: Command, b: Command) -> CompileResult<Command> {
    let (
        Command::Assign {
            target,
            value: value_a,
            droppable: drop_a,
        },
        Command::Assign {
            value: value_b,
            droppable: drop_b,
            ..
        },
    ) = (&a, &b)
    else {
        return Err(CompileError::contradiction("expected two assigns", &a, &b));
    };

    if value_a == value_b {
        return Ok(Command::Assign {
            target: target.clone(),
            value: value_a.clone(),
            droppable: *drop_a && *drop_b,
        });
    }
    match (drop_a, drop_b) {
        (true, false) => Ok(b),
        (false, true) => Ok(a),
        _ => Err(CompileError::contradiction(
            format!("{} is assigned {} and {}", target, value_a, value_b),
            &a,
            &b,
        )),
    }
}

/// Merge two claims on the same record and relation type.
fn reduce_claims(
    x: &RelationClaim,
    y: &RelationClaim,
    aliases: &mut AliasTable,
    (a, b): (&Command, &Command),
) -> CompileResult<RelationClaim> {
    let only_x: Vec<&AnyId> = x.rel_ids.iter().filter(|id| !y.rel_ids.contains(id)).collect();
    let only_y: Vec<&AnyId> = y.rel_ids.iter().filter(|id| !x.rel_ids.contains(id)).collect();

    match (x.exact, y.exact) {
        (false, false) => {
            let mut rel_ids = x.rel_ids.clone();
            for id in only_y {
                rel_ids.push(id.clone());
            }
            Ok(RelationClaim { rel_ids, ..x.clone() })
        }
        (true, false) if only_y.is_empty() => Ok(x.clone()),
        (false, true) if only_x.is_empty() => Ok(y.clone()),
        (true, true) if only_x.is_empty() && only_y.is_empty() => Ok(x.clone()),
        _ => {
            if only_x.len() != only_y.len() {
                return Err(CompileError::contradiction(
                    format!(
                        "{} relations of {} cannot be matched ({} against {})",
                        x.rt,
                        x.target,
                        only_x.len(),
                        only_y.len()
                    ),
                    a,
                    b,
                ));
            }
            // the next pass relabels both claims to the same ids
            for (p, q) in only_x.into_iter().zip(only_y) {
                union_or_contradict(aliases, p, q, a, b)?;
            }
            Ok(if x.exact { x.clone() } else { y.clone() })
        }
    }
}
