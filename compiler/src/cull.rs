//! Culling: drop commands the slice already satisfies.

use crate::{AliasTable, Atom, Command, CompileError, CompileResult, Stranded};
use std::collections::BTreeSet;
use tracing::{debug, trace};
use wish_core::{AnyId, AtomKind, EternalUid, GraphSlice, Record};

/// Drop every command whose effect is already realized on `slice`.
///
/// Culled instantiates alias their names to the existing record. Terminates of records
/// that are already gone add the target to `vanished`; any surviving command that still
/// needs a vanished identity is a dependency error.
pub fn cull(
    cmds: Vec<Command>,
    slice: &dyn GraphSlice,
    aliases: &mut AliasTable,
    vanished: &mut BTreeSet<AnyId>,
) -> CompileResult<Vec<Command>> {
    let before = cmds.len();
    let mut kept = Vec::with_capacity(cmds.len());

    for cmd in cmds {
        if is_realized(&cmd, slice, aliases, vanished)? {
            trace!(command = %cmd, "culled");
        } else {
            kept.push(cmd);
        }
    }

    let stranded: Vec<Stranded> = kept
        .iter()
        .filter_map(|cmd| {
            let unmet: Vec<AnyId> = cmd
                .dependencies()
                .into_iter()
                .filter(|id| vanished.contains(&aliases.resolve(id)))
                .collect();
            (!unmet.is_empty()).then(|| Stranded {
                command: cmd.clone(),
                unmet,
            })
        })
        .collect();
    if !stranded.is_empty() {
        return Err(CompileError::dependency(stranded));
    }

    debug!(before, after = kept.len(), vanished = vanished.len(), "culled");
    Ok(kept)
}

/// Returns true if `cmd` has nothing left to do on `slice`.
fn is_realized(
    cmd: &Command,
    slice: &dyn GraphSlice,
    aliases: &mut AliasTable,
    vanished: &mut BTreeSet<AnyId>,
) -> CompileResult<bool> {
    match cmd {
        Command::Instantiate {
            atom,
            origin_uid: Some(uid),
            internal_ids,
        } => {
            let Some(existing) = slice.record(uid) else {
                return Ok(false);
            };
            check_equivalent(cmd, atom, &existing, slice, aliases)?;
            for id in internal_ids {
                union_or_contradict(aliases, id, &AnyId::Eternal(*uid), cmd)?;
            }
            Ok(true)
        }
        Command::Instantiate {
            atom: atom @ (Atom::Value(_) | Atom::Delegate(_)),
            internal_ids,
            ..
        } => {
            let Some(content) = atom.content_id() else {
                return Ok(false);
            };
            if !slice.contains(&content) {
                return Ok(false);
            }
            for id in internal_ids {
                union_or_contradict(aliases, id, &content, cmd)?;
            }
            Ok(true)
        }
        Command::Instantiate { .. } => Ok(false),
        Command::Assign { target, value, .. } => Ok(slice
            .lookup(target)
            .and_then(|reference| slice.record(&reference.uid))
            .map(|record| record.current_value() == Some(value))
            .unwrap_or(false)),
        Command::Terminate { target } => {
            if target.is_permanent() && !slice.contains(target) {
                vanished.insert(target.clone());
                return Ok(true);
            }
            Ok(false)
        }
        Command::Alias { ids } if ids.len() > 1 => Err(CompileError::Conflict {
            message: "alias survived recombination".to_string(),
            commands: vec![cmd.clone()],
        }),
        Command::Alias { .. }
        | Command::BeSource(_)
        | Command::BeTarget(_)
        | Command::MustLive { .. } => Ok(true),
    }
}

/// An instantiate with an existing origin must describe the existing record.
fn check_equivalent(
    cmd: &Command,
    atom: &Atom,
    existing: &Record,
    slice: &dyn GraphSlice,
    aliases: &mut AliasTable,
) -> CompileResult<()> {
    let mismatch = || CompileError::Conflict {
        message: format!("{} does not describe existing {}", cmd, existing.reference),
        commands: vec![cmd.clone()],
    };
    match (atom, existing.kind()) {
        (Atom::Entity(a), AtomKind::Entity(b)) if a == b => Ok(()),
        (Atom::Attribute(a), AtomKind::Attribute(b)) if a == b => Ok(()),
        (
            Atom::Relation { rt, source, target },
            AtomKind::Relation {
                rt: existing_rt,
                source: existing_source,
                target: existing_target,
            },
        ) if rt == existing_rt => {
            endpoint_matches(source, existing_source, slice, aliases, cmd)?
                .then_some(())
                .ok_or_else(mismatch)?;
            endpoint_matches(target, existing_target, slice, aliases, cmd)?
                .then_some(())
                .ok_or_else(mismatch)
        }
        _ => Err(mismatch()),
    }
}

/// Placeholders take the existing endpoint; permanent ids must already be it.
fn endpoint_matches(
    id: &AnyId,
    existing: &EternalUid,
    slice: &dyn GraphSlice,
    aliases: &mut AliasTable,
    cmd: &Command,
) -> CompileResult<bool> {
    if id.is_placeholder() {
        union_or_contradict(aliases, id, &AnyId::Eternal(*existing), cmd)?;
        return Ok(true);
    }
    Ok(slice.lookup(id).map(|reference| reference.uid) == Some(*existing))
}

fn union_or_contradict(
    aliases: &mut AliasTable,
    a: &AnyId,
    b: &AnyId,
    cmd: &Command,
) -> CompileResult<()> {
    aliases.union(a, b).map(|_| ()).map_err(|err| match err {
        CompileError::Conflict { message, .. } => CompileError::Conflict {
            message,
            commands: vec![cmd.clone()],
        },
        other => other,
    })
}
