//! The compilation pipeline: level-2 commands to an ordered command batch.

use crate::cull::cull;
use crate::interpret::interpret;
use crate::order::order;
use crate::prepare::{insert_must_live, prepare};
use crate::recombine::recombine;
use crate::{
    AliasTable, Command, CompileResult, GenerationState, Level2Command, ResolveOptions, WishItem,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;
use wish_core::{AnyId, EternalUid, GraphSlice, InternalId, SliceMarker, Variable};

/// An ordered, conflict-free command list, valid against one slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandBatch {
    /// The slice the batch was compiled against.
    pub slice: SliceMarker,
    pub commands: Vec<Command>,
    /// Every variable merged into another identity, with the identity it resolved to.
    pub resolved_variables: BTreeMap<Variable, AnyId>,
    pub resolved_internal_ids: Vec<(InternalId, AnyId)>,
    /// Eternal uids the wish referred to.
    pub eternal_ids: BTreeSet<EternalUid>,
    /// Generation state after compilation.
    pub generation: GenerationState,
}

impl CommandBatch {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

/// Interpreted input, ready to compile.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
    pub commands: Vec<Level2Command>,
    pub generation: GenerationState,
}

/// Interpret raw items with the rules and salt from `options`.
pub fn interpret_items(
    items: Vec<WishItem>,
    options: &ResolveOptions,
) -> CompileResult<Interpretation> {
    let mut generation = options.generation();
    let commands = interpret(items, &options.rules, &mut generation)?;
    Ok(Interpretation {
        commands,
        generation,
    })
}

/// Compile level-2 commands against `slice`.
pub fn compile(
    level2: Vec<Level2Command>,
    slice: &dyn GraphSlice,
    options: &ResolveOptions,
    mut gen: GenerationState,
) -> CompileResult<CommandBatch> {
    let marker = slice.marker();
    debug!(slice = %marker, commands = level2.len(), "compiling");

    let prepared = prepare(level2, slice, &mut gen)?;
    let eternal_ids = referenced_eternal_ids(&prepared);
    let prepared = insert_must_live(prepared, slice);

    let passes = options.max_recombination_passes;
    let mut aliases = AliasTable::new();
    let mut cmds = recombine(prepared, &mut aliases, &mut gen, passes)?;

    // culling can prove more names equal, which can enable more merges
    let mut vanished = BTreeSet::new();
    loop {
        let unions = aliases.union_count();
        cmds = cull(cmds, slice, &mut aliases, &mut vanished)?;
        if aliases.union_count() == unions {
            break;
        }
        cmds = recombine(cmds, &mut aliases, &mut gen, passes)?;
    }

    let commands = order(cmds, slice)?;
    debug!(slice = %marker, commands = commands.len(), "compiled");
    Ok(CommandBatch {
        slice: marker,
        commands,
        resolved_variables: aliases.resolved_variables(),
        resolved_internal_ids: aliases.resolved_internal_ids(),
        eternal_ids,
        generation: gen,
    })
}

/// Interpret and compile raw items in one step.
pub fn compile_items(
    items: Vec<WishItem>,
    slice: &dyn GraphSlice,
    options: &ResolveOptions,
) -> CompileResult<CommandBatch> {
    let Interpretation {
        commands,
        generation,
    } = interpret_items(items, options)?;
    compile(commands, slice, options, generation)
}

fn referenced_eternal_ids(cmds: &[Command]) -> BTreeSet<EternalUid> {
    cmds.iter()
        .flat_map(|cmd| {
            let mut ids = cmd.names();
            ids.extend(cmd.dependencies());
            ids
        })
        .filter_map(|id| id.as_eternal().copied())
        .collect()
}
