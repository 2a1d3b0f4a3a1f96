//! Effects: a compiled wish bound to the graph it was compiled for.
//!
//! Resolution is pure and only reads a slice. Applying the effect is the single step
//! that writes.

use tracing::debug;
use std::collections::BTreeSet;
use wish_compiler::{
    compile, encode, interpret, interpret_items, Command, CommandBatch, Interpretation,
    Level2Command, ResolveOptions, Template, WishItem,
};
use wish_core::{AnyId, GraphSlice, GraphUid, SliceMarker, TargetGraph};

use crate::error::{TransactionError, TransactionResult};
use crate::executor::{check_slice, execute_with, Applied};
use crate::receipt::{Receipt, Unpacked};

/// A resolved wish, ready to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    /// The graph the batch targets.
    pub target: GraphUid,
    /// Interpreted input, kept so the wish can be recompiled on a newer slice.
    pub interpretation: Interpretation,
    pub batch: CommandBatch,
    pub retain_internal_ids: bool,
    /// Shape of the caller's input, when it was encoded.
    pub template: Option<Template>,
}

/// What running an effect produced.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectOutput {
    pub receipt: Receipt,
    pub unpacked: Option<Unpacked>,
    /// The slice after the commit.
    pub marker: SliceMarker,
}

/// Interpret and compile `items` against the current slice of `graph`.
pub fn resolve_and_transact<G: TargetGraph>(
    items: Vec<WishItem>,
    graph: &G,
    options: &ResolveOptions,
) -> TransactionResult<Effect> {
    let interpretation = interpret_items(items, options)?;
    Effect::compile(interpretation, graph, options, options.retain_internal_ids, None)
}

/// Compile level-2 commands against the current slice of `graph`.
pub fn resolve_commands<G: TargetGraph>(
    commands: Vec<Level2Command>,
    graph: &G,
    options: &ResolveOptions,
) -> TransactionResult<Effect> {
    let interpretation = Interpretation {
        commands,
        generation: options.generation(),
    };
    Effect::compile(interpretation, graph, options, options.retain_internal_ids, None)
}

/// Name every top-level item first, so the receipt unpacks into the input's shape.
pub fn resolve_encoded<G: TargetGraph>(
    items: Vec<WishItem>,
    graph: &G,
    options: &ResolveOptions,
) -> TransactionResult<Effect> {
    let mut generation = options.generation();
    let (items, template) = encode(items, &mut generation)?;
    let commands = interpret(items, &options.rules, &mut generation)?;
    let interpretation = Interpretation {
        commands,
        generation,
    };
    // template ids are usually internal
    Effect::compile(interpretation, graph, options, true, Some(template))
}

/// Apply `effect` and return its receipt.
pub fn apply<G: TargetGraph>(effect: Effect, graph: &mut G) -> TransactionResult<Receipt> {
    effect.run(graph).map(|output| output.receipt)
}

impl Effect {
    fn compile<G: TargetGraph>(
        interpretation: Interpretation,
        graph: &G,
        options: &ResolveOptions,
        retain_internal_ids: bool,
        template: Option<Template>,
    ) -> TransactionResult<Self> {
        let slice = graph.slice();
        let batch = compile(
            interpretation.commands.clone(),
            &slice,
            options,
            interpretation.generation.clone(),
        )?;
        debug!(slice = %batch.slice, commands = batch.len(), "wish resolved");
        Ok(Self {
            target: graph.uid(),
            interpretation,
            batch,
            retain_internal_ids,
            template,
        })
    }

    /// Execute the batch and unpack the template, if any.
    ///
    /// A template the batch cannot satisfy fails before anything is written.
    pub fn run<G: TargetGraph>(self, graph: &mut G) -> TransactionResult<EffectOutput> {
        let wanted: Vec<AnyId> = match &self.template {
            Some(template) => {
                check_slice(&self.batch, graph)?;
                self.check_template(template, &graph.slice())?;
                template.ids().into_iter().cloned().collect()
            }
            None => Vec::new(),
        };
        let Applied {
            receipt, marker, ..
        } = execute_with(&self.batch, graph, self.retain_internal_ids, &wanted)?;
        let unpacked = self
            .template
            .as_ref()
            .map(|template| receipt.unpack(template))
            .transpose()?;
        Ok(EffectOutput {
            receipt,
            unpacked,
            marker,
        })
    }

    /// Recompile against the current slice of `graph`, e.g. after a stale-slice rejection.
    pub fn rebase<G: TargetGraph>(
        self,
        graph: &G,
        options: &ResolveOptions,
    ) -> TransactionResult<Self> {
        Self::compile(
            self.interpretation,
            graph,
            options,
            self.retain_internal_ids,
            self.template,
        )
    }

    pub fn is_noop(&self) -> bool {
        self.batch.is_empty()
    }

    /// Every required template id must exist once the batch has run.
    fn check_template(
        &self,
        template: &Template,
        slice: &dyn GraphSlice,
    ) -> TransactionResult<()> {
        let mut created = BTreeSet::new();
        let mut terminated = BTreeSet::new();
        for cmd in &self.batch.commands {
            match cmd {
                Command::Instantiate { .. } => created.extend(cmd.names()),
                Command::Terminate { target } => {
                    terminated.insert(target.clone());
                }
                _ => {}
            }
        }
        for id in template.required_ids() {
            let resolved = self.resolved(id);
            let exists = created.contains(&resolved) || slice.contains(&resolved);
            if !exists || terminated.contains(&resolved) {
                return Err(TransactionError::MissingFromReceipt(id.clone()));
            }
        }
        Ok(())
    }

    /// The identity a placeholder was merged into, or the id itself.
    fn resolved(&self, id: &AnyId) -> AnyId {
        let merged = match id {
            AnyId::Variable(var) => self.batch.resolved_variables.get(var).cloned(),
            AnyId::Internal(internal) => self
                .batch
                .resolved_internal_ids
                .iter()
                .find(|(candidate, _)| candidate == internal)
                .map(|(_, target)| target.clone()),
            _ => None,
        };
        merged.unwrap_or_else(|| id.clone())
    }
}
