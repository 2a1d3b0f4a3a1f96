//! Scenario runner.

use tracing::debug;
use wish_compiler::{Command, CommandBatch, CommandKind, WishItem};
use wish_core::{AtomRef, TargetGraph};
use wish_graph::Graph;
use wish_transaction::{execute, resolve_and_transact, Applied, Receipt, TransactionResult};

use crate::error::{ScenarioError, ScenarioResult};
use crate::scenario::Scenario;

/// What a step's wish can see: every name earlier steps produced.
#[derive(Debug, Clone)]
pub struct Context {
    step: String,
    receipt: Receipt,
}

impl Context {
    /// The record an earlier step bound to `name`.
    pub fn var(&self, name: &str) -> ScenarioResult<AtomRef> {
        self.receipt
            .var(name)
            .cloned()
            .ok_or_else(|| ScenarioError::unknown_variable(&self.step, name))
    }

    pub fn receipt(&self) -> &Receipt {
        &self.receipt
    }
}

/// A step that compiled and committed.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub batch: CommandBatch,
    pub applied: Applied,
}

impl StepOutcome {
    pub fn count(&self, kind: CommandKind) -> usize {
        self.batch.commands.iter().filter(|c| c.kind() == kind).count()
    }

    pub fn relation_instantiates(&self) -> usize {
        self.batch
            .commands
            .iter()
            .filter(|c| c.is_relation_instantiate())
            .count()
    }

    pub fn commands(&self) -> &[Command] {
        &self.batch.commands
    }
}

/// Runs a scenario against one graph.
pub struct Runner<'s> {
    scenario: &'s Scenario,
    graph: Graph,
}

impl<'s> Runner<'s> {
    pub fn new(scenario: &'s Scenario, graph: Graph) -> Self {
        Self { scenario, graph }
    }

    /// Run the scenario.
    pub fn run(mut self) -> ScenarioResult<Graph> {
        let scenario = self.scenario;
        let mut seen = Receipt::new();
        for step in scenario.steps() {
            let context = Context {
                step: step.name.clone(),
                receipt: seen.clone(),
            };
            let items = (step.wish)(&context)?;
            debug!(scenario = scenario.name(), step = %step.name, "running step");

            let result = self.apply(items).map_err(|e| e.to_string());
            step.assertion.verify(&step.name, &result)?;

            if let Ok(outcome) = result {
                for (id, reference) in outcome.applied.receipt.iter() {
                    seen.insert(id.clone(), reference.clone());
                }
            }
        }
        Ok(self.graph)
    }

    fn apply(&mut self, items: Vec<WishItem>) -> TransactionResult<StepOutcome> {
        let effect = resolve_and_transact(items, &self.graph, self.scenario.resolve_options())?;
        let applied = execute(&effect.batch, &mut self.graph, effect.retain_internal_ids)?;
        debug!(head = %self.graph.current_write_head(), "step applied");
        Ok(StepOutcome {
            batch: effect.batch,
            applied,
        })
    }
}
