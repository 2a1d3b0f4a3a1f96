//! Scenario definitions.

use wish_compiler::{ResolveOptions, WishItem};
use wish_core::GraphUid;
use wish_graph::Graph;

use crate::assertion::{Assertion, AssertionBuilder};
use crate::error::ScenarioResult;
use crate::runner::{Context, Runner};

/// Builds a step's wish from what earlier steps produced.
pub type WishFn = Box<dyn Fn(&Context) -> ScenarioResult<Vec<WishItem>>>;

/// One step: a wish and what applying it should do.
pub struct Step {
    pub name: String,
    pub wish: WishFn,
    pub assertion: Assertion,
}

/// A named sequence of wishes applied to one graph.
pub struct Scenario {
    name: String,
    graph: GraphUid,
    options: ResolveOptions,
    steps: Vec<Step>,
}

impl Scenario {
    /// Create a new scenario on graph 1.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            graph: GraphUid::new(1),
            options: ResolveOptions::new().with_salt("scenario"),
            steps: Vec::new(),
        }
    }

    /// Run against the graph with this uid.
    pub fn graph(mut self, uid: GraphUid) -> Self {
        self.graph = uid;
        self
    }

    pub fn options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    /// Add a step.
    pub fn step<W, A>(mut self, name: impl Into<String>, wish: W, assertion: A) -> Self
    where
        W: Fn(&Context) -> ScenarioResult<Vec<WishItem>> + 'static,
        A: FnOnce(AssertionBuilder) -> AssertionBuilder,
    {
        self.steps.push(Step {
            name: name.into(),
            wish: Box::new(wish),
            assertion: assertion(AssertionBuilder::new()).build(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn resolve_options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Run every step on a fresh graph and return the graph afterwards.
    pub fn run(&self) -> ScenarioResult<Graph> {
        Runner::new(self, Graph::new(self.graph)).run()
    }

    /// Run every step on an existing graph.
    pub fn run_on(&self, graph: Graph) -> ScenarioResult<Graph> {
        Runner::new(self, graph).run()
    }
}
