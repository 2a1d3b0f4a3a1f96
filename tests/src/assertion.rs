//! Assertion types and builders for verifying step results.

use wish_compiler::CommandKind;

use crate::error::{ScenarioError, ScenarioResult};
use crate::runner::StepOutcome;

/// A complete assertion for a step result.
#[derive(Default)]
pub struct Assertion {
    // Batch assertions
    pub commands: Option<usize>,
    pub instantiates: Option<usize>,
    pub relations: Option<usize>,
    pub assigns: Option<usize>,
    pub terminates: Option<usize>,

    // Commit assertions
    pub created: Option<usize>,
    pub linked: Option<usize>,
    pub updated: Option<usize>,
    pub removed: Option<usize>,

    // Error assertions
    pub error: Option<String>,

    // Custom assertion function
    #[allow(clippy::type_complexity)]
    pub custom: Option<Box<dyn Fn(&StepOutcome) -> bool>>,
}

impl std::fmt::Debug for Assertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assertion")
            .field("commands", &self.commands)
            .field("instantiates", &self.instantiates)
            .field("relations", &self.relations)
            .field("assigns", &self.assigns)
            .field("terminates", &self.terminates)
            .field("created", &self.created)
            .field("linked", &self.linked)
            .field("updated", &self.updated)
            .field("removed", &self.removed)
            .field("error", &self.error)
            .field("custom", &self.custom.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Assertion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verify the assertion against a step result.
    pub fn verify(&self, step: &str, result: &Result<StepOutcome, String>) -> ScenarioResult<()> {
        if let Some(expected) = &self.error {
            return match result {
                Err(msg) if msg.contains(expected.as_str()) => Ok(()),
                Err(msg) => Err(ScenarioError::assertion_failed(
                    step,
                    format!("expected error containing '{}', got: {}", expected, msg),
                )),
                Ok(_) => Err(ScenarioError::assertion_failed(
                    step,
                    format!("expected error containing '{}', but step succeeded", expected),
                )),
            };
        }

        let outcome = result
            .as_ref()
            .map_err(|msg| ScenarioError::step_failed(step, msg.clone()))?;

        let changes = &outcome.applied.changes;
        let checks = [
            ("commands", self.commands, outcome.batch.len()),
            ("instantiates", self.instantiates, outcome.count(CommandKind::Instantiate)),
            ("relation instantiates", self.relations, outcome.relation_instantiates()),
            ("assigns", self.assigns, outcome.count(CommandKind::Assign)),
            ("terminates", self.terminates, outcome.count(CommandKind::Terminate)),
            ("created records", self.created, changes.created().len()),
            ("created relations", self.linked, changes.relations_created()),
            ("updated values", self.updated, changes.updated().len()),
            ("removed records", self.removed, changes.removed().len()),
        ];
        for (what, expected, actual) in checks {
            if let Some(expected) = expected {
                if expected != actual {
                    return Err(ScenarioError::assertion_failed(
                        step,
                        format!("expected {} {}, got {}", expected, what, actual),
                    ));
                }
            }
        }

        if let Some(custom) = &self.custom {
            if !custom(outcome) {
                return Err(ScenarioError::assertion_failed(step, "custom assertion failed"));
            }
        }
        Ok(())
    }
}

/// Builder for fluent assertion construction.
#[derive(Default)]
pub struct AssertionBuilder {
    assertion: Assertion,
}

impl AssertionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(self) -> Assertion {
        self.assertion
    }

    // ========== Batch assertions ==========

    /// Assert the compiled batch holds N commands.
    pub fn commands(mut self, n: usize) -> Self {
        self.assertion.commands = Some(n);
        self
    }

    pub fn instantiates(mut self, n: usize) -> Self {
        self.assertion.instantiates = Some(n);
        self
    }

    /// Assert N of the instantiates create relations.
    pub fn relations(mut self, n: usize) -> Self {
        self.assertion.relations = Some(n);
        self
    }

    pub fn assigns(mut self, n: usize) -> Self {
        self.assertion.assigns = Some(n);
        self
    }

    pub fn terminates(mut self, n: usize) -> Self {
        self.assertion.terminates = Some(n);
        self
    }

    /// Assert nothing needed doing.
    pub fn noop(self) -> Self {
        self.commands(0)
    }

    // ========== Commit assertions ==========

    /// Assert N records were created, value nodes included.
    pub fn created(mut self, n: usize) -> Self {
        self.assertion.created = Some(n);
        self
    }

    pub fn linked(mut self, n: usize) -> Self {
        self.assertion.linked = Some(n);
        self
    }

    pub fn updated(mut self, n: usize) -> Self {
        self.assertion.updated = Some(n);
        self
    }

    pub fn removed(mut self, n: usize) -> Self {
        self.assertion.removed = Some(n);
        self
    }

    // ========== Errors ==========

    /// Assert the step fails with an error containing `text`.
    pub fn error(mut self, text: impl Into<String>) -> Self {
        self.assertion.error = Some(text.into());
        self
    }

    // ========== Advanced ==========

    pub fn assert_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&StepOutcome) -> bool + 'static,
    {
        self.assertion.custom = Some(Box::new(f));
        self
    }
}
