//! Options for one resolution call.

use crate::{GenerationState, InterpretationRules};

/// Default bound on recombination passes.
pub const DEFAULT_MAX_RECOMBINATION_PASSES: usize = 64;

/// Options for resolving a wish.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Salt for minted internal ids. A random one is used when unset.
    pub salt: Option<String>,
    /// Keep internal ids in the receipt.
    pub retain_internal_ids: bool,
    pub max_recombination_passes: usize,
    pub rules: InterpretationRules,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            salt: None,
            retain_internal_ids: false,
            max_recombination_passes: DEFAULT_MAX_RECOMBINATION_PASSES,
            rules: InterpretationRules::standard(),
        }
    }
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    pub fn retain_internal_ids(mut self, retain: bool) -> Self {
        self.retain_internal_ids = retain;
        self
    }

    pub fn with_max_recombination_passes(mut self, passes: usize) -> Self {
        self.max_recombination_passes = passes;
        self
    }

    pub fn with_rules(mut self, rules: InterpretationRules) -> Self {
        self.rules = rules;
        self
    }

    /// A fresh generation state for one call.
    pub fn generation(&self) -> GenerationState {
        match &self.salt {
            Some(salt) => GenerationState::new(salt.clone()),
            None => GenerationState::random(),
        }
    }
}
