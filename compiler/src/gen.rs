//! Per-call generation of internal ids.

use serde::{Deserialize, Serialize};
use wish_core::{AnyId, InternalId};

/// Source of fresh `InternalId`s for one resolution call.
///
/// Owned by the call and passed along by `&mut`; two calls never share a state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationState {
    salt: String,
    counter: u64,
}

impl GenerationState {
    pub fn new(salt: impl Into<String>) -> Self {
        Self {
            salt: salt.into(),
            counter: 0,
        }
    }

    /// A state with a random salt, so ids from separate calls never collide.
    pub fn random() -> Self {
        Self::new(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Mint the next internal id.
    pub fn next_internal(&mut self) -> InternalId {
        self.counter += 1;
        InternalId::new(self.salt.clone(), self.counter)
    }

    /// Mint the next internal id as an `AnyId`.
    pub fn next_id(&mut self) -> AnyId {
        AnyId::Internal(self.next_internal())
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    /// How many ids have been minted.
    pub fn counter(&self) -> u64 {
        self.counter
    }
}
