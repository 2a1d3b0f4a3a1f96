//! Identity bindings made while one batch executes.

use crate::error::{TransactionError, TransactionResult};
use std::collections::BTreeMap;
use wish_core::{AnyId, AtomRef, Transaction};

/// Maps every name a batch uses to the record it ended up as.
#[derive(Debug, Default)]
pub struct Names {
    bound: BTreeMap<AnyId, AtomRef>,
}

impl Names {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `id` to `reference`. A name cannot stand for two different records.
    pub fn bind(&mut self, id: AnyId, reference: AtomRef) -> TransactionResult<()> {
        match self.bound.get(&id) {
            Some(existing) if existing.uid != reference.uid => {
                Err(TransactionError::conflict(format!(
                    "{} is bound to both {} and {}",
                    id, existing.uid, reference.uid
                )))
            }
            Some(_) => Ok(()),
            None => {
                self.bound.insert(id, reference);
                Ok(())
            }
        }
    }

    pub fn get(&self, id: &AnyId) -> Option<&AtomRef> {
        self.bound.get(id)
    }

    /// Resolve `id` to a record: names bound earlier in the batch first, then the graph.
    ///
    /// Value and delegate identities are interned on first use.
    pub fn resolve(&mut self, tx: &mut dyn Transaction, id: &AnyId) -> TransactionResult<AtomRef> {
        if let Some(reference) = self.bound.get(id) {
            return Ok(reference.clone());
        }
        let reference = match tx.lookup(id) {
            Some(reference) => reference,
            None => match id {
                AnyId::Value(value) => tx.create_value_node(value)?,
                AnyId::Delegate(delegate) => tx.create_delegate(delegate)?,
                _ => return Err(TransactionError::Unbound(id.clone())),
            },
        };
        self.bound.insert(id.clone(), reference.clone());
        Ok(reference)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AnyId, &AtomRef)> {
        self.bound.iter()
    }
}
