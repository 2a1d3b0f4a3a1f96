//! Change tracking for one engine transaction.

use crate::{AtomRef, EternalUid, SliceMarker, Value};

/// A value assignment made inside a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpdate {
    /// The attribute assigned to.
    pub target: EternalUid,
    /// The value before the assignment.
    pub old_value: Option<Value>,
    /// The new value.
    pub new_value: Value,
}

/// Everything one transaction changed, in application order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    created: Vec<AtomRef>,
    updated: Vec<PendingUpdate>,
    removed: Vec<AtomRef>,
}

impl ChangeSet {
    /// Create a new empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_create(&mut self, reference: AtomRef) {
        self.created.push(reference);
    }

    pub fn record_update(
        &mut self,
        target: EternalUid,
        old_value: Option<Value>,
        new_value: Value,
    ) {
        self.updated.push(PendingUpdate {
            target,
            old_value,
            new_value,
        });
    }

    pub fn record_remove(&mut self, reference: AtomRef) {
        self.removed.push(reference);
    }

    pub fn created(&self) -> &[AtomRef] {
        &self.created
    }

    pub fn updated(&self) -> &[PendingUpdate] {
        &self.updated
    }

    pub fn removed(&self) -> &[AtomRef] {
        &self.removed
    }

    /// Number of created records of relation kind.
    pub fn relations_created(&self) -> usize {
        self.created.iter().filter(|r| r.kind.is_relation()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// The outcome of a committed transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    /// The slice the commit produced.
    pub marker: SliceMarker,
    pub changes: ChangeSet,
}
