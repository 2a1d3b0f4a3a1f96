//! Alias resolution: a union-find over identities.

use crate::{CompileError, CompileResult};
use std::collections::BTreeMap;
use tracing::trace;
use wish_core::{AnyId, InternalId, Variable};

/// Which identities denote the same thing, for one resolution call.
///
/// The root of every set is its most specific member: a permanent identity if the set
/// has one, else a variable, else an internal id. Two distinct permanent identities
/// never share a set.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    parent: BTreeMap<AnyId, AnyId>,
    unions: usize,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The canonical member of `id`'s set.
    pub fn find(&mut self, id: &AnyId) -> AnyId {
        let root = self.resolve(id);

        // path compression
        let mut current = id.clone();
        while let Some(next) = self.parent.get(&current).cloned() {
            if next == root {
                break;
            }
            self.parent.insert(current, root.clone());
            current = next;
        }
        root
    }

    /// The canonical member of `id`'s set, without compressing paths.
    pub fn resolve(&self, id: &AnyId) -> AnyId {
        let mut current = id;
        while let Some(next) = self.parent.get(current) {
            current = next;
        }
        current.clone()
    }

    /// Merge the sets of `a` and `b`. Returns the new root.
    pub fn union(&mut self, a: &AnyId, b: &AnyId) -> CompileResult<AnyId> {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return Ok(ra);
        }
        if ra.is_permanent() && rb.is_permanent() {
            return Err(CompileError::conflict(format!(
                "cannot merge distinct permanent identities {} and {}",
                ra, rb
            )));
        }

        let (root, child) = if preferred(&ra, &rb) { (ra, rb) } else { (rb, ra) };
        trace!(root = %root, child = %child, "alias");
        self.parent.insert(child, root.clone());
        self.unions += 1;
        Ok(root)
    }

    /// Merge every id of `ids` into one set.
    pub fn union_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a AnyId>) -> CompileResult<()> {
        let mut ids = ids.into_iter();
        if let Some(first) = ids.next() {
            for id in ids {
                self.union(first, id)?;
            }
        }
        Ok(())
    }

    /// Number of merges so far. Grows whenever two sets become one.
    pub fn union_count(&self) -> usize {
        self.unions
    }

    /// Every variable that was merged into something, with its root.
    pub fn resolved_variables(&self) -> BTreeMap<Variable, AnyId> {
        self.parent
            .keys()
            .filter_map(|id| id.as_variable().map(|var| (var.clone(), self.resolve(id))))
            .collect()
    }

    /// Every internal id that was merged into something, with its root.
    pub fn resolved_internal_ids(&self) -> Vec<(InternalId, AnyId)> {
        self.parent
            .keys()
            .filter_map(|id| match id {
                AnyId::Internal(internal) => Some((internal.clone(), self.resolve(id))),
                _ => None,
            })
            .collect()
    }
}

/// Returns true if `a` should be the root over `b`.
fn preferred(a: &AnyId, b: &AnyId) -> bool {
    match a.rank().cmp(&b.rank()) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => a < b,
    }
}
