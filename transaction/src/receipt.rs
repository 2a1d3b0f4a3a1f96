//! Receipts: what each name in a wish ended up as.

use crate::error::{TransactionError, TransactionResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wish_compiler::Template;
use wish_core::{AnyId, AtomRef, Variable};

/// One receipt entry on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptEntry {
    pub id: AnyId,
    pub reference: AtomRef,
}

/// Map from the identities a caller used to the records they resolved to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ReceiptEntry>", into = "Vec<ReceiptEntry>")]
pub struct Receipt {
    entries: BTreeMap<AnyId, AtomRef>,
}

impl From<Vec<ReceiptEntry>> for Receipt {
    fn from(entries: Vec<ReceiptEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.id, e.reference)).collect(),
        }
    }
}

impl From<Receipt> for Vec<ReceiptEntry> {
    fn from(receipt: Receipt) -> Self {
        receipt
            .entries
            .into_iter()
            .map(|(id, reference)| ReceiptEntry { id, reference })
            .collect()
    }
}

impl Receipt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: AnyId, reference: AtomRef) {
        self.entries.insert(id, reference);
    }

    pub fn get(&self, id: &AnyId) -> Option<&AtomRef> {
        self.entries.get(id)
    }

    /// Look up a variable by name.
    pub fn var(&self, name: &str) -> Option<&AtomRef> {
        self.entries.get(&AnyId::Variable(Variable::new(name)))
    }

    pub fn contains(&self, id: &AnyId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AnyId, &AtomRef)> {
        self.entries.iter()
    }

    /// Rebuild the caller's shape from `template`.
    ///
    /// A required id missing from the receipt is an error; a missing optional id
    /// unpacks to `Unpacked::Absent`.
    pub fn unpack(&self, template: &Template) -> TransactionResult<Unpacked> {
        match template {
            Template::Id(id) => self
                .get(id)
                .cloned()
                .map(Unpacked::Ref)
                .ok_or_else(|| TransactionError::MissingFromReceipt(id.clone())),
            Template::Optional(id) => Ok(self
                .get(id)
                .cloned()
                .map_or(Unpacked::Absent, Unpacked::Ref)),
            Template::Seq(items) => items
                .iter()
                .map(|item| self.unpack(item))
                .collect::<TransactionResult<Vec<_>>>()
                .map(Unpacked::Seq),
            Template::Map(entries) => entries
                .iter()
                .map(|(key, item)| Ok((key.clone(), self.unpack(item)?)))
                .collect::<TransactionResult<BTreeMap<_, _>>>()
                .map(Unpacked::Map),
        }
    }
}

/// A template filled in from a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unpacked {
    Ref(AtomRef),
    Absent,
    Seq(Vec<Unpacked>),
    Map(BTreeMap<String, Unpacked>),
}

impl Unpacked {
    pub fn reference(&self) -> Option<&AtomRef> {
        match self {
            Unpacked::Ref(reference) => Some(reference),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Unpacked]> {
        match self {
            Unpacked::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Unpacked::Absent)
    }
}
