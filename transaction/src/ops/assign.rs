//! ASSIGN operation - sets attribute values.

use wish_compiler::Command;
use wish_core::{AtomRef, Transaction};

use crate::error::{TransactionError, TransactionResult};
use crate::names::Names;

pub fn execute_assign(
    tx: &mut dyn Transaction,
    names: &mut Names,
    cmd: &Command,
) -> TransactionResult<AtomRef> {
    match cmd {
        Command::Assign { target, value, .. } => {
            let target = names.resolve(tx, target)?;
            Ok(tx.set_value(&target, value)?)
        }
        other => Err(TransactionError::UnexpectedCommand(other.to_string())),
    }
}
