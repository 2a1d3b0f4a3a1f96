//! TERMINATE operation - removes records.
//!
//! The engine removes every relation touching the record along with it.

use wish_compiler::Command;
use wish_core::{AtomRef, Transaction};

use crate::error::{TransactionError, TransactionResult};
use crate::names::Names;

pub fn execute_terminate(
    tx: &mut dyn Transaction,
    names: &mut Names,
    cmd: &Command,
) -> TransactionResult<AtomRef> {
    match cmd {
        Command::Terminate { target } => {
            let target = names.resolve(tx, target)?;
            Ok(tx.remove(&target)?)
        }
        other => Err(TransactionError::UnexpectedCommand(other.to_string())),
    }
}
