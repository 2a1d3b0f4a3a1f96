//! INSTANTIATE operation - creates records.

use wish_compiler::{Atom, Command};
use wish_core::{AtomRef, Transaction};

use crate::error::{TransactionError, TransactionResult};
use crate::names::Names;

/// Create the record an `Instantiate` describes and bind all of its names to it.
pub fn execute_instantiate(
    tx: &mut dyn Transaction,
    names: &mut Names,
    cmd: &Command,
) -> TransactionResult<AtomRef> {
    let Command::Instantiate {
        atom, origin_uid, ..
    } = cmd
    else {
        return Err(TransactionError::UnexpectedCommand(cmd.to_string()));
    };
    let origin = origin_uid.as_ref();

    let reference = match atom {
        Atom::Entity(ty) => tx.create_entity(ty, origin)?,
        Atom::Attribute(ty) => tx.create_attribute(ty, origin)?,
        Atom::Relation { rt, source, target } => {
            let source = names.resolve(tx, source)?;
            let target = names.resolve(tx, target)?;
            tx.create_relation(rt, &source, &target, origin)?
        }
        Atom::Delegate(delegate) => tx.create_delegate(delegate)?,
        Atom::Value(value) => tx.create_value_node(value)?,
    };

    for name in cmd.names() {
        names.bind(name, reference.clone())?;
    }
    Ok(reference)
}
