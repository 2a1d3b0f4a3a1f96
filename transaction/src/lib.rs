//! Wish Transaction
//!
//! Apply compiled wishes to a target graph.
//!
//! Responsibilities:
//! - Revalidate the slice a batch was compiled against
//! - Run every command inside one engine transaction (all or nothing)
//! - Build the receipt and unpack it into the caller's shape
//! - Answer remote wishes over a JSON wire form

mod effect;
mod error;
mod executor;
mod names;
mod ops;
mod receipt;
mod remote;

pub use effect::{
    apply, resolve_and_transact, resolve_commands, resolve_encoded, Effect, EffectOutput,
};
pub use error::{TransactionError, TransactionResult};
pub use executor::{check_slice, execute, execute_with, Applied};
pub use names::Names;
pub use receipt::{Receipt, ReceiptEntry, Unpacked};
pub use remote::{handle_remote_merge, RemoteMergeReply, RemoteWish};
