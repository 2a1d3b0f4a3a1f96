//! Per-command execution.
//!
//! - `instantiate.rs` - INSTANTIATE (record creation, value and delegate interning)
//! - `assign.rs` - ASSIGN (attribute values)
//! - `terminate.rs` - TERMINATE (removal with cascade)

mod assign;
mod instantiate;
mod terminate;

pub use assign::execute_assign;
pub use instantiate::execute_instantiate;
pub use terminate::execute_terminate;
