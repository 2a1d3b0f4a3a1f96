//! Wish Graph Storage
//!
//! An in-memory reference engine implementing the capabilities the wish pipeline consumes:
//! - `Graph`: a target graph with a write head and atomic transactions
//! - `Slice`: an immutable snapshot of one version
//! - `GraphTransaction`: write primitives over a private copy of the state
//! - Indexes: entity types, relation adjacency, value and delegate content

mod graph;
mod index;
mod slice;
mod state;
mod txn;

pub use graph::*;
pub use slice::*;
pub use state::*;
pub use txn::*;
