//! Wish Core Types
//!
//! This crate provides the foundational types shared by the wish pipeline:
//! - Identity kinds (EternalUid, Variable, InternalId, DelegateRef, WrappedValue, AnyId)
//! - Value types and their content hash
//! - Atom types (EntityType, AttributeType, RelationType)
//! - Records and references (Record, AtomRef, SliceMarker)
//! - Engine capability traits (GraphSlice, Transaction, TargetGraph)
//! - Engine error types

mod changes;
mod entity;
mod error;
mod id;
mod store;
mod types;
mod value;

pub use changes::*;
pub use entity::*;
pub use error::*;
pub use id::*;
pub use store::*;
pub use types::*;
pub use value::*;
