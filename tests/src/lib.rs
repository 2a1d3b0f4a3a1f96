//! Wish Integration Test Framework
//!
//! Scenarios run a sequence of wishes against one graph and check each step:
//! - `Scenario`: named steps, each a wish built from the receipts so far
//! - `AssertionBuilder`: fluent expectations on the batch, the commit, or the error
//! - `Runner`: resolves, applies and verifies every step in order

mod assertion;
mod error;
mod fixtures;
mod runner;
mod scenario;

pub use assertion::{Assertion, AssertionBuilder};
pub use error::{ScenarioError, ScenarioResult};
pub use fixtures::{attribute_targets, init_tracing, person_with_names};
pub use runner::{Context, Runner, StepOutcome};
pub use scenario::{Scenario, Step};

pub mod prelude {
    pub use crate::{
        attribute_targets, init_tracing, person_with_names, AssertionBuilder, Context, Scenario,
        ScenarioError, StepOutcome,
    };
    pub use wish_compiler::{
        Atom, AttributeLiteral, Command, CommandKind, CompileError, EntityLiteral, Field,
        FieldValue, Level2Command, ObjectNotation, Pipeline, RelationLiteral, ResolveOptions,
        Template, WishItem,
    };
    pub use wish_core::{
        AnyId, AtomKind, AtomRef, AttributeType, EntityType, EternalUid, GraphError, GraphSlice,
        GraphUid, RelationType, TargetGraph, Value, ValueKind, WrappedValue, WriteHead,
    };
    pub use wish_graph::Graph;
    pub use wish_transaction::{
        apply, execute, handle_remote_merge, resolve_and_transact, resolve_commands,
        resolve_encoded, Effect, Receipt, RemoteMergeReply, RemoteWish, TransactionError,
        Unpacked,
    };
}
