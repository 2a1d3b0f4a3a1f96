//! Wish Compiler
//!
//! Turn heterogeneous wish input into an ordered, conflict-free command batch.
//!
//! Stages:
//! - Interpretation: raw items to level-2 commands, through a rule table keyed by shape
//! - Preparation: object notation to level-1 commands against a graph slice
//! - Recombination: merge commands about the same identity, to a fixed point
//! - Culling: drop commands the slice already satisfies
//! - Ordering: topological sort under structural dependencies

mod alias;
mod batch;
mod command;
mod config;
mod cull;
mod error;
mod gen;
mod interpret;
mod order;
mod pipeline;
mod prepare;
mod recombine;
mod tagging;
mod template;
mod wish;

pub use alias::AliasTable;
pub use batch::{compile, compile_items, interpret_items, CommandBatch, Interpretation};
pub use command::{
    Atom, Command, CommandKind, Field, FieldValue, Level2Command, ObjectNotation, RelationClaim,
};
pub use config::{ResolveOptions, DEFAULT_MAX_RECOMBINATION_PASSES};
pub use cull::cull;
pub use error::{CompileError, CompileResult, Stranded};
pub use gen::GenerationState;
pub use interpret::{interpret, InterpretRule, Interpreted, InterpretationRules};
pub use order::{order, verify_order};
pub use prepare::{bound_records, insert_must_live, prepare, prepare_object};
pub use recombine::recombine;
pub use tagging::ensure_tag;
pub use template::{encode, Template};
pub use wish::{
    AttributeLiteral, EntityLiteral, Fanout, Pipeline, PipelineOp, RelationLiteral, ShapeKind,
    Triple, WishItem,
};
