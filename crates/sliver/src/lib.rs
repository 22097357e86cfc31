//! Demand-driven interpreter that explains every value it computes.
//!
//! Programs are built with [`syntax::ProgramBuilder`] and evaluated by
//! [`eval::Evaluator`] into a versioned [`store::Store`] of explained values.
//! The [`annotation`] engine slices those explanations forward (which outputs
//! depend on unavailable inputs) and backward (which inputs an output needed).

pub mod annotation;
pub mod config;
pub mod env;
pub mod error;
pub mod eval;
pub mod expl;
pub mod primitive;
pub mod programs;
pub mod session;
pub mod store;
pub mod syntax;
pub mod value;

pub use annotation::{Annotated, Annotation, Annotations, Direction};
pub use config::{Config, EvalConfig};
pub use env::{Binding, EnvId};
pub use error::{Error, Result};
pub use eval::{Evaluated, Evaluator};
pub use expl::Expl;
pub use session::Session;
pub use store::{Address, NodeId, NodeState, Store, WorldId};
pub use syntax::{ExprId, Num, Program, ProgramBuilder, Symbol, TrieId};
pub use value::Value;
