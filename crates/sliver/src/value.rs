//! Runtime values. Sub-values are store nodes, so every part of a value
//! carries its own explanation.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::env::EnvId;
use crate::primitive::{BinaryOp, UnaryOp};
use crate::store::NodeId;
use crate::store::lattice::{Conflict, Merge, merge_by_equality, variant_conflict};
use crate::syntax::{ExprId, Num, Program, RecGroupId, Symbol};

/// The recursive group a closure was created from, with the env it closes over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecScope {
    pub env: EnvId,
    pub group: RecGroupId,
}

merge_by_equality!(RecScope);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Closure {
    pub env: EnvId,
    /// The [`crate::syntax::Expr::Fun`] literal.
    pub func: ExprId,
    pub rec: Option<RecScope>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimValue {
    Unary(UnaryOp),
    Binary(BinaryOp),
    /// A binary primitive applied to its first operand.
    Partial { op: BinaryOp, first: NodeId },
}

impl PrimValue {
    pub fn name(&self) -> &'static str {
        match self {
            PrimValue::Unary(op) => op.name(),
            PrimValue::Binary(op) | PrimValue::Partial { op, .. } => op.name(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Num(Num),
    Str(Arc<str>),
    Closure(Closure),
    Prim(PrimValue),
    Constr {
        tag: Symbol,
        args: SmallVec<[NodeId; 2]>,
    },
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Closure(_) => "closure",
            Value::Prim(_) => "primitive",
            Value::Constr { .. } => "constructor",
        }
    }

    pub fn describe(&self, program: &Program) -> String {
        match self {
            Value::Num(n) => format!("number {n}"),
            Value::Str(s) => format!("string {s:?}"),
            Value::Constr { tag, .. } => format!("constructor {}", program.name(*tag)),
            Value::Prim(prim) => format!("primitive `{}`", prim.name()),
            Value::Closure(_) => "closure".to_string(),
        }
    }

    /// Sub-values held by this value.
    pub fn children(&self) -> SmallVec<[NodeId; 2]> {
        match self {
            Value::Constr { args, .. } => args.clone(),
            Value::Prim(PrimValue::Partial { first, .. }) => SmallVec::from_slice(&[*first]),
            _ => SmallVec::new(),
        }
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(n.0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Value::Closure(_) | Value::Prim(_))
    }
}

impl Merge for Closure {
    fn merge(&self, other: &Self) -> Result<Self, Conflict> {
        Ok(Closure {
            env: self.env.merge(&other.env)?,
            func: self.func.merge(&other.func)?,
            rec: self.rec.merge(&other.rec)?,
        })
    }
}

impl Merge for PrimValue {
    fn merge(&self, other: &Self) -> Result<Self, Conflict> {
        match (self, other) {
            (PrimValue::Unary(left), PrimValue::Unary(right)) => {
                left.merge(right).map(PrimValue::Unary)
            }
            (PrimValue::Binary(left), PrimValue::Binary(right)) => {
                left.merge(right).map(PrimValue::Binary)
            }
            (
                PrimValue::Partial { op, first },
                PrimValue::Partial {
                    op: other_op,
                    first: other_first,
                },
            ) => Ok(PrimValue::Partial {
                op: op.merge(other_op)?,
                first: first.merge(other_first)?,
            }),
            _ => Err(variant_conflict(self.name(), other.name())),
        }
    }
}

impl Merge for Value {
    fn merge(&self, other: &Self) -> Result<Self, Conflict> {
        match (self, other) {
            (Value::Num(left), Value::Num(right)) => left.merge(right).map(Value::Num),
            (Value::Str(left), Value::Str(right)) => left.merge(right).map(Value::Str),
            (Value::Closure(left), Value::Closure(right)) => left.merge(right).map(Value::Closure),
            (Value::Prim(left), Value::Prim(right)) => left.merge(right).map(Value::Prim),
            (
                Value::Constr { tag, args },
                Value::Constr {
                    tag: other_tag,
                    args: other_args,
                },
            ) => Ok(Value::Constr {
                tag: tag.merge(other_tag)?,
                args: args.merge(other_args)?,
            }),
            _ => Err(variant_conflict(self.kind(), other.kind())),
        }
    }
}
