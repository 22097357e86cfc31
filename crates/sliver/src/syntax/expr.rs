use std::sync::Arc;

use ordered_float::OrderedFloat;
use smallvec::SmallVec;

use super::{ExprId, RecGroupId, Symbol, TrieId};

/// Numbers are ordered floats so they can live in hashed and merged structures.
pub type Num = OrderedFloat<f64>;

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Num(Num),
    Str(Arc<str>),
    Var(Symbol),
    /// Operator reference, resolved through the environment like a variable.
    Op(Symbol),
    Constr {
        tag: Symbol,
        args: SmallVec<[ExprId; 2]>,
    },
    /// Function literal. The trie's leaves are the bodies.
    Fun { trie: TrieId },
    App { func: ExprId, arg: ExprId },
    Let {
        name: Symbol,
        bound: ExprId,
        body: ExprId,
    },
    LetRec { group: RecGroupId, body: ExprId },
    MatchAs { scrutinee: ExprId, trie: TrieId },
    Defs { defs: Vec<Def>, body: ExprId },
}

impl Expr {
    pub fn kind(&self) -> &'static str {
        match self {
            Expr::Num(_) => "number",
            Expr::Str(_) => "string",
            Expr::Var(_) => "variable",
            Expr::Op(_) => "operator",
            Expr::Constr { .. } => "constructor",
            Expr::Fun { .. } => "function",
            Expr::App { .. } => "application",
            Expr::Let { .. } => "let",
            Expr::LetRec { .. } => "letrec",
            Expr::MatchAs { .. } => "match",
            Expr::Defs { .. } => "defs",
        }
    }
}

/// One definition of a [`Expr::Defs`] sequence.
#[derive(Clone, Debug, PartialEq)]
pub enum Def {
    Let { name: Symbol, bound: ExprId },
    /// Binds `name` to the library primitive called `op`.
    Prim { name: Symbol, op: Symbol },
    LetRec(RecGroupId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecDef {
    pub name: Symbol,
    /// Always a [`Expr::Fun`].
    pub func: ExprId,
}

/// Mutually recursive function definitions closed together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecGroup {
    pub defs: Vec<RecDef>,
}
