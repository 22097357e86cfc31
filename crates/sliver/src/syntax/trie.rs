use serde::{Deserialize, Serialize};

use super::{ExprId, Symbol, TrieId};

/// What follows once a trie node has been satisfied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kont {
    Done,
    Expr(ExprId),
    /// Demand on the next constructor argument.
    Trie(TrieId),
}

/// A demand: how much of a value to compute and how to destructure it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Trie {
    /// Binds the value without evaluating it.
    Var { name: Symbol, kont: Kont },
    Num { kont: Kont },
    Str { kont: Kont },
    Fun { kont: Kont },
    /// One continuation per accepted tag, in declaration order.
    Constr { cases: Vec<(Symbol, Kont)> },
    /// Forces the whole value and binds nothing.
    Top { kont: Kont },
}

impl Trie {
    pub fn kind(&self) -> &'static str {
        match self {
            Trie::Var { .. } => "variable",
            Trie::Num { .. } => "number",
            Trie::Str { .. } => "string",
            Trie::Fun { .. } => "function",
            Trie::Constr { .. } => "constructor",
            Trie::Top { .. } => "value",
        }
    }

    pub fn case(&self, tag: Symbol) -> Option<Kont> {
        match self {
            Trie::Constr { cases } => cases
                .iter()
                .find(|(case, _)| *case == tag)
                .map(|(_, kont)| *kont),
            _ => None,
        }
    }

    /// Continuation of a non-constructor trie.
    pub fn kont(&self) -> Option<Kont> {
        match self {
            Trie::Var { kont, .. }
            | Trie::Num { kont }
            | Trie::Str { kont }
            | Trie::Fun { kont }
            | Trie::Top { kont } => Some(*kont),
            Trie::Constr { .. } => None,
        }
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Trie::Var { .. })
    }
}
