use std::fmt;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use super::lattice::merge_by_equality;
use crate::env::EnvId;
use crate::syntax::{ExprId, TrieId};

/// Dense handle of a store node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

merge_by_equality!(NodeId);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stable identity of a node, independent of when it was first computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Address {
    /// Result of evaluating `expr` in `env`.
    Eval { env: EnvId, expr: ExprId },
    /// Value supplied from outside the program.
    External(Ulid),
}

impl Address {
    pub fn eval(env: EnvId, expr: ExprId) -> Self {
        Address::Eval { env, expr }
    }

    pub fn expr(&self) -> Option<ExprId> {
        match self {
            Address::Eval { expr, .. } => Some(*expr),
            Address::External(_) => None,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Address::External(_))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Eval { env, expr } => write!(f, "e{}@env{}", expr.0, env.0),
            Address::External(ulid) => write!(f, "input:{ulid}"),
        }
    }
}

/// Memo key of one evaluation: where, what, and how much was demanded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EvalKey {
    pub env: EnvId,
    pub expr: ExprId,
    pub demand: TrieId,
}
