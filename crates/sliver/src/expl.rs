//! Explanations: how a node's value was derived.
//!
//! Each variant names the store nodes that contributed to the value. Those
//! references are the dependency edges walked by the annotation engine.

use smallvec::SmallVec;

use crate::primitive::BinaryOp;
use crate::store::NodeId;
use crate::store::lattice::{Conflict, Merge, variant_conflict};
use crate::syntax::Symbol;

/// A closure created for one definition of a recursive group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecDefExpl {
    pub name: Symbol,
    pub closure: NodeId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DefExpl {
    Let { name: Symbol, bound: NodeId },
    Prim { name: Symbol, op: NodeId },
    LetRec(SmallVec<[RecDefExpl; 2]>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expl {
    /// Constants, constructors, closures and external inputs.
    Empty,
    Var {
        name: Symbol,
        binding: NodeId,
    },
    App {
        func: NodeId,
        arg: NodeId,
        /// Closures of the applied function's recursive group.
        rec_defs: SmallVec<[RecDefExpl; 2]>,
        /// Nodes whose constructors the parameter pattern examined.
        matched: SmallVec<[NodeId; 2]>,
        body: NodeId,
    },
    UnaryApp {
        func: NodeId,
        arg: NodeId,
    },
    BinaryApp {
        func: NodeId,
        left: NodeId,
        op: BinaryOp,
        right: NodeId,
    },
    Let {
        name: Symbol,
        bound: NodeId,
        body: NodeId,
    },
    LetRec {
        defs: SmallVec<[RecDefExpl; 2]>,
        body: NodeId,
    },
    Defs {
        defs: Vec<DefExpl>,
        body: NodeId,
    },
    MatchAs {
        scrutinee: NodeId,
        matched: SmallVec<[NodeId; 2]>,
        body: NodeId,
    },
}

impl Expl {
    pub fn kind(&self) -> &'static str {
        match self {
            Expl::Empty => "empty",
            Expl::Var { .. } => "var",
            Expl::App { .. } => "app",
            Expl::UnaryApp { .. } => "unary-app",
            Expl::BinaryApp { .. } => "binary-app",
            Expl::Let { .. } => "let",
            Expl::LetRec { .. } => "letrec",
            Expl::Defs { .. } => "defs",
            Expl::MatchAs { .. } => "match",
        }
    }

    /// Every node this explanation refers to, in evaluation order.
    pub fn dependencies(&self) -> SmallVec<[NodeId; 4]> {
        let mut deps = SmallVec::new();
        match self {
            Expl::Empty => {}
            Expl::Var { binding, .. } => deps.push(*binding),
            Expl::App {
                func,
                arg,
                rec_defs,
                matched,
                body,
            } => {
                deps.push(*func);
                deps.push(*arg);
                deps.extend(rec_defs.iter().map(|def| def.closure));
                deps.extend(matched.iter().copied());
                deps.push(*body);
            }
            Expl::UnaryApp { func, arg } => {
                deps.push(*func);
                deps.push(*arg);
            }
            Expl::BinaryApp {
                func, left, right, ..
            } => {
                deps.push(*func);
                deps.push(*left);
                deps.push(*right);
            }
            Expl::Let { bound, body, .. } => {
                deps.push(*bound);
                deps.push(*body);
            }
            Expl::LetRec { defs, body } => {
                deps.extend(defs.iter().map(|def| def.closure));
                deps.push(*body);
            }
            Expl::Defs { defs, body } => {
                for def in defs {
                    match def {
                        DefExpl::Let { bound, .. } => deps.push(*bound),
                        DefExpl::Prim { op, .. } => deps.push(*op),
                        DefExpl::LetRec(rec_defs) => {
                            deps.extend(rec_defs.iter().map(|def| def.closure))
                        }
                    }
                }
                deps.push(*body);
            }
            Expl::MatchAs {
                scrutinee,
                matched,
                body,
            } => {
                deps.push(*scrutinee);
                deps.extend(matched.iter().copied());
                deps.push(*body);
            }
        }
        deps
    }
}

impl Merge for RecDefExpl {
    fn merge(&self, other: &Self) -> Result<Self, Conflict> {
        Ok(RecDefExpl {
            name: self.name.merge(&other.name)?,
            closure: self.closure.merge(&other.closure)?,
        })
    }
}

impl Merge for DefExpl {
    fn merge(&self, other: &Self) -> Result<Self, Conflict> {
        match (self, other) {
            (DefExpl::Let { name, bound }, DefExpl::Let { name: n, bound: b }) => Ok(DefExpl::Let {
                name: name.merge(n)?,
                bound: bound.merge(b)?,
            }),
            (DefExpl::Prim { name, op }, DefExpl::Prim { name: n, op: o }) => Ok(DefExpl::Prim {
                name: name.merge(n)?,
                op: op.merge(o)?,
            }),
            (DefExpl::LetRec(defs), DefExpl::LetRec(others)) => {
                defs.merge(others).map(DefExpl::LetRec)
            }
            _ => Err(variant_conflict("definition", "definition of another kind")),
        }
    }
}

impl Merge for Expl {
    fn merge(&self, other: &Self) -> Result<Self, Conflict> {
        match (self, other) {
            (Expl::Empty, Expl::Empty) => Ok(Expl::Empty),
            (Expl::Var { name, binding }, Expl::Var { name: n, binding: b }) => Ok(Expl::Var {
                name: name.merge(n)?,
                binding: binding.merge(b)?,
            }),
            (
                Expl::App {
                    func,
                    arg,
                    rec_defs,
                    matched,
                    body,
                },
                Expl::App {
                    func: f,
                    arg: a,
                    rec_defs: r,
                    matched: m,
                    body: b,
                },
            ) => Ok(Expl::App {
                func: func.merge(f)?,
                arg: arg.merge(a)?,
                rec_defs: rec_defs.merge(r)?,
                matched: matched.merge(m)?,
                body: body.merge(b)?,
            }),
            (Expl::UnaryApp { func, arg }, Expl::UnaryApp { func: f, arg: a }) => {
                Ok(Expl::UnaryApp {
                    func: func.merge(f)?,
                    arg: arg.merge(a)?,
                })
            }
            (
                Expl::BinaryApp {
                    func,
                    left,
                    op,
                    right,
                },
                Expl::BinaryApp {
                    func: f,
                    left: l,
                    op: o,
                    right: r,
                },
            ) => Ok(Expl::BinaryApp {
                func: func.merge(f)?,
                left: left.merge(l)?,
                op: op.merge(o)?,
                right: right.merge(r)?,
            }),
            (Expl::Let { name, bound, body }, Expl::Let { name: n, bound: x, body: b }) => {
                Ok(Expl::Let {
                    name: name.merge(n)?,
                    bound: bound.merge(x)?,
                    body: body.merge(b)?,
                })
            }
            (Expl::LetRec { defs, body }, Expl::LetRec { defs: d, body: b }) => Ok(Expl::LetRec {
                defs: defs.merge(d)?,
                body: body.merge(b)?,
            }),
            (Expl::Defs { defs, body }, Expl::Defs { defs: d, body: b }) => Ok(Expl::Defs {
                defs: defs.merge(d)?,
                body: body.merge(b)?,
            }),
            (
                Expl::MatchAs {
                    scrutinee,
                    matched,
                    body,
                },
                Expl::MatchAs {
                    scrutinee: s,
                    matched: m,
                    body: b,
                },
            ) => Ok(Expl::MatchAs {
                scrutinee: scrutinee.merge(s)?,
                matched: matched.merge(m)?,
                body: body.merge(b)?,
            }),
            _ => Err(variant_conflict(self.kind(), other.kind())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_dependencies_in_evaluation_order() {
        let expl = Expl::App {
            func: NodeId(1),
            arg: NodeId(2),
            rec_defs: SmallVec::from_slice(&[RecDefExpl {
                name: Symbol(0),
                closure: NodeId(3),
            }]),
            matched: SmallVec::from_slice(&[NodeId(4)]),
            body: NodeId(5),
        };
        let deps: Vec<u32> = expl.dependencies().iter().map(|node| node.0).collect();
        assert_eq!(deps, vec![1, 2, 3, 4, 5]);
        assert!(Expl::Empty.dependencies().is_empty());
    }

    #[test]
    fn different_explanations_conflict() {
        let var = Expl::Var {
            name: Symbol(0),
            binding: NodeId(1),
        };
        assert_eq!(var.merge(&var), Ok(var.clone()));
        assert_eq!(
            var.merge(&Expl::Empty),
            Err(Conflict::Variant {
                left: "var",
                right: "empty"
            })
        );
    }
}
