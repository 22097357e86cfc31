use ordered_float::OrderedFloat;
use smallvec::SmallVec;

use super::{Def, Expr, ExprId, Kont, Program, RecDef, RecGroup, RecGroupId, Trie, TrieId};
use crate::error::{Error, Result};

/// Source-level pattern, compiled into a demand trie.
#[derive(Clone, Debug, PartialEq)]
pub enum Pattern {
    Var(String),
    /// Binds nothing and demands nothing.
    Wild,
    Num,
    Str,
    Fun,
    Constr(String, Vec<Pattern>),
}

impl Pattern {
    pub fn var(name: impl Into<String>) -> Self {
        Pattern::Var(name.into())
    }

    pub fn constr(tag: impl Into<String>, args: Vec<Pattern>) -> Self {
        Pattern::Constr(tag.into(), args)
    }

    pub fn nullary(tag: impl Into<String>) -> Self {
        Pattern::Constr(tag.into(), Vec::new())
    }
}

/// Builder for constructing programs without a parser.
pub struct ProgramBuilder {
    program: Program,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self {
            program: Program::new(),
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Declares a data constructor.
    pub fn declare(&mut self, tag: &str, arity: usize, datatype: &str) {
        self.program.declare(tag, arity, datatype);
    }

    pub fn num(&mut self, value: f64) -> ExprId {
        self.program.push_expr(Expr::Num(OrderedFloat(value)))
    }

    pub fn string(&mut self, value: &str) -> ExprId {
        self.program.push_expr(Expr::Str(value.into()))
    }

    pub fn var(&mut self, name: &str) -> ExprId {
        let name = self.program.intern(name);
        self.program.push_expr(Expr::Var(name))
    }

    pub fn op(&mut self, name: &str) -> ExprId {
        let name = self.program.intern(name);
        self.program.push_expr(Expr::Op(name))
    }

    pub fn constr(&mut self, tag: &str, args: Vec<ExprId>) -> Result<ExprId> {
        let symbol = self
            .program
            .symbol(tag)
            .and_then(|symbol| self.program.constructor(symbol))
            .ok_or_else(|| Error::UnknownConstructor(tag.to_string()))?;
        if symbol.arity != args.len() {
            return Err(Error::ArityMismatch {
                tag: tag.to_string(),
                expected: symbol.arity,
                found: args.len(),
            });
        }
        let tag = symbol.tag;
        Ok(self.program.push_expr(Expr::Constr {
            tag,
            args: args.into_iter().collect(),
        }))
    }

    pub fn nil(&mut self) -> ExprId {
        let tag = self.program.builtins().nil;
        self.builtin(tag, SmallVec::new())
    }

    pub fn cons(&mut self, head: ExprId, tail: ExprId) -> ExprId {
        let tag = self.program.builtins().cons;
        self.builtin(tag, SmallVec::from_slice(&[head, tail]))
    }

    pub fn pair(&mut self, first: ExprId, second: ExprId) -> ExprId {
        let tag = self.program.builtins().pair;
        self.builtin(tag, SmallVec::from_slice(&[first, second]))
    }

    pub fn boolean(&mut self, value: bool) -> ExprId {
        let builtins = self.program.builtins();
        let tag = if value { builtins.true_tag } else { builtins.false_tag };
        self.builtin(tag, SmallVec::new())
    }

    pub fn list(&mut self, items: Vec<ExprId>) -> ExprId {
        let nil = self.nil();
        items
            .into_iter()
            .rev()
            .fold(nil, |tail, head| self.cons(head, tail))
    }

    pub fn numbers(&mut self, values: &[f64]) -> ExprId {
        let items = values.iter().map(|value| self.num(*value)).collect();
        self.list(items)
    }

    pub fn app(&mut self, func: ExprId, arg: ExprId) -> ExprId {
        self.program.push_expr(Expr::App { func, arg })
    }

    /// Curried application to several arguments.
    pub fn apply(&mut self, func: ExprId, args: &[ExprId]) -> ExprId {
        args.iter().fold(func, |func, arg| self.app(func, *arg))
    }

    /// `left op right`, i.e. `(op left) right`.
    pub fn binary(&mut self, left: ExprId, op: &str, right: ExprId) -> ExprId {
        let op = self.op(op);
        let partial = self.app(op, left);
        self.app(partial, right)
    }

    pub fn let_(&mut self, name: &str, bound: ExprId, body: ExprId) -> ExprId {
        let name = self.program.intern(name);
        self.program.push_expr(Expr::Let { name, bound, body })
    }

    /// `fun name -> body`
    pub fn lambda(&mut self, name: &str, body: ExprId) -> ExprId {
        let name = self.program.intern(name);
        let trie = self.program.intern_trie(Trie::Var {
            name,
            kont: Kont::Expr(body),
        });
        self.program.push_expr(Expr::Fun { trie })
    }

    /// Function defined by one pattern per clause.
    pub fn function(&mut self, clauses: Vec<(Pattern, ExprId)>) -> Result<ExprId> {
        let trie = self.clauses(clauses)?;
        Ok(self.program.push_expr(Expr::Fun { trie }))
    }

    pub fn match_(&mut self, scrutinee: ExprId, clauses: Vec<(Pattern, ExprId)>) -> Result<ExprId> {
        let trie = self.clauses(clauses)?;
        Ok(self.program.push_expr(Expr::MatchAs { scrutinee, trie }))
    }

    pub fn if_(&mut self, cond: ExprId, then: ExprId, otherwise: ExprId) -> ExprId {
        let builtins = *self.program.builtins();
        let trie = self.program.intern_trie(Trie::Constr {
            cases: vec![
                (builtins.true_tag, Kont::Expr(then)),
                (builtins.false_tag, Kont::Expr(otherwise)),
            ],
        });
        self.program.push_expr(Expr::MatchAs {
            scrutinee: cond,
            trie,
        })
    }

    /// Recursive group of function literals.
    pub fn rec_group(&mut self, defs: Vec<(&str, ExprId)>) -> RecGroupId {
        let defs = defs
            .into_iter()
            .map(|(name, func)| RecDef {
                name: self.program.intern(name),
                func,
            })
            .collect();
        self.program.push_group(RecGroup { defs })
    }

    pub fn letrec(&mut self, defs: Vec<(&str, ExprId)>, body: ExprId) -> ExprId {
        let group = self.rec_group(defs);
        self.program.push_expr(Expr::LetRec { group, body })
    }

    pub fn def_let(&mut self, name: &str, bound: ExprId) -> Def {
        Def::Let {
            name: self.program.intern(name),
            bound,
        }
    }

    pub fn def_prim(&mut self, name: &str, op: &str) -> Def {
        Def::Prim {
            name: self.program.intern(name),
            op: self.program.intern(op),
        }
    }

    pub fn def_letrec(&mut self, defs: Vec<(&str, ExprId)>) -> Def {
        Def::LetRec(self.rec_group(defs))
    }

    pub fn defs(&mut self, defs: Vec<Def>, body: ExprId) -> ExprId {
        self.program.push_expr(Expr::Defs { defs, body })
    }

    pub fn finish(self) -> Program {
        self.program
    }

    fn builtin(&mut self, tag: super::Symbol, args: SmallVec<[ExprId; 2]>) -> ExprId {
        self.program.push_expr(Expr::Constr { tag, args })
    }

    fn clauses(&mut self, clauses: Vec<(Pattern, ExprId)>) -> Result<TrieId> {
        let mut merged: Option<TrieId> = None;
        for (pattern, body) in clauses {
            let trie = self.pattern(&pattern, Kont::Expr(body))?;
            merged = Some(match merged {
                None => trie,
                Some(previous) => self.merge_tries(previous, trie)?,
            });
        }
        merged.ok_or_else(|| Error::OverlappingClauses("no clauses".to_string()))
    }

    fn pattern(&mut self, pattern: &Pattern, kont: Kont) -> Result<TrieId> {
        let trie = match pattern {
            Pattern::Var(name) => Trie::Var {
                name: self.program.intern(name),
                kont,
            },
            Pattern::Wild => Trie::Var {
                name: self.program.intern("_"),
                kont,
            },
            Pattern::Num => Trie::Num { kont },
            Pattern::Str => Trie::Str { kont },
            Pattern::Fun => Trie::Fun { kont },
            Pattern::Constr(tag, args) => {
                let constructor = self
                    .program
                    .symbol(tag)
                    .and_then(|symbol| self.program.constructor(symbol))
                    .cloned()
                    .ok_or_else(|| Error::UnknownConstructor(tag.clone()))?;
                if constructor.arity != args.len() {
                    return Err(Error::ArityMismatch {
                        tag: tag.clone(),
                        expected: constructor.arity,
                        found: args.len(),
                    });
                }
                // Arguments chain left to right: each one's continuation demands the next.
                let mut next = kont;
                for arg in args.iter().rev() {
                    next = Kont::Trie(self.pattern(arg, next)?);
                }
                Trie::Constr {
                    cases: vec![(constructor.tag, next)],
                }
            }
        };
        Ok(self.program.intern_trie(trie))
    }

    fn merge_tries(&mut self, left: TrieId, right: TrieId) -> Result<TrieId> {
        if left == right {
            return Ok(left);
        }
        let merged = match (self.program.trie(left).clone(), self.program.trie(right).clone()) {
            (Trie::Constr { mut cases }, Trie::Constr { cases: others }) => {
                for (tag, kont) in others {
                    match cases.iter().position(|(case, _)| *case == tag) {
                        Some(index) => cases[index].1 = self.merge_konts(cases[index].1, kont)?,
                        None => cases.push((tag, kont)),
                    }
                }
                Trie::Constr { cases }
            }
            (Trie::Var { name, kont }, Trie::Var { name: other, kont: next }) if name == other => {
                Trie::Var {
                    name,
                    kont: self.merge_konts(kont, next)?,
                }
            }
            (Trie::Num { kont }, Trie::Num { kont: next }) => Trie::Num {
                kont: self.merge_konts(kont, next)?,
            },
            (Trie::Str { kont }, Trie::Str { kont: next }) => Trie::Str {
                kont: self.merge_konts(kont, next)?,
            },
            (Trie::Fun { kont }, Trie::Fun { kont: next }) => Trie::Fun {
                kont: self.merge_konts(kont, next)?,
            },
            (Trie::Top { kont }, Trie::Top { kont: next }) => Trie::Top {
                kont: self.merge_konts(kont, next)?,
            },
            (left, right) => {
                return Err(Error::OverlappingClauses(format!(
                    "{} pattern cannot be combined with {} pattern",
                    left.kind(),
                    right.kind()
                )));
            }
        };
        Ok(self.program.intern_trie(merged))
    }

    fn merge_konts(&mut self, left: Kont, right: Kont) -> Result<Kont> {
        match (left, right) {
            (Kont::Trie(left), Kont::Trie(right)) => Ok(Kont::Trie(self.merge_tries(left, right)?)),
            _ => Err(Error::OverlappingClauses(
                "two clauses match the same values".to_string(),
            )),
        }
    }
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_clauses_merge_into_one_constructor_trie() {
        let mut b = ProgramBuilder::new();
        let zero = b.num(0.0);
        let one = b.num(1.0);
        let f = b
            .function(vec![
                (Pattern::nullary("Nil"), zero),
                (
                    Pattern::constr("Cons", vec![Pattern::var("x"), Pattern::var("xs")]),
                    one,
                ),
            ])
            .unwrap();
        let program = b.finish();

        let Expr::Fun { trie } = program.expr(f) else {
            panic!("expected a function literal");
        };
        let Trie::Constr { cases } = program.trie(*trie) else {
            panic!("expected a constructor trie");
        };
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0], (program.builtins().nil, Kont::Expr(zero)));

        // Cons(x, xs) chains a binder for each argument.
        let Kont::Trie(head) = cases[1].1 else {
            panic!("expected a trie for the head");
        };
        let Trie::Var { name, kont: Kont::Trie(tail) } = program.trie(head) else {
            panic!("expected a head binder");
        };
        assert_eq!(program.name(*name), "x");
        assert!(matches!(
            program.trie(*tail),
            Trie::Var { kont: Kont::Expr(body), .. } if *body == one
        ));
    }

    #[test]
    fn nested_patterns_merge_under_shared_tags() {
        let mut b = ProgramBuilder::new();
        let one = b.num(1.0);
        let two = b.num(2.0);
        let trie = b
            .clauses(vec![
                (
                    Pattern::constr("Cons", vec![Pattern::var("x"), Pattern::nullary("Nil")]),
                    one,
                ),
                (
                    Pattern::constr(
                        "Cons",
                        vec![
                            Pattern::var("x"),
                            Pattern::constr("Cons", vec![Pattern::Wild, Pattern::Wild]),
                        ],
                    ),
                    two,
                ),
            ])
            .unwrap();
        let program = b.finish();
        let Trie::Constr { cases } = program.trie(trie) else {
            panic!("expected a constructor trie");
        };
        assert_eq!(cases.len(), 1);
    }

    #[test]
    fn duplicate_clauses_overlap() {
        let mut b = ProgramBuilder::new();
        let one = b.num(1.0);
        let two = b.num(2.0);
        let err = b
            .function(vec![(Pattern::nullary("Nil"), one), (Pattern::nullary("Nil"), two)])
            .unwrap_err();
        assert!(matches!(err, Error::OverlappingClauses(_)));
    }

    #[test]
    fn constructor_arity_is_checked() {
        let mut b = ProgramBuilder::new();
        let one = b.num(1.0);
        assert!(matches!(
            b.constr("Cons", vec![one]),
            Err(Error::ArityMismatch { expected: 2, found: 1, .. })
        ));
        assert!(matches!(b.constr("Leaf", vec![]), Err(Error::UnknownConstructor(_))));

        b.declare("Leaf", 1, "Tree");
        assert!(b.constr("Leaf", vec![one]).is_ok());
    }
}
