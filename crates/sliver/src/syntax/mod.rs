//! Syntax model: expressions, demand tries and the program arena that owns them.
//!
//! A [`Program`] is immutable once built. Expressions, tries and recursive
//! groups are addressed by small copyable ids so evaluation results can refer
//! to program points without borrowing the program.

mod builder;
mod expr;
mod trie;

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use builder::{Pattern, ProgramBuilder};
pub use expr::{Def, Expr, Num, RecDef, RecGroup};
pub use trie::{Kont, Trie};

use crate::primitive::Primitive;
use crate::store::lattice::merge_by_equality;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExprId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrieId(pub u32);

impl TrieId {
    /// Demands the whole value.
    pub const TOP: Self = Self(0);
    /// Demands a function.
    pub const FUN: Self = Self(1);
    /// Demands a number.
    pub const NUM: Self = Self(2);
    /// Demands a string.
    pub const STR: Self = Self(3);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecGroupId(pub u32);

/// Interned identifier or constructor tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(pub u32);

merge_by_equality!(ExprId, TrieId, RecGroupId, Symbol);

/// Intern table: Symbol ↔ name.
#[derive(Clone, Debug, Default)]
pub struct Symbols {
    names: Vec<Arc<str>>,
    ids: HashMap<Arc<str>, Symbol>,
}

impl Symbols {
    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = Symbol(self.names.len() as u32);
        let name: Arc<str> = name.into();
        self.names.push(name.clone());
        self.ids.insert(name, id);
        id
    }

    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: Symbol) -> &str {
        self.names.get(id.0 as usize).map_or("<unknown>", |name| &**name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Signature of a data constructor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Constructor {
    pub tag: Symbol,
    pub arity: usize,
    pub datatype: Symbol,
}

/// Tags the evaluator and primitives produce themselves.
#[derive(Clone, Copy, Debug)]
pub struct Builtins {
    pub true_tag: Symbol,
    pub false_tag: Symbol,
    pub nil: Symbol,
    pub cons: Symbol,
    pub pair: Symbol,
}

#[derive(Clone, Debug)]
pub struct Program {
    exprs: Vec<Expr>,
    tries: Vec<Trie>,
    trie_ids: HashMap<Trie, TrieId>,
    groups: Vec<RecGroup>,
    symbols: Symbols,
    constructors: IndexMap<Symbol, Constructor>,
    builtins: Builtins,
}

impl Program {
    pub fn new() -> Self {
        let mut symbols = Symbols::default();
        let builtins = Builtins {
            true_tag: symbols.intern("True"),
            false_tag: symbols.intern("False"),
            nil: symbols.intern("Nil"),
            cons: symbols.intern("Cons"),
            pair: symbols.intern("Pair"),
        };
        for primitive in Primitive::all() {
            symbols.intern(primitive.name());
        }
        let mut program = Self {
            exprs: Vec::new(),
            tries: Vec::new(),
            trie_ids: HashMap::new(),
            groups: Vec::new(),
            symbols,
            constructors: IndexMap::new(),
            builtins,
        };

        // Order must agree with the TrieId constants.
        program.intern_trie(Trie::Top { kont: Kont::Done });
        program.intern_trie(Trie::Fun { kont: Kont::Done });
        program.intern_trie(Trie::Num { kont: Kont::Done });
        program.intern_trie(Trie::Str { kont: Kont::Done });

        for (tag, arity, datatype) in [
            ("True", 0, "Bool"),
            ("False", 0, "Bool"),
            ("Nil", 0, "List"),
            ("Cons", 2, "List"),
            ("Pair", 2, "Pair"),
            ("None", 0, "Option"),
            ("Some", 1, "Option"),
        ] {
            program.declare(tag, arity, datatype);
        }
        program
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.0 as usize]
    }

    pub fn exprs(&self) -> impl Iterator<Item = (ExprId, &Expr)> {
        self.exprs
            .iter()
            .enumerate()
            .map(|(index, expr)| (ExprId(index as u32), expr))
    }

    pub fn trie(&self, id: TrieId) -> &Trie {
        &self.tries[id.0 as usize]
    }

    pub fn group(&self, id: RecGroupId) -> &RecGroup {
        &self.groups[id.0 as usize]
    }

    pub fn symbols(&self) -> &Symbols {
        &self.symbols
    }

    pub fn symbol(&self, name: &str) -> Option<Symbol> {
        self.symbols.get(name)
    }

    pub fn name(&self, symbol: Symbol) -> &str {
        self.symbols.name(symbol)
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    pub fn constructor(&self, tag: Symbol) -> Option<&Constructor> {
        self.constructors.get(&tag)
    }

    /// Declared constructors in declaration order.
    pub fn constructors(&self) -> impl Iterator<Item = &Constructor> {
        self.constructors.values()
    }

    /// Human-readable description of a demand, for diagnostics.
    pub fn describe_trie(&self, id: TrieId) -> String {
        match self.trie(id) {
            Trie::Constr { cases } => {
                let tags: Vec<&str> = cases.iter().map(|(tag, _)| self.name(*tag)).collect();
                format!("constructor ({})", tags.join(" | "))
            }
            trie => trie.kind().to_string(),
        }
    }

    pub(crate) fn declare(&mut self, tag: &str, arity: usize, datatype: &str) -> Symbol {
        let tag = self.symbols.intern(tag);
        let datatype = self.symbols.intern(datatype);
        self.constructors.insert(
            tag,
            Constructor {
                tag,
                arity,
                datatype,
            },
        );
        tag
    }

    pub(crate) fn push_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(expr);
        id
    }

    pub(crate) fn intern_trie(&mut self, trie: Trie) -> TrieId {
        if let Some(&id) = self.trie_ids.get(&trie) {
            return id;
        }
        let id = TrieId(self.tries.len() as u32);
        self.tries.push(trie.clone());
        self.trie_ids.insert(trie, id);
        id
    }

    pub(crate) fn push_group(&mut self, group: RecGroup) -> RecGroupId {
        let id = RecGroupId(self.groups.len() as u32);
        self.groups.push(group);
        id
    }

    pub(crate) fn intern(&mut self, name: &str) -> Symbol {
        self.symbols.intern(name)
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesised_demands_are_preinterned() {
        let program = Program::new();
        assert!(matches!(program.trie(TrieId::TOP), Trie::Top { kont: Kont::Done }));
        assert!(matches!(program.trie(TrieId::FUN), Trie::Fun { kont: Kont::Done }));
        assert!(matches!(program.trie(TrieId::NUM), Trie::Num { kont: Kont::Done }));
        assert!(matches!(program.trie(TrieId::STR), Trie::Str { kont: Kont::Done }));
    }

    #[test]
    fn tries_are_hash_consed() {
        let mut program = Program::new();
        let x = program.intern("x");
        let a = program.intern_trie(Trie::Var { name: x, kont: Kont::Done });
        let b = program.intern_trie(Trie::Var { name: x, kont: Kont::Done });
        assert_eq!(a, b);
        assert_eq!(program.intern_trie(Trie::Num { kont: Kont::Done }), TrieId::NUM);
    }

    #[test]
    fn builtin_constructors_are_declared() {
        let program = Program::new();
        let cons = program.constructor(program.builtins().cons).unwrap();
        assert_eq!(cons.arity, 2);
        assert_eq!(program.name(cons.datatype), "List");
        assert!(program.symbol("+").is_some());
        assert!(program.symbol("intToString").is_some());
    }

    #[test]
    fn symbols_round_trip_names() {
        let mut symbols = Symbols::default();
        let a = symbols.intern("alpha");
        let b = symbols.intern("beta");
        assert_ne!(a, b);
        assert_eq!(symbols.intern("alpha"), a);
        assert_eq!(symbols.name(b), "beta");
        assert_eq!(symbols.get("gamma"), None);
        assert_eq!(symbols.len(), 2);
    }
}
