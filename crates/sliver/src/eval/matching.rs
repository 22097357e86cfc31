use smallvec::SmallVec;

use super::{Evaluated, Evaluator, STACK_GROW_SIZE, STACK_RED_ZONE};
use crate::env::EnvId;
use crate::error::{Error, Result};
use crate::store::{Address, NodeId, Store};
use crate::syntax::{Kont, Trie, TrieId};
use crate::value::Value;

impl Evaluator<'_> {
    /// Matches an existing node against `demand`, evaluating it first if it is
    /// still unevaluated.
    pub(crate) fn match_node(
        &mut self,
        store: &mut Store,
        node: NodeId,
        demand: TrieId,
    ) -> Result<Evaluated> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.match_known(store, node, demand)
        })
    }

    fn match_known(
        &mut self,
        store: &mut Store,
        node: NodeId,
        demand: TrieId,
    ) -> Result<Evaluated> {
        let program = self.program;
        let trie = program.trie(demand);
        if let Trie::Var { name, kont } = *trie {
            return Ok(Evaluated::bound(store, node, name, kont));
        }
        let Some(value) = store.value(node).cloned() else {
            return match store.address(node) {
                Address::Eval { env, expr } => self.eval(store, env, expr, demand),
                external => Err(Error::Unevaluated(external.to_string())),
            };
        };
        match (trie, &value) {
            (Trie::Top { kont }, Value::Constr { args, .. }) => {
                for arg in args {
                    self.match_node(store, *arg, TrieId::TOP)?;
                }
                Ok(Evaluated::new(node, *kont))
            }
            (Trie::Top { kont }, _)
            | (Trie::Num { kont }, Value::Num(_))
            | (Trie::Str { kont }, Value::Str(_))
            | (Trie::Fun { kont }, Value::Closure(_) | Value::Prim(_)) => {
                Ok(Evaluated::new(node, *kont))
            }
            (Trie::Constr { .. }, Value::Constr { tag, args }) => match trie.case(*tag) {
                Some(kont) => self.match_args(store, node, kont, args),
                None => Err(self.mismatch(demand, &value)),
            },
            _ => Err(self.mismatch(demand, &value)),
        }
    }

    /// Matches constructor arguments left to right, each against the trie the
    /// previous one continued with.
    fn match_args(
        &mut self,
        store: &mut Store,
        node: NodeId,
        mut kont: Kont,
        args: &[NodeId],
    ) -> Result<Evaluated> {
        let program = self.program;
        let mut env = EnvId::EMPTY;
        let mut inspected = SmallVec::new();
        for &arg in args {
            let Kont::Trie(sub) = kont else {
                return Err(Error::DemandMismatch {
                    demand: format!("{} argument(s)", args.len()),
                    found: "a pattern that stops early".to_string(),
                });
            };
            let matched = self.match_node(store, arg, sub)?;
            if !program.trie(sub).is_var() {
                inspected.push(arg);
            }
            inspected.extend(matched.inspected);
            env = store.envs_mut().concat(matched.env, env);
            kont = matched.kont;
        }
        Ok(Evaluated {
            node,
            env,
            kont,
            inspected,
        })
    }

    fn mismatch(&self, demand: TrieId, value: &Value) -> Error {
        Error::DemandMismatch {
            demand: self.program.describe_trie(demand),
            found: value.describe(self.program),
        }
    }
}
