//! Demand-driven evaluation.
//!
//! Evaluating an expression under a demand trie computes only as much of the
//! value as the trie asks for, records the result and its explanation in the
//! store, and hands back whatever the trie bound plus its continuation.
//! Anything bound by a variable trie stays unevaluated until someone demands
//! it; its address is enough to evaluate it later.

mod matching;

use std::collections::HashMap;

use log::{debug, trace};
use smallvec::SmallVec;

use crate::config::EvalConfig;
use crate::env::{Binding, EnvId};
use crate::error::{Error, Result};
use crate::expl::{DefExpl, Expl, RecDefExpl};
use crate::primitive::Primitive;
use crate::store::{Address, EvalKey, NodeId, NodeState, Store, WorldId};
use crate::syntax::{Def, Expr, ExprId, Kont, Program, RecGroupId, Symbol, Trie, TrieId};
use crate::value::{Closure, PrimValue, RecScope, Value};

/// Remaining stack below which a nested evaluation moves to a fresh segment.
const STACK_RED_ZONE: usize = 256 * 1024;
/// Size of each additional stack segment.
const STACK_GROW_SIZE: usize = 8 * 1024 * 1024;

/// Outcome of evaluating under a demand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evaluated {
    pub node: NodeId,
    /// Bindings introduced by the demand's variable tries.
    pub env: EnvId,
    /// What the demand continues with.
    pub kont: Kont,
    /// Nodes below `node` whose constructors the demand examined.
    pub inspected: SmallVec<[NodeId; 2]>,
}

impl Evaluated {
    fn new(node: NodeId, kont: Kont) -> Self {
        Self {
            node,
            env: EnvId::EMPTY,
            kont,
            inspected: SmallVec::new(),
        }
    }

    fn bound(store: &mut Store, node: NodeId, name: Symbol, kont: Kont) -> Self {
        Self {
            node,
            env: store.envs_mut().singleton(name, Binding::Node(node)),
            kont,
            inspected: SmallVec::new(),
        }
    }
}

pub struct Evaluator<'p> {
    program: &'p Program,
    config: EvalConfig,
    memo: HashMap<EvalKey, Evaluated>,
    memo_world: WorldId,
    depth: usize,
}

impl<'p> Evaluator<'p> {
    pub fn new(program: &'p Program, config: EvalConfig) -> Self {
        Self {
            program,
            config,
            memo: HashMap::new(),
            memo_world: WorldId::ROOT,
            depth: 0,
        }
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// An environment binding every library primitive under its name.
    pub fn prelude(&mut self, store: &mut Store) -> Result<EnvId> {
        let mut env = EnvId::EMPTY;
        for primitive in Primitive::all() {
            let name = self
                .program
                .symbol(primitive.name())
                .ok_or_else(|| Error::NameNotFound(primitive.name().to_string()))?;
            let node = store.primitive(primitive)?;
            env = store.envs_mut().extend(env, name, Binding::Node(node));
        }
        Ok(env)
    }

    /// Evaluates `expr` completely.
    pub fn evaluate(&mut self, store: &mut Store, env: EnvId, expr: ExprId) -> Result<NodeId> {
        Ok(self.eval(store, env, expr, TrieId::TOP)?.node)
    }

    /// Evaluates `expr` in `env` as far as `demand` requires.
    pub fn eval(
        &mut self,
        store: &mut Store,
        env: EnvId,
        expr: ExprId,
        demand: TrieId,
    ) -> Result<Evaluated> {
        self.sync(store);
        let key = EvalKey { env, expr, demand };
        if self.config.memoize {
            if let Some(hit) = self.memo.get(&key) {
                trace!("memo hit e{}@env{}", expr.0, env.0);
                return Ok(hit.clone());
            }
        }
        if self.depth >= self.config.max_depth {
            return Err(Error::DepthExceeded(self.config.max_depth));
        }
        self.depth += 1;
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.eval_expr(store, env, expr, demand)
        });
        self.depth -= 1;
        let evaluated = result?;
        if self.config.memoize {
            self.memo.insert(key, evaluated.clone());
        }
        Ok(evaluated)
    }

    /// Memoised results are only valid for the revision they were computed in.
    fn sync(&mut self, store: &Store) {
        let world = store.current_world();
        if world != self.memo_world {
            if !self.memo.is_empty() {
                debug!(
                    "revision {} -> {}: dropping {} memoised evaluations",
                    self.memo_world.0,
                    world.0,
                    self.memo.len()
                );
            }
            self.memo.clear();
            self.memo_world = world;
        }
    }

    fn eval_expr(
        &mut self,
        store: &mut Store,
        env: EnvId,
        expr: ExprId,
        demand: TrieId,
    ) -> Result<Evaluated> {
        let program = self.program;
        let address = Address::eval(env, expr);
        if let Trie::Var { name, kont } = *program.trie(demand) {
            let node = store.node(address);
            return Ok(Evaluated::bound(store, node, name, kont));
        }
        match program.expr(expr) {
            Expr::Num(n) => {
                let node = store.at(address, NodeState::new(Expl::Empty, Value::Num(*n)))?;
                self.match_node(store, node, demand)
            }
            Expr::Str(s) => {
                let node = store.at(address, NodeState::new(Expl::Empty, Value::Str(s.clone())))?;
                self.match_node(store, node, demand)
            }
            Expr::Constr { tag, args } => {
                let constructor = program
                    .constructor(*tag)
                    .ok_or_else(|| Error::UnknownConstructor(program.name(*tag).to_string()))?;
                if constructor.arity != args.len() {
                    return Err(Error::ArityMismatch {
                        tag: program.name(*tag).to_string(),
                        expected: constructor.arity,
                        found: args.len(),
                    });
                }
                // Arguments are registered unevaluated; matching demands what it needs.
                let args = args
                    .iter()
                    .map(|arg| store.node(Address::eval(env, *arg)))
                    .collect();
                let value = Value::Constr { tag: *tag, args };
                let node = store.at(address, NodeState::new(Expl::Empty, value))?;
                self.match_node(store, node, demand)
            }
            Expr::Fun { .. } => {
                let closure = Closure {
                    env,
                    func: expr,
                    rec: None,
                };
                let node = store.at(address, NodeState::new(Expl::Empty, Value::Closure(closure)))?;
                self.match_node(store, node, demand)
            }
            Expr::Var(name) | Expr::Op(name) => self.variable(store, env, address, *name, demand),
            Expr::App { func, arg } => self.apply(store, env, address, *func, *arg, demand),
            Expr::Let { name, bound, body } => {
                let bound = store.node(Address::eval(env, *bound));
                let body_env = store.envs_mut().extend(env, *name, Binding::Node(bound));
                let tv = self.eval(store, body_env, *body, demand)?;
                let expl = Expl::Let {
                    name: *name,
                    bound,
                    body: tv.node,
                };
                self.wrap(store, address, expl, tv)
            }
            Expr::LetRec { group, body } => {
                let scope = RecScope { env, group: *group };
                let defs = self.rec_closures(store, scope)?;
                let body_env = self.close_group(store, scope);
                let tv = self.eval(store, body_env, *body, demand)?;
                let expl = Expl::LetRec { defs, body: tv.node };
                self.wrap(store, address, expl, tv)
            }
            Expr::MatchAs { scrutinee, trie } => {
                let tu = self.eval(store, env, *scrutinee, *trie)?;
                let body = self.body_of(&tu, *trie)?;
                let body_env = store.envs_mut().concat(tu.env, env);
                let tv = self.eval(store, body_env, body, demand)?;
                let expl = Expl::MatchAs {
                    scrutinee: tu.node,
                    matched: tu.inspected,
                    body: tv.node,
                };
                self.wrap(store, address, expl, tv)
            }
            Expr::Defs { defs, body } => {
                let mut current = env;
                let mut explained = Vec::with_capacity(defs.len());
                for def in defs {
                    match def {
                        Def::Let { name, bound } => {
                            let bound = store.node(Address::eval(current, *bound));
                            explained.push(DefExpl::Let { name: *name, bound });
                            current = store.envs_mut().extend(current, *name, Binding::Node(bound));
                        }
                        Def::Prim { name, op } => {
                            let primitive = Primitive::from_name(program.name(*op))
                                .ok_or_else(|| Error::NameNotFound(program.name(*op).to_string()))?;
                            let node = store.primitive(primitive)?;
                            explained.push(DefExpl::Prim { name: *name, op: node });
                            current = store.envs_mut().extend(current, *name, Binding::Node(node));
                        }
                        Def::LetRec(group) => {
                            let scope = RecScope {
                                env: current,
                                group: *group,
                            };
                            explained.push(DefExpl::LetRec(self.rec_closures(store, scope)?));
                            current = self.close_group(store, scope);
                        }
                    }
                }
                let tv = self.eval(store, current, *body, demand)?;
                let expl = Expl::Defs {
                    defs: explained,
                    body: tv.node,
                };
                self.wrap(store, address, expl, tv)
            }
        }
    }

    fn variable(
        &mut self,
        store: &mut Store,
        env: EnvId,
        address: Address,
        name: Symbol,
        demand: TrieId,
    ) -> Result<Evaluated> {
        let binding = store
            .envs()
            .get(env, name)
            .ok_or_else(|| Error::NameNotFound(self.program.name(name).to_string()))?;
        let target = match binding {
            Binding::Node(node) => node,
            Binding::Recursive { env, group, index } => {
                self.rec_closure(store, RecScope { env, group }, index as usize)?
            }
        };
        let tv = self.match_node(store, target, demand)?;
        let state = NodeState {
            expl: Some(Expl::Var { name, binding: target }),
            value: store.value(target).cloned(),
        };
        let node = store.at(address, state)?;
        Ok(Evaluated { node, ..tv })
    }

    fn apply(
        &mut self,
        store: &mut Store,
        env: EnvId,
        address: Address,
        func: ExprId,
        arg: ExprId,
        demand: TrieId,
    ) -> Result<Evaluated> {
        let tf = self.eval(store, env, func, TrieId::FUN)?;
        match store.value(tf.node).cloned() {
            Some(Value::Closure(closure)) => {
                self.apply_closure(store, env, address, tf.node, closure, arg, demand)
            }
            Some(Value::Prim(prim)) => {
                self.apply_primitive(store, env, address, tf.node, prim, arg, demand)
            }
            other => Err(Error::DemandMismatch {
                demand: "function".to_string(),
                found: other.map_or_else(
                    || "nothing".to_string(),
                    |value| value.describe(self.program),
                ),
            }),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_closure(
        &mut self,
        store: &mut Store,
        env: EnvId,
        address: Address,
        func: NodeId,
        closure: Closure,
        arg: ExprId,
        demand: TrieId,
    ) -> Result<Evaluated> {
        let Expr::Fun { trie } = self.program.expr(closure.func) else {
            return Err(Error::DemandMismatch {
                demand: "function".to_string(),
                found: self.program.expr(closure.func).kind().to_string(),
            });
        };
        let tu = self.eval(store, env, arg, *trie)?;
        let body = self.body_of(&tu, *trie)?;
        let rec_defs = match closure.rec {
            Some(scope) => self.rec_closures(store, scope)?,
            None => SmallVec::new(),
        };
        let body_env = store.envs_mut().concat(tu.env, closure.env);
        let tv = self.eval(store, body_env, body, demand)?;
        let expl = Expl::App {
            func,
            arg: tu.node,
            rec_defs,
            matched: tu.inspected,
            body: tv.node,
        };
        self.wrap(store, address, expl, tv)
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_primitive(
        &mut self,
        store: &mut Store,
        env: EnvId,
        address: Address,
        func: NodeId,
        prim: PrimValue,
        arg: ExprId,
        demand: TrieId,
    ) -> Result<Evaluated> {
        let operand = match prim {
            PrimValue::Unary(op) => op.operand(),
            PrimValue::Binary(op) | PrimValue::Partial { op, .. } => op.operand(),
        };
        let tu = self.eval(store, env, arg, operand.demand())?;
        let right = self.known_value(store, tu.node)?;
        let (expl, value) = match prim {
            PrimValue::Unary(op) => (Expl::UnaryApp { func, arg: tu.node }, op.apply(&right)?),
            PrimValue::Binary(op) => (
                Expl::UnaryApp { func, arg: tu.node },
                Value::Prim(PrimValue::Partial { op, first: tu.node }),
            ),
            PrimValue::Partial { op, first } => {
                let left = self.known_value(store, first)?;
                let value = op.apply(&left, &right, self.program)?;
                let expl = Expl::BinaryApp {
                    func,
                    left: first,
                    op,
                    right: tu.node,
                };
                (expl, value)
            }
        };
        let node = store.at(address, NodeState::new(expl, value))?;
        self.match_node(store, node, demand)
    }

    /// Records a node whose value is that of `tv`, which it explains with `expl`.
    fn wrap(
        &mut self,
        store: &mut Store,
        address: Address,
        expl: Expl,
        tv: Evaluated,
    ) -> Result<Evaluated> {
        let state = NodeState {
            expl: Some(expl),
            value: store.value(tv.node).cloned(),
        };
        let node = store.at(address, state)?;
        Ok(Evaluated { node, ..tv })
    }

    /// The body a pattern match selected.
    fn body_of(&self, evaluated: &Evaluated, trie: TrieId) -> Result<ExprId> {
        match evaluated.kont {
            Kont::Expr(body) => Ok(body),
            _ => Err(Error::DemandMismatch {
                demand: self.program.describe_trie(trie),
                found: "a pattern without a body".to_string(),
            }),
        }
    }

    fn known_value(&self, store: &Store, node: NodeId) -> Result<Value> {
        store
            .value(node)
            .cloned()
            .ok_or_else(|| Error::Unevaluated(store.address(node).to_string()))
    }

    /// `scope.env` extended with a recursive binding for each definition of the group.
    fn close_group(&mut self, store: &mut Store, scope: RecScope) -> EnvId {
        let group = self.program.group(scope.group);
        group
            .defs
            .iter()
            .enumerate()
            .fold(scope.env, |env, (index, def)| {
                let binding = Binding::Recursive {
                    env: scope.env,
                    group: scope.group,
                    index: index as u32,
                };
                store.envs_mut().extend(env, def.name, binding)
            })
    }

    fn rec_closure(&mut self, store: &mut Store, scope: RecScope, index: usize) -> Result<NodeId> {
        let closed = self.close_group(store, scope);
        let def = self.program.group(scope.group).defs[index];
        let closure = Closure {
            env: closed,
            func: def.func,
            rec: Some(scope),
        };
        let state = NodeState::new(Expl::Empty, Value::Closure(closure));
        store.at(Address::eval(closed, def.func), state)
    }

    fn rec_closures(
        &mut self,
        store: &mut Store,
        scope: RecScope,
    ) -> Result<SmallVec<[RecDefExpl; 2]>> {
        let count = self.group_len(scope.group);
        (0..count)
            .map(|index| {
                let name = self.program.group(scope.group).defs[index].name;
                let closure = self.rec_closure(store, scope, index)?;
                Ok(RecDefExpl { name, closure })
            })
            .collect()
    }

    fn group_len(&self, group: RecGroupId) -> usize {
        self.program.group(group).defs.len()
    }
}
