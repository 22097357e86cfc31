//! One program, its store, and the annotation state of the current slicing pass.

use crate::annotation::{self, Annotated, Annotations, Direction};
use crate::config::EvalConfig;
use crate::env::{Binding, EnvId};
use crate::error::Result;
use crate::eval::Evaluator;
use crate::store::{NodeId, Store, WorldId};
use crate::syntax::{ExprId, Program};
use crate::value::Value;

pub struct Session<'p> {
    program: &'p Program,
    store: Store,
    evaluator: Evaluator<'p>,
    annotations: Annotations,
    prelude: EnvId,
}

impl<'p> Session<'p> {
    pub fn new(program: &'p Program, config: EvalConfig) -> Result<Self> {
        let mut store = Store::new();
        let mut evaluator = Evaluator::new(program, config);
        let prelude = evaluator.prelude(&mut store)?;
        Ok(Self {
            program,
            store,
            evaluator,
            annotations: Annotations::default(),
            prelude,
        })
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Environment binding the primitive library.
    pub fn prelude(&self) -> EnvId {
        self.prelude
    }

    /// Evaluates `expr` completely in the prelude.
    pub fn evaluate(&mut self, expr: ExprId) -> Result<NodeId> {
        self.evaluate_in(self.prelude, expr)
    }

    pub fn evaluate_in(&mut self, env: EnvId, expr: ExprId) -> Result<NodeId> {
        self.evaluator.evaluate(&mut self.store, env, expr)
    }

    /// Injects an external value and returns its node.
    pub fn input(&mut self, value: Value) -> Result<NodeId> {
        self.store.input(value)
    }

    /// Extends `env` with `name` bound to `node`.
    pub fn bind(&mut self, env: EnvId, name: &str, node: NodeId) -> Option<EnvId> {
        let name = self.program.symbol(name)?;
        Some(self.store.envs_mut().extend(env, name, Binding::Node(node)))
    }

    pub fn update_input(&mut self, node: NodeId, value: Value) -> Result<()> {
        self.store.update_input(node, value)
    }

    pub fn new_revision(&mut self) -> WorldId {
        self.store.new_revision()
    }

    pub fn value(&self, node: NodeId) -> Option<&Value> {
        self.store.value(node)
    }

    /// Starts a forward pass if one is not already running, then makes `roots` unavailable.
    pub fn slice_forward(&mut self, roots: &[Annotated]) -> Result<()> {
        if self.annotations.direction() != Direction::Forward {
            self.annotations.reset(Direction::Forward);
        }
        annotation::slice_forward(&mut self.annotations, &self.store, roots)
    }

    /// Starts a backward pass if one is not already running, then marks `roots` needed.
    pub fn slice_backward(&mut self, roots: &[Annotated]) -> Result<()> {
        if self.annotations.direction() != Direction::Backward {
            self.annotations.reset(Direction::Backward);
        }
        annotation::slice_backward(&mut self.annotations, &self.store, roots)
    }

    pub fn reset(&mut self, direction: Direction) {
        self.annotations.reset(direction);
    }

    pub fn is_available(&self, target: impl Into<Annotated>) -> bool {
        self.annotations.is_available(target)
    }

    pub fn is_needed(&self, target: impl Into<Annotated>) -> bool {
        self.annotations.is_needed(target)
    }

    /// Drops flags that are not part of how `root` was computed.
    pub fn restrict_to(&mut self, root: NodeId) {
        self.annotations.restrict_to(&self.store, root);
    }
}
