//! Versioned, content-addressed store of explained values.
//!
//! Every node has a stable [`Address`]. Writing to a node merges the new
//! knowledge with what the current revision already holds; a new revision
//! layers copy-on-write entries over its parent so older revisions stay
//! readable.

mod address;
mod arena;
pub mod lattice;
pub mod snapshot;
mod world;

use std::collections::HashMap;

use log::debug;
use smallvec::SmallVec;
use ulid::Generator;

pub use address::{Address, EvalKey, NodeId};
pub use arena::{NodeArena, NodeState};
pub use world::{WorldId, Worlds};

use crate::env::Envs;
use crate::error::{Error, Result};
use crate::expl::Expl;
use crate::primitive::Primitive;
use crate::syntax::Symbol;
use crate::value::{PrimValue, Value};

pub struct Store {
    worlds: Worlds,
    nodes: NodeArena,
    envs: Envs,
    fresh: Generator,
    library: HashMap<Primitive, NodeId>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            worlds: Worlds::new(),
            nodes: NodeArena::new(),
            envs: Envs::new(),
            fresh: Generator::new(),
            library: HashMap::new(),
        }
    }

    /// Writes `state` to the node for `address` at the current revision.
    pub fn at(&mut self, address: Address, state: NodeState) -> Result<NodeId> {
        let id = self.nodes.id(address);
        let world = self.worlds.current();
        self.nodes
            .commit(id, &self.worlds, world, state)
            .map_err(|conflict| Error::AddressCollision {
                address: address.to_string(),
                conflict,
            })?;
        Ok(id)
    }

    /// The node for `address`, without adding anything to it.
    pub fn node(&mut self, address: Address) -> NodeId {
        self.nodes.id(address)
    }

    pub fn lookup(&self, address: &Address) -> Option<NodeId> {
        self.nodes.lookup(address)
    }

    /// A new identity for externally sourced data.
    pub fn fresh(&mut self) -> Result<Address> {
        Ok(Address::External(self.fresh.generate()?))
    }

    /// Injects an external value under a fresh identity.
    pub fn input(&mut self, value: Value) -> Result<NodeId> {
        let address = self.fresh()?;
        self.at(address, NodeState::new(Expl::Empty, value))
    }

    /// Injects an external constructor value over existing nodes.
    pub fn input_constr(&mut self, tag: Symbol, args: &[NodeId]) -> Result<NodeId> {
        self.input(Value::Constr {
            tag,
            args: SmallVec::from_slice(args),
        })
    }

    /// Replaces the value of an input. Only legal once per revision.
    pub fn update_input(&mut self, node: NodeId, value: Value) -> Result<()> {
        let address = self.nodes.address(node);
        self.at(address, NodeState::new(Expl::Empty, value))?;
        Ok(())
    }

    /// The library node of `primitive`, shared by every prelude of this store.
    pub fn primitive(&mut self, primitive: Primitive) -> Result<NodeId> {
        if let Some(&node) = self.library.get(&primitive) {
            return Ok(node);
        }
        let value = match primitive {
            Primitive::Unary(op) => PrimValue::Unary(op),
            Primitive::Binary(op) => PrimValue::Binary(op),
        };
        let node = self.input(Value::Prim(value))?;
        self.library.insert(primitive, node);
        Ok(node)
    }

    pub fn is_library(&self, node: NodeId) -> bool {
        self.library.values().any(|&library| library == node)
    }

    pub fn new_revision(&mut self) -> WorldId {
        let world = self.worlds.spawn();
        debug!("opened revision {} over {}", world.0, self.worlds.parent(world).map_or(0, |p| p.0));
        world
    }

    pub fn checkout(&mut self, world: WorldId) -> Result<()> {
        if self.worlds.checkout(world) {
            Ok(())
        } else {
            Err(Error::UnknownRevision(world.0))
        }
    }

    pub fn current_world(&self) -> WorldId {
        self.worlds.current()
    }

    pub fn worlds(&self) -> &Worlds {
        &self.worlds
    }

    pub fn leq(&self, earlier: WorldId, later: WorldId) -> bool {
        self.worlds.leq(earlier, later)
    }

    pub fn envs(&self) -> &Envs {
        &self.envs
    }

    pub fn envs_mut(&mut self) -> &mut Envs {
        &mut self.envs
    }

    pub fn state(&self, node: NodeId) -> Option<&NodeState> {
        self.state_at(node, self.worlds.current())
    }

    pub fn state_at(&self, node: NodeId, world: WorldId) -> Option<&NodeState> {
        self.nodes.state(node, &self.worlds, world)
    }

    pub fn value(&self, node: NodeId) -> Option<&Value> {
        self.state(node).and_then(|state| state.value.as_ref())
    }

    pub fn value_at(&self, node: NodeId, world: WorldId) -> Option<&Value> {
        self.state_at(node, world).and_then(|state| state.value.as_ref())
    }

    pub fn expl(&self, node: NodeId) -> Option<&Expl> {
        self.state(node).and_then(|state| state.expl.as_ref())
    }

    pub fn address(&self, node: NodeId) -> Address {
        self.nodes.address(node)
    }

    /// Whether the current revision holds anything for `node`.
    pub fn is_known(&self, node: NodeId) -> bool {
        self.state(node).is_some_and(|state| !state.is_blank())
    }

    pub fn value_children(&self, node: NodeId) -> SmallVec<[NodeId; 2]> {
        self.value(node).map(Value::children).unwrap_or_default()
    }

    /// Revisions at which `node` has its own entry.
    pub fn versions(&self, node: NodeId) -> Vec<WorldId> {
        self.nodes.versions(node).collect()
    }

    /// All nodes ever addressed, in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EnvId;
    use crate::syntax::ExprId;
    use ordered_float::OrderedFloat;

    fn num(n: f64) -> Value {
        Value::Num(OrderedFloat(n))
    }

    #[test]
    fn same_address_same_node() {
        let mut store = Store::new();
        let address = Address::eval(EnvId::EMPTY, ExprId(4));
        let a = store.at(address, NodeState::new(Expl::Empty, num(1.0))).unwrap();
        let b = store.at(address, NodeState::new(Expl::Empty, num(1.0))).unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn blank_registration_stays_unknown() {
        let mut store = Store::new();
        let node = store.node(Address::eval(EnvId::EMPTY, ExprId(0)));
        assert!(!store.is_known(node));
        assert!(store.value(node).is_none());
        assert!(store.versions(node).is_empty());
    }

    #[test]
    fn conflicting_writes_collide() {
        let mut store = Store::new();
        let address = Address::eval(EnvId::EMPTY, ExprId(0));
        store.at(address, NodeState::new(Expl::Empty, num(1.0))).unwrap();
        let err = store
            .at(address, NodeState::new(Expl::Empty, Value::Str("one".into())))
            .unwrap_err();
        assert!(matches!(err, Error::AddressCollision { .. }));
    }

    #[test]
    fn inputs_change_only_in_a_new_revision() {
        let mut store = Store::new();
        let input = store.input(num(3.0)).unwrap();
        assert!(store.address(input).is_external());
        assert!(store.update_input(input, num(4.0)).is_err());

        let first = store.current_world();
        let second = store.new_revision();
        store.update_input(input, num(4.0)).unwrap();
        assert_eq!(store.value(input), Some(&num(4.0)));
        assert_eq!(store.value_at(input, first), Some(&num(3.0)));
        assert!(store.leq(first, second));

        store.checkout(first).unwrap();
        assert_eq!(store.value(input), Some(&num(3.0)));
        assert!(matches!(store.checkout(WorldId(42)), Err(Error::UnknownRevision(42))));
    }

    #[test]
    fn fresh_identities_are_distinct() {
        let mut store = Store::new();
        let a = store.fresh().unwrap();
        let b = store.fresh().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn library_nodes_are_shared() {
        let mut store = Store::new();
        let plus = Primitive::from_name("+").unwrap();
        let a = store.primitive(plus).unwrap();
        let b = store.primitive(plus).unwrap();
        assert_eq!(a, b);
        assert!(matches!(store.value(a), Some(Value::Prim(PrimValue::Binary(_)))));
    }
}
