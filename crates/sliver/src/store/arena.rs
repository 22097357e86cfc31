use std::collections::HashMap;

use log::{debug, trace};

use super::address::{Address, NodeId};
use super::lattice::{Conflict, Merge};
use super::world::{WorldId, Worlds};
use crate::expl::Expl;
use crate::value::Value;

/// Everything known about one node at one revision.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeState {
    pub expl: Option<Expl>,
    pub value: Option<Value>,
}

impl NodeState {
    pub const BLANK: Self = Self {
        expl: None,
        value: None,
    };

    pub fn new(expl: Expl, value: Value) -> Self {
        Self {
            expl: Some(expl),
            value: Some(value),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.expl.is_none() && self.value.is_none()
    }
}

impl Merge for NodeState {
    fn merge(&self, other: &Self) -> Result<Self, Conflict> {
        Ok(NodeState {
            expl: self.expl.merge(&other.expl)?,
            value: self.value.merge(&other.value)?,
        })
    }
}

/// One addressed node and the revisions at which its state was written.
#[derive(Clone, Debug)]
struct VersionedNode {
    address: Address,
    history: Vec<(WorldId, NodeState)>,
}

/// Copy-on-write node table keyed by address.
#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    nodes: Vec<VersionedNode>,
    ids: HashMap<Address, NodeId>,
    /// What each revision wrote to nodes it still only inherits.
    shared: HashMap<(NodeId, WorldId), NodeState>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// The node for `address`, allocated on first reference.
    pub fn id(&mut self, address: Address) -> NodeId {
        if let Some(&id) = self.ids.get(&address) {
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(VersionedNode {
            address,
            history: Vec::new(),
        });
        self.ids.insert(address, id);
        id
    }

    pub fn lookup(&self, address: &Address) -> Option<NodeId> {
        self.ids.get(address).copied()
    }

    pub fn address(&self, id: NodeId) -> Address {
        self.nodes[id.0 as usize].address
    }

    /// State visible from `world`: the entry written at `world` or its nearest ancestor.
    pub fn state<'a>(
        &'a self,
        id: NodeId,
        worlds: &Worlds,
        world: WorldId,
    ) -> Option<&'a NodeState> {
        let history = &self.nodes[id.0 as usize].history;
        worlds.ancestry(world).find_map(|ancestor| {
            history
                .iter()
                .find(|(written, _)| *written == ancestor)
                .map(|(_, state)| state)
        })
    }

    /// Revisions at which the node has its own entry, oldest first.
    pub fn versions(&self, id: NodeId) -> impl Iterator<Item = WorldId> + '_ {
        self.nodes[id.0 as usize].history.iter().map(|(world, _)| *world)
    }

    /// Records `state` for `id` at `world`.
    ///
    /// Within one revision writes merge in place. A revision that only inherits
    /// the node gets its own entry when the written state carries something the
    /// inherited one does not, or contradicts it. Writes at one revision must
    /// agree with each other even while the node has no entry of its own there.
    pub fn commit(
        &mut self,
        id: NodeId,
        worlds: &Worlds,
        world: WorldId,
        state: NodeState,
    ) -> Result<(), Conflict> {
        if state.is_blank() {
            return Ok(());
        }
        let own = self.nodes[id.0 as usize]
            .history
            .iter()
            .position(|(written, _)| *written == world);
        if let Some(index) = own {
            let node = &mut self.nodes[id.0 as usize];
            let merged = node.history[index].1.merge(&state)?;
            trace!("merge {} at world {}", node.address, world.0);
            node.history[index].1 = merged;
            return Ok(());
        }
        let written = match self.shared.get(&(id, world)) {
            Some(earlier) => earlier.merge(&state)?,
            None => state,
        };
        let entry = match self.state(id, worlds, world).cloned() {
            None => written,
            Some(inherited) => match inherited.merge(&written) {
                Ok(merged) if merged == inherited => {
                    self.shared.insert((id, world), written);
                    return Ok(());
                }
                Ok(merged) => merged,
                Err(_) => written,
            },
        };
        self.shared.remove(&(id, world));
        let node = &mut self.nodes[id.0 as usize];
        if !node.history.is_empty() {
            debug!("copy-on-write {} at world {}", node.address, world.0);
        }
        node.history.push((world, entry));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
