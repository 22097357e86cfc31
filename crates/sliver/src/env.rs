//! Persistent environments.
//!
//! An environment is a chain of frames, innermost first, interned so that the
//! same chain always has the same [`EnvId`]. Node addresses include the env,
//! so equal chains must be equal ids for identities to survive re-evaluation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::store::NodeId;
use crate::store::lattice::merge_by_equality;
use crate::syntax::{RecGroupId, Symbol};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnvId(pub u32);

impl EnvId {
    pub const EMPTY: Self = Self(0);
}

merge_by_equality!(EnvId);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Binding {
    /// A store node. It may still be unevaluated.
    Node(NodeId),
    /// Definition `index` of a recursive group, closed over `env` on lookup.
    Recursive {
        env: EnvId,
        group: RecGroupId,
        index: u32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Frame {
    Empty,
    Extend {
        parent: EnvId,
        name: Symbol,
        binding: Binding,
    },
}

#[derive(Clone, Debug)]
pub struct Envs {
    frames: Vec<Frame>,
    ids: HashMap<Frame, EnvId>,
}

impl Envs {
    pub fn new() -> Self {
        let mut ids = HashMap::new();
        ids.insert(Frame::Empty, EnvId::EMPTY);
        Self {
            frames: vec![Frame::Empty],
            ids,
        }
    }

    pub fn extend(&mut self, parent: EnvId, name: Symbol, binding: Binding) -> EnvId {
        let frame = Frame::Extend {
            parent,
            name,
            binding,
        };
        if let Some(&id) = self.ids.get(&frame) {
            return id;
        }
        let id = EnvId(self.frames.len() as u32);
        self.frames.push(frame);
        self.ids.insert(frame, id);
        id
    }

    pub fn singleton(&mut self, name: Symbol, binding: Binding) -> EnvId {
        self.extend(EnvId::EMPTY, name, binding)
    }

    /// Innermost binding of `name`.
    pub fn get(&self, env: EnvId, name: Symbol) -> Option<Binding> {
        let mut current = env;
        loop {
            match self.frames[current.0 as usize] {
                Frame::Empty => return None,
                Frame::Extend {
                    parent,
                    name: bound,
                    binding,
                } => {
                    if bound == name {
                        return Some(binding);
                    }
                    current = parent;
                }
            }
        }
    }

    pub fn has(&self, env: EnvId, name: Symbol) -> bool {
        self.get(env, name).is_some()
    }

    /// `inner` laid on top of `outer`. Neither chain changes.
    pub fn concat(&mut self, inner: EnvId, outer: EnvId) -> EnvId {
        if inner == EnvId::EMPTY {
            return outer;
        }
        self.entries(inner)
            .into_iter()
            .rev()
            .fold(outer, |env, (name, binding)| self.extend(env, name, binding))
    }

    /// Bindings innermost first, shadowed ones included.
    pub fn entries(&self, env: EnvId) -> Vec<(Symbol, Binding)> {
        let mut entries = Vec::new();
        let mut current = env;
        while let Frame::Extend {
            parent,
            name,
            binding,
        } = self.frames[current.0 as usize]
        {
            entries.push((name, binding));
            current = parent;
        }
        entries
    }

    pub fn depth(&self, env: EnvId) -> usize {
        self.entries(env).len()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.len() == 1
    }
}

impl Default for Envs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(index: u32) -> Binding {
        Binding::Node(NodeId(index))
    }

    #[test]
    fn innermost_binding_wins() {
        let mut envs = Envs::new();
        let x = Symbol(0);
        let y = Symbol(1);
        let outer = envs.singleton(x, node(1));
        let env = envs.extend(outer, y, node(2));
        let shadowed = envs.extend(env, x, node(3));

        assert_eq!(envs.get(shadowed, x), Some(node(3)));
        assert_eq!(envs.get(shadowed, y), Some(node(2)));
        assert_eq!(envs.get(outer, x), Some(node(1)));
        assert!(!envs.has(outer, y));
        assert_eq!(envs.get(EnvId::EMPTY, x), None);
    }

    #[test]
    fn equal_chains_share_an_id() {
        let mut envs = Envs::new();
        let a = envs.singleton(Symbol(0), node(1));
        let b = envs.singleton(Symbol(0), node(1));
        assert_eq!(a, b);
        assert_ne!(a, envs.singleton(Symbol(0), node(2)));
    }

    #[test]
    fn concat_lays_inner_over_outer() {
        let mut envs = Envs::new();
        let (x, y, z) = (Symbol(0), Symbol(1), Symbol(2));
        let outer = envs.singleton(x, node(1));
        let outer = envs.extend(outer, y, node(2));
        let inner = envs.singleton(x, node(10));
        let inner = envs.extend(inner, z, node(30));

        let joined = envs.concat(inner, outer);
        assert_eq!(envs.get(joined, x), Some(node(10)));
        assert_eq!(envs.get(joined, y), Some(node(2)));
        assert_eq!(envs.get(joined, z), Some(node(30)));
        assert_eq!(envs.depth(joined), 4);

        // Inputs are untouched.
        assert_eq!(envs.get(outer, x), Some(node(1)));
        assert!(!envs.has(inner, y));
        assert_eq!(envs.concat(EnvId::EMPTY, outer), outer);
    }
}
