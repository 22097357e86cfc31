use serde::{Deserialize, Serialize};

/// One revision of the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorldId(pub u32);

impl WorldId {
    pub const ROOT: Self = Self(0);
}

/// The revision tree. Revisions only ever grow as children of existing ones.
#[derive(Clone, Debug)]
pub struct Worlds {
    parents: Vec<Option<WorldId>>,
    current: WorldId,
}

impl Worlds {
    pub fn new() -> Self {
        Self {
            parents: vec![None],
            current: WorldId::ROOT,
        }
    }

    pub fn current(&self) -> WorldId {
        self.current
    }

    pub fn parent(&self, world: WorldId) -> Option<WorldId> {
        self.parents.get(world.0 as usize).copied().flatten()
    }

    pub fn contains(&self, world: WorldId) -> bool {
        (world.0 as usize) < self.parents.len()
    }

    /// Opens a child of the current revision and makes it current.
    pub fn spawn(&mut self) -> WorldId {
        let world = WorldId(self.parents.len() as u32);
        self.parents.push(Some(self.current));
        self.current = world;
        world
    }

    /// Returns false if `world` does not exist.
    pub fn checkout(&mut self, world: WorldId) -> bool {
        if !self.contains(world) {
            return false;
        }
        self.current = world;
        true
    }

    /// `world` and then each of its ancestors up to the root.
    pub fn ancestry(&self, world: WorldId) -> impl Iterator<Item = WorldId> + '_ {
        std::iter::successors(Some(world), |world| self.parent(*world))
    }

    /// `earlier ≤ later`: `earlier` is `later` or one of its ancestors.
    pub fn leq(&self, earlier: WorldId, later: WorldId) -> bool {
        self.ancestry(later).any(|world| world == earlier)
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

impl Default for Worlds {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ancestors_precede_descendants() {
        let mut worlds = Worlds::new();
        let first = worlds.spawn();
        let second = worlds.spawn();
        assert!(worlds.leq(WorldId::ROOT, second));
        assert!(worlds.leq(first, second));
        assert!(worlds.leq(second, second));
        assert!(!worlds.leq(second, first));
    }

    #[test]
    fn branches_are_unordered() {
        let mut worlds = Worlds::new();
        let left = worlds.spawn();
        assert!(worlds.checkout(WorldId::ROOT));
        let right = worlds.spawn();
        assert_eq!(worlds.parent(right), Some(WorldId::ROOT));
        assert!(!worlds.leq(left, right));
        assert!(!worlds.leq(right, left));
        assert!(!worlds.checkout(WorldId(9)));
    }
}
