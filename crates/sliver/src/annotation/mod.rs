//! Availability and need annotations over expressions and store nodes.
//!
//! A pass runs in one [`Direction`]. Forward passes start with everything
//! available and only ever take availability away; backward passes start with
//! nothing needed and only ever add need. Only the nodes that moved away from
//! the starting point are stored.

mod slice;

use std::collections::{HashSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

pub use slice::{Users, dependencies, slice_backward, slice_forward};

use crate::error::{Error, Result};
use crate::store::{NodeId, Store};
use crate::syntax::ExprId;

/// The two-point lattice `Bot < Top`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Annotation {
    Bot,
    Top,
}

impl Annotation {
    pub fn join(self, other: Self) -> Self {
        self.max(other)
    }

    pub fn meet(self, other: Self) -> Self {
        self.min(other)
    }

    pub fn negate(self) -> Self {
        match self {
            Annotation::Bot => Annotation::Top,
            Annotation::Top => Annotation::Bot,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Top means available.
    Forward,
    /// Top means needed.
    Backward,
}

impl Direction {
    /// What every node is annotated with before the pass touches it.
    pub fn initial(self) -> Annotation {
        match self {
            Direction::Forward => Annotation::Top,
            Direction::Backward => Annotation::Bot,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
        }
    }
}

/// Something an annotation can be attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Annotated {
    /// A program point.
    Expr(ExprId),
    /// An explained value.
    Node(NodeId),
}

impl From<ExprId> for Annotated {
    fn from(expr: ExprId) -> Self {
        Annotated::Expr(expr)
    }
}

impl From<NodeId> for Annotated {
    fn from(node: NodeId) -> Self {
        Annotated::Node(node)
    }
}

impl fmt::Display for Annotated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Annotated::Expr(expr) => write!(f, "expression e{}", expr.0),
            Annotated::Node(node) => write!(f, "node {node}"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Annotations {
    direction: Direction,
    flagged: HashSet<Annotated>,
}

impl Annotations {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            flagged: HashSet::new(),
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Starts a new pass, forgetting every flag.
    pub fn reset(&mut self, direction: Direction) {
        self.direction = direction;
        self.flagged.clear();
    }

    pub fn is(&self, target: Annotated) -> Annotation {
        let initial = self.direction.initial();
        if self.flagged.contains(&target) {
            initial.negate()
        } else {
            initial
        }
    }

    /// Moves `target` to `annotation`.
    ///
    /// Setting the current annotation again is a no-op. Moving back towards
    /// the pass's starting point is a [`Error::DirectionViolation`].
    pub fn set(&mut self, target: Annotated, annotation: Annotation) -> Result<()> {
        if self.is(target) == annotation {
            return Ok(());
        }
        if annotation == self.direction.initial() {
            return Err(Error::DirectionViolation {
                direction: self.direction,
                target: target.to_string(),
            });
        }
        self.flagged.insert(target);
        Ok(())
    }

    /// Not made unavailable by a forward pass.
    pub fn is_available(&self, target: impl Into<Annotated>) -> bool {
        self.direction == Direction::Forward && !self.flagged.contains(&target.into())
    }

    /// Marked needed by a backward pass.
    pub fn is_needed(&self, target: impl Into<Annotated>) -> bool {
        self.direction == Direction::Backward && self.flagged.contains(&target.into())
    }

    /// Everything that moved away from the starting annotation.
    pub fn flagged(&self) -> impl Iterator<Item = Annotated> + '_ {
        self.flagged.iter().copied()
    }

    pub fn flagged_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.flagged.iter().filter_map(|target| match target {
            Annotated::Node(node) => Some(*node),
            Annotated::Expr(_) => None,
        })
    }

    pub fn flagged_exprs(&self) -> impl Iterator<Item = ExprId> + '_ {
        self.flagged.iter().filter_map(|target| match target {
            Annotated::Expr(expr) => Some(*expr),
            Annotated::Node(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.flagged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flagged.is_empty()
    }

    /// Keeps only flags reachable from `root` through value children and explanations.
    pub fn restrict_to(&mut self, store: &Store, root: NodeId) {
        let reachable = reachable(store, root, true);
        self.flagged.retain(|target| reachable.contains(target));
    }

    /// Keeps only flags on `root` and the sub-values it is built from.
    pub fn restrict_to_values(&mut self, store: &Store, root: NodeId) {
        let reachable = reachable(store, root, false);
        self.flagged.retain(|target| reachable.contains(target));
    }
}

impl Default for Annotations {
    fn default() -> Self {
        Self::new(Direction::Forward)
    }
}

fn reachable(store: &Store, root: NodeId, explanations: bool) -> HashSet<Annotated> {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([Annotated::Node(root)]);
    while let Some(target) = queue.pop_front() {
        if !seen.insert(target) {
            continue;
        }
        let Annotated::Node(node) = target else {
            continue;
        };
        queue.extend(store.value_children(node).into_iter().map(Annotated::Node));
        if explanations {
            queue.extend(dependencies(store, node));
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lattice_operations() {
        use Annotation::{Bot, Top};
        assert_eq!(Bot.join(Top), Top);
        assert_eq!(Bot.meet(Top), Bot);
        assert_eq!(Top.meet(Top), Top);
        assert_eq!(Top.negate(), Bot);
    }

    #[test]
    fn forward_updates_only_descend() {
        let mut annotations = Annotations::new(Direction::Forward);
        let node = Annotated::Node(NodeId(1));
        assert_eq!(annotations.is(node), Annotation::Top);

        annotations.set(node, Annotation::Top).unwrap();
        assert!(annotations.is_empty());

        annotations.set(node, Annotation::Bot).unwrap();
        annotations.set(node, Annotation::Bot).unwrap();
        assert!(!annotations.is_available(NodeId(1)));

        let err = annotations.set(node, Annotation::Top).unwrap_err();
        assert!(matches!(err, Error::DirectionViolation { direction: Direction::Forward, .. }));
    }

    #[test]
    fn backward_updates_only_ascend() {
        let mut annotations = Annotations::new(Direction::Backward);
        let expr = Annotated::Expr(ExprId(4));
        annotations.set(expr, Annotation::Top).unwrap();
        assert!(annotations.is_needed(ExprId(4)));
        assert!(annotations.set(expr, Annotation::Bot).is_err());
    }

    #[test]
    fn reset_clears_and_switches_direction() {
        let mut annotations = Annotations::new(Direction::Forward);
        annotations.set(Annotated::Node(NodeId(0)), Annotation::Bot).unwrap();
        annotations.reset(Direction::Backward);
        assert!(annotations.is_empty());
        assert_eq!(annotations.is(Annotated::Node(NodeId(0))), Annotation::Bot);
        assert!(!annotations.is_available(NodeId(0)));
    }
}
