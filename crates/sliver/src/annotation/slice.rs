use std::collections::{HashMap, VecDeque};

use log::debug;
use smallvec::SmallVec;

use super::{Annotated, Annotation, Annotations, Direction};
use crate::error::{Error, Result};
use crate::store::{NodeId, Store};

/// What `node`'s value was computed from: its source expression, every
/// evaluated node its explanation refers to, and the evaluated parts of its
/// value. Library primitives are part of every prelude and never count.
pub fn dependencies(store: &Store, node: NodeId) -> SmallVec<[Annotated; 4]> {
    let mut deps = SmallVec::new();
    if let Some(expr) = store.address(node).expr() {
        deps.push(Annotated::Expr(expr));
    }
    let mut nodes: SmallVec<[NodeId; 4]> = store.value_children(node).into_iter().collect();
    if let Some(expl) = store.expl(node) {
        nodes.extend(expl.dependencies());
    }
    for dep in nodes {
        if store.is_known(dep) && !store.is_library(dep) && !deps.contains(&Annotated::Node(dep)) {
            deps.push(Annotated::Node(dep));
        }
    }
    deps
}

/// Reverse of [`dependencies`] over the nodes known at the current revision.
#[derive(Debug, Default)]
pub struct Users {
    users: HashMap<Annotated, SmallVec<[NodeId; 2]>>,
}

impl Users {
    pub fn index(store: &Store) -> Self {
        let mut users: HashMap<Annotated, SmallVec<[NodeId; 2]>> = HashMap::new();
        for node in store.ids().filter(|node| store.is_known(*node)) {
            for dep in dependencies(store, node) {
                users.entry(dep).or_default().push(node);
            }
        }
        Self { users }
    }

    pub fn of(&self, target: Annotated) -> &[NodeId] {
        self.users.get(&target).map(|users| users.as_slice()).unwrap_or(&[])
    }
}

/// Makes `roots`, and everything already flagged, unavailable, then propagates:
/// a node is available only if all of its dependencies are.
pub fn slice_forward(
    annotations: &mut Annotations,
    store: &Store,
    roots: &[Annotated],
) -> Result<()> {
    expect_direction(annotations, Direction::Forward)?;
    let users = Users::index(store);
    let mut queue: VecDeque<Annotated> = annotations.flagged().collect();
    for root in roots {
        annotations.set(*root, Annotation::Bot)?;
        queue.push_back(*root);
    }
    while let Some(target) = queue.pop_front() {
        for &node in users.of(target) {
            let user = Annotated::Node(node);
            if annotations.is(user) == Annotation::Bot {
                continue;
            }
            let availability = dependencies(store, node)
                .into_iter()
                .fold(Annotation::Top, |acc, dep| acc.meet(annotations.is(dep)));
            if availability == Annotation::Bot {
                annotations.set(user, availability)?;
                queue.push_back(user);
            }
        }
    }
    debug!("forward slice: {} unavailable of {} nodes", annotations.len(), store.len());
    Ok(())
}

/// Marks `roots` needed, then propagates need to every dependency.
pub fn slice_backward(
    annotations: &mut Annotations,
    store: &Store,
    roots: &[Annotated],
) -> Result<()> {
    expect_direction(annotations, Direction::Backward)?;
    let mut queue = VecDeque::new();
    for root in roots {
        annotations.set(*root, Annotation::Top)?;
        queue.push_back(*root);
    }
    while let Some(target) = queue.pop_front() {
        let Annotated::Node(node) = target else {
            continue;
        };
        for dep in dependencies(store, node) {
            let need = annotations.is(dep);
            if need == Annotation::Bot {
                annotations.set(dep, need.join(Annotation::Top))?;
                queue.push_back(dep);
            }
        }
    }
    debug!("backward slice: {} needed of {} nodes", annotations.len(), store.len());
    Ok(())
}

fn expect_direction(annotations: &Annotations, direction: Direction) -> Result<()> {
    if annotations.direction() == direction {
        Ok(())
    } else {
        Err(Error::DirectionViolation {
            direction: annotations.direction(),
            target: format!("a {direction} slice"),
        })
    }
}
