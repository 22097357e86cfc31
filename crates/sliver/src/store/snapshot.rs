//! Serialisable views of the store for inspection and command-line output.
//!
//! Note: JSON rendering requires the `cli` feature.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{NodeId, Store};
use crate::expl::Expl;
use crate::syntax::Program;
use crate::value::Value;

/// The nodes visible at the store's current revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Version for migration support
    pub version: u32,
    pub world: u32,
    pub nodes: Vec<NodeRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: u32,
    pub address: String,
    pub explanation: Option<String>,
    pub value: Option<SerializedValue>,
    /// Revisions holding their own entry for this node.
    pub versions: Vec<u32>,
}

/// A value with its sub-values inlined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SerializedValue {
    Number(f64),
    Text(String),
    Closure { func: u32 },
    Primitive(String),
    Constructor { tag: String, args: Vec<SerializedValue> },
    /// A complete `Cons`/`Nil` chain.
    List(Vec<SerializedValue>),
    Unevaluated,
    /// A constructor that contains itself.
    Cycle { node: u32 },
}

impl SerializedValue {
    pub fn of(store: &Store, program: &Program, node: NodeId) -> Self {
        Self::inline(store, program, node, &mut HashSet::new())
    }

    /// `enclosing` holds the nodes whose values are being inlined around `node`.
    fn inline(
        store: &Store,
        program: &Program,
        node: NodeId,
        enclosing: &mut HashSet<NodeId>,
    ) -> Self {
        let Some(value) = store.value(node) else {
            return SerializedValue::Unevaluated;
        };
        let (tag, args) = match value {
            Value::Num(n) => return SerializedValue::Number(n.0),
            Value::Str(s) => return SerializedValue::Text(s.to_string()),
            Value::Closure(closure) => {
                return SerializedValue::Closure {
                    func: closure.func.0,
                };
            }
            Value::Prim(prim) => return SerializedValue::Primitive(prim.name().to_string()),
            Value::Constr { tag, args } => (tag, args),
        };
        if !enclosing.insert(node) {
            return SerializedValue::Cycle { node: node.0 };
        }
        let inlined = match list_items(store, program, node) {
            Some(items) => SerializedValue::List(
                items
                    .into_iter()
                    .map(|item| Self::inline(store, program, item, enclosing))
                    .collect(),
            ),
            None => SerializedValue::Constructor {
                tag: program.name(*tag).to_string(),
                args: args
                    .iter()
                    .map(|arg| Self::inline(store, program, *arg, enclosing))
                    .collect(),
            },
        };
        enclosing.remove(&node);
        inlined
    }
}

/// Elements of a finite list ending in a known `Nil`, or `None` for anything else.
fn list_items(store: &Store, program: &Program, mut node: NodeId) -> Option<Vec<NodeId>> {
    let builtins = program.builtins();
    let mut items = Vec::new();
    let mut cells = HashSet::new();
    loop {
        if !cells.insert(node) {
            return None;
        }
        match store.value(node)? {
            Value::Constr { tag, .. } if *tag == builtins.nil => return Some(items),
            Value::Constr { tag, args } if *tag == builtins.cons => match args.as_slice() {
                [head, tail] => {
                    items.push(*head);
                    node = *tail;
                }
                _ => return None,
            },
            _ => return None,
        }
    }
}

impl fmt::Display for SerializedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializedValue::Number(n) => write!(f, "{n}"),
            SerializedValue::Text(s) => write!(f, "{s:?}"),
            SerializedValue::Closure { .. } => write!(f, "<closure>"),
            SerializedValue::Primitive(name) => write!(f, "<primitive {name}>"),
            SerializedValue::Constructor { tag, args } => {
                write!(f, "{tag}")?;
                if !args.is_empty() {
                    write!(f, "(")?;
                    write_separated(f, args)?;
                    write!(f, ")")?;
                }
                Ok(())
            }
            SerializedValue::List(items) => {
                write!(f, "[")?;
                write_separated(f, items)?;
                write!(f, "]")
            }
            SerializedValue::Unevaluated => write!(f, "_"),
            SerializedValue::Cycle { node } => write!(f, "<cycle #{node}>"),
        }
    }
}

fn write_separated(f: &mut fmt::Formatter<'_>, values: &[SerializedValue]) -> fmt::Result {
    for (index, value) in values.iter().enumerate() {
        if index > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{value}")?;
    }
    Ok(())
}

impl StoreSnapshot {
    /// Current snapshot version.
    pub const VERSION: u32 = 1;

    pub fn capture(store: &Store, program: &Program) -> Self {
        let nodes = store
            .ids()
            .filter(|node| store.is_known(*node))
            .map(|node| NodeRecord {
                id: node.0,
                address: store.address(node).to_string(),
                explanation: store.expl(node).map(|expl| expl.kind().to_string()),
                value: store
                    .value(node)
                    .map(|_| SerializedValue::of(store, program, node)),
                versions: store.versions(node).into_iter().map(|world| world.0).collect(),
            })
            .collect();
        Self {
            version: Self::VERSION,
            world: store.current_world().0,
            nodes,
        }
    }

    /// Serialize snapshot to JSON string.
    #[cfg(feature = "cli")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Explanation of a node with the explanations of its dependencies nested below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplTree {
    pub node: u32,
    pub label: String,
    pub value: SerializedValue,
    pub children: Vec<ExplTree>,
}

impl ExplTree {
    /// Nodes already shown higher up appear once more as childless references.
    pub fn of(store: &Store, program: &Program, root: NodeId) -> Self {
        let mut seen = HashSet::new();
        Self::build(store, program, root, &mut seen)
    }

    fn build(store: &Store, program: &Program, node: NodeId, seen: &mut HashSet<NodeId>) -> Self {
        let value = SerializedValue::of(store, program, node);
        if !seen.insert(node) {
            return ExplTree {
                node: node.0,
                label: "ref".to_string(),
                value,
                children: Vec::new(),
            };
        }
        let label = match store.expl(node) {
            None => "unevaluated".to_string(),
            Some(Expl::Var { name, .. }) => format!("var {}", program.name(*name)),
            Some(Expl::BinaryApp { op, .. }) => format!("binary-app {}", op.name()),
            Some(Expl::Let { name, .. }) => format!("let {}", program.name(*name)),
            Some(expl) => expl.kind().to_string(),
        };
        let children = store
            .expl(node)
            .map(|expl| expl.dependencies())
            .unwrap_or_default()
            .into_iter()
            .filter(|dep| store.is_known(*dep))
            .map(|dep| Self::build(store, program, dep, seen))
            .collect();
        ExplTree {
            node: node.0,
            label,
            value,
            children,
        }
    }

    /// Indented text, one node per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!("{} {} = {}\n", NodeId(self.node), self.label, self.value));
        for child in &self.children {
            child.render_into(out, depth + 1);
        }
    }

    /// Serialize tree to JSON string.
    #[cfg(feature = "cli")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
