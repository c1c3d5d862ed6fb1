//! Arena-backed document tree
//!
//! Every node lives in a `Vec<NodeData>` owned by the [`Tree`] and is named by
//! a [`NodeId`] index. Children are owned through the parent's child list;
//! the parent link is a plain index, so the tree has no reference cycles and
//! dropping the `Tree` frees everything at once.

use crate::name::{Attribute, QualifiedName};
use crate::node::Node;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Index of a node inside its [`Tree`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The synthetic root of every tree
    pub const ROOT: Self = Self(0);

    pub const fn index(self) -> usize {
        self.0
    }
}

/// Payload-free tag of a node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NodeType {
    Root,
    Element,
    Text,
    Comment,
    Directive,
    ProcessingInstruction,
}

/// What a node is, and the data that goes with it
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Element {
        name: QualifiedName,
        attributes: Vec<Attribute>,
    },
    /// Raw character data
    Text(String),
    /// Trimmed comment body
    Comment(String),
    /// Trimmed directive body, e.g. `DOCTYPE html`
    Directive(String),
    ProcessingInstruction { target: String, value: String },
}

impl NodeKind {
    pub const fn node_type(&self) -> NodeType {
        match self {
            Self::Root => NodeType::Root,
            Self::Element { .. } => NodeType::Element,
            Self::Text(_) => NodeType::Text,
            Self::Comment(_) => NodeType::Comment,
            Self::Directive(_) => NodeType::Directive,
            Self::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
        }
    }
}

/// Storage for a single node
#[derive(Clone, Debug)]
pub struct NodeData {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// A node arena with a synthetic root at [`NodeId::ROOT`]
#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<NodeData>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create a tree holding only the root
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> Node<'_> {
        Node::new(self, NodeId::ROOT)
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0)
    }

    /// Allocate a node and attach it as the last child of `parent`.
    ///
    /// Returns `None` when `parent` does not belong to this tree.
    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> Option<NodeId> {
        let id = NodeId(self.nodes.len());
        self.nodes.get_mut(parent.0)?.children.push(id);
        self.nodes.push(NodeData {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        Some(id)
    }

    /// Total number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree holds nothing but the root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }
}

impl PartialEq for Tree {
    /// Trees are equal when their node structure and contents match,
    /// independent of allocation order.
    fn eq(&self, other: &Self) -> bool {
        self.root().deep_eq(&other.root())
    }
}

impl Eq for Tree {}
