//! Borrowed node handles

use std::fmt;
use std::ptr;

use crate::name::{Attribute, QualifiedName};
use crate::tree::{NodeData, NodeId, NodeKind, NodeType, Tree};

/// A node together with the tree that owns it.
///
/// Handles are cheap to copy. Two handles are equal when they point at the
/// same node of the same tree; use [`Node::deep_eq`] to compare content.
#[derive(Clone, Copy)]
pub struct Node<'a> {
    tree: &'a Tree,
    id: NodeId,
}

impl<'a> Node<'a> {
    pub(crate) const fn new(tree: &'a Tree, id: NodeId) -> Self {
        Self { tree, id }
    }

    pub const fn id(&self) -> NodeId {
        self.id
    }

    pub const fn tree(&self) -> &'a Tree {
        self.tree
    }

    #[allow(clippy::unreachable)]
    fn data(&self) -> &'a NodeData {
        // ids are only ever handed out by the tree that owns them
        match self.tree.data(self.id) {
            Some(data) => data,
            None => unreachable!("node id {} outside its tree", self.id.index()),
        }
    }

    pub fn kind(&self) -> &'a NodeKind {
        &self.data().kind
    }

    pub fn node_type(&self) -> NodeType {
        self.kind().node_type()
    }

    pub fn is_element(&self) -> bool {
        self.node_type() == NodeType::Element
    }

    pub fn parent(&self) -> Option<Node<'a>> {
        self.data().parent.map(|id| Node::new(self.tree, id))
    }

    /// Direct children in document order
    pub fn children(&self) -> impl DoubleEndedIterator<Item = Node<'a>> + ExactSizeIterator + 'a {
        let tree = self.tree;
        self.data().children.iter().map(move |&id| Node::new(tree, id))
    }

    pub fn has_children(&self) -> bool {
        !self.data().children.is_empty()
    }

    /// Element name, `None` for every other kind
    pub fn name(&self) -> Option<&'a QualifiedName> {
        match self.kind() {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Element attributes in document order; empty for other kinds
    pub fn attributes(&self) -> &'a [Attribute] {
        match self.kind() {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Value of the first attribute named `(space, local)`
    pub fn attribute(&self, space: &str, local: &str) -> Option<&'a str> {
        self.attributes()
            .iter()
            .find(|attr| attr.name.matches(space, local))
            .map(|attr| attr.value.as_str())
    }

    /// Text of a text, comment or directive node, or the body of a
    /// processing instruction
    pub fn value(&self) -> Option<&'a str> {
        match self.kind() {
            NodeKind::Text(value) | NodeKind::Comment(value) | NodeKind::Directive(value) => {
                Some(value)
            }
            NodeKind::ProcessingInstruction { value, .. } => Some(value),
            NodeKind::Root | NodeKind::Element { .. } => None,
        }
    }

    /// Target of a processing instruction
    pub fn target(&self) -> Option<&'a str> {
        match self.kind() {
            NodeKind::ProcessingInstruction { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Concatenated text of every descendant text node
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let NodeKind::Text(value) = self.kind() {
            out.push_str(value);
        }
        for child in self.children() {
            child.collect_text(out);
        }
    }

    /// Compare kind and content of two subtrees, ignoring identity
    pub fn deep_eq(&self, other: &Node<'_>) -> bool {
        self.kind() == other.kind()
            && self.children().len() == other.children().len()
            && self
                .children()
                .zip(other.children())
                .all(|(a, b)| a.deep_eq(&b))
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id.index())
            .field("kind", self.kind())
            .finish()
    }
}
