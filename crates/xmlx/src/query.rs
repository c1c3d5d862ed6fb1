//! Qualified-name lookups on any subtree

use crate::node::Node;

impl<'a> Node<'a> {
    fn is_named(&self, space: &str, local: &str) -> bool {
        self.name().is_some_and(|name| name.matches(space, local))
    }

    /// First direct child element named `(space, local)`
    pub fn select_node(&self, space: &str, local: &str) -> Option<Node<'a>> {
        self.children().find(|child| child.is_named(space, local))
    }

    /// Every direct child element named `(space, local)`, in document order.
    /// Matches are not searched further.
    pub fn select_nodes(&self, space: &str, local: &str) -> Vec<Node<'a>> {
        self.children()
            .filter(|child| child.is_named(space, local))
            .collect()
    }

    /// Every descendant element named `(space, local)`, depth-first in
    /// document order, including elements nested inside other matches.
    pub fn select_nodes_recursive(&self, space: &str, local: &str) -> Vec<Node<'a>> {
        let mut found = Vec::new();
        self.collect_recursive(space, local, &mut found);
        found
    }

    fn collect_recursive(&self, space: &str, local: &str, found: &mut Vec<Node<'a>>) {
        for child in self.children() {
            if child.is_named(space, local) {
                found.push(child);
            }
            child.collect_recursive(space, local, found);
        }
    }
}
