//! XML serializer

use std::fmt;

use crate::name::{Attribute, QualifiedName};
use crate::node::Node;
use crate::tree::{NodeKind, NodeType, Tree};

/// Output options for the serializer
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Repeated once per nesting level at the start of every line.
    /// Empty (the default) produces minified output.
    pub indent: String,
}

impl SaveOptions {
    /// Set the per-level indentation string
    #[must_use]
    pub fn indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    pub fn is_indented(&self) -> bool {
        !self.indent.is_empty()
    }
}

/// Writes a node tree as XML text
#[derive(Debug)]
pub struct Serializer<'o> {
    options: &'o SaveOptions,
    out: String,
}

impl<'o> Serializer<'o> {
    pub fn new(options: &'o SaveOptions) -> Self {
        Self {
            options,
            out: String::new(),
        }
    }

    /// `<?xml version=".." encoding=".." standalone=".."?>`, plus a newline
    /// when indenting
    pub fn declaration(&mut self, version: &str, encoding: &str, standalone: &str) -> &mut Self {
        self.out.push_str(&format!(
            r#"<?xml version="{version}" encoding="{encoding}" standalone="{standalone}"?>"#
        ));
        if self.options.is_indented() {
            self.out.push('\n');
        }
        self
    }

    /// Write `node` and its subtree. The root writes only its children.
    pub fn node(&mut self, node: Node<'_>) -> &mut Self {
        match node.kind() {
            NodeKind::Root => self.write_children(node, 0, false),
            _ => self.write_node(node, 0, false),
        }
        self
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn write_node(&mut self, node: Node<'_>, depth: usize, inline: bool) {
        if !inline && node.node_type() != NodeType::Text {
            self.break_line(depth);
        }

        match node.kind() {
            NodeKind::Root => self.write_children(node, depth, inline),
            NodeKind::Element { name, attributes } => {
                self.out.push('<');
                self.write_name(name);
                for attr in attributes {
                    self.write_attribute(attr);
                }
                if !node.has_children() {
                    self.out.push_str("/>");
                    return;
                }
                self.out.push('>');

                let inline_children = inline || has_text_child(node);
                self.write_children(node, depth + 1, inline_children);
                if !inline_children {
                    self.break_line(depth);
                }

                self.out.push_str("</");
                self.write_name(name);
                self.out.push('>');
            }
            NodeKind::Text(value) => escape_text(&mut self.out, value),
            NodeKind::Comment(value) => {
                self.out.push_str("<!--");
                self.out.push_str(value);
                // `--->` would close on the value's own dash
                if value.ends_with('-') {
                    self.out.push(' ');
                }
                self.out.push_str("-->");
            }
            NodeKind::Directive(value) => {
                self.out.push_str("<!");
                self.out.push_str(value);
                self.out.push('>');
            }
            NodeKind::ProcessingInstruction { target, value } => {
                self.out.push_str("<?");
                self.out.push_str(target);
                if !value.is_empty() {
                    self.out.push(' ');
                    self.out.push_str(value);
                }
                self.out.push_str("?>");
            }
        }
    }

    fn write_children(&mut self, node: Node<'_>, depth: usize, inline: bool) {
        // mixed content is written as-is so text keeps its exact value
        let inline = inline || has_text_child(node);
        for child in node.children() {
            self.write_node(child, depth, inline);
        }
    }

    fn write_name(&mut self, name: &QualifiedName) {
        if !name.space.is_empty() {
            self.out.push_str(&name.space);
            self.out.push(':');
        }
        self.out.push_str(&name.local);
    }

    fn write_attribute(&mut self, attr: &Attribute) {
        self.out.push(' ');
        self.write_name(&attr.name);
        self.out.push_str("=\"");
        escape_attribute(&mut self.out, &attr.value);
        self.out.push('"');
    }

    fn break_line(&mut self, depth: usize) {
        if !self.options.is_indented() {
            return;
        }
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        for _ in 0..depth {
            self.out.push_str(&self.options.indent);
        }
    }
}

fn has_text_child(node: Node<'_>) -> bool {
    node.children().any(|c| c.node_type() == NodeType::Text)
}

/// Escape character data
pub fn escape_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(ch),
        }
    }
}

/// Escape a double-quoted attribute value
pub fn escape_attribute(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str("&#xA;"),
            '\t' => out.push_str("&#x9;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(ch),
        }
    }
}

/// Serialize a whole tree without a declaration
pub fn serialize(tree: &Tree, options: &SaveOptions) -> String {
    tree.root().to_xml(options)
}

impl Node<'_> {
    /// Serialize this subtree
    pub fn to_xml(&self, options: &SaveOptions) -> String {
        let mut serializer = Serializer::new(options);
        serializer.node(*self);
        serializer.finish()
    }
}

impl fmt::Display for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml(&SaveOptions::default()))
    }
}
