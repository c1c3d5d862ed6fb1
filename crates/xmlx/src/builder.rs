//! Tree construction from a token stream

use tracing::{trace, warn};

use crate::error::Result;
use crate::name::{Attribute, QualifiedName};
use crate::namespace::NamespaceTable;
use crate::token::Token;
use crate::tokenizer::Tokenizer;
use crate::tree::{NodeId, NodeKind, Tree};

const STANDALONE_MARKER: &str = "standalone=\"";

/// Everything a successful build produces
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Built {
    pub tree: Tree,
    /// The seed table plus every namespace declared in the input
    pub namespaces: NamespaceTable,
    /// `standalone` value from the XML declaration, when present
    pub standalone: Option<String>,
}

/// Builds a [`Tree`] from tokens, rewriting namespace URIs to aliases
#[derive(Debug)]
pub struct TreeBuilder {
    tree: Tree,
    namespaces: NamespaceTable,
    standalone: Option<String>,
    current: NodeId,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new(NamespaceTable::new())
    }
}

impl TreeBuilder {
    /// Start from an empty root, resolving names through `namespaces`
    pub fn new(namespaces: NamespaceTable) -> Self {
        Self {
            tree: Tree::new(),
            namespaces,
            standalone: None,
            current: NodeId::ROOT,
        }
    }

    /// Consume the tokenizer until end of input or an end tag at the root
    pub fn build(mut self, tokenizer: &mut Tokenizer<'_>) -> Result<Built> {
        while let Some(token) = tokenizer.next_token()? {
            if !self.push(token) {
                warn!(pos = %tokenizer.position(), "end tag without open element, stopping");
                return Ok(self.finish());
            }
        }
        if self.current != NodeId::ROOT {
            warn!(open = tokenizer.depth(), "input ended inside open elements");
        }
        Ok(self.finish())
    }

    /// Apply one token. Returns false once an end tag is seen at the root.
    pub fn push(&mut self, token: Token) -> bool {
        trace!(token = token.name(), "push");
        match token {
            Token::CharData(text) => {
                self.append(NodeKind::Text(text));
            }
            Token::Comment(text) => {
                self.append(NodeKind::Comment(text.trim().to_string()));
            }
            Token::Directive(text) => {
                self.append(NodeKind::Directive(text.trim().to_string()));
            }
            Token::StartElement { name, attributes } => self.start_element(name, attributes),
            Token::EndElement { .. } => {
                let parent = self
                    .tree
                    .data(self.current)
                    .and_then(|data| data.parent);
                match parent {
                    Some(parent) => self.current = parent,
                    None => return false,
                }
            }
            Token::ProcInst { target, content } if target == "xml" => {
                self.read_declaration(&content);
            }
            Token::ProcInst { target, content } => {
                self.append(NodeKind::ProcessingInstruction {
                    target: target.trim().to_string(),
                    value: content.trim().to_string(),
                });
            }
        }
        true
    }

    pub fn finish(self) -> Built {
        Built {
            tree: self.tree,
            namespaces: self.namespaces,
            standalone: self.standalone,
        }
    }

    fn append(&mut self, kind: NodeKind) -> Option<NodeId> {
        self.tree.append(self.current, kind)
    }

    fn start_element(&mut self, mut name: QualifiedName, mut attributes: Vec<Attribute>) {
        for attr in &attributes {
            if attr.name.space.is_empty() && attr.name.local == "xmlns" {
                trace!(uri = %attr.value, "default namespace");
                self.namespaces.register(attr.value.clone(), "");
            } else if attr.name.space == "xmlns" {
                trace!(uri = %attr.value, alias = %attr.name.local, "namespace alias");
                self.namespaces
                    .register(attr.value.clone(), attr.name.local.clone());
            }
        }
        for attr in &mut attributes {
            self.namespaces.resolve(&mut attr.name.space);
        }
        self.namespaces.resolve(&mut name.space);

        if let Some(id) = self.append(NodeKind::Element { name, attributes }) {
            self.current = id;
        }
    }

    fn read_declaration(&mut self, content: &str) {
        let content = content.trim();
        if let Some(i) = content.find(STANDALONE_MARKER) {
            let rest = &content[i + STANDALONE_MARKER.len()..];
            let end = rest.find('"').unwrap_or(rest.len());
            self.standalone = Some(rest[..end].to_string());
        }
    }
}
