//! Document: the loaded tree plus its declaration metadata

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use tracing::{debug, info, instrument};

use crate::builder::TreeBuilder;
use crate::charset::{prepare_input, CharsetReader};
use crate::entities;
use crate::error::Result;
use crate::http::HttpClient;
use crate::namespace::NamespaceTable;
use crate::node::Node;
use crate::serializer::{SaveOptions, Serializer};
use crate::tokenizer::Tokenizer;
use crate::tree::Tree;

/// An XML document
///
/// Loading replaces the tree. The namespace table carries over between
/// loads and keeps growing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub version: String,
    pub encoding: String,
    pub standalone: String,
    /// Write the `<?xml ...?>` declaration when saving
    pub save_doctype: bool,
    /// Custom entities resolved while tokenizing, name without `&`/`;`
    pub entity: HashMap<String, String>,
    /// Namespace URI to alias
    pub namespaces: NamespaceTable,
    pub options: SaveOptions,
    tree: Tree,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            version: "1.0".to_string(),
            encoding: "UTF-8".to_string(),
            standalone: "yes".to_string(),
            save_doctype: true,
            entity: HashMap::new(),
            namespaces: NamespaceTable::new(),
            options: SaveOptions::default(),
            tree: Tree::new(),
        }
    }

    /// The synthetic root; its children are the top-level nodes
    pub fn root(&self) -> Node<'_> {
        self.tree.root()
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Add the HTML 4 named character entities to [`Document::entity`]
    pub fn load_extended_entity_map(&mut self) {
        entities::load_extended(&mut self.entity);
    }

    /// Read `reader` to the end and load it
    #[instrument(skip_all)]
    pub fn load_stream<R: Read>(
        &mut self,
        mut reader: R,
        charset: Option<&dyn CharsetReader>,
    ) -> Result<()> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        self.load_bytes(&buf, charset)
    }

    /// Load a document held in memory. On error the previous tree is kept.
    #[instrument(skip_all, fields(bytes = input.len()))]
    pub fn load_bytes(&mut self, input: &[u8], charset: Option<&dyn CharsetReader>) -> Result<()> {
        debug!("loading document");
        let prepared = prepare_input(input, charset)?;
        let mut tokenizer = Tokenizer::new(&prepared, &self.entity);
        let built = TreeBuilder::new(self.namespaces.clone()).build(&mut tokenizer)?;

        self.tree = built.tree;
        self.namespaces = built.namespaces;
        if let Some(standalone) = built.standalone {
            self.standalone = standalone;
        }
        debug!(
            nodes = self.tree.len(),
            namespaces = self.namespaces.len(),
            "document loaded"
        );
        Ok(())
    }

    /// Load UTF-8 text
    pub fn load_str(&mut self, input: &str) -> Result<()> {
        self.load_bytes(input.as_bytes(), None)
    }

    /// Load a file, decoding non UTF-8 input with the default charset reader
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let content = fs::read(path.as_ref())?;
        info!("file read, building tree");
        self.load_bytes(&content, default_charset())
    }

    /// Fetch `uri` over plain HTTP with a default [`HttpClient`] and load it
    pub fn load_uri(&mut self, uri: &str) -> Result<()> {
        self.load_uri_with(&HttpClient::default(), uri)
    }

    #[instrument(skip(self, client))]
    pub fn load_uri_with(&mut self, client: &HttpClient, uri: &str) -> Result<()> {
        let body = client.get(uri)?;
        info!(bytes = body.len(), "document fetched");
        self.load_bytes(&body, default_charset())
    }

    /// Serialize the whole document, declaration first when
    /// [`Document::save_doctype`] is set
    pub fn save_string(&self) -> String {
        let mut serializer = Serializer::new(&self.options);
        if self.save_doctype {
            serializer.declaration(&self.version, &self.encoding, &self.standalone);
        }
        serializer.node(self.root());
        serializer.finish()
    }

    pub fn save_bytes(&self) -> Vec<u8> {
        self.save_string().into_bytes()
    }

    #[instrument(skip_all)]
    pub fn save_stream<W: Write>(&self, mut writer: W) -> Result<()> {
        let bytes = self.save_bytes();
        debug!(bytes = bytes.len(), "writing document");
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the document to `path`, created with mode 0600 on Unix
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let file = options.open(path.as_ref())?;
        self.save_stream(file)
    }

    pub fn select_node(&self, space: &str, local: &str) -> Option<Node<'_>> {
        self.root().select_node(space, local)
    }

    pub fn select_nodes(&self, space: &str, local: &str) -> Vec<Node<'_>> {
        self.root().select_nodes(space, local)
    }

    pub fn select_nodes_recursive(&self, space: &str, local: &str) -> Vec<Node<'_>> {
        self.root().select_nodes_recursive(space, local)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.save_string())
    }
}

#[cfg(feature = "encoding")]
fn default_charset() -> Option<&'static dyn CharsetReader> {
    Some(&crate::charset::EncodingRs)
}

#[cfg(not(feature = "encoding"))]
fn default_charset() -> Option<&'static dyn CharsetReader> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_defaults() {
        let doc = Document::new();
        assert_eq!(doc.version, "1.0");
        assert_eq!(doc.encoding, "UTF-8");
        assert_eq!(doc.standalone, "yes");
        assert!(doc.save_doctype);
        assert!(doc.entity.is_empty());
        assert!(doc.namespaces.is_empty());
        assert!(doc.tree().is_empty());
    }

    #[test]
    fn test_failed_load_keeps_previous_tree() -> Result<()> {
        let mut doc = Document::new();
        doc.load_str("<a><b/></a>")?;
        let before = doc.tree().clone();

        let err = doc.load_str("<a><b></a>");
        assert!(err.is_err_and(|e| e.is_syntax()));
        assert_eq!(doc.tree(), &before);
        Ok(())
    }

    #[test]
    fn test_load_replaces_tree_and_keeps_namespaces() -> Result<()> {
        let mut doc = Document::new();
        doc.load_str(r#"<a xmlns:x="urn:x"/>"#)?;
        doc.load_str(r#"<b xmlns:y="urn:y"/>"#)?;
        assert!(doc.select_node("", "a").is_none());
        assert!(doc.select_node("", "b").is_some());
        assert_eq!(doc.namespaces.alias("urn:x"), Some("x"));
        assert_eq!(doc.namespaces.alias("urn:y"), Some("y"));
        Ok(())
    }

    #[test]
    fn test_standalone_read_from_declaration() -> Result<()> {
        let mut doc = Document::new();
        doc.load_str(r#"<?xml version="1.0" standalone="no"?><a/>"#)?;
        assert_eq!(doc.standalone, "no");
        assert_eq!(
            doc.save_string(),
            r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?><a/>"#
        );
        Ok(())
    }

    #[test]
    fn test_custom_entities() -> Result<()> {
        let mut doc = Document::new();
        doc.entity.insert("who".to_string(), "world".to_string());
        doc.load_str("<a>hello &who;</a>")?;
        assert_eq!(doc.select_node("", "a").map(|a| a.text()), Some("hello world".to_string()));

        let err = doc.load_str("<a>&nbsp;</a>");
        assert!(err.is_err());
        doc.load_extended_entity_map();
        doc.load_str("<a>&nbsp;</a>")?;
        assert_eq!(doc.select_node("", "a").map(|a| a.text()), Some("\u{a0}".to_string()));
        Ok(())
    }

    #[test]
    fn test_charset_hook_is_used() -> Result<()> {
        let upper = |_: &str, input: &[u8]| -> Result<String> {
            Ok(String::from_utf8_lossy(input).to_uppercase())
        };
        let mut doc = Document::new();
        doc.load_bytes(
            br#"<?xml version="1.0" encoding="shout"?><a>hi</a>"#,
            Some(&upper),
        )?;
        assert_eq!(doc.select_node("", "A").map(|a| a.text()), Some("HI".to_string()));

        let err = doc.load_bytes(br#"<?xml version="1.0" encoding="shout"?><a/>"#, None);
        assert!(matches!(err, Err(Error::Charset { .. })));
        Ok(())
    }

    #[test]
    fn test_load_stream_and_save_stream() -> Result<()> {
        let mut doc = Document::new();
        doc.save_doctype = false;
        doc.load_stream("<a>x</a>".as_bytes(), None)?;

        let mut out = Vec::new();
        doc.save_stream(&mut out)?;
        assert_eq!(out, b"<a>x</a>");
        assert_eq!(doc.to_string(), "<a>x</a>");
        Ok(())
    }

    #[test]
    fn test_document_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Document>();
    }
}
