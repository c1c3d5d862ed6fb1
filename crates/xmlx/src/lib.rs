//! xmlx: a small XML document object model
//!
//! Loads XML into an owned node tree, answers qualified-name queries over
//! it and writes it back out as XML text.
//!
//! Element and attribute names are stored with their namespace URI already
//! rewritten to the alias the document declared for it, so lookups use the
//! short prefix the author wrote (`select_node("s", "Body")`).
//!
//! # Examples
//! ```
//! use xmlx::{Document, Result};
//!
//! fn example() -> Result<()> {
//!     let mut doc = Document::new();
//!     doc.load_str(r#"<feed xmlns:m="urn:media"><m:item id="1"/></feed>"#)?;
//!
//!     let item = doc
//!         .select_node("", "feed")
//!         .and_then(|feed| feed.select_node("m", "item"));
//!     assert_eq!(item.and_then(|i| i.attribute("", "id")), Some("1"));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

#![forbid(unsafe_code)]

pub mod builder;
pub mod charset;
mod cursor;
pub mod document;
pub mod entities;
pub mod error;
pub mod http;
pub mod name;
pub mod namespace;
pub mod node;
mod query;
pub mod serializer;
pub mod token;
pub mod tokenizer;
pub mod tree;

// Re-exports
pub use builder::{Built, TreeBuilder};
#[cfg(feature = "encoding")]
pub use charset::EncodingRs;
pub use charset::CharsetReader;
pub use document::Document;
pub use error::{Error, Pos, Result};
pub use http::HttpClient;
pub use name::{Attribute, QualifiedName};
pub use namespace::NamespaceTable;
pub use node::Node;
pub use serializer::{serialize, SaveOptions, Serializer};
pub use token::Token;
pub use tokenizer::Tokenizer;
pub use tree::{NodeData, NodeId, NodeKind, NodeType, Tree};
