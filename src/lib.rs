//! # xdoc
//!
//! A minimal XML document library. A single-pass recursive descent parser
//! reads one root element (attributes, nested elements, comments and text)
//! into an arena-backed tree with ordered children and a key-ordered
//! attribute index.
//!
//! ## Quick Start
//!
//! ```
//! use xdoc::Document;
//!
//! let doc = Document::parse_str(r#"<root id="7"><child>Hello</child></root>"#).unwrap();
//! let root = doc.root().unwrap();
//! assert_eq!(doc.name(root), Some("root"));
//! assert_eq!(doc.attribute_value(root, "id"), Some("7"));
//!
//! let child = doc.first_child_element(root).unwrap();
//! assert_eq!(doc.text_content(child), "Hello");
//! ```
//!
//! Not supported: entity references, CDATA sections, namespaces, DTDs,
//! the XML declaration, and serialization.

pub mod encoding;
pub mod error;
pub mod parser;
pub mod tree;

// Re-export primary types at the crate root for convenience.
pub use error::{ErrorKind, ParseError};
pub use parser::ParseOptions;
pub use tree::{AttrId, Attribute, Document, NodeId, NodeKind};
