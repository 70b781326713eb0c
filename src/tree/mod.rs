//! Arena-based document tree.
//!
//! All nodes live in one `Vec` owned by the `Document` and are referenced by
//! `NodeId`; attributes live in a second `Vec` referenced by `AttrId`. Both
//! ids are newtypes over `NonZeroU32`, so `Option<NodeId>` costs nothing
//! extra.
//!
//! # Architecture
//!
//! An element's children form a circular sibling list ([`list`]) whose
//! sentinel header is itself a node of kind [`NodeKind::ListHead`]. Its
//! attributes form a red-black tree ([`rbtree`]) keyed by attribute name.
//! Both structures store their links inside the arena entries, so moving a
//! whole child list or attribute index to another element is O(1).
//!
//! The persistent root element and its list header occupy the first two
//! arena slots of every document, so the root's `NodeId` never changes when
//! a document is reloaded. Dropping the `Document` frees everything.

pub mod list;
mod node;
pub mod rbtree;

pub use node::NodeKind;

use std::num::NonZeroU32;
use std::path::Path;

use crate::error::ParseError;
use crate::parser::ParseOptions;

use list::{Link, ListArena};
use rbtree::{RbLinks, RbTree, TreeArena};

/// A typed index into the document's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Creates a `NodeId` for arena slot `index`.
    ///
    /// # Panics
    ///
    /// Panics if the arena has grown past `u32::MAX - 1` entries.
    #[allow(clippy::expect_used)]
    fn from_index(index: usize) -> Self {
        let raw = u32::try_from(index + 1).expect("node arena exceeds u32 range");
        Self(NonZeroU32::new(raw).expect("index + 1 is non-zero"))
    }

    fn as_index(self) -> usize {
        self.0.get() as usize - 1
    }

    /// Converts this `NodeId` to a raw `u32`. The value is never zero.
    #[must_use]
    pub fn into_raw(self) -> u32 {
        self.0.get()
    }

    /// Creates a `NodeId` from a raw `u32`, if non-zero.
    #[must_use]
    pub fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }
}

/// A typed index into the document's attribute arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct AttrId(NonZeroU32);

impl AttrId {
    #[allow(clippy::expect_used)]
    fn from_index(index: usize) -> Self {
        let raw = u32::try_from(index + 1).expect("attribute arena exceeds u32 range");
        Self(NonZeroU32::new(raw).expect("index + 1 is non-zero"))
    }

    fn as_index(self) -> usize {
        self.0.get() as usize - 1
    }
}

/// Arena slot of the persistent root element.
const ROOT_SLOT: usize = 0;

/// Storage for a single node in the document arena.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// What kind of node this is and its payload.
    pub kind: NodeKind,
    /// Position in the parent's child list. Self-referential when the node
    /// is in no list.
    link: Link<NodeId>,
}

/// A key/value attribute owned by one element.
///
/// Fields are read-only: the key orders the element's attribute index.
#[derive(Debug, Clone)]
pub struct Attribute {
    key: String,
    value: String,
    links: RbLinks<AttrId>,
}

impl Attribute {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

#[derive(Debug, Default)]
struct NodeArena(Vec<NodeData>);

impl NodeArena {
    fn get(&self, id: NodeId) -> &NodeData {
        &self.0[id.as_index()]
    }

    fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.0[id.as_index()]
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::from_index(self.0.len());
        self.0.push(NodeData {
            kind,
            link: Link::unlinked(id),
        });
        id
    }
}

impl ListArena for NodeArena {
    type Id = NodeId;

    fn link(&self, id: NodeId) -> &Link<NodeId> {
        &self.get(id).link
    }

    fn link_mut(&mut self, id: NodeId) -> &mut Link<NodeId> {
        &mut self.get_mut(id).link
    }
}

#[derive(Debug, Default)]
struct AttrArena(Vec<Attribute>);

impl TreeArena for AttrArena {
    type Id = AttrId;
    type Key = str;

    fn links(&self, id: AttrId) -> &RbLinks<AttrId> {
        &self.0[id.as_index()].links
    }

    fn links_mut(&mut self, id: AttrId) -> &mut RbLinks<AttrId> {
        &mut self.0[id.as_index()].links
    }

    fn key(&self, id: AttrId) -> &str {
        &self.0[id.as_index()].key
    }
}

/// An XML document: a persistent root element plus the last load outcome.
///
/// All tree operations go through `&Document` (navigation) or
/// `&mut Document` (construction), addressing nodes by [`NodeId`].
///
/// # Examples
///
/// ```
/// use xdoc::Document;
///
/// let doc = Document::parse_str(r#"<config version="2"><entry/></config>"#).unwrap();
/// let root = doc.root().unwrap();
/// assert_eq!(doc.name(root), Some("config"));
/// assert_eq!(doc.attribute_value(root, "version"), Some("2"));
/// assert!(doc.first_child_element(root).is_some());
/// ```
#[derive(Debug)]
pub struct Document {
    nodes: NodeArena,
    attrs: AttrArena,
    /// Set once a root element has been installed.
    root: Option<NodeId>,
    /// Outcome of the last `load`; `None` means no error.
    error: Option<ParseError>,
}

impl Document {
    /// Creates an empty document with no root element.
    #[must_use]
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: NodeArena(Vec::with_capacity(64)),
            attrs: AttrArena::default(),
            root: None,
            error: None,
        };
        let slot = doc.create_element(String::new());
        debug_assert_eq!(slot.as_index(), ROOT_SLOT);
        doc
    }

    /// Parses a byte buffer into a new `Document` with default options.
    ///
    /// The bytes are scanned as-is; byte-order marks are only handled by
    /// [`load`](Document::load).
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the input is not a well-formed element.
    pub fn parse_bytes(input: &[u8]) -> Result<Self, ParseError> {
        crate::parser::parse_bytes(input)
    }

    /// Parses a byte buffer into a new `Document` with the given options.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the input is not a well-formed element.
    pub fn parse_bytes_with_options(
        input: &[u8],
        options: &ParseOptions,
    ) -> Result<Self, ParseError> {
        crate::parser::parse_bytes_with_options(input, options)
    }

    /// Parses a string into a new `Document` with default options.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the input is not a well-formed element.
    pub fn parse_str(input: &str) -> Result<Self, ParseError> {
        Self::parse_bytes(input.as_bytes())
    }

    /// Creates a document from the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the file cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let mut doc = Self::new();
        doc.load(path)?;
        Ok(doc)
    }

    /// Replaces this document's contents with the file at `path`, using
    /// default options.
    ///
    /// # Errors
    ///
    /// See [`load_with_options`](Document::load_with_options).
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), ParseError> {
        self.load_with_options(path, &ParseOptions::default())
    }

    /// Replaces this document's contents with the file at `path`.
    ///
    /// The whole file is read into memory, a byte-order mark is handled, and
    /// the bytes are parsed into a staging tree. Only on success does the
    /// staged tree replace the current one; the root element keeps its
    /// `NodeId`. On failure the current tree is left untouched. Either way
    /// the outcome is recorded for [`error`](Document::error).
    ///
    /// # Errors
    ///
    /// Returns `ParseError` with kind `BadFile`, `EmptyFile` or
    /// `MemoryAllocation` if the file cannot be loaded, or
    /// `IncompleteDocument`/`Parse` if its contents are malformed.
    pub fn load_with_options(
        &mut self,
        path: impl AsRef<Path>,
        options: &ParseOptions,
    ) -> Result<(), ParseError> {
        let path = path.as_ref();
        let staged = crate::encoding::read_file(path).and_then(|bytes| {
            let utf8 = crate::encoding::decode_to_utf8(&bytes)?;
            crate::parser::parse_bytes_with_options(&utf8, options)
        });
        match staged {
            Ok(doc) => {
                self.nodes = doc.nodes;
                self.attrs = doc.attrs;
                self.root = doc.root;
                self.error = None;
                Ok(())
            }
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "load failed");
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Returns the error recorded by the last load, or `None` if it succeeded
    /// (or no load has happened).
    #[must_use]
    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    /// Returns the message of the last load error, or an empty string.
    #[must_use]
    pub fn error_text(&self) -> String {
        self.error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    /// Returns the root element, or `None` before a root has been installed.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Installs `element` as the document's root by moving its name, child
    /// list and attribute index into the persistent root element.
    ///
    /// `element` is left as an empty, nameless element. The root's `NodeId`
    /// does not change. Anything the root held before becomes unreachable
    /// but stays allocated until the document is dropped.
    ///
    /// # Panics
    ///
    /// Panics if `element` is not an element.
    pub fn set_root(&mut self, element: NodeId) {
        let root = NodeId::from_index(ROOT_SLOT);
        self.root = Some(root);
        if element == root {
            return;
        }

        let NodeKind::Element {
            name,
            children,
            attributes,
        } = &mut self.nodes.get_mut(element).kind
        else {
            panic!("set_root: node {element:?} is not an element");
        };
        let name = std::mem::take(name);
        let src_children = *children;
        let mut moved = RbTree::new();
        moved.move_all(attributes);

        let dst_children = self.children_header(root);
        if let NodeKind::Element {
            name: root_name,
            attributes: root_attributes,
            ..
        } = &mut self.nodes.get_mut(root).kind
        {
            *root_name = name;
            root_attributes.move_all(&mut moved);
        }
        list::move_all(&mut self.nodes, dst_children, src_children);
    }

    /// Returns a reference to the `NodeData` for the given node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this document.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        self.nodes.get(id)
    }

    /// Returns `true` if `id` is an element.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.node(id).kind.is_element()
    }

    /// Returns the tag name of an element, or `None` for other nodes.
    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Sets the tag name of an element.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not an element.
    pub fn set_name(&mut self, id: NodeId, new_name: impl Into<String>) {
        match &mut self.nodes.get_mut(id).kind {
            NodeKind::Element { name, .. } => *name = new_name.into(),
            _ => panic!("set_name: node {id:?} is not an element"),
        }
    }

    /// Returns the content of a text or comment node.
    #[must_use]
    pub fn node_text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text { content } | NodeKind::Comment { content } => Some(content),
            _ => None,
        }
    }

    /// Replaces the content of a text or comment node.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a text or comment node.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        match &mut self.nodes.get_mut(id).kind {
            NodeKind::Text { content } | NodeKind::Comment { content } => *content = text.into(),
            _ => panic!("set_text: node {id:?} is not a text or comment node"),
        }
    }

    /// Returns the concatenated text of all descendant text nodes.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut result = String::new();
        if let NodeKind::Text { content } = &self.node(id).kind {
            result.push_str(content);
        }
        for node in self.descendants(id) {
            if let NodeKind::Text { content } = &self.node(node).kind {
                result.push_str(content);
            }
        }
        result
    }

    // --- Construction ---

    /// Allocates a detached element with its own empty child list.
    pub fn create_element(&mut self, name: impl Into<String>) -> NodeId {
        let header = NodeId::from_index(self.nodes.0.len() + 1);
        let id = self.nodes.push(NodeKind::Element {
            name: name.into(),
            children: header,
            attributes: RbTree::new(),
        });
        let pushed = self.nodes.push(NodeKind::ListHead);
        debug_assert_eq!(pushed, header);
        id
    }

    /// Appends a new element named `name` to `parent`'s children.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not an element.
    pub fn add_child_element(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        let header = self.children_header(parent);
        let child = self.create_element(name);
        list::append(&mut self.nodes, header, child);
        child
    }

    /// Appends a new text node to `parent`'s children.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not an element.
    pub fn add_child_text(&mut self, parent: NodeId, content: impl Into<String>) -> NodeId {
        self.append_leaf(
            parent,
            NodeKind::Text {
                content: content.into(),
            },
        )
    }

    /// Appends a new comment node to `parent`'s children.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not an element.
    pub fn add_child_comment(&mut self, parent: NodeId, content: impl Into<String>) -> NodeId {
        self.append_leaf(
            parent,
            NodeKind::Comment {
                content: content.into(),
            },
        )
    }

    fn append_leaf(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let header = self.children_header(parent);
        let child = self.nodes.push(kind);
        list::append(&mut self.nodes, header, child);
        child
    }

    fn children_header(&self, id: NodeId) -> NodeId {
        match &self.node(id).kind {
            NodeKind::Element { children, .. } => *children,
            _ => panic!("node {id:?} is not an element and cannot have children"),
        }
    }

    // --- Attributes ---

    /// Adds an attribute with an empty value to `element`.
    ///
    /// Returns `Ok(id)` for the new attribute, or `Err(existing)` if the
    /// element already has an attribute with this key; the existing
    /// attribute and its value are kept.
    ///
    /// # Errors
    ///
    /// Returns the id of the existing attribute on a duplicate key.
    ///
    /// # Panics
    ///
    /// Panics if `element` is not an element.
    pub fn add_attribute(
        &mut self,
        element: NodeId,
        key: impl Into<String>,
    ) -> Result<AttrId, AttrId> {
        let NodeKind::Element { attributes, .. } = &mut self.nodes.get_mut(element).kind else {
            panic!("add_attribute: node {element:?} is not an element");
        };
        let attr = AttrId::from_index(self.attrs.0.len());
        self.attrs.0.push(Attribute {
            key: key.into(),
            value: String::new(),
            links: RbLinks::default(),
        });
        match attributes.insert(&mut self.attrs, attr) {
            Ok(()) => Ok(attr),
            Err(existing) => {
                tracing::debug!(key = self.attrs.key(attr), "duplicate attribute ignored");
                self.attrs.0.pop();
                Err(existing)
            }
        }
    }

    /// Sets the value of an attribute.
    pub fn set_attribute_value(&mut self, attr: AttrId, value: impl Into<String>) {
        self.attrs.0[attr.as_index()].value = value.into();
    }

    /// Returns the attribute with the given id.
    #[must_use]
    pub fn attribute(&self, attr: AttrId) -> &Attribute {
        &self.attrs.0[attr.as_index()]
    }

    /// Looks up an attribute of `element` by key.
    ///
    /// Returns `None` for non-elements and for keys that are not present.
    #[must_use]
    pub fn find_attribute(&self, element: NodeId, key: &str) -> Option<AttrId> {
        match &self.node(element).kind {
            NodeKind::Element { attributes, .. } => attributes.find(&self.attrs, key),
            _ => None,
        }
    }

    /// Returns the value of `element`'s attribute `key`, if present.
    #[must_use]
    pub fn attribute_value(&self, element: NodeId, key: &str) -> Option<&str> {
        self.find_attribute(element, key)
            .map(|attr| self.attribute(attr).value())
    }

    /// Returns an iterator over `element`'s attributes in key order.
    ///
    /// Non-elements yield nothing.
    pub fn attributes(&self, element: NodeId) -> Attributes<'_> {
        let tree = match &self.node(element).kind {
            NodeKind::Element { attributes, .. } => *attributes,
            _ => RbTree::new(),
        };
        Attributes {
            doc: self,
            inner: tree.iter(&self.attrs),
        }
    }

    /// Verifies the red-black invariants of `element`'s attribute index and
    /// returns its black height.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violated invariant.
    pub fn verify_attribute_index(&self, element: NodeId) -> Result<usize, String> {
        match &self.node(element).kind {
            NodeKind::Element { attributes, .. } => attributes.check_invariants(&self.attrs),
            _ => Ok(1),
        }
    }

    // --- Navigation ---

    /// Returns an iterator over all children of a node, in document order.
    ///
    /// Non-elements have no children.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        let inner = match &self.node(id).kind {
            NodeKind::Element { children, .. } => Some(list::iter(&self.nodes, *children)),
            _ => None,
        };
        Children { inner }
    }

    /// Returns an iterator over the element children of a node.
    pub fn child_elements(&self, id: NodeId) -> ChildElements<'_> {
        ChildElements {
            doc: self,
            next: self.first_child_element(id),
        }
    }

    /// Returns the first child of `id` that is an element.
    #[must_use]
    pub fn first_child_element(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).find(|&child| self.is_element(child))
    }

    /// Returns the last child of `id` that is an element.
    #[must_use]
    pub fn last_child_element(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).rev().find(|&child| self.is_element(child))
    }

    /// Returns the next sibling of `id` that is an element.
    #[must_use]
    pub fn next_sibling_element(&self, id: NodeId) -> Option<NodeId> {
        self.scan_siblings(id, |link| link.next, NodeKind::is_element)
    }

    /// Returns the previous sibling of `id` that is an element.
    #[must_use]
    pub fn prev_sibling_element(&self, id: NodeId) -> Option<NodeId> {
        self.scan_siblings(id, |link| link.prev, NodeKind::is_element)
    }

    /// Returns the node after `id` in its parent's child list, of any kind.
    ///
    /// Returns `None` for the last child and for detached nodes.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.scan_siblings(id, |link| link.next, |_| true)
    }

    /// Returns the node before `id` in its parent's child list, of any kind.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.scan_siblings(id, |link| link.prev, |_| true)
    }

    /// Walks the sibling list from `id` until a node `accept`s or the list
    /// header is reached.
    fn scan_siblings(
        &self,
        id: NodeId,
        step: impl Fn(&Link<NodeId>) -> NodeId,
        accept: impl Fn(&NodeKind) -> bool,
    ) -> Option<NodeId> {
        if list::is_unlinked(&self.nodes, id) {
            return None;
        }
        let mut current = step(self.nodes.link(id));
        loop {
            let kind = &self.node(current).kind;
            if matches!(kind, NodeKind::ListHead) {
                return None;
            }
            if accept(kind) {
                return Some(current);
            }
            current = step(self.nodes.link(current));
        }
    }

    /// Returns an iterator over all descendants of a node, depth-first in
    /// document order. The node itself is not included.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: vec![self.children(id)],
        }
    }

    /// Returns the number of allocated arena slots, including list headers.
    ///
    /// Slots are never reclaimed while the document lives: an element
    /// emptied by [`set_root`](Self::set_root) keeps its slot, as do the
    /// contents a programmatic `set_root` replaces. Reloading starts from
    /// a fresh arena.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.0.len()
    }

    /// Returns the number of attributes allocated in this document.
    #[must_use]
    pub fn attribute_count(&self) -> usize {
        self.attrs.0.len()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// --- Iterators ---

/// Iterator over the children of a node.
pub struct Children<'a> {
    inner: Option<list::Iter<'a, NodeArena>>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.as_mut()?.next()
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.as_mut()?.next_back()
    }
}

/// Iterator over the element children of a node.
pub struct ChildElements<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for ChildElements<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.next_sibling_element(current);
        Some(current)
    }
}

/// Depth-first iterator over all descendants of a node.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<Children<'a>>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            if let Some(node) = top.next() {
                if self.doc.is_element(node) {
                    self.stack.push(self.doc.children(node));
                }
                return Some(node);
            }
            self.stack.pop();
        }
    }
}

/// Iterator over an element's attributes in key order.
pub struct Attributes<'a> {
    doc: &'a Document,
    inner: rbtree::Iter<'a, AttrArena>,
}

impl<'a> Iterator for Attributes<'a> {
    type Item = &'a Attribute;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|attr| self.doc.attribute(attr))
    }
}
