//! Node type definitions.
//!
//! `NodeKind` carries the per-kind payload. Sibling-list links live in
//! `NodeData`, not here.

use super::rbtree::RbTree;
use super::{AttrId, NodeId};

/// The kind of a node and its associated data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An element, e.g. `<item id="1">`.
    Element {
        /// The tag name.
        name: String,
        /// Header node of the child list.
        children: NodeId,
        /// Attributes indexed by key.
        attributes: RbTree<AttrId>,
    },

    /// Character data between markup, stored verbatim.
    Text {
        content: String,
    },

    /// A comment, without the `<!--` and `-->` delimiters.
    Comment {
        content: String,
    },

    /// Sentinel header of an element's child list. Never a child itself.
    ListHead,
}

impl NodeKind {
    /// Returns `true` for [`NodeKind::Element`].
    #[must_use]
    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element { .. })
    }
}
