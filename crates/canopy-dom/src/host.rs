/*
 * host.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The tree surface the template engine consumes.

use crate::error::Result;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of one tree instance.
///
/// Node handles are only meaningful within the tree that issued them; two
/// trees may well hand out equal handles. Anything that remembers nodes
/// across trees keys them by `(TreeId, node)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeId(u64);

impl TreeId {
    /// An identity distinct from every other one issued in this process.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        TreeId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Operations the template engine needs from the tree it renders into.
///
/// Queries on nodes the host does not know return `None` or an empty list.
/// Mutations on such nodes fail with [`DomError::UnknownNode`](crate::DomError).
/// The engine never recovers from host errors; it propagates them.
pub trait HostTree {
    /// Handle to a node. Handles are cheap to copy and stable for the
    /// lifetime of the node.
    type Node: Copy + Eq + Hash + Debug;

    /// Identity of this tree. Stable for the tree's lifetime and distinct
    /// from every other live tree, copies included.
    fn tree_id(&self) -> TreeId;

    /// Create a detached element. Fails if `tag` is not a valid tag name.
    fn create_element(&mut self, tag: &str) -> Result<Self::Node>;

    /// Create a detached text node.
    fn create_text(&mut self, text: &str) -> Result<Self::Node>;

    /// Tag name of an element, or `None` for text and container nodes.
    fn tag_name(&self, node: Self::Node) -> Option<&str>;

    /// Content of a text node, or `None` for anything else.
    fn text(&self, node: Self::Node) -> Option<&str>;

    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;

    fn has_attribute(&self, node: Self::Node, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    fn set_attribute(&mut self, node: Self::Node, name: &str, value: &str) -> Result<()>;

    fn remove_attribute(&mut self, node: Self::Node, name: &str) -> Result<()>;

    /// All attributes of an element, in document order.
    fn attributes(&self, node: Self::Node) -> Vec<(String, String)>;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    fn previous_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    /// Direct children, text nodes included.
    fn child_nodes(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Direct children that are elements.
    fn child_elements(&self, node: Self::Node) -> Vec<Self::Node> {
        self.child_nodes(node)
            .into_iter()
            .filter(|child| self.tag_name(*child).is_some())
            .collect()
    }

    /// Direct text content: every direct text child, trimmed, concatenated.
    ///
    /// Text inside child elements is not included.
    fn direct_text(&self, node: Self::Node) -> String {
        self.child_nodes(node)
            .into_iter()
            .filter_map(|child| self.text(child))
            .map(str::trim)
            .collect()
    }

    /// Replace every direct text child with a single text node holding
    /// `text`. The new node takes the place of the first direct text child,
    /// or goes first when there was none. An empty `text` just removes the
    /// direct text children.
    fn set_direct_text(&mut self, node: Self::Node, text: &str) -> Result<()>;

    fn append_child(&mut self, parent: Self::Node, child: Self::Node) -> Result<()>;

    /// Insert `child` into `parent` immediately before `reference`, which
    /// must be a child of `parent`.
    fn insert_before(
        &mut self,
        parent: Self::Node,
        child: Self::Node,
        reference: Self::Node,
    ) -> Result<()>;

    /// Detach and destroy `node` and its subtree.
    fn remove(&mut self, node: Self::Node) -> Result<()>;

    /// Read a value from the node's data bag.
    fn data(&self, node: Self::Node, key: &str) -> Option<&str>;

    /// Write a value into the node's data bag. The bag is private to the host
    /// and never shows up as markup.
    fn set_data(&mut self, node: Self::Node, key: &str, value: &str) -> Result<()>;
}

/// Check whether `name` is acceptable as an element tag.
///
/// A tag starts with an ASCII letter and continues with ASCII alphanumerics,
/// `-`, `_`, `.` or `:`.
pub fn is_valid_tag_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
}

/// Check whether `name` is acceptable as an attribute name.
pub fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '<' | '>' | '/' | '='))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_ids_are_unique() {
        let a = TreeId::next();
        let b = TreeId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_valid_tag_names() {
        assert!(is_valid_tag_name("div"));
        assert!(is_valid_tag_name("recursive-template"));
        assert!(is_valid_tag_name("h1"));
        assert!(is_valid_tag_name("svg:rect"));
    }

    #[test]
    fn test_invalid_tag_names() {
        assert!(!is_valid_tag_name(""));
        assert!(!is_valid_tag_name("1div"));
        assert!(!is_valid_tag_name("my div"));
        assert!(!is_valid_tag_name("<div>"));
        assert!(!is_valid_tag_name("-x"));
    }

    #[test]
    fn test_attribute_names() {
        assert!(is_valid_attribute_name("of"));
        assert!(is_valid_attribute_name("data-action"));
        assert!(is_valid_attribute_name("@click"));
        assert!(!is_valid_attribute_name(""));
        assert!(!is_valid_attribute_name("a b"));
        assert!(!is_valid_attribute_name("a=b"));
    }
}
