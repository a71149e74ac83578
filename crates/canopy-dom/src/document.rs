/*
 * document.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Arena-backed in-memory tree.
//!
//! Nodes live in a slot vector and are addressed by [`NodeId`], which pairs a
//! slot index with a generation counter. Removing a node frees its slot for
//! reuse and bumps the generation, so stale ids held by callers are detected
//! instead of silently aliasing a newer node.

use crate::error::{DomError, Result};
use crate::host::{HostTree, TreeId, is_valid_attribute_name, is_valid_tag_name};
use std::collections::HashMap;
use std::fmt;

/// Handle to a node in a [`Document`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}v{})", self.index, self.generation)
    }
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    /// The document container. Exactly one per document, never removed.
    Root,
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    data: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<NodeData>,
}

/// An in-memory markup tree.
///
/// The document owns a root container whose children are the top-level
/// nodes. Unlike XML, several top-level elements are allowed, which makes a
/// document a convenient holder for template fragments.
///
/// Every document, clones included, has its own [`TreeId`].
#[derive(Debug)]
pub struct Document {
    id: TreeId,
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
}

impl Clone for Document {
    fn clone(&self) -> Self {
        Self {
            id: TreeId::next(),
            slots: self.slots.clone(),
            free: self.free.clone(),
            root: self.root,
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        let root = NodeData {
            kind: NodeKind::Root,
            parent: None,
            children: Vec::new(),
            data: HashMap::new(),
        };
        Self {
            id: TreeId::next(),
            slots: vec![Slot {
                generation: 0,
                node: Some(root),
            }],
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
        }
    }

    /// Parse markup into a new document.
    pub fn parse(markup: &str) -> Result<Self> {
        crate::parser::parse(markup)
    }

    /// The root container.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Whether `node` refers to a live node of this document.
    pub fn contains(&self, node: NodeId) -> bool {
        self.get(node).is_some()
    }

    /// Number of live nodes, the root included.
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    /// Serialize the whole document.
    pub fn to_markup(&self) -> String {
        self.serialize_children(self.root)
    }

    /// Find the first element (in document order) whose `id` attribute
    /// equals `id`.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if self.attribute(node, "id") == Some(id) {
                return Some(node);
            }
            if let Some(data) = self.get(node) {
                stack.extend(data.children.iter().rev().copied());
            }
        }
        None
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut NodeData> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or_else(|| DomError::unknown(id))
    }

    pub(crate) fn alloc(&mut self, kind: NodeKind) -> Result<NodeId> {
        let node = NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            data: HashMap::new(),
        };
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                Ok(NodeId {
                    index,
                    generation: slot.generation,
                })
            }
            None => {
                let index = slot_index(self.slots.len())?;
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                Ok(NodeId {
                    index,
                    generation: 0,
                })
            }
        }
    }

    /// Detach `node` from its parent, if it has one.
    fn detach(&mut self, node: NodeId) -> Result<()> {
        let parent = self.get_mut(node)?.parent.take();
        if let Some(parent) = parent {
            self.get_mut(parent)?.children.retain(|c| *c != node);
        }
        Ok(())
    }

    fn free_subtree(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let Some(slot) = self.slots.get_mut(id.index as usize) else {
                continue;
            };
            if slot.generation != id.generation {
                continue;
            }
            if let Some(data) = slot.node.take() {
                stack.extend(data.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
            }
        }
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.get(id).and_then(|d| d.parent);
        }
        false
    }

    /// Validate that `child` may be placed under `parent`, then detach it
    /// from wherever it currently lives.
    fn prepare_insert(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if !self.contains(parent) {
            return Err(DomError::unknown(parent));
        }
        if !self.contains(child) {
            return Err(DomError::unknown(child));
        }
        if child == self.root {
            return Err(DomError::invalid("the document root cannot be moved"));
        }
        if matches!(self.get(parent).map(|d| &d.kind), Some(NodeKind::Text(_))) {
            return Err(DomError::invalid("text nodes cannot have children"));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(DomError::invalid(
                "a node cannot be inserted into its own subtree",
            ));
        }
        self.detach(child)
    }
}

/// Index for a new slot at the end of a slot vector of length `len`.
fn slot_index(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| DomError::invalid("document has run out of node slots"))
}

impl HostTree for Document {
    type Node = NodeId;

    fn tree_id(&self) -> TreeId {
        self.id
    }

    fn create_element(&mut self, tag: &str) -> Result<NodeId> {
        if !is_valid_tag_name(tag) {
            return Err(DomError::InvalidTagName {
                name: tag.to_string(),
            });
        }
        self.alloc(NodeKind::Element {
            tag: tag.to_string(),
            attributes: Vec::new(),
        })
    }

    fn create_text(&mut self, text: &str) -> Result<NodeId> {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        match &self.get(node)?.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        match &self.get(node)?.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.get(node)?.kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        if !is_valid_attribute_name(name) {
            return Err(DomError::InvalidAttributeName {
                name: name.to_string(),
            });
        }
        match &mut self.get_mut(node)?.kind {
            NodeKind::Element { attributes, .. } => {
                match attributes.iter_mut().find(|(n, _)| n == name) {
                    Some((_, existing)) => *existing = value.to_string(),
                    None => attributes.push((name.to_string(), value.to_string())),
                }
                Ok(())
            }
            _ => Err(DomError::invalid("only elements carry attributes")),
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<()> {
        if let NodeKind::Element { attributes, .. } = &mut self.get_mut(node)?.kind {
            attributes.retain(|(n, _)| n != name);
        }
        Ok(())
    }

    fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        match self.get(node).map(|d| &d.kind) {
            Some(NodeKind::Element { attributes, .. }) => attributes.clone(),
            _ => Vec::new(),
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.parent
    }

    fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.get(self.get(node)?.parent?)?;
        let position = parent.children.iter().position(|c| *c == node)?;
        position
            .checked_sub(1)
            .map(|previous| parent.children[previous])
    }

    fn child_nodes(&self, node: NodeId) -> Vec<NodeId> {
        self.get(node)
            .map(|d| d.children.clone())
            .unwrap_or_default()
    }

    fn set_direct_text(&mut self, node: NodeId, text: &str) -> Result<()> {
        if !self.contains(node) {
            return Err(DomError::unknown(node));
        }
        let children = self.child_nodes(node);
        // Nothing before the first text child is text, so its index survives
        // the removals below.
        let position = children
            .iter()
            .position(|c| self.text(*c).is_some())
            .unwrap_or(0);
        for child in children {
            if self.text(child).is_some() {
                self.remove(child)?;
            }
        }
        if !text.is_empty() {
            let text_node = self.create_text(text)?;
            self.prepare_insert(node, text_node)?;
            self.get_mut(text_node)?.parent = Some(node);
            self.get_mut(node)?.children.insert(position, text_node);
        }
        Ok(())
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.prepare_insert(parent, child)?;
        self.get_mut(child)?.parent = Some(parent);
        self.get_mut(parent)?.children.push(child);
        Ok(())
    }

    fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> Result<()> {
        if child == reference {
            return Ok(());
        }
        if self.parent(reference) != Some(parent) {
            return Err(DomError::invalid(format!(
                "{:?} is not a child of {:?}",
                reference, parent
            )));
        }
        self.prepare_insert(parent, child)?;
        let siblings = &mut self.get_mut(parent)?.children;
        let position = siblings
            .iter()
            .position(|c| *c == reference)
            .ok_or_else(|| DomError::invalid("reference node vanished during insert"))?;
        siblings.insert(position, child);
        self.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn remove(&mut self, node: NodeId) -> Result<()> {
        if node == self.root {
            return Err(DomError::invalid("the document root cannot be removed"));
        }
        self.detach(node)?;
        self.free_subtree(node);
        Ok(())
    }

    fn data(&self, node: NodeId, key: &str) -> Option<&str> {
        self.get(node)?.data.get(key).map(String::as_str)
    }

    fn set_data(&mut self, node: NodeId, key: &str, value: &str) -> Result<()> {
        self.get_mut(node)?
            .data
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
