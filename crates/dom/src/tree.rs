//! A minimal DOM tree mirror for range bookkeeping.
//!
//! The mirror applies `DOMUpdate` batches and keeps parent/child order, text
//! data, and element tag/attributes. Each applied update reports the
//! `TreeMutation` records that live ranges use to adjust their boundaries.

use crate::{BoundaryPoint, DOMSubscriber, DOMUpdate, DocumentId, NodeKey, TreeMutation, TreeOrder};
use anyhow::{Result, anyhow, bail};
use core::cmp::Ordering;
use log::trace;
use std::collections::HashMap;

/// What a mirrored node is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element {
        /// Tag name, ASCII lowercase.
        tag: String,
        /// Attributes in insertion order.
        attributes: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Clone, Debug)]
struct NodeData {
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
    kind: NodeKind,
}

/// Tree mirror for one document, rooted at [`NodeKey::ROOT`].
#[derive(Clone, Debug)]
pub struct DomTree {
    document: DocumentId,
    nodes: HashMap<NodeKey, NodeData>,
}

impl DomTree {
    /// Create an empty tree holding only the document node.
    pub fn new(document: DocumentId) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            NodeKey::ROOT,
            NodeData {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            },
        );
        Self { document, nodes }
    }

    #[inline]
    pub const fn document(&self) -> DocumentId {
        self.document
    }

    #[inline]
    pub fn contains(&self, node: NodeKey) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn kind(&self, node: NodeKey) -> Option<&NodeKind> {
        self.nodes.get(&node).map(|data| &data.kind)
    }

    pub fn parent(&self, node: NodeKey) -> Option<NodeKey> {
        self.nodes.get(&node).and_then(|data| data.parent)
    }

    pub fn children(&self, node: NodeKey) -> &[NodeKey] {
        self.nodes
            .get(&node)
            .map_or(&[], |data| data.children.as_slice())
    }

    /// Index of `node` among its parent's children.
    pub fn index_in_parent(&self, node: NodeKey) -> Option<u32> {
        let parent = self.parent(node)?;
        self.children(parent)
            .iter()
            .position(|child| *child == node)
            .map(to_offset)
    }

    pub fn is_element(&self, node: NodeKey) -> bool {
        matches!(self.kind(node), Some(NodeKind::Element { .. }))
    }

    pub fn text(&self, node: NodeKey) -> Option<&str> {
        match self.kind(node) {
            Some(NodeKind::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn tag_name(&self, node: NodeKey) -> Option<&str> {
        match self.kind(node) {
            Some(NodeKind::Element { tag, .. }) => Some(tag.as_str()),
            _ => None,
        }
    }

    /// Attribute value by name (ASCII case-insensitive name match).
    pub fn attribute(&self, node: NodeKey, name: &str) -> Option<&str> {
        match self.kind(node) {
            Some(NodeKind::Element { attributes, .. }) => attributes
                .iter()
                .find(|(attr_name, _)| attr_name.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    /// Node length: UTF-16 code units for text, child count otherwise.
    /// Spec: <https://dom.spec.whatwg.org/#concept-node-length>
    pub fn node_length(&self, node: NodeKey) -> Option<u32> {
        let data = self.nodes.get(&node)?;
        Some(match &data.kind {
            NodeKind::Text(text) => utf16_len(text),
            NodeKind::Document | NodeKind::Element { .. } => to_offset(data.children.len()),
        })
    }

    /// All nodes below the document, in tree order.
    pub fn descendants_in_order(&self) -> Vec<NodeKey> {
        self.subtree_in_order(NodeKey::ROOT)
            .into_iter()
            .filter(|node| *node != NodeKey::ROOT)
            .collect()
    }

    /// All element nodes, in tree order.
    pub fn elements(&self) -> Vec<NodeKey> {
        self.descendants_in_order()
            .into_iter()
            .filter(|node| self.is_element(*node))
            .collect()
    }

    /// All text nodes, in tree order.
    pub fn text_nodes_in_order(&self) -> Vec<NodeKey> {
        self.descendants_in_order()
            .into_iter()
            .filter(|node| self.text(*node).is_some())
            .collect()
    }

    /// `node` and its descendants, in tree order.
    pub fn subtree_in_order(&self, node: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let Some(data) = self.nodes.get(&current) else {
                continue;
            };
            out.push(current);
            stack.extend(data.children.iter().rev().copied());
        }
        out
    }

    /// Child index path from the document node down to `node`.
    fn path_from_root(&self, node: NodeKey) -> Option<Vec<u32>> {
        let mut path = Vec::new();
        let mut current = node;
        while current != NodeKey::ROOT {
            let parent = self.parent(current)?;
            let index = self
                .children(parent)
                .iter()
                .position(|child| *child == current)?;
            path.push(to_offset(index));
            current = parent;
        }
        path.reverse();
        Some(path)
    }

    /// Apply one update and report the structural changes it caused.
    ///
    /// # Errors
    /// Returns an error when the update names an unknown node, inserts a key
    /// that already exists, inserts under a text node or past the parent's
    /// last child, or edits text data outside the node's length.
    pub fn apply(&mut self, update: DOMUpdate) -> Result<Vec<TreeMutation>> {
        trace!("DomTree({:?}): applying {update:?}", self.document);
        match update {
            DOMUpdate::InsertElement {
                parent,
                node,
                tag,
                pos,
            } => {
                let kind = NodeKind::Element {
                    tag: tag.to_ascii_lowercase(),
                    attributes: Vec::new(),
                };
                self.insert_child(parent, node, kind, pos).map(|mutation| vec![mutation])
            }
            DOMUpdate::InsertText {
                parent,
                node,
                text,
                pos,
            } => self
                .insert_child(parent, node, NodeKind::Text(text), pos)
                .map(|mutation| vec![mutation]),
            DOMUpdate::SetAttr { node, name, value } => self.set_attribute(node, name, value),
            DOMUpdate::RemoveNode { node } => self.remove_node(node).map(|mutation| vec![mutation]),
            DOMUpdate::UpdateText { node, text } => {
                let length = self
                    .text(node)
                    .map(utf16_len)
                    .ok_or_else(|| anyhow!("UpdateText on non-text node {node:?}"))?;
                self.replace_data(node, 0, length, &text)
                    .map(|mutation| vec![mutation])
            }
            DOMUpdate::ReplaceData {
                node,
                offset,
                count,
                data,
            } => self
                .replace_data(node, offset, count, &data)
                .map(|mutation| vec![mutation]),
            DOMUpdate::EndOfDocument => Ok(Vec::new()),
        }
    }

    fn insert_child(
        &mut self,
        parent: NodeKey,
        node: NodeKey,
        kind: NodeKind,
        pos: usize,
    ) -> Result<TreeMutation> {
        if self.nodes.contains_key(&node) {
            bail!("node {node:?} is already in the tree");
        }
        let parent_data = self
            .nodes
            .get_mut(&parent)
            .ok_or_else(|| anyhow!("unknown parent {parent:?}"))?;
        if matches!(parent_data.kind, NodeKind::Text(_)) {
            bail!("cannot insert {node:?} under text node {parent:?}");
        }
        if pos > parent_data.children.len() {
            bail!(
                "insert position {pos} is past the end ({}) of {parent:?}",
                parent_data.children.len()
            );
        }
        let index = pos;
        parent_data.children.insert(index, node);
        self.nodes.insert(
            node,
            NodeData {
                parent: Some(parent),
                children: Vec::new(),
                kind,
            },
        );
        Ok(TreeMutation::ChildInserted {
            parent,
            index: to_offset(index),
            node,
        })
    }

    fn set_attribute(
        &mut self,
        node: NodeKey,
        name: String,
        value: String,
    ) -> Result<Vec<TreeMutation>> {
        let data = self
            .nodes
            .get_mut(&node)
            .ok_or_else(|| anyhow!("SetAttr on unknown node {node:?}"))?;
        let NodeKind::Element { attributes, .. } = &mut data.kind else {
            bail!("SetAttr on non-element node {node:?}");
        };
        let lowered = name.to_ascii_lowercase();
        if let Some(slot) = attributes.iter_mut().find(|(existing, _)| *existing == lowered) {
            slot.1 = value;
        } else {
            attributes.push((lowered.clone(), value));
        }
        Ok(vec![TreeMutation::AttributeChanged {
            node,
            name: lowered,
        }])
    }

    fn remove_node(&mut self, node: NodeKey) -> Result<TreeMutation> {
        if node == NodeKey::ROOT {
            bail!("the document node cannot be removed");
        }
        let parent = self
            .parent(node)
            .ok_or_else(|| anyhow!("RemoveNode on unknown or detached node {node:?}"))?;
        let index = self
            .index_in_parent(node)
            .ok_or_else(|| anyhow!("{node:?} is missing from its parent's children"))?;
        let subtree = self.subtree_in_order(node);
        if let Some(parent_data) = self.nodes.get_mut(&parent) {
            parent_data.children.retain(|child| *child != node);
        }
        for removed in &subtree {
            self.nodes.remove(removed);
        }
        Ok(TreeMutation::ChildRemoved {
            parent,
            index,
            node,
            subtree,
        })
    }

    fn replace_data(
        &mut self,
        node: NodeKey,
        offset: u32,
        count: u32,
        data: &str,
    ) -> Result<TreeMutation> {
        let node_data = self
            .nodes
            .get_mut(&node)
            .ok_or_else(|| anyhow!("text edit on unknown node {node:?}"))?;
        let NodeKind::Text(text) = &mut node_data.kind else {
            bail!("text edit on non-text node {node:?}");
        };
        let mut units: Vec<u16> = text.encode_utf16().collect();
        let length = to_offset(units.len());
        if offset > length {
            bail!("offset {offset} is past the end ({length}) of {node:?}");
        }
        let removed = count.min(length - offset);
        let replacement: Vec<u16> = data.encode_utf16().collect();
        let inserted = to_offset(replacement.len());
        let start = offset as usize;
        units.splice(start..start + removed as usize, replacement);
        *text = String::from_utf16_lossy(&units);
        Ok(TreeMutation::TextReplaced {
            node,
            offset,
            removed,
            inserted,
        })
    }
}

impl TreeOrder for DomTree {
    /// Tree order as a lexicographic comparison of child-index paths, with the
    /// boundary offset appended to the container's path. A shorter path that
    /// is a prefix of the other sorts first.
    fn compare_points(&self, left: BoundaryPoint, right: BoundaryPoint) -> Option<Ordering> {
        let mut left_path = self.path_from_root(left.node)?;
        let mut right_path = self.path_from_root(right.node)?;
        left_path.push(left.offset);
        right_path.push(right.offset);
        Some(left_path.cmp(&right_path))
    }
}

impl DOMSubscriber for DomTree {
    fn apply_update(&mut self, update: DOMUpdate) -> Result<()> {
        self.apply(update).map(|_| ())
    }
}

fn utf16_len(text: &str) -> u32 {
    to_offset(text.encode_utf16().count())
}

fn to_offset(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
