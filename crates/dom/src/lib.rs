//! DOM mirroring primitives shared by the highlight subsystem.
//! This crate centralizes node keys, the batchable update model, and a small
//! tree mirror that answers the tree-order questions live ranges need.

use anyhow::Result;
use core::cmp::Ordering;

mod tree;
pub use tree::{DomTree, NodeKind};

// ============================
// Stable keys
// ============================

/// A 64-bit stable key for DOM nodes used to correlate updates across subsystems.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct NodeKey(pub u64);

impl NodeKey {
    /// The document node key (always present in a tree).
    pub const ROOT: Self = Self(0);
}

/// Identifies the document a tree, range, or text run belongs to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct DocumentId(pub u32);

// ============================
// DOM Update model + mirror pattern
// ============================

/// A batchable update applied to the runtime DOM and mirrored to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DOMUpdate {
    InsertElement {
        parent: NodeKey,
        node: NodeKey,
        tag: String,
        pos: usize,
    },
    InsertText {
        parent: NodeKey,
        node: NodeKey,
        text: String,
        pos: usize,
    },
    SetAttr {
        node: NodeKey,
        name: String,
        value: String,
    },
    RemoveNode {
        node: NodeKey,
    },
    /// Replace the whole data of a text node.
    UpdateText {
        node: NodeKey,
        text: String,
    },
    /// Replace `count` code units starting at `offset` with `data`.
    /// Spec: <https://dom.spec.whatwg.org/#concept-cd-replace>
    ReplaceData {
        node: NodeKey,
        offset: u32,
        count: u32,
        data: String,
    },
    EndOfDocument,
}

/// A subscriber that receives `DOMUpdate` values and mirrors them into its own state.
pub trait DOMSubscriber {
    /// Apply a single `DOMUpdate` to the subscriber state.
    ///
    /// # Errors
    /// Returns an error if the update does not fit the subscriber's current state.
    fn apply_update(&mut self, update: DOMUpdate) -> Result<()>;
}

/// Structural change record produced by [`DomTree::apply`].
///
/// These carry exactly what the live range update steps need: the parent and
/// index of the changed child, or the replaced code unit span of a text node.
/// Spec: <https://dom.spec.whatwg.org/#interface-range> (live range update steps)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeMutation {
    ChildInserted {
        parent: NodeKey,
        index: u32,
        node: NodeKey,
    },
    ChildRemoved {
        parent: NodeKey,
        index: u32,
        node: NodeKey,
        /// The removed node and all of its descendants, in tree order.
        subtree: Vec<NodeKey>,
    },
    TextReplaced {
        node: NodeKey,
        offset: u32,
        removed: u32,
        inserted: u32,
    },
    AttributeChanged {
        node: NodeKey,
        name: String,
    },
}

// ============================
// Boundary points and tree order
// ============================

/// A (node, offset) pair. Offsets count UTF-16 code units inside text nodes
/// and children inside element and document nodes.
/// Spec: <https://dom.spec.whatwg.org/#concept-range-bp>
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BoundaryPoint {
    pub node: NodeKey,
    pub offset: u32,
}

impl BoundaryPoint {
    #[inline]
    pub const fn new(node: NodeKey, offset: u32) -> Self {
        Self { node, offset }
    }
}

/// Range/layout collaborator: positions boundary points in tree order.
pub trait TreeOrder {
    /// Compare two boundary points.
    ///
    /// Returns `None` when either point is unknown or the two are not in the
    /// same connected tree.
    /// Spec: <https://dom.spec.whatwg.org/#concept-range-bp-position>
    fn compare_points(&self, left: BoundaryPoint, right: BoundaryPoint) -> Option<Ordering>;
}
