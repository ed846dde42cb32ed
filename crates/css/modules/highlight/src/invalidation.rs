//! Repaint damage produced by highlight mutations.
//!
//! The map queues requests as it changes; the host drains them and the
//! planner turns them into the set of elements whose text must be restyled.

use crate::map::HighlightsMap;
use crate::range::{LiveRange, TextRun};
use css_cascade::CascadeSource;
use dom::{DomTree, NodeKey};
use log::debug;
use std::collections::HashSet;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvalidationRequest {
    /// Text covered by this extent needs repaint.
    Range(LiveRange),
    /// Every element styling this group needs repaint.
    Group(String),
    /// All highlighted content needs repaint.
    Everything,
}

/// Host hook receiving the elements to restyle.
pub trait Invalidator {
    fn invalidate(&mut self, elements: &HashSet<NodeKey>);
}

impl<Sink: FnMut(&HashSet<NodeKey>)> Invalidator for Sink {
    #[inline]
    fn invalidate(&mut self, elements: &HashSet<NodeKey>) {
        self(elements);
    }
}

pub struct InvalidationPlanner<'tree, Cascade: CascadeSource + ?Sized> {
    tree: &'tree DomTree,
    cascade: &'tree Cascade,
}

impl<'tree, Cascade: CascadeSource + ?Sized> InvalidationPlanner<'tree, Cascade> {
    pub const fn new(tree: &'tree DomTree, cascade: &'tree Cascade) -> Self {
        Self { tree, cascade }
    }

    /// Elements affected by `requests`. Ranges in other documents are ignored.
    pub fn plan(&self, requests: &[InvalidationRequest]) -> HashSet<NodeKey> {
        if requests.contains(&InvalidationRequest::Everything) {
            return self.tree.elements().into_iter().collect();
        }
        let mut out = HashSet::new();
        for request in requests {
            match request {
                InvalidationRequest::Range(range) => self.plan_range(range, &mut out),
                InvalidationRequest::Group(name) => {
                    out.extend(self.tree.elements().into_iter().filter(|element| {
                        self.cascade.cascaded_group_styles(*element).mentions(name)
                    }));
                }
                InvalidationRequest::Everything => {}
            }
        }
        out
    }

    fn plan_range(&self, range: &LiveRange, out: &mut HashSet<NodeKey>) {
        if range.document != self.tree.document() {
            return;
        }
        for node in range.boundary_nodes() {
            if self.tree.is_element(node) {
                out.insert(node);
            }
        }
        for text in self.tree.text_nodes_in_order() {
            let Some(len) = self.tree.node_length(text) else {
                continue;
            };
            let whole = TextRun::new(range.document, text, 0, len);
            // Carets count here so toggling collapsed painting repaints them.
            if !range.intersects_run(self.tree, &whole, true) {
                continue;
            }
            if let Some(parent) = self.tree.parent(text).filter(|parent| self.tree.is_element(*parent)) {
                out.insert(parent);
            }
        }
    }
}

/// Drain `map`'s queue and hand the affected elements to `sink` once.
/// Returns how many elements were invalidated.
pub fn flush<Cascade: CascadeSource + ?Sized, Sink: Invalidator + ?Sized>(
    map: &mut HighlightsMap,
    tree: &DomTree,
    cascade: &Cascade,
    sink: &mut Sink,
) -> usize {
    let requests = map.take_invalidations();
    if requests.is_empty() {
        return 0;
    }
    let elements = InvalidationPlanner::new(tree, cascade).plan(&requests);
    debug!(
        "invalidation: {} requests -> {} elements",
        requests.len(),
        elements.len()
    );
    if elements.is_empty() {
        return 0;
    }
    sink.invalidate(&elements);
    elements.len()
}
