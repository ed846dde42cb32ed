//! One document's DOM mirror and highlights map, kept in step.
//!
//! DOM batches go to the mirror first; the structural changes it reports then
//! drive the live range update steps of every registered entry.

use crate::allow_list::HighlightableProperties;
use crate::entry::EntryId;
use crate::error::HighlightError;
use crate::invalidation::{Invalidator, flush};
use crate::map::HighlightsMap;
use crate::range::{LiveRange, TextRun};
use crate::resolver::{HighlightResolver, ResolvedHighlightStyle};
use anyhow::Result;
use css_cascade::CascadeSource;
use dom::{BoundaryPoint, DOMSubscriber, DOMUpdate, DocumentId, DomTree};
use log::trace;

#[derive(Debug)]
pub struct HighlightView {
    tree: DomTree,
    highlights: HighlightsMap,
}

impl HighlightView {
    pub fn new(document: DocumentId) -> Self {
        Self {
            tree: DomTree::new(document),
            highlights: HighlightsMap::new(document),
        }
    }

    #[inline]
    pub const fn tree(&self) -> &DomTree {
        &self.tree
    }

    #[inline]
    pub const fn highlights(&self) -> &HighlightsMap {
        &self.highlights
    }

    #[inline]
    pub const fn highlights_mut(&mut self) -> &mut HighlightsMap {
        &mut self.highlights
    }

    /// Borrow the mirror and the map at once, e.g. to bind a stylesheet to
    /// the tree while flushing the map.
    #[inline]
    pub const fn split(&mut self) -> (&DomTree, &mut HighlightsMap) {
        (&self.tree, &mut self.highlights)
    }

    /// # Errors
    /// Returns [`HighlightError::UnknownEntry`] for a foreign handle.
    pub fn set_start(&mut self, id: EntryId, point: BoundaryPoint) -> Result<(), HighlightError> {
        self.highlights.set_start(id, point, &self.tree)
    }

    /// # Errors
    /// Returns [`HighlightError::UnknownEntry`] for a foreign handle.
    pub fn set_end(&mut self, id: EntryId, point: BoundaryPoint) -> Result<(), HighlightError> {
        self.highlights.set_end(id, point, &self.tree)
    }

    /// # Errors
    /// Returns [`HighlightError::UnknownEntry`] for a foreign handle.
    pub fn set_range(&mut self, id: EntryId, range: LiveRange) -> Result<(), HighlightError> {
        self.highlights.set_range(id, range, &self.tree)
    }

    /// Resolve `run` against the cascaded styles of its parent element.
    ///
    /// # Errors
    /// Returns [`HighlightError::DocumentMismatch`] if `run` belongs to
    /// another document.
    pub fn resolve_run<Props: HighlightableProperties, Cascade: CascadeSource + ?Sized>(
        &self,
        resolver: &HighlightResolver<Props>,
        cascade: &Cascade,
        run: &TextRun,
    ) -> Result<ResolvedHighlightStyle, HighlightError> {
        let element = self.tree.parent(run.node).unwrap_or(run.node);
        resolver.resolve_with_cascade(&self.highlights, &self.tree, cascade, element, run)
    }

    /// Drain queued damage into `sink`. See [`flush`].
    pub fn flush_invalidations<Cascade: CascadeSource + ?Sized, Sink: Invalidator + ?Sized>(
        &mut self,
        cascade: &Cascade,
        sink: &mut Sink,
    ) -> usize {
        flush(&mut self.highlights, &self.tree, cascade, sink)
    }
}

impl DOMSubscriber for HighlightView {
    fn apply_update(&mut self, update: DOMUpdate) -> Result<()> {
        let mutations = self.tree.apply(update)?;
        for mutation in &mutations {
            trace!("HighlightView: {mutation:?}");
            self.highlights.apply_mutation(mutation);
        }
        Ok(())
    }
}
