//! Highlight style resolution for one painted text run.
//! Spec: <https://drafts.csswg.org/css-highlight-api-1/#priorities>
//!
//! Entries whose ranges intersect the run are applied in ascending
//! `(priority, group creation order, index in group)` order, so the last
//! writer of a property wins. The first applied entry of each group brings in
//! that group's cascaded `::highlight()` properties, then every entry layers
//! its inline style on top. Everything passes through the allow-list.

use crate::allow_list::{HighlightAllowList, HighlightableProperties};
use crate::config::ResolverConfig;
use crate::entry::{EntryId, HighlightEntry};
use crate::error::HighlightError;
use crate::map::{CreationOrder, HighlightGroup, HighlightsMap};
use crate::range::TextRun;
use css_cascade::{CascadeSource, CascadedGroupStyle};
use css_style_attr::PropertyMap;
use dom::{NodeKey, TreeOrder};
use log::{error, trace};
use std::collections::HashSet;
use tracing::trace_span;

/// Properties to paint over a text run. Empty means the run is unhighlighted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedHighlightStyle {
    pub properties: PropertyMap,
    /// Entries that intersected the run, in application order.
    pub contributing: Vec<EntryId>,
}

impl ResolvedHighlightStyle {
    #[inline]
    pub fn get(&self, property: &str) -> Option<&str> {
        self.properties.get(property)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

struct Candidate<'map> {
    priority: u32,
    creation_order: CreationOrder,
    index: usize,
    id: EntryId,
    group: &'map HighlightGroup,
    entry: &'map HighlightEntry,
}

impl Candidate<'_> {
    const fn key(&self) -> (u32, CreationOrder, usize) {
        (self.priority, self.creation_order, self.index)
    }
}

#[derive(Clone, Debug, Default)]
pub struct HighlightResolver<Props = HighlightAllowList> {
    allow_list: Props,
    config: ResolverConfig,
}

impl HighlightResolver {
    /// A resolver with the standard allow-list.
    pub fn new(config: ResolverConfig) -> Self {
        Self::with_allow_list(HighlightAllowList::new(), config)
    }
}

impl<Props: HighlightableProperties> HighlightResolver<Props> {
    pub const fn with_allow_list(allow_list: Props, config: ResolverConfig) -> Self {
        Self { allow_list, config }
    }

    #[inline]
    pub const fn config(&self) -> ResolverConfig {
        self.config
    }

    /// Resolve the highlight style of `run`, given the cascaded group styles
    /// of its parent element.
    ///
    /// # Errors
    /// Returns [`HighlightError::DocumentMismatch`] if `run` belongs to a
    /// different document than `map`.
    pub fn resolve<Order: TreeOrder + ?Sized>(
        &self,
        map: &HighlightsMap,
        order: &Order,
        cascaded: &CascadedGroupStyle,
        run: &TextRun,
    ) -> Result<ResolvedHighlightStyle, HighlightError> {
        let _span = trace_span!(
            "highlight_resolve",
            node = run.node.0,
            start = run.start,
            end = run.end
        )
        .entered();

        if run.document != map.document() {
            error!(
                "HighlightResolver: run in {:?} resolved against the map of {:?}",
                run.document,
                map.document()
            );
            return Err(HighlightError::DocumentMismatch {
                expected: map.document(),
                found: run.document,
            });
        }

        let mut candidates: Vec<Candidate<'_>> = map
            .grouped_entries()
            .filter(|(_, _, _, entry)| {
                entry.range.document == map.document()
                    && entry.range.intersects_run(
                        order,
                        run,
                        self.config.render_collapsed_ranges,
                    )
            })
            .map(|(group, index, id, entry)| Candidate {
                priority: entry.priority,
                creation_order: group.creation_order(),
                index,
                id,
                group,
                entry,
            })
            .collect();
        candidates.sort_by_key(Candidate::key);

        let mut resolved = ResolvedHighlightStyle::default();
        let mut groups_applied: HashSet<CreationOrder> = HashSet::new();
        for candidate in &candidates {
            if groups_applied.insert(candidate.creation_order) {
                if let Some(group_style) = cascaded.get(candidate.group.name()) {
                    self.apply(&mut resolved.properties, group_style);
                }
            }
            self.apply(&mut resolved.properties, &candidate.entry.style);
            resolved.contributing.push(candidate.id);
        }

        trace!(
            "HighlightResolver: {} entries over {:?}[{}..{}] -> {{{}}}",
            resolved.contributing.len(),
            run.node,
            run.start,
            run.end,
            resolved.properties.to_css_text()
        );
        Ok(resolved)
    }

    /// Like [`Self::resolve`], looking the element's cascaded group styles up
    /// through `cascade`.
    ///
    /// # Errors
    /// Returns [`HighlightError::DocumentMismatch`] if `run` belongs to a
    /// different document than `map`.
    pub fn resolve_with_cascade<Order: TreeOrder + ?Sized, Cascade: CascadeSource + ?Sized>(
        &self,
        map: &HighlightsMap,
        order: &Order,
        cascade: &Cascade,
        element: NodeKey,
        run: &TextRun,
    ) -> Result<ResolvedHighlightStyle, HighlightError> {
        let cascaded = cascade.cascaded_group_styles(element);
        self.resolve(map, order, &cascaded, run)
    }

    fn apply(&self, target: &mut PropertyMap, source: &PropertyMap) {
        for (name, value) in source.iter() {
            if value.is_empty() || !self.allow_list.is_highlightable(name) {
                continue;
            }
            target.set(name, value);
        }
    }
}
