//! Highlight entries: a live range plus its inline style and priority.
//! Spec: <https://drafts.csswg.org/css-highlight-api-1/#highlight>

use crate::range::LiveRange;
use css_style_attr::PropertyMap;

/// Stable handle to an entry owned by a [`HighlightsMap`](crate::HighlightsMap).
/// Handles are never reused within one map, so they double as identity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub(crate) u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighlightEntry {
    pub(crate) range: LiveRange,
    pub(crate) style: PropertyMap,
    pub(crate) priority: u32,
    /// Name of the owning group; `None` while detached.
    pub(crate) group: Option<String>,
}

impl HighlightEntry {
    pub(crate) const fn new(range: LiveRange) -> Self {
        Self {
            range,
            style: PropertyMap::new(),
            priority: 0,
            group: None,
        }
    }

    #[inline]
    pub const fn range(&self) -> &LiveRange {
        &self.range
    }

    /// Author-set inline style; sparse.
    #[inline]
    pub const fn style(&self) -> &PropertyMap {
        &self.style
    }

    #[inline]
    pub const fn priority(&self) -> u32 {
        self.priority
    }

    #[inline]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }
}
