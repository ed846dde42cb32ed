//! CSS Cascading and Inheritance Level 4 — cascade for `::highlight()` rules.
//! Spec: <https://www.w3.org/TR/css-cascade-4/>
//! Spec: <https://drafts.csswg.org/css-highlight-api-1/#styling-highlights>
//!
//! The highlight resolver never looks styles up on its own: it is handed a
//! [`CascadedGroupStyle`] per element, produced by a [`CascadeSource`]. This
//! crate defines that collaborator and ships two sources: a fixed table and a
//! small stylesheet cascade over `::highlight(name)` rules.

#![forbid(unsafe_code)]

use core::cmp::Ordering;
use css_style_attr::PropertyMap;
use dom::NodeKey;
use std::collections::HashMap;

mod selector;
mod stylesheet;

pub use selector::{ElementSource, HighlightSelector, SimpleSelector, Specificity, parse_highlight_selector_list};
pub use stylesheet::{HighlightRule, HighlightStylesheet, StylesheetCascade};

/// Style sheet origin.
/// Spec: Section 6.2 — Cascading origins
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Origin {
    UserAgent,
    User,
    Author,
}

/// Priority tuple used to order declarations in the cascade.
/// Spec: Section 6 — Cascading
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CascadePriority {
    /// Spec: Section 6.2 — Origins
    pub origin: Origin,
    /// Spec: Section 6.3 — Importance
    pub important: bool,
    /// Spec: Section 6.4 — Specificity
    pub specificity: Specificity,
    /// Source order index, increasing with appearance in the stylesheet.
    /// Spec: Section 6.4 — Order of appearance
    pub source_order: u32,
}

impl CascadePriority {
    #[inline]
    pub const fn new(
        origin: Origin,
        important: bool,
        specificity: Specificity,
        source_order: u32,
    ) -> Self {
        Self {
            origin,
            important,
            specificity,
            source_order,
        }
    }
}

/// Compare two `CascadePriority` values according to the cascade rules.
/// Returns `Ordering::Greater` if `left` should win over `right`.
/// Spec: Section 6 — Cascade sorting order
pub fn compare_priority(left: &CascadePriority, right: &CascadePriority) -> Ordering {
    // Origin and importance: important declarations invert the origin order.
    let left_rank = origin_importance_rank(left.origin, left.important);
    let right_rank = origin_importance_rank(right.origin, right.important);
    if left_rank != right_rank {
        return left_rank.cmp(&right_rank);
    }

    if left.specificity != right.specificity {
        return left.specificity.cmp(&right.specificity);
    }

    left.source_order.cmp(&right.source_order)
}

/// Rank origin+importance: UA < User < Author < Author!important < User!important < UA!important.
/// Spec: Section 6.2 — Cascading origins
const fn origin_importance_rank(origin: Origin, important: bool) -> u8 {
    match (important, origin) {
        (false, Origin::UserAgent) => 0,
        (false, Origin::User) => 1,
        (false, Origin::Author) => 2,
        (true, Origin::Author) => 3,
        (true, Origin::User) => 4,
        (true, Origin::UserAgent) => 5,
    }
}

/// Per-element result of matching `::highlight(name)` rules: group name to
/// the properties that apply to that group's highlight pseudo-element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CascadedGroupStyle {
    groups: HashMap<String, PropertyMap>,
}

impl CascadedGroupStyle {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Properties cascaded for `group`, if any rule matched.
    pub fn get(&self, group: &str) -> Option<&PropertyMap> {
        self.groups.get(group)
    }

    /// True if any rule for `group` matched, even one without declarations.
    pub fn mentions(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    pub fn insert(&mut self, group: &str, properties: PropertyMap) {
        self.groups.insert(group.to_owned(), properties);
    }

    /// The mutable property map for `group`, created empty on first use.
    pub fn group_mut(&mut self, group: &str) -> &mut PropertyMap {
        self.groups.entry(group.to_owned()).or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Cascade engine collaborator.
pub trait CascadeSource {
    /// Resolve the per-group highlight styles for `element`. Read-only.
    fn cascaded_group_styles(&self, element: NodeKey) -> CascadedGroupStyle;
}

/// A precomputed element → group style table.
#[derive(Clone, Debug, Default)]
pub struct StaticCascade {
    by_element: HashMap<NodeKey, CascadedGroupStyle>,
}

impl StaticCascade {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cascaded properties of `group` on `element`.
    pub fn set_group_style(&mut self, element: NodeKey, group: &str, properties: PropertyMap) {
        self.by_element
            .entry(element)
            .or_default()
            .insert(group, properties);
    }
}

impl CascadeSource for StaticCascade {
    fn cascaded_group_styles(&self, element: NodeKey) -> CascadedGroupStyle {
        self.by_element.get(&element).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(specificity: Specificity, source_order: u32) -> CascadePriority {
        CascadePriority::new(Origin::Author, false, specificity, source_order)
    }

    #[test]
    fn specificity_beats_source_order() {
        let early_specific = author(Specificity(0, 1, 1), 0);
        let late_plain = author(Specificity(0, 0, 1), 5);
        assert_eq!(
            compare_priority(&early_specific, &late_plain),
            Ordering::Greater
        );
    }

    #[test]
    fn important_inverts_origins() {
        let user_important = CascadePriority::new(Origin::User, true, Specificity::default(), 0);
        let author_important =
            CascadePriority::new(Origin::Author, true, Specificity(1, 0, 0), 9);
        let author_normal = CascadePriority::new(Origin::Author, false, Specificity(1, 0, 0), 9);
        assert_eq!(
            compare_priority(&user_important, &author_important),
            Ordering::Greater
        );
        assert_eq!(
            compare_priority(&author_normal, &user_important),
            Ordering::Less
        );
    }

    #[test]
    fn static_cascade_returns_empty_for_unknown_elements() {
        let mut cascade = StaticCascade::new();
        cascade.set_group_style(NodeKey(4), "found", PropertyMap::parse("color: red"));
        assert!(cascade.cascaded_group_styles(NodeKey(5)).is_empty());
        let styles = cascade.cascaded_group_styles(NodeKey(4));
        assert_eq!(styles.get("found").and_then(|map| map.get("color")), Some("red"));
    }
}
