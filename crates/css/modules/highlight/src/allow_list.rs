//! Properties that may apply to highlight pseudo-elements.
//! Spec: <https://drafts.csswg.org/css-pseudo-4/#highlight-styling>

use std::collections::HashSet;

/// Decides whether a property may be painted by a highlight.
pub trait HighlightableProperties {
    fn is_highlightable(&self, name: &str) -> bool;
}

impl<Filter: Fn(&str) -> bool> HighlightableProperties for Filter {
    #[inline]
    fn is_highlightable(&self, name: &str) -> bool {
        self(name)
    }
}

const HIGHLIGHTABLE: &[&str] = &[
    "color",
    "background",
    "background-color",
    "text-decoration",
    "text-decoration-line",
    "text-decoration-style",
    "text-decoration-color",
    "text-decoration-thickness",
    "text-underline-offset",
    "text-underline-position",
    "text-emphasis-color",
    "text-shadow",
    "-webkit-text-fill-color",
    "-webkit-text-stroke-color",
    "-webkit-text-stroke-width",
    "stroke-color",
    "fill-color",
    "stroke-width",
];

/// The standard allow-list plus any extra names the host opts into.
/// Matching is ASCII case-insensitive; custom properties always pass.
#[derive(Clone, Debug, Default)]
pub struct HighlightAllowList {
    extra: HashSet<String>,
}

impl HighlightAllowList {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also allow `name`.
    #[must_use]
    pub fn with_extra(mut self, name: &str) -> Self {
        self.extra.insert(name.to_ascii_lowercase());
        self
    }
}

impl HighlightableProperties for HighlightAllowList {
    fn is_highlightable(&self, name: &str) -> bool {
        if name.starts_with("--") {
            return true;
        }
        HIGHLIGHTABLE
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(name))
            || self.extra.contains(&name.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_properties_pass_case_insensitively() {
        let list = HighlightAllowList::new();
        assert!(list.is_highlightable("color"));
        assert!(list.is_highlightable("Background-Color"));
        assert!(list.is_highlightable("text-decoration-thickness"));
        assert!(list.is_highlightable("--brand"));
        assert!(!list.is_highlightable("font-size"));
        assert!(!list.is_highlightable("display"));
    }

    #[test]
    fn extras_and_closures() {
        let list = HighlightAllowList::new().with_extra("Outline-Color");
        assert!(list.is_highlightable("outline-color"));
        let only_color = |name: &str| name == "color";
        assert!(only_color.is_highlightable("color"));
        assert!(!only_color.is_highlightable("background"));
    }
}
