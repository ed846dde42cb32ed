//! `::highlight(name)` selector parsing, specificity, and matching.
//! Spec: <https://drafts.csswg.org/css-highlight-api-1/#custom-highlight-pseudo>
//!
//! Supported: an optional compound selector (type, universal, class, id; no
//! combinators) followed by `::highlight(<ident>)`, in comma-separated lists.

use dom::{DomTree, NodeKey};
use log::debug;

/// Selector specificity triple (a, b, c).
/// Spec: <https://www.w3.org/TR/selectors-4/#specificity-rules>
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Specificity(pub u16, pub u16, pub u16);

/// Simple selectors allowed in the originating element's compound.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SimpleSelector {
    Universal,
    /// ASCII lowercase tag name.
    Type(String),
    Class(String),
    Id(String),
}

/// `<compound>::highlight(<group>)`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighlightSelector {
    /// Originating element compound; empty means "any element".
    pub compound: Vec<SimpleSelector>,
    /// Highlight group name (case-sensitive).
    pub group: String,
}

impl HighlightSelector {
    /// Specificity of the whole selector; the pseudo-element counts as a type.
    /// Spec: <https://www.w3.org/TR/selectors-4/#specificity-rules>
    pub fn specificity(&self) -> Specificity {
        let mut spec = Specificity(0, 0, 1);
        for simple in &self.compound {
            match simple {
                SimpleSelector::Id(_) => spec.0 = spec.0.saturating_add(1),
                SimpleSelector::Class(_) => spec.1 = spec.1.saturating_add(1),
                SimpleSelector::Type(_) => spec.2 = spec.2.saturating_add(1),
                SimpleSelector::Universal => {}
            }
        }
        spec
    }

    /// True if the originating compound matches `element`.
    pub fn matches<Source: ElementSource + ?Sized>(&self, elements: &Source, element: NodeKey) -> bool {
        let Some(tag) = elements.tag_name(element) else {
            return false;
        };
        self.compound.iter().all(|simple| match simple {
            SimpleSelector::Universal => true,
            SimpleSelector::Type(name) => tag.eq_ignore_ascii_case(name),
            SimpleSelector::Class(class) => elements.has_class(element, class),
            SimpleSelector::Id(id) => elements.element_id(element) == Some(id.as_str()),
        })
    }
}

/// An adapter that abstracts DOM access for highlight selector matching.
pub trait ElementSource {
    /// Tag name if `element` is an element, `None` otherwise.
    fn tag_name(&self, element: NodeKey) -> Option<&str>;

    /// The element's `id` attribute, if any.
    fn element_id(&self, element: NodeKey) -> Option<&str>;

    /// True if the element's class list contains `class` (case-sensitive).
    fn has_class(&self, element: NodeKey, class: &str) -> bool;
}

impl ElementSource for DomTree {
    fn tag_name(&self, element: NodeKey) -> Option<&str> {
        Self::tag_name(self, element)
    }

    fn element_id(&self, element: NodeKey) -> Option<&str> {
        self.attribute(element, "id").filter(|id| !id.is_empty())
    }

    fn has_class(&self, element: NodeKey, class: &str) -> bool {
        self.attribute(element, "class")
            .is_some_and(|list| list.split_ascii_whitespace().any(|token| token == class))
    }
}

/// Parse a selector list prelude. Returns `None` if any selector in the list
/// is unsupported, mirroring how an invalid selector drops the whole rule.
/// Spec: <https://www.w3.org/TR/selectors-4/#invalid>
pub fn parse_highlight_selector_list(prelude: &str) -> Option<Vec<HighlightSelector>> {
    let mut out = Vec::new();
    for part in prelude.split(',') {
        let Some(selector) = parse_highlight_selector(part.trim()) else {
            debug!("cascade: unsupported highlight selector {part:?}");
            return None;
        };
        out.push(selector);
    }
    Some(out)
}

fn parse_highlight_selector(text: &str) -> Option<HighlightSelector> {
    let (compound_text, rest) = text.split_once("::")?;
    let argument = rest
        .strip_prefix("highlight(")?
        .strip_suffix(')')?
        .trim();
    if !is_identifier(argument) {
        return None;
    }
    Some(HighlightSelector {
        compound: parse_compound(compound_text)?,
        group: argument.to_owned(),
    })
}

/// Parse a compound selector with no combinators.
fn parse_compound(text: &str) -> Option<Vec<SimpleSelector>> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(first) = rest.chars().next() {
        match first {
            '*' => {
                out.push(SimpleSelector::Universal);
                rest = &rest[1..];
            }
            '.' | '#' => {
                let (name, remaining) = take_identifier(&rest[1..]);
                if name.is_empty() {
                    return None;
                }
                out.push(if first == '.' {
                    SimpleSelector::Class(name.to_owned())
                } else {
                    SimpleSelector::Id(name.to_owned())
                });
                rest = remaining;
            }
            _ => {
                let (name, remaining) = take_identifier(rest);
                // Whitespace, combinators, and anything else end up here.
                if name.is_empty() || !out.is_empty() {
                    return None;
                }
                out.push(SimpleSelector::Type(name.to_ascii_lowercase()));
                rest = remaining;
            }
        }
    }
    Some(out)
}

fn take_identifier(text: &str) -> (&str, &str) {
    let end = text
        .char_indices()
        .find(|&(_, character)| !is_identifier_char(character))
        .map_or(text.len(), |(index, _)| index);
    text.split_at(end)
}

fn is_identifier(text: &str) -> bool {
    !text.is_empty()
        && !text.starts_with(|character: char| character.is_ascii_digit())
        && text.chars().all(is_identifier_char)
}

const fn is_identifier_char(character: char) -> bool {
    character.is_ascii_alphanumeric() || matches!(character, '-' | '_') || !character.is_ascii()
}
