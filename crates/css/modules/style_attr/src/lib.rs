//! CSS Style Attributes — declaration blocks and ordered property maps.
//! Spec: <https://www.w3.org/TR/css-style-attr/>
//!
//! Highlight entries carry an inline style, and the cascade hands back one
//! property map per highlight group. Both are sparse, ordered maps of
//! property name to value; this crate owns that representation and the
//! `cssparser`-based declaration-block parsing that fills it.

#![forbid(unsafe_code)]

use core::mem::replace;
use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, Parser,
    ParserInput, ParserState, QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser,
    parse_important,
};
use log::trace;

/// A single CSS declaration parsed from a declaration block.
///
/// Spec: <https://www.w3.org/TR/css-style-attr/#interpreting>
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// Property name, ASCII lowercase unless it is a custom property.
    pub property: String,
    /// Raw value trimmed of surrounding ASCII whitespace, without `!important`.
    pub value: String,
    /// Whether the declaration ended in `!important`.
    pub important: bool,
}

/// Parse the body of a declaration block into a list of declarations.
///
/// Tokenization is done by `cssparser`, so strings, comments, escapes and
/// nested blocks never split a declaration. Invalid items (no colon, empty
/// value) are skipped, recovering at the next `;`.
///
/// Spec: <https://www.w3.org/TR/css-style-attr/#interpreting>
pub fn parse_declaration_block(input: &str) -> Vec<Declaration> {
    let mut parser_input = ParserInput::new(input);
    let mut parser = Parser::new(&mut parser_input);
    parse_declaration_list(&mut parser)
}

/// Parse the declarations of an already opened block, e.g. the `{}` block of
/// a style rule.
pub fn parse_declaration_list(block: &mut Parser<'_, '_>) -> Vec<Declaration> {
    let mut collector = DeclarationCollector;
    let mut out = Vec::new();
    for item in RuleBodyParser::new(block, &mut collector) {
        match item {
            Ok(declaration) => out.push(declaration),
            Err((_, source)) => trace!("style_attr: skipping invalid declaration {source:?}"),
        }
    }
    out
}

/// Records each declaration's name, raw value text and importance.
struct DeclarationCollector;

impl DeclarationParser<'_> for DeclarationCollector {
    type Declaration = Declaration;
    type Error = ();

    fn parse_value<'input>(
        &mut self,
        name: CowRcStr<'input>,
        input: &mut Parser<'input, '_>,
        _declaration_start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'input, Self::Error>> {
        let start = input.position();
        let mut end = start;
        let mut important = false;
        loop {
            let trailing_important = input
                .try_parse(|rest| {
                    parse_important(rest)?;
                    rest.expect_exhausted()
                })
                .is_ok();
            if trailing_important {
                important = true;
                break;
            }
            if input.next_including_whitespace().is_err() {
                break;
            }
            end = input.position();
        }
        let value = input.slice(start..end).trim_matches(is_ascii_whitespace);
        if value.is_empty() {
            return Err(input.new_custom_error(()));
        }
        Ok(Declaration {
            property: normalize_property_name(&name),
            value: value.to_owned(),
            important,
        })
    }
}

// Declaration blocks hold no nested rules; the default hooks reject them.
impl AtRuleParser<'_> for DeclarationCollector {
    type Prelude = ();
    type AtRule = Declaration;
    type Error = ();
}

impl QualifiedRuleParser<'_> for DeclarationCollector {
    type Prelude = ();
    type QualifiedRule = Declaration;
    type Error = ();
}

impl RuleBodyItemParser<'_, Declaration, ()> for DeclarationCollector {
    fn parse_declarations(&self) -> bool {
        true
    }

    fn parse_qualified(&self) -> bool {
        false
    }
}

/// Normalize a property name: custom properties (`--*`) are case-sensitive,
/// everything else is ASCII case-insensitive and stored lowercase.
///
/// Spec: <https://www.w3.org/TR/css-variables-1/#defining-variables>
pub fn normalize_property_name(name: &str) -> String {
    if name.starts_with("--") {
        return name.to_owned();
    }
    name.to_ascii_lowercase()
}

/// Sparse, insertion-ordered map from property name to value.
///
/// Setting an existing property replaces its value in place, so the order
/// reflects first assignment. Only explicitly set properties are present.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyMap {
    entries: Vec<(String, String)>,
}

impl PropertyMap {
    #[inline]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Parse a declaration block; later duplicates win in place.
    pub fn parse(input: &str) -> Self {
        parse_declaration_block(input)
            .into_iter()
            .map(|decl| (decl.property, decl.value))
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        let name = normalize_property_name(property);
        self.entries
            .iter()
            .find(|(existing, _)| *existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, property: &str) -> bool {
        self.get(property).is_some()
    }

    /// Set a property. Returns the previous value, if any.
    pub fn set(&mut self, property: &str, value: &str) -> Option<String> {
        let name = normalize_property_name(property);
        let trimmed = value.trim_matches(is_ascii_whitespace).to_owned();
        if let Some(slot) = self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            return Some(replace(&mut slot.1, trimmed));
        }
        self.entries.push((name, trimmed));
        None
    }

    /// Remove a property. Returns its value, if it was present.
    pub fn remove(&mut self, property: &str) -> Option<String> {
        let name = normalize_property_name(property);
        let index = self.entries.iter().position(|(existing, _)| *existing == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate `(property, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Serialize back into declaration block text.
    pub fn to_css_text(&self) -> String {
        self.iter()
            .map(|(name, value)| format!("{name}: {value};"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<Name: AsRef<str>, Value: AsRef<str>> FromIterator<(Name, Value)> for PropertyMap {
    fn from_iter<Iter: IntoIterator<Item = (Name, Value)>>(iter: Iter) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.set(name.as_ref(), value.as_ref());
        }
        map
    }
}

/// ASCII whitespace per CSS Syntax (TAB, LF, FF, CR, SPACE).
///
/// Spec: <https://www.w3.org/TR/css-syntax-3/#whitespace>
const fn is_ascii_whitespace(character: char) -> bool {
    matches!(
        character,
        '\u{0009}' | '\u{000A}' | '\u{000C}' | '\u{000D}' | '\u{0020}'
    )
}
