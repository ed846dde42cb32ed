//! A stylesheet of `::highlight()` rules and the cascade over it.
//! Spec: <https://www.w3.org/TR/css-cascade-4/#cascading>

use crate::selector::{ElementSource, HighlightSelector, Specificity, parse_highlight_selector_list};
use crate::{CascadePriority, CascadeSource, CascadedGroupStyle, Origin, compare_priority};
use core::iter::once;
use css_style_attr::{Declaration, parse_declaration_list};
use cssparser::{
    AtRuleParser, BasicParseErrorKind, CowRcStr, ParseError, Parser, ParserInput, ParserState,
    QualifiedRuleParser, StyleSheetParser, ToCss as _, Token,
};
use dom::NodeKey;
use log::{debug, trace};

/// One `::highlight()` style rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighlightRule {
    pub selectors: Vec<HighlightSelector>,
    /// Declarations in source order, each carrying its `!important` flag.
    pub declarations: Vec<Declaration>,
    /// Rule index across the stylesheet.
    pub source_order: u32,
}

/// The `::highlight()` rules of one origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighlightStylesheet {
    pub origin: Origin,
    pub rules: Vec<HighlightRule>,
}

impl HighlightStylesheet {
    /// Parse stylesheet text, keeping only rules whose whole selector list
    /// consists of supported `::highlight()` selectors. At-rules and other
    /// rules are skipped.
    /// Spec: <https://www.w3.org/TR/css-syntax-3/#parse-stylesheet>
    pub fn parse(origin: Origin, css: &str) -> Self {
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        let mut collector = RuleCollector;
        let mut rules = Vec::new();
        let mut source_order: u32 = 0;
        for (prelude, declarations) in StyleSheetParser::new(&mut parser, &mut collector).flatten() {
            let Some(selectors) = parse_highlight_selector_list(&prelude) else {
                continue;
            };
            rules.push(HighlightRule {
                selectors,
                declarations,
                source_order,
            });
            source_order = source_order.saturating_add(1);
        }
        trace!("cascade: parsed {} highlight rules", rules.len());
        Self { origin, rules }
    }

    /// Bind this sheet to an element source so it can serve as a cascade.
    pub fn bind<'sheet, Source: ElementSource>(
        &'sheet self,
        elements: &'sheet Source,
    ) -> StylesheetCascade<'sheet, Source> {
        StylesheetCascade {
            sheets: Vec::new(),
            primary: self,
            elements,
        }
    }

    /// Collect the declarations of every rule matching `element`.
    fn cascade_into<Source: ElementSource + ?Sized>(
        &self,
        elements: &Source,
        element: NodeKey,
        candidates: &mut Vec<Candidate>,
    ) {
        for rule in &self.rules {
            for selector in &rule.selectors {
                if !selector.matches(elements, element) {
                    continue;
                }
                for (index, declaration) in rule.declarations.iter().enumerate() {
                    candidates.push(Candidate {
                        priority: CascadePriority::new(
                            self.origin,
                            declaration.important,
                            selector.specificity(),
                            rule.source_order,
                        ),
                        declaration_index: index,
                        group: selector.group.clone(),
                        declaration: declaration.clone(),
                    });
                }
                if rule.declarations.is_empty() {
                    candidates.push(Candidate::mention(&selector.group, rule.source_order));
                }
            }
        }
    }
}

/// A stylesheet cascade bound to the element data it matches against.
pub struct StylesheetCascade<'sheet, Source: ElementSource> {
    primary: &'sheet HighlightStylesheet,
    sheets: Vec<&'sheet HighlightStylesheet>,
    elements: &'sheet Source,
}

impl<'sheet, Source: ElementSource> StylesheetCascade<'sheet, Source> {
    /// Add another sheet (e.g. a user-agent or user sheet) to the cascade.
    #[must_use]
    pub fn with_sheet(mut self, sheet: &'sheet HighlightStylesheet) -> Self {
        self.sheets.push(sheet);
        self
    }
}

impl<Source: ElementSource> CascadeSource for StylesheetCascade<'_, Source> {
    fn cascaded_group_styles(&self, element: NodeKey) -> CascadedGroupStyle {
        let mut candidates = Vec::new();
        for sheet in once(self.primary).chain(self.sheets.iter().copied()) {
            sheet.cascade_into(self.elements, element, &mut candidates);
        }
        // Ascending priority; applying in order makes the winner write last.
        candidates.sort_by(|left, right| {
            compare_priority(&left.priority, &right.priority)
                .then(left.declaration_index.cmp(&right.declaration_index))
        });
        let mut out = CascadedGroupStyle::new();
        for candidate in candidates {
            let properties = out.group_mut(&candidate.group);
            if !candidate.declaration.property.is_empty() {
                properties.set(&candidate.declaration.property, &candidate.declaration.value);
            }
        }
        out
    }
}

/// A declaration competing in the cascade for one element.
struct Candidate {
    priority: CascadePriority,
    declaration_index: usize,
    group: String,
    declaration: Declaration,
}

impl Candidate {
    /// Placeholder recording that an empty rule matched `group`.
    fn mention(group: &str, source_order: u32) -> Self {
        Self {
            priority: CascadePriority::new(Origin::UserAgent, false, Specificity::default(), source_order),
            declaration_index: 0,
            group: group.to_owned(),
            declaration: Declaration {
                property: String::new(),
                value: String::new(),
                important: false,
            },
        }
    }
}

/// Top-level rule parser: qualified rules yield their prelude text and
/// declarations, at-rules are dropped.
struct RuleCollector;

impl AtRuleParser<'_> for RuleCollector {
    type Prelude = ();
    type AtRule = (String, Vec<Declaration>);
    type Error = ();

    fn parse_prelude<'input>(
        &mut self,
        name: CowRcStr<'input>,
        input: &mut Parser<'input, '_>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        debug!("cascade: skipping at-rule @{name}");
        while input.next().is_ok() {}
        Ok(())
    }

    fn parse_block<'input>(
        &mut self,
        _prelude: Self::Prelude,
        _state: &ParserState,
        input: &mut Parser<'input, '_>,
    ) -> Result<Self::AtRule, ParseError<'input, Self::Error>> {
        Err(input.new_error(BasicParseErrorKind::AtRuleBodyInvalid))
    }

    fn rule_without_block(
        &mut self,
        _prelude: Self::Prelude,
        _state: &ParserState,
    ) -> Result<Self::AtRule, Self::Error> {
        Err(())
    }
}

impl QualifiedRuleParser<'_> for RuleCollector {
    type Prelude = String;
    type QualifiedRule = (String, Vec<Declaration>);
    type Error = ();

    fn parse_prelude<'input>(
        &mut self,
        input: &mut Parser<'input, '_>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        let mut prelude = String::new();
        serialize_tokens(input, &mut prelude);
        Ok(prelude.trim().to_owned())
    }

    fn parse_block<'input>(
        &mut self,
        prelude: Self::Prelude,
        _state: &ParserState,
        input: &mut Parser<'input, '_>,
    ) -> Result<Self::QualifiedRule, ParseError<'input, Self::Error>> {
        Ok((prelude, parse_declaration_list(input)))
    }
}

/// Re-serialize the remaining tokens of `input` into `out`, dropping comments
/// and descending into nested blocks.
fn serialize_tokens<'input>(input: &mut Parser<'input, '_>, out: &mut String) {
    while let Ok(token) = input.next_including_whitespace() {
        let token = token.clone();
        out.push_str(&token.to_css_string());
        let close = match token {
            Token::Function(_) | Token::ParenthesisBlock => ")",
            Token::SquareBracketBlock => "]",
            Token::CurlyBracketBlock => "}",
            _ => continue,
        };
        let nested = input.parse_nested_block(|block| {
            serialize_tokens(block, out);
            Ok::<_, ParseError<'input, ()>>(())
        });
        if nested.is_ok() {
            out.push_str(close);
        }
    }
}
