//! Minimal stylesheet for computed style lookup
//!
//! Components never paint anything; they only need to ask "what would the
//! browser compute for this property right now", mostly for
//! `transition-duration` and `transition-delay` while marker classes are on
//! the element. A stylesheet is a list of rules:
//!
//! ```css
//! /* block comments are allowed */
//! .fade-enter-active, .fade-leave-active {
//!     transition-duration: 150ms;
//!     transition-delay: 0s;
//! }
//! ```
//!
//! Resolution picks the matching rule with the highest selector specificity,
//! later rules winning ties. Inline style is applied on top by
//! [`Document::computed_style`](crate::document::Document::computed_style).

use indexmap::IndexMap;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while1},
    character::complete::{char, multispace1},
    combinator::{all_consuming, opt, value},
    error::{context, ParseError as NomParseError, VerboseError},
    multi::many0,
    sequence::delimited,
    Finish, IResult,
};

use crate::document::Element;
use crate::error::Result;
use crate::selector::{css_error, selector_list, ParseResult, Selector, Specificity};

/// A single `selectors { declarations }` rule
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleRule {
    pub selectors: Vec<Selector>,
    pub declarations: IndexMap<String, String>,
}

impl StyleRule {
    /// Highest specificity among this rule's selectors that match `element`
    fn matching_specificity(&self, element: &Element) -> Option<Specificity> {
        self.selectors
            .iter()
            .filter(|selector| selector.matches(element))
            .map(Selector::specificity)
            .max()
    }
}

/// Ordered collection of style rules
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stylesheet {
    rules: Vec<StyleRule>,
}

impl Stylesheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(css: &str) -> Result<Self> {
        let (_, rules) = all_consuming(delimited(ws, many0(style_rule), ws))(css)
            .finish()
            .map_err(|err| css_error(css, err))?;
        tracing::debug!(rules = rules.len(), "parsed stylesheet");
        Ok(Self { rules })
    }

    /// Append all rules of `other` after the existing ones
    pub fn extend(&mut self, other: Stylesheet) {
        self.rules.extend(other.rules);
    }

    pub fn rules(&self) -> &[StyleRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Resolve `property` for `element` from the rules alone
    pub fn resolve(&self, element: &Element, property: &str) -> Option<&str> {
        let mut best: Option<(Specificity, &str)> = None;
        for rule in &self.rules {
            let Some(value) = rule.declarations.get(property) else {
                continue;
            };
            let Some(specificity) = rule.matching_specificity(element) else {
                continue;
            };
            // >= so that later rules win ties
            if best.map_or(true, |(current, _)| specificity >= current) {
                best = Some((specificity, value.as_str()));
            }
        }
        best.map(|(_, value)| value)
    }
}

// ============================================================================
// Parsers
// ============================================================================

/// Skip whitespace and comments
fn ws<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, (), E> {
    value(
        (),
        many0(alt((value((), multispace1), value((), parse_comment)))),
    )(input)
}

/// Parse a block comment /* ... */
fn parse_comment<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    delimited(tag("/*"), take_until("*/"), tag("*/"))(input)
}

fn property_name(input: &str) -> ParseResult<&str> {
    context(
        "property name",
        take_while1(|c: char| c.is_alphanumeric() || c == '-' || c == '_'),
    )(input)
}

/// Parse a property value (everything until ; or })
fn property_value(input: &str) -> ParseResult<&str> {
    let (input, value) = context(
        "property value",
        take_while1(|c: char| c != ';' && c != '}'),
    )(input)?;
    Ok((input, value.trim()))
}

/// Parse a single property declaration: name: value;
fn property_declaration(input: &str) -> ParseResult<(&str, &str)> {
    let (input, _) = ws::<VerboseError<&str>>(input)?;
    let (input, name) = property_name(input)?;
    let (input, _) = ws::<VerboseError<&str>>(input)?;
    let (input, _) = context("colon after property name", char(':'))(input)?;
    let (input, _) = ws::<VerboseError<&str>>(input)?;
    let (input, value) = property_value(input)?;
    let (input, _) = ws::<VerboseError<&str>>(input)?;
    let (input, _) = opt(char(';'))(input)?;
    Ok((input, (name, value)))
}

fn style_rule(input: &str) -> ParseResult<StyleRule> {
    let (input, _) = ws::<VerboseError<&str>>(input)?;
    let (input, selectors) = selector_list(input)?;
    let (input, _) = ws::<VerboseError<&str>>(input)?;
    let (input, _) = context("opening brace", char('{'))(input)?;
    let (input, declarations) = many0(property_declaration)(input)?;
    let (input, _) = ws::<VerboseError<&str>>(input)?;
    let (input, _) = context("closing brace", char('}'))(input)?;

    let declarations = declarations
        .into_iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.to_string()))
        .collect();

    Ok((
        input,
        StyleRule {
            selectors,
            declarations,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn test_parse_rules() {
        let sheet = Stylesheet::parse(
            r#"
            /* toast transitions */
            .fade-enter-active, .fade-leave-active {
                transition-duration: 150ms;
                transition-delay: 0s
            }
            .toast { opacity: 0.9; }
            "#,
        )
        .unwrap();

        assert_eq!(sheet.len(), 2);
        let first = &sheet.rules()[0];
        assert_eq!(first.selectors.len(), 2);
        assert_eq!(first.declarations.get("transition-duration").unwrap(), "150ms");
        assert_eq!(first.declarations.get("transition-delay").unwrap(), "0s");
    }

    #[test]
    fn test_parse_empty() {
        assert!(Stylesheet::parse("").unwrap().is_empty());
        assert!(Stylesheet::parse("  /* nothing */ ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_error() {
        assert!(Stylesheet::parse(".toast { opacity: 1;").is_err());
        assert!(Stylesheet::parse("{ opacity: 1 }").is_err());
    }

    #[test]
    fn test_resolve_specificity_and_order() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        doc.add_class(el, "toast");
        doc.add_class(el, "fade-enter-active");

        doc.add_stylesheet(
            r#"
            .toast.fade-enter-active { transition-duration: 300ms; }
            .fade-enter-active { transition-duration: 150ms; }
            div { transition-duration: 1s; }
            "#,
        )
        .unwrap();

        // Two classes beat one class and a tag, despite source order
        let element = doc.element(el).unwrap();
        assert_eq!(
            doc.stylesheet().resolve(element, "transition-duration"),
            Some("300ms")
        );

        doc.add_stylesheet(".toast.fade-enter-active { transition-duration: 200ms; }")
            .unwrap();
        let element = doc.element(el).unwrap();
        assert_eq!(
            doc.stylesheet().resolve(element, "transition-duration"),
            Some("200ms")
        );
        assert_eq!(doc.stylesheet().resolve(element, "opacity"), None);
    }
}
