//! Compound selector parsing and matching
//!
//! Supports the subset of CSS selectors that components need for event
//! delegation and stylesheet rules:
//!
//! - Type and universal selectors: `button`, `*`
//! - Class selectors: `.toast`
//! - ID selectors: `#status`
//! - Attribute selectors: `[data-dismiss]`, `[data-dismiss="toast"]`
//!
//! Parts can be combined into a compound selector (`button.close[data-dismiss="toast"]`)
//! and compound selectors can be grouped with commas. Combinators (descendant,
//! child, sibling) are not supported.
//!
//! # Example
//!
//! ```ignore
//! use glint_core::selector::Selector;
//!
//! let selector = Selector::parse(r#"[data-dismiss="toast"]"#)?;
//! assert!(selector.matches(document.element(button).unwrap()));
//! ```

use std::fmt;
use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{all_consuming, cut, map, opt},
    error::{context, VerboseError, VerboseErrorKind},
    multi::{many0, separated_list1},
    sequence::{delimited, preceded},
    Finish, IResult,
};
use smallvec::SmallVec;

use crate::document::Element;
use crate::error::{GlintError, Result};

pub(crate) type ParseResult<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

/// How an attribute selector constrains the attribute value
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttributeMatch {
    /// `[name]` - the attribute is present
    Exists,
    /// `[name="value"]` - the attribute equals the value exactly
    Equals(String),
}

/// A compound selector such as `button.close[data-dismiss="toast"]`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    /// Tag name, `None` for `*` or when omitted
    tag: Option<String>,
    id: Option<String>,
    classes: SmallVec<[String; 2]>,
    attributes: SmallVec<[(String, AttributeMatch); 1]>,
}

/// Specificity as (ids, classes + attributes, tags)
pub type Specificity = (u32, u32, u32);

impl Selector {
    /// Parse a single compound selector
    pub fn parse(input: &str) -> Result<Self> {
        all_consuming(delimited(multispace0, compound_selector, multispace0))(input)
            .finish()
            .map(|(_, selector)| selector)
            .map_err(|err| css_error(input, err))
    }

    /// Parse a comma separated group of compound selectors
    pub fn parse_list(input: &str) -> Result<Vec<Self>> {
        all_consuming(delimited(multispace0, selector_list, multispace0))(input)
            .finish()
            .map(|(_, selectors)| selectors)
            .map_err(|err| css_error(input, err))
    }

    /// Check whether an element satisfies every part of this selector
    pub fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if !tag.eq_ignore_ascii_case(element.tag()) {
                return false;
            }
        }

        if let Some(id) = &self.id {
            if element.attribute("id") != Some(id.as_str()) {
                return false;
            }
        }

        if !self.classes.iter().all(|class| element.has_class(class)) {
            return false;
        }

        self.attributes.iter().all(|(name, expected)| {
            match (element.attribute(name), expected) {
                (Some(_), AttributeMatch::Exists) => true,
                (Some(actual), AttributeMatch::Equals(value)) => actual == value,
                (None, _) => false,
            }
        })
    }

    pub fn specificity(&self) -> Specificity {
        (
            self.id.is_some() as u32,
            (self.classes.len() + self.attributes.len()) as u32,
            self.tag.is_some() as u32,
        )
    }
}

impl FromStr for Selector {
    type Err = GlintError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{tag}")?,
            None if self.id.is_none() && self.classes.is_empty() && self.attributes.is_empty() => {
                write!(f, "*")?
            }
            None => {}
        }
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        for (name, matcher) in &self.attributes {
            match matcher {
                AttributeMatch::Exists => write!(f, "[{name}]")?,
                AttributeMatch::Equals(value) => write!(f, "[{name}=\"{value}\"]")?,
            }
        }
        Ok(())
    }
}

// ============================================================================
// Parsers
// ============================================================================

enum Part<'a> {
    Class(&'a str),
    Id(&'a str),
    Attribute(&'a str, Option<&'a str>),
}

pub(crate) fn css_error(input: &str, err: VerboseError<&str>) -> GlintError {
    let reason = err
        .errors
        .iter()
        .find_map(|(rest, kind)| match kind {
            VerboseErrorKind::Context(ctx) => Some(format!("expected {ctx} at \"{rest}\"")),
            VerboseErrorKind::Char(c) => Some(format!("expected '{c}' at \"{rest}\"")),
            VerboseErrorKind::Nom(_) => None,
        })
        .unwrap_or_else(|| "unexpected input".to_string());

    tracing::debug!(input, %reason, "css parse failed");

    GlintError::Css {
        input: input.to_string(),
        reason,
    }
}

/// Parse an identifier (alphanumeric, hyphen, underscore)
pub(crate) fn identifier(input: &str) -> ParseResult<&str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '-' || c == '_')(input)
}

fn quoted_value(input: &str) -> ParseResult<&str> {
    context(
        "attribute value",
        alt((
            delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
            delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
            identifier,
        )),
    )(input)
}

fn class_part(input: &str) -> ParseResult<Part<'_>> {
    map(
        preceded(char('.'), cut(context("class name", identifier))),
        Part::Class,
    )(input)
}

fn id_part(input: &str) -> ParseResult<Part<'_>> {
    map(preceded(char('#'), cut(context("id", identifier))), Part::Id)(input)
}

fn attribute_part(input: &str) -> ParseResult<Part<'_>> {
    let (input, _) = char('[')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, name) = cut(context("attribute name", identifier))(input)?;
    let (input, _) = multispace0(input)?;
    let (input, value) = opt(preceded(
        char('='),
        cut(delimited(multispace0, quoted_value, multispace0)),
    ))(input)?;
    let (input, _) = cut(char(']'))(input)?;
    Ok((input, Part::Attribute(name, value)))
}

/// Parse a compound selector: `tag.class#id[attr="value"]`
pub(crate) fn compound_selector(input: &str) -> ParseResult<Selector> {
    context("selector", compound_parts)(input)
}

fn compound_parts(input: &str) -> ParseResult<Selector> {
    let (input, tag) = opt(alt((map(char('*'), |_| None), map(identifier, Some))))(input)?;
    let (rest, parts) = many0(alt((class_part, id_part, attribute_part)))(input)?;

    if tag.is_none() && parts.is_empty() {
        return Err(nom::Err::Error(VerboseError {
            errors: vec![(input, VerboseErrorKind::Context("selector"))],
        }));
    }

    let mut selector = Selector {
        tag: tag.flatten().map(str::to_string),
        ..Default::default()
    };

    for part in parts {
        match part {
            Part::Class(class) => selector.classes.push(class.to_string()),
            Part::Id(id) => selector.id = Some(id.to_string()),
            Part::Attribute(name, value) => selector.attributes.push((
                name.to_string(),
                value.map_or(AttributeMatch::Exists, |v| AttributeMatch::Equals(v.to_string())),
            )),
        }
    }

    Ok((rest, selector))
}

/// Parse `a, b, c`
pub(crate) fn selector_list(input: &str) -> ParseResult<Vec<Selector>> {
    separated_list1(
        delimited(multispace0, char(','), multispace0),
        compound_selector,
    )(input)
}
