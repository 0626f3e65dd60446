//! LDAP-style service filters.
//!
//! Filters use the RFC 1960 string syntax, for example
//! `(&(objectClass=org.example.Log)(vendor=acme*))`. Attribute names are
//! matched case-insensitively. A multi-valued property matches when any of
//! its values matches.
//!
//! # Examples
//!
//! ```
//! use composite_core::filter::Filter;
//! use composite_core::types::ServiceProperties;
//!
//! let filter: Filter = "(&(objectClass=org.example.Log)(ranking>=5))".parse().unwrap();
//! let properties = ServiceProperties::new()
//!     .with("objectClass", "org.example.Log")
//!     .with("ranking", 10i64);
//!
//! assert!(filter.matches(&properties));
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::types::{PropertyValue, ServiceProperties};
use crate::utils::Version;

/// Error parsing a filter string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterParseError {
    /// The invalid filter string.
    pub filter: String,

    /// Character offset of the problem.
    pub position: usize,

    /// The reason for the error.
    pub reason: String,
}

impl fmt::Display for FilterParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid filter '{}' at {}: {}",
            self.filter, self.position, self.reason
        )
    }
}

impl std::error::Error for FilterParseError {}

/// A parsed filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Filter {
    /// All sub-filters must match.
    And(Vec<Filter>),

    /// At least one sub-filter must match.
    Or(Vec<Filter>),

    /// The sub-filter must not match.
    Not(Box<Filter>),

    /// `(attr=value)`
    Equal { attribute: String, value: String },

    /// `(attr~=value)`: equality ignoring case and whitespace.
    Approx { attribute: String, value: String },

    /// `(attr>=value)`
    GreaterEq { attribute: String, value: String },

    /// `(attr<=value)`
    LessEq { attribute: String, value: String },

    /// `(attr=*)`
    Present { attribute: String },

    /// `(attr=initial*any*final)`
    Substring {
        attribute: String,
        initial: Option<String>,
        any: Vec<String>,
        last: Option<String>,
    },
}

impl Filter {
    /// Parse a filter string.
    pub fn parse(source: &str) -> Result<Self, FilterParseError> {
        let mut parser = Parser {
            source,
            chars: source.chars().collect(),
            pos: 0,
        };
        parser.skip_whitespace();
        let filter = parser.parse_filter()?;
        parser.skip_whitespace();
        if parser.pos != parser.chars.len() {
            return Err(parser.error("unexpected trailing characters"));
        }
        Ok(filter)
    }

    /// Evaluate this filter against a set of service properties.
    pub fn matches(&self, properties: &ServiceProperties) -> bool {
        match self {
            Self::And(filters) => filters.iter().all(|f| f.matches(properties)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(properties)),
            Self::Not(filter) => !filter.matches(properties),
            Self::Present { attribute } => properties.get(attribute).is_some(),
            Self::Equal { attribute, value } => {
                compare_property(properties.get(attribute), &Comparison::Equal(value))
            }
            Self::Approx { attribute, value } => {
                compare_property(properties.get(attribute), &Comparison::Approx(value))
            }
            Self::GreaterEq { attribute, value } => {
                compare_property(properties.get(attribute), &Comparison::GreaterEq(value))
            }
            Self::LessEq { attribute, value } => {
                compare_property(properties.get(attribute), &Comparison::LessEq(value))
            }
            Self::Substring {
                attribute,
                initial,
                any,
                last,
            } => {
                let pattern = SubstringPattern {
                    initial: initial.as_deref(),
                    any,
                    last: last.as_deref(),
                };
                compare_property(properties.get(attribute), &Comparison::Substring(pattern))
            }
        }
    }
}

impl FromStr for Filter {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Filter {
    type Error = FilterParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Filter> for String {
    fn from(filter: Filter) -> Self {
        filter.to_string()
    }
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '(' | ')' | '*' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And(filters) => {
                write!(f, "(&")?;
                for filter in filters {
                    write!(f, "{}", filter)?;
                }
                write!(f, ")")
            }
            Self::Or(filters) => {
                write!(f, "(|")?;
                for filter in filters {
                    write!(f, "{}", filter)?;
                }
                write!(f, ")")
            }
            Self::Not(filter) => write!(f, "(!{})", filter),
            Self::Equal { attribute, value } => write!(f, "({}={})", attribute, escape(value)),
            Self::Approx { attribute, value } => write!(f, "({}~={})", attribute, escape(value)),
            Self::GreaterEq { attribute, value } => {
                write!(f, "({}>={})", attribute, escape(value))
            }
            Self::LessEq { attribute, value } => write!(f, "({}<={})", attribute, escape(value)),
            Self::Present { attribute } => write!(f, "({}=*)", attribute),
            Self::Substring {
                attribute,
                initial,
                any,
                last,
            } => {
                write!(f, "({}=", attribute)?;
                if let Some(initial) = initial {
                    write!(f, "{}", escape(initial))?;
                }
                write!(f, "*")?;
                for part in any {
                    write!(f, "{}*", escape(part))?;
                }
                if let Some(last) = last {
                    write!(f, "{}", escape(last))?;
                }
                write!(f, ")")
            }
        }
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, reason: &str) -> FilterParseError {
        FilterParseError {
            filter: self.source.to_string(),
            position: self.pos,
            reason: reason.to_string(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), FilterParseError> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", expected)))
        }
    }

    fn parse_filter(&mut self) -> Result<Filter, FilterParseError> {
        self.expect('(')?;
        self.skip_whitespace();
        let filter = match self.peek() {
            Some('&') => {
                self.pos += 1;
                Filter::And(self.parse_list()?)
            }
            Some('|') => {
                self.pos += 1;
                Filter::Or(self.parse_list()?)
            }
            Some('!') => {
                self.pos += 1;
                self.skip_whitespace();
                Filter::Not(Box::new(self.parse_filter()?))
            }
            Some(_) => self.parse_item()?,
            None => return Err(self.error("unexpected end of filter")),
        };
        self.skip_whitespace();
        self.expect(')')?;
        Ok(filter)
    }

    fn parse_list(&mut self) -> Result<Vec<Filter>, FilterParseError> {
        let mut filters = Vec::new();
        self.skip_whitespace();
        while self.peek() == Some('(') {
            filters.push(self.parse_filter()?);
            self.skip_whitespace();
        }
        if filters.is_empty() {
            return Err(self.error("empty filter list"));
        }
        Ok(filters)
    }

    fn parse_item(&mut self) -> Result<Filter, FilterParseError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '=' | '~' | '<' | '>' | '(' | ')') {
                break;
            }
            self.pos += 1;
        }
        let attribute: String = self.chars[start..self.pos].iter().collect();
        let attribute = attribute.trim().to_string();
        if attribute.is_empty() {
            return Err(self.error("missing attribute name"));
        }

        let operator = match self.peek() {
            Some('=') => {
                self.pos += 1;
                '='
            }
            Some(op @ ('~' | '<' | '>')) => {
                self.pos += 1;
                self.expect('=')?;
                op
            }
            _ => return Err(self.error("expected a comparison operator")),
        };

        let pieces = self.parse_value()?;
        if operator != '=' {
            if pieces.len() != 1 {
                return Err(self.error("wildcards are only allowed with '='"));
            }
            let value = pieces.into_iter().next().unwrap_or_default();
            return Ok(match operator {
                '~' => Filter::Approx { attribute, value },
                '<' => Filter::LessEq { attribute, value },
                _ => Filter::GreaterEq { attribute, value },
            });
        }

        match pieces.as_slice() {
            [value] => Ok(Filter::Equal {
                attribute,
                value: value.clone(),
            }),
            [first, second] if first.is_empty() && second.is_empty() => {
                Ok(Filter::Present { attribute })
            }
            [first, middle @ .., last] => Ok(Filter::Substring {
                attribute,
                initial: Some(first.clone()).filter(|s| !s.is_empty()),
                any: middle.iter().filter(|s| !s.is_empty()).cloned().collect(),
                last: Some(last.clone()).filter(|s| !s.is_empty()),
            }),
            [] => Err(self.error("missing value")),
        }
    }

    /// Read a value up to the closing parenthesis, split on unescaped `*`.
    fn parse_value(&mut self) -> Result<Vec<String>, FilterParseError> {
        let mut pieces = vec![String::new()];
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated value")),
                Some(')') => break,
                Some('(') => return Err(self.error("unescaped '(' in value")),
                Some('*') => {
                    self.pos += 1;
                    pieces.push(String::new());
                }
                Some('\\') => {
                    self.pos += 1;
                    let escaped = self
                        .peek()
                        .ok_or_else(|| self.error("dangling escape"))?;
                    self.pos += 1;
                    if let Some(piece) = pieces.last_mut() {
                        piece.push(escaped);
                    }
                }
                Some(c) => {
                    self.pos += 1;
                    if let Some(piece) = pieces.last_mut() {
                        piece.push(c);
                    }
                }
            }
        }
        Ok(pieces)
    }
}

struct SubstringPattern<'a> {
    initial: Option<&'a str>,
    any: &'a [String],
    last: Option<&'a str>,
}

impl SubstringPattern<'_> {
    fn matches(&self, candidate: &str) -> bool {
        let mut rest = candidate;
        if let Some(initial) = self.initial {
            match rest.strip_prefix(initial) {
                Some(remaining) => rest = remaining,
                None => return false,
            }
        }
        for part in self.any {
            match rest.find(part.as_str()) {
                Some(index) => rest = &rest[index + part.len()..],
                None => return false,
            }
        }
        match self.last {
            Some(last) => rest.ends_with(last),
            None => true,
        }
    }
}

enum Comparison<'a> {
    Equal(&'a str),
    Approx(&'a str),
    GreaterEq(&'a str),
    LessEq(&'a str),
    Substring(SubstringPattern<'a>),
}

fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn compare_property(property: Option<&PropertyValue>, comparison: &Comparison<'_>) -> bool {
    match property {
        None => false,
        Some(PropertyValue::String(value)) => compare_string(value, comparison),
        Some(PropertyValue::Strings(values)) => {
            values.iter().any(|value| compare_string(value, comparison))
        }
        Some(PropertyValue::Long(value)) => compare_ordered(value, comparison, |s| {
            s.trim().parse::<i64>().ok()
        }),
        Some(PropertyValue::Version(value)) => compare_ordered(value, comparison, |s| {
            s.trim().parse::<Version>().ok()
        }),
        Some(PropertyValue::Bool(value)) => match comparison {
            Comparison::Equal(s) | Comparison::Approx(s) => {
                s.trim()
                    .eq_ignore_ascii_case(if *value { "true" } else { "false" })
            }
            _ => false,
        },
    }
}

fn compare_string(value: &str, comparison: &Comparison<'_>) -> bool {
    match comparison {
        Comparison::Equal(expected) => value == *expected,
        Comparison::Approx(expected) => normalize(value) == normalize(expected),
        Comparison::GreaterEq(expected) => value >= *expected,
        Comparison::LessEq(expected) => value <= *expected,
        Comparison::Substring(pattern) => pattern.matches(value),
    }
}

fn compare_ordered<T: Ord>(
    value: &T,
    comparison: &Comparison<'_>,
    parse: impl Fn(&str) -> Option<T>,
) -> bool {
    let (expected, accept): (&str, fn(Ordering) -> bool) = match comparison {
        Comparison::Equal(s) | Comparison::Approx(s) => (*s, |o| o == Ordering::Equal),
        Comparison::GreaterEq(s) => (*s, |o| o != Ordering::Less),
        Comparison::LessEq(s) => (*s, |o| o != Ordering::Greater),
        Comparison::Substring(_) => return false,
    };
    match parse(expected) {
        Some(expected) => accept(value.cmp(&expected)),
        None => false,
    }
}
