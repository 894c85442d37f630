//! Filter expression parser for the in-memory index.
//!
//! Supported syntax, one or more clauses separated by whitespace or `AND`,
//! all of which must hold:
//!
//! - Match everything: `*:*`
//! - Exact value: `category:news`, `title:"hello world"`
//! - Field presence: `category:*`
//! - Ranges: `year:[2020 TO 2023]` (inclusive), `price:{10 TO *}` (exclusive, open)
//! - Negation: `-category:spam`, `NOT category:spam`
//! - A leading `+` is accepted and ignored
//!
//! Values compare numerically when both sides parse as numbers and as
//! strings otherwise.
//!
//! # Examples
//!
//! ```
//! use relata::index::filter_parser::FilterParser;
//!
//! let filter = FilterParser::new().parse("category:news -year:[* TO 2000]").unwrap();
//! assert_eq!(filter.clauses().len(), 2);
//!
//! assert!(FilterParser::new().parse("category:").is_err());
//! ```

use std::cmp::Ordering;
use std::iter::Peekable;
use std::ops::Bound;
use std::str::Chars;

use crate::document::{FieldValue, StoredDocument};
use crate::error::{RelataError, Result};

/// A single filter clause.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterClause {
    /// Matches every document.
    MatchAll,
    /// Field has a value equal to the given one.
    Term { field: String, value: String },
    /// Field has at least one value.
    Exists { field: String },
    /// Field has a value within the bounds.
    Range {
        field: String,
        lower: Bound<String>,
        upper: Bound<String>,
    },
    /// Negated clause.
    Not(Box<FilterClause>),
}

impl FilterClause {
    /// Check the clause against a stored document.
    pub fn matches(&self, doc: &StoredDocument) -> bool {
        match self {
            FilterClause::MatchAll => true,
            FilterClause::Term { field, value } => doc
                .get_field(field)
                .is_some_and(|values| values.iter().any(|v| value_equals(v, value))),
            FilterClause::Exists { field } => {
                doc.get_field(field).is_some_and(|values| !values.is_empty())
            }
            FilterClause::Range {
                field,
                lower,
                upper,
            } => doc.get_field(field).is_some_and(|values| {
                values
                    .iter()
                    .any(|v| within_lower(v, lower) && within_upper(v, upper))
            }),
            FilterClause::Not(inner) => !inner.matches(doc),
        }
    }
}

/// A parsed filter expression: a conjunction of clauses.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpr {
    clauses: Vec<FilterClause>,
}

impl FilterExpr {
    /// The clauses of this expression.
    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    /// Check the expression against a stored document.
    pub fn matches(&self, doc: &StoredDocument) -> bool {
        self.clauses.iter().all(|clause| clause.matches(doc))
    }
}

/// Parser for filter expressions.
#[derive(Debug, Default)]
pub struct FilterParser;

impl FilterParser {
    /// Create a new filter parser.
    pub fn new() -> Self {
        FilterParser
    }

    /// Parse a filter expression.
    pub fn parse(&self, expression: &str) -> Result<FilterExpr> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(RelataError::parse("Empty filter expression"));
        }

        let mut parser = FilterStringParser::new(trimmed);
        let clauses = parser.parse()?;
        Ok(FilterExpr { clauses })
    }
}

/// Internal parser for filter strings.
struct FilterStringParser<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> FilterStringParser<'a> {
    fn new(expression: &'a str) -> Self {
        FilterStringParser {
            chars: expression.chars().peekable(),
        }
    }

    fn parse(&mut self) -> Result<Vec<FilterClause>> {
        let mut clauses = Vec::new();

        loop {
            self.skip_whitespace();
            if self.chars.peek().is_none() {
                break;
            }

            match self.peek_word().as_deref() {
                Some("AND") => {
                    self.consume_word();
                    if clauses.is_empty() {
                        return Err(RelataError::parse("Filter cannot start with AND"));
                    }
                    continue;
                }
                Some("OR") => {
                    return Err(RelataError::parse(
                        "OR is not supported in filter expressions",
                    ));
                }
                _ => {}
            }

            clauses.push(self.parse_clause()?);
        }

        if clauses.is_empty() {
            return Err(RelataError::parse("Empty filter expression"));
        }

        Ok(clauses)
    }

    fn parse_clause(&mut self) -> Result<FilterClause> {
        match self.chars.peek() {
            Some('-') => {
                self.chars.next();
                let inner = self.parse_atom()?;
                return Ok(FilterClause::Not(Box::new(inner)));
            }
            Some('+') => {
                self.chars.next();
                return self.parse_atom();
            }
            Some('(') | Some(')') => {
                return Err(RelataError::parse(
                    "Grouping is not supported in filter expressions",
                ));
            }
            _ => {}
        }

        if self.peek_word().as_deref() == Some("NOT") {
            self.consume_word();
            self.skip_whitespace();
            let inner = self.parse_atom()?;
            return Ok(FilterClause::Not(Box::new(inner)));
        }

        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<FilterClause> {
        let field = self.parse_field()?;

        match self.chars.peek() {
            Some('[') | Some('{') => self.parse_range(field),
            Some('"') => {
                let value = self.parse_quoted()?;
                Ok(FilterClause::Term { field, value })
            }
            Some(c) if c.is_whitespace() => Err(RelataError::parse(format!(
                "Missing value for field '{field}'"
            ))),
            None => Err(RelataError::parse(format!(
                "Missing value for field '{field}'"
            ))),
            Some(_) => {
                let value = self.parse_bare(|c| c.is_whitespace());
                match (field.as_str(), value.as_str()) {
                    ("*", "*") => Ok(FilterClause::MatchAll),
                    ("*", _) => Err(RelataError::parse("Wildcard field requires '*:*'")),
                    (_, "*") => Ok(FilterClause::Exists { field }),
                    _ => Ok(FilterClause::Term { field, value }),
                }
            }
        }
    }

    fn parse_field(&mut self) -> Result<String> {
        let mut field = String::new();

        while let Some(&ch) = self.chars.peek() {
            if ch == ':' {
                self.chars.next();
                if field.is_empty() {
                    return Err(RelataError::parse("Missing field name before ':'"));
                }
                return Ok(field);
            }
            if ch.is_whitespace() || matches!(ch, '"' | '[' | ']' | '{' | '}' | '(' | ')') {
                break;
            }
            field.push(ch);
            self.chars.next();
        }

        Err(RelataError::parse(format!(
            "Expected 'field:value', found '{field}'"
        )))
    }

    fn parse_range(&mut self, field: String) -> Result<FilterClause> {
        let inclusive_lower = self.chars.next() == Some('[');

        self.skip_whitespace();
        let lower = self.parse_bound()?;
        self.skip_whitespace();

        if self.peek_word().as_deref() != Some("TO") {
            return Err(RelataError::parse(format!(
                "Expected 'TO' in range for field '{field}'"
            )));
        }
        self.consume_word();
        self.skip_whitespace();

        let upper = self.parse_bound()?;
        self.skip_whitespace();

        let inclusive_upper = match self.chars.next() {
            Some(']') => true,
            Some('}') => false,
            _ => {
                return Err(RelataError::parse(format!(
                    "Unterminated range for field '{field}'"
                )));
            }
        };

        Ok(FilterClause::Range {
            field,
            lower: to_bound(lower, inclusive_lower),
            upper: to_bound(upper, inclusive_upper),
        })
    }

    fn parse_bound(&mut self) -> Result<Option<String>> {
        let value = if self.chars.peek() == Some(&'"') {
            self.parse_quoted()?
        } else {
            self.parse_bare(|c| c.is_whitespace() || matches!(c, ']' | '}'))
        };

        match value.as_str() {
            "" => Err(RelataError::parse("Missing range bound")),
            "*" => Ok(None),
            _ => Ok(Some(value)),
        }
    }

    fn parse_quoted(&mut self) -> Result<String> {
        self.chars.next(); // opening quote
        let mut value = String::new();

        while let Some(ch) = self.chars.next() {
            match ch {
                '"' => return Ok(value),
                '\\' => {
                    if let Some(escaped) = self.chars.next() {
                        value.push(escaped);
                    }
                }
                _ => value.push(ch),
            }
        }

        Err(RelataError::parse("Unterminated quoted value"))
    }

    fn parse_bare(&mut self, stop: impl Fn(char) -> bool) -> String {
        let mut value = String::new();

        while let Some(&ch) = self.chars.peek() {
            if stop(ch) {
                break;
            }
            if ch == '\\' {
                self.chars.next();
                if let Some(escaped) = self.chars.next() {
                    value.push(escaped);
                }
                continue;
            }
            value.push(ch);
            self.chars.next();
        }

        value
    }

    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    /// Peek at the next whitespace-delimited word without consuming it.
    fn peek_word(&self) -> Option<String> {
        let word: String = self
            .chars
            .clone()
            .take_while(|c| !c.is_whitespace())
            .collect();
        if word.is_empty() { None } else { Some(word) }
    }

    fn consume_word(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() {
                break;
            }
            self.chars.next();
        }
    }
}

fn to_bound(value: Option<String>, inclusive: bool) -> Bound<String> {
    match value {
        None => Bound::Unbounded,
        Some(v) if inclusive => Bound::Included(v),
        Some(v) => Bound::Excluded(v),
    }
}

fn value_equals(stored: &FieldValue, expected: &str) -> bool {
    if let (Some(a), Ok(b)) = (stored.as_f64(), expected.parse::<f64>()) {
        return a == b;
    }
    stored.to_string() == expected
}

fn compare(stored: &FieldValue, bound: &str) -> Option<Ordering> {
    if let (Some(a), Ok(b)) = (stored.as_f64(), bound.parse::<f64>()) {
        return a.partial_cmp(&b);
    }
    Some(stored.to_string().as_str().cmp(bound))
}

fn within_lower(stored: &FieldValue, lower: &Bound<String>) -> bool {
    match lower {
        Bound::Unbounded => true,
        Bound::Included(b) => matches!(
            compare(stored, b),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Bound::Excluded(b) => matches!(compare(stored, b), Some(Ordering::Greater)),
    }
}

fn within_upper(stored: &FieldValue, upper: &Bound<String>) -> bool {
    match upper {
        Bound::Unbounded => true,
        Bound::Included(b) => matches!(compare(stored, b), Some(Ordering::Less | Ordering::Equal)),
        Bound::Excluded(b) => matches!(compare(stored, b), Some(Ordering::Less)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> StoredDocument {
        StoredDocument::builder("d1")
            .add_text("category", "news")
            .add_text("category", "tech")
            .add_text("title", "hello world")
            .add_integer("year", 2021)
            .build()
    }

    #[test]
    fn test_term_clause() {
        let parser = FilterParser::new();
        let filter = parser.parse("category:news").unwrap();

        assert_eq!(
            filter.clauses(),
            &[FilterClause::Term {
                field: "category".to_string(),
                value: "news".to_string()
            }]
        );
        assert!(filter.matches(&doc()));
        assert!(!parser.parse("category:sports").unwrap().matches(&doc()));
    }

    #[test]
    fn test_multi_valued_field_matches_any_value() {
        let parser = FilterParser::new();
        assert!(parser.parse("category:tech").unwrap().matches(&doc()));
    }

    #[test]
    fn test_quoted_value() {
        let parser = FilterParser::new();
        assert!(parser.parse("title:\"hello world\"").unwrap().matches(&doc()));
        assert!(!parser.parse("title:hello").unwrap().matches(&doc()));
    }

    #[test]
    fn test_numeric_term() {
        let parser = FilterParser::new();
        assert!(parser.parse("year:2021").unwrap().matches(&doc()));
        assert!(parser.parse("year:2021.0").unwrap().matches(&doc()));
    }

    #[test]
    fn test_ranges() {
        let parser = FilterParser::new();
        assert!(parser.parse("year:[2020 TO 2023]").unwrap().matches(&doc()));
        assert!(parser.parse("year:[2021 TO 2021]").unwrap().matches(&doc()));
        assert!(!parser.parse("year:{2021 TO 2023]").unwrap().matches(&doc()));
        assert!(parser.parse("year:[* TO 2030}").unwrap().matches(&doc()));
        assert!(!parser.parse("year:[2022 TO *]").unwrap().matches(&doc()));
        assert!(parser.parse("category:[a TO o]").unwrap().matches(&doc()));
    }

    #[test]
    fn test_negation_and_conjunction() {
        let parser = FilterParser::new();
        assert!(!parser.parse("-category:news").unwrap().matches(&doc()));
        assert!(parser.parse("NOT category:sports").unwrap().matches(&doc()));
        assert!(
            parser
                .parse("+category:news AND year:[2000 TO *]")
                .unwrap()
                .matches(&doc())
        );
        assert!(
            !parser
                .parse("category:news year:[* TO 2000]")
                .unwrap()
                .matches(&doc())
        );
    }

    #[test]
    fn test_match_all_and_exists() {
        let parser = FilterParser::new();
        assert_eq!(
            parser.parse("*:*").unwrap().clauses(),
            &[FilterClause::MatchAll]
        );
        assert!(parser.parse("year:*").unwrap().matches(&doc()));
        assert!(!parser.parse("author:*").unwrap().matches(&doc()));
    }

    #[test]
    fn test_malformed_expressions() {
        let parser = FilterParser::new();
        for expression in [
            "",
            "   ",
            "category",
            "category:",
            ":news",
            "title:\"unterminated",
            "year:[2020 2023]",
            "year:[2020 TO 2023",
            "category:news OR category:tech",
            "(category:news)",
            "AND category:news",
            "*:news",
        ] {
            assert!(
                parser.parse(expression).is_err(),
                "expected parse error for {expression:?}"
            );
        }
    }
}
