//! Text addition rules.
//!
//! A [`TextAddition`] describes one insertion: the text, which end of the file
//! it goes to, and an optional regex the file must (or must not) contain.

use regex::{Regex, RegexBuilder};
use std::fmt;
use thiserror::Error;

/// Which end of the file an addition targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Prepend,
    Append,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Prepend => "prepend",
            Position::Append => "append",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("invalid regex '{pattern}': {source}")]
pub struct PatternError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// A compiled "must contain" regex.
///
/// Matching is an unanchored search with `^`/`$` matching at line boundaries
/// and `.` matching newlines.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: impl Into<String>) -> Result<Self, PatternError> {
        let source = source.into();
        let regex = RegexBuilder::new(&source)
            .multi_line(true)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| PatternError {
                pattern: source.clone(),
                source: e,
            })?;
        Ok(Self { source, regex })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, content: &str) -> bool {
        self.regex.is_match(content)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

/// One configured insertion rule. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "TextAddition does nothing until handed to apply_additions()"]
pub struct TextAddition {
    text: Option<String>,
    contains: Option<Pattern>,
    inverted: bool,
    position: Position,
    same_line: bool,
}

impl TextAddition {
    pub fn new(position: Position, text: Option<String>) -> Self {
        Self {
            text,
            contains: None,
            inverted: false,
            position,
            same_line: false,
        }
    }

    pub fn prepend(text: impl Into<String>) -> Self {
        Self::new(Position::Prepend, Some(text.into()))
    }

    pub fn append(text: impl Into<String>) -> Self {
        Self::new(Position::Append, Some(text.into()))
    }

    /// Only apply when the file matches `regex`.
    pub fn when_contains(self, regex: &str) -> Result<Self, PatternError> {
        Ok(self.with_pattern(Some(Pattern::new(regex)?)))
    }

    pub fn with_pattern(mut self, pattern: Option<Pattern>) -> Self {
        self.contains = pattern;
        self
    }

    pub fn with_text(mut self, text: Option<String>) -> Self {
        self.text = text;
        self
    }

    /// Flip the match condition: apply only when the file does NOT match.
    pub fn inverted(mut self) -> Self {
        self.inverted = true;
        self
    }

    pub fn same_line(mut self) -> Self {
        self.same_line = true;
        self
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn pattern(&self) -> Option<&Pattern> {
        self.contains.as_ref()
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_prepend(&self) -> bool {
        self.position == Position::Prepend
    }

    pub fn is_same_line(&self) -> bool {
        self.same_line
    }

    /// Whether the addition applies given the outcome of the content match.
    pub fn decide(&self, contains: bool) -> bool {
        contains ^ self.inverted
    }
}
