//! Patterns matched against process output.
//!
//! Matching runs over raw bytes, not decoded text: process output is
//! arbitrary bytes, and match positions must stay valid as indices into
//! the output buffer even when the output is not valid UTF-8.

use regex::bytes::Regex;

use crate::error::Result;

/// A pattern to look for in the output stream.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Exact substring match.
    Literal(String),
    /// Regular expression match.
    Regex(Regex),
}

impl Pattern {
    /// Create a literal substring pattern.
    pub fn literal(s: impl Into<String>) -> Self {
        Self::Literal(s.into())
    }

    /// Create a regex pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the regex fails to compile.
    pub fn regex(pattern: &str) -> Result<Self> {
        Ok(Self::Regex(Regex::new(pattern)?))
    }

    /// Get the pattern source text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(s) => s,
            Self::Regex(re) => re.as_str(),
        }
    }

    /// Find the first match in `data`, returning byte range and captures.
    pub(crate) fn find(&self, data: &[u8]) -> Option<PatternMatch> {
        match self {
            Self::Literal(s) => find_subslice(data, s.as_bytes()).map(|start| PatternMatch {
                start,
                end: start + s.len(),
                captures: Vec::new(),
            }),
            Self::Regex(re) => re.captures(data).map(|caps| {
                let whole = caps.get(0).map_or((0, 0), |m| (m.start(), m.end()));
                let captures = caps
                    .iter()
                    .skip(1)
                    .map(|c| {
                        c.map_or_else(String::new, |m| {
                            String::from_utf8_lossy(m.as_bytes()).into_owned()
                        })
                    })
                    .collect();
                PatternMatch {
                    start: whole.0,
                    end: whole.1,
                    captures,
                }
            }),
        }
    }
}

/// First occurrence of `needle` in `haystack`.
fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

impl From<&str> for Pattern {
    fn from(s: &str) -> Self {
        Self::literal(s)
    }
}

impl From<String> for Pattern {
    fn from(s: String) -> Self {
        Self::Literal(s)
    }
}

impl From<Regex> for Pattern {
    fn from(re: Regex) -> Self {
        Self::Regex(re)
    }
}

/// Byte range and captures of a raw pattern match.
#[derive(Debug, Clone)]
pub(crate) struct PatternMatch {
    pub start: usize,
    pub end: usize,
    pub captures: Vec<String>,
}

/// A successful match against the output stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Output preceding the match, consumed from the buffer.
    pub before: String,
    /// The matched text.
    pub matched: String,
    /// Regex capture groups, if any.
    pub captures: Vec<String>,
}
