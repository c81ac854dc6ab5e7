// SPDX-License-Identifier: MIT

//! `/regex/flags` pattern literals

use regex::{Regex, RegexBuilder};
use std::fmt;

use crate::ci::error::ExpressionError;

/// A compiled `/source/flags` pattern
///
/// Supported flags: `i` (case insensitive), `m` and `s` (dot matches
/// newline), `x` (ignore whitespace).
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    flags: String,
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern from its parts
    pub fn new(source: &str, flags: &str) -> Result<Self, ExpressionError> {
        let mut builder = RegexBuilder::new(source);
        for flag in flags.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' | 's' => {
                    builder.dot_matches_new_line(true);
                }
                'x' => {
                    builder.ignore_whitespace(true);
                }
                other => {
                    return Err(ExpressionError::InvalidPattern {
                        pattern: format!("/{}/{}", source, flags),
                        message: format!("unknown flag `{}`", other),
                    })
                }
            }
        }

        let regex = builder
            .build()
            .map_err(|e| ExpressionError::InvalidPattern {
                pattern: format!("/{}/{}", source, flags),
                message: e.to_string(),
            })?;

        Ok(Self {
            source: source.to_string(),
            flags: flags.to_string(),
            regex,
        })
    }

    /// Parse a full `/source/flags` literal
    pub fn parse(literal: &str) -> Result<Self, ExpressionError> {
        let invalid = || ExpressionError::InvalidPattern {
            pattern: literal.to_string(),
            message: "expected /pattern/flags".to_string(),
        };

        let body = literal.strip_prefix('/').ok_or_else(invalid)?;
        let end = body.rfind('/').ok_or_else(invalid)?;
        let (source, flags) = (&body[..end], &body[end + 1..]);
        if source.is_empty() {
            return Err(invalid());
        }
        Self::new(source, flags)
    }

    /// Lenient variant used for pattern operands that come from variables:
    /// anything that is not a valid literal yields `None`
    pub fn fabricate(text: &str) -> Option<Self> {
        match Self::parse(text) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                log::debug!("Ignoring pattern operand `{}`: {}", text, e);
                None
            }
        }
    }

    /// All non-overlapping matches in `text`
    pub fn scan<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.regex.find_iter(text).map(|m| m.as_str()).collect()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.flags == other.flags
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}
