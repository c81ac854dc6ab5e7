// SPDX-License-Identifier: MIT

//! Lexeme registry for CI variable expressions
//!
//! Every lexeme kind is listed in [`LexemeKind::ALL`] together with the
//! pattern that recognises it. The lexer walks that list in order, so there
//! is no name-based lookup of lexeme types at runtime.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use super::pattern::Pattern;
use crate::ci::error::ExpressionError;

/// A lexed token
#[derive(Debug, Clone, PartialEq)]
pub enum Lexeme {
    /// `$NAME`
    Variable(String),
    /// `"text"` or `'text'`
    String(String),
    /// `/source/flags`
    Pattern(Pattern),
    /// `null`
    Null,
    Operator(Operator),
    ParenthesisOpen,
    ParenthesisClose,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// ==
    Equals,
    /// !=
    NotEquals,
    /// =~
    Matches,
    /// !~
    NotMatches,
    /// &&
    And,
    /// ||
    Or,
}

impl Operator {
    /// Binding strength; lower values bind tighter
    pub fn precedence(self) -> u8 {
        match self {
            Operator::Equals | Operator::NotEquals | Operator::Matches | Operator::NotMatches => 10,
            Operator::And => 11,
            Operator::Or => 12,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Equals => "==",
            Operator::NotEquals => "!=",
            Operator::Matches => "=~",
            Operator::NotMatches => "!~",
            Operator::And => "&&",
            Operator::Or => "||",
        }
    }

    /// Logical operators short-circuit and yield operand values
    pub fn is_logical(self) -> bool {
        matches!(self, Operator::And | Operator::Or)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Kinds of lexeme, in the order the lexer tries them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexemeKind {
    Variable,
    String,
    Pattern,
    Null,
    ParenthesisOpen,
    ParenthesisClose,
    Equals,
    NotEquals,
    Matches,
    NotMatches,
    And,
    Or,
}

static PATTERNS: Lazy<Vec<(LexemeKind, Regex)>> = Lazy::new(|| {
    LexemeKind::ALL
        .iter()
        .map(|kind| {
            let regex = Regex::new(kind.source()).expect("invalid lexeme pattern");
            (*kind, regex)
        })
        .collect()
});

impl LexemeKind {
    pub const ALL: [LexemeKind; 12] = [
        LexemeKind::Variable,
        LexemeKind::String,
        LexemeKind::Pattern,
        LexemeKind::Null,
        LexemeKind::ParenthesisOpen,
        LexemeKind::ParenthesisClose,
        LexemeKind::Equals,
        LexemeKind::NotEquals,
        LexemeKind::Matches,
        LexemeKind::NotMatches,
        LexemeKind::And,
        LexemeKind::Or,
    ];

    fn source(self) -> &'static str {
        match self {
            LexemeKind::Variable => r"^\$(?P<name>\w+)",
            LexemeKind::String => r#"^(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)')"#,
            LexemeKind::Pattern => r"^/(?P<source>(?:[^/\\\n]|\\.)+)/(?P<flags>[ismx]*)",
            LexemeKind::Null => r"^null\b",
            LexemeKind::ParenthesisOpen => r"^\(",
            LexemeKind::ParenthesisClose => r"^\)",
            LexemeKind::Equals => r"^==",
            LexemeKind::NotEquals => r"^!=",
            LexemeKind::Matches => r"^=~",
            LexemeKind::NotMatches => r"^!~",
            LexemeKind::And => r"^&&",
            LexemeKind::Or => r"^\|\|",
        }
    }

    /// Try to recognise this kind at the start of `input`.
    ///
    /// Returns the lexeme and the number of bytes it consumed.
    pub fn scan(self, input: &str) -> Result<Option<(Lexeme, usize)>, ExpressionError> {
        let regex = PATTERNS
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, regex)| regex)
            .ok_or_else(|| ExpressionError::Incomplete(format!("no pattern for {:?}", self)))?;

        let Some(caps) = regex.captures(input) else {
            return Ok(None);
        };
        let consumed = caps.get(0).map(|m| m.end()).unwrap_or(0);

        let lexeme = match self {
            LexemeKind::Variable => Lexeme::Variable(caps["name"].to_string()),
            LexemeKind::String => {
                let text = caps
                    .name("dq")
                    .or_else(|| caps.name("sq"))
                    .map(|m| m.as_str())
                    .unwrap_or_default();
                Lexeme::String(text.to_string())
            }
            LexemeKind::Pattern => Lexeme::Pattern(Pattern::new(&caps["source"], &caps["flags"])?),
            LexemeKind::Null => Lexeme::Null,
            LexemeKind::ParenthesisOpen => Lexeme::ParenthesisOpen,
            LexemeKind::ParenthesisClose => Lexeme::ParenthesisClose,
            LexemeKind::Equals => Lexeme::Operator(Operator::Equals),
            LexemeKind::NotEquals => Lexeme::Operator(Operator::NotEquals),
            LexemeKind::Matches => Lexeme::Operator(Operator::Matches),
            LexemeKind::NotMatches => Lexeme::Operator(Operator::NotMatches),
            LexemeKind::And => Lexeme::Operator(Operator::And),
            LexemeKind::Or => Lexeme::Operator(Operator::Or),
        };

        Ok(Some((lexeme, consumed)))
    }
}

impl fmt::Display for Lexeme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lexeme::Variable(name) => write!(f, "${}", name),
            Lexeme::String(text) => write!(f, "{:?}", text),
            Lexeme::Pattern(pattern) => write!(f, "{}", pattern),
            Lexeme::Null => f.write_str("null"),
            Lexeme::Operator(op) => write!(f, "{}", op),
            Lexeme::ParenthesisOpen => f.write_str("("),
            Lexeme::ParenthesisClose => f.write_str(")"),
        }
    }
}
