// SPDX-License-Identifier: MIT

//! Values produced by expression evaluation

use std::fmt;

use super::pattern::Pattern;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    String(String),
    Pattern(Pattern),
}

impl Value {
    /// Truthiness used by `&&` and `||`: only `null` and `false` are falsy
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    /// Whether a statement holds: like `is_truthy`, but an empty string is
    /// also absent
    pub fn is_present(&self) -> bool {
        match self {
            Value::Null | Value::Bool(false) => false,
            Value::String(s) => !s.is_empty(),
            Value::Bool(true) | Value::Pattern(_) => true,
        }
    }

    /// Text used as the left side of a match; `null` matches as `""`
    pub fn as_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::String(s) => s.clone(),
            Value::Pattern(p) => p.source().to_string(),
        }
    }

    /// Pattern used as the right side of a match
    ///
    /// Strings are accepted when they hold a valid `/pattern/` literal, so a
    /// pattern can be stored in a variable.
    pub fn to_pattern(&self) -> Option<Pattern> {
        match self {
            Value::Pattern(p) => Some(p.clone()),
            Value::String(s) => Pattern::fabricate(s),
            Value::Null | Value::Bool(_) => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Option<&str>> for Value {
    fn from(s: Option<&str>) -> Self {
        s.map(|s| Value::String(s.to_string())).unwrap_or(Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Pattern(p) => write!(f, "{}", p),
        }
    }
}
