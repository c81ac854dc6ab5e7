// SPDX-License-Identifier: MIT

//! Expression tree for CI variable expressions

use std::fmt;

use super::lexeme::Operator;
use super::pattern::Pattern;

/// An immutable expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// `$NAME`, resolved against the variable context
    Variable(String),
    /// String literal
    String(String),
    /// Pattern literal
    Pattern(Pattern),
    /// `null`
    Null,
    /// `left op right`
    Binary {
        op: Operator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

impl Expression {
    pub fn binary(op: Operator, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Names of every variable referenced by the tree
    pub fn variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expression::Variable(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Expression::Binary { left, right, .. } => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
            _ => {}
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Variable(name) => write!(f, "${}", name),
            Expression::String(text) => write!(f, "{:?}", text),
            Expression::Pattern(pattern) => write!(f, "{}", pattern),
            Expression::Null => f.write_str("null"),
            Expression::Binary { op, left, right } => write!(f, "({} {} {})", left, op, right),
        }
    }
}
