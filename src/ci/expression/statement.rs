// SPDX-License-Identifier: MIT

//! A raw expression string bound to a variable context

use super::ast::Expression;
use super::evaluator::evaluate;
use super::parser::parse;
use super::value::Value;
use crate::ci::error::ExpressionError;
use crate::ci::variables::Variables;

/// An expression statement evaluated against a set of variables
///
/// The statement re-parses its text on every evaluation; callers that need
/// to validate syntax ahead of time use [`Statement::parse`].
#[derive(Debug, Clone, Copy)]
pub struct Statement<'a> {
    text: &'a str,
    variables: &'a Variables,
}

impl<'a> Statement<'a> {
    pub fn new(text: &'a str, variables: &'a Variables) -> Self {
        Self { text, variables }
    }

    /// Parse statement text without evaluating it
    pub fn parse(text: &str) -> Result<Expression, ExpressionError> {
        parse(text)
    }

    pub fn parse_tree(&self) -> Result<Expression, ExpressionError> {
        Self::parse(self.text)
    }

    pub fn evaluate(&self) -> Result<Value, ExpressionError> {
        let tree = self.parse_tree()?;
        Ok(evaluate(&tree, self.variables))
    }

    /// Whether the statement holds; statements that fail to parse do not
    pub fn truthful(&self) -> bool {
        match self.evaluate() {
            Ok(value) => value.is_present(),
            Err(e) => {
                log::warn!("Cannot evaluate expression `{}`: {}", self.text, e);
                false
            }
        }
    }

    pub fn valid(&self) -> bool {
        self.parse_tree().is_ok()
    }

    pub fn text(&self) -> &str {
        self.text
    }
}
