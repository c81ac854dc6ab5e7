// SPDX-License-Identifier: MIT

//! Expression parser
//!
//! Lexemes are reordered into reverse polish notation with the
//! shunting-yard algorithm, using [`Operator::precedence`], and the tree is
//! then built from the RPN sequence. Parses expressions like:
//! - `$CI_COMMIT_REF_NAME == "main"`
//! - `$CI_COMMIT_TAG =~ /^v\d+/ && $DEPLOY != null`
//! - `($A || $B) && $C`

use super::ast::Expression;
use super::lexeme::{Lexeme, Operator};
use super::lexer::tokenize;
use crate::ci::error::ExpressionError;

/// Parse an expression string into a tree
pub fn parse(input: &str) -> Result<Expression, ExpressionError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ExpressionError::Empty);
    }

    let rpn = to_rpn(tokens)?;
    build_tree(rpn)
}

enum Pending {
    Operator(Operator),
    Parenthesis,
}

/// Reorder infix lexemes into reverse polish notation
pub fn to_rpn(tokens: Vec<Lexeme>) -> Result<Vec<Lexeme>, ExpressionError> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Pending> = Vec::new();
    let mut expect_operand = true;

    for token in tokens {
        match token {
            Lexeme::Operator(op) => {
                if expect_operand {
                    return Err(ExpressionError::Incomplete(format!(
                        "missing left operand for `{}`",
                        op
                    )));
                }
                while let Some(Pending::Operator(top)) = stack.last() {
                    if top.precedence() > op.precedence() {
                        break;
                    }
                    output.push(Lexeme::Operator(*top));
                    stack.pop();
                }
                stack.push(Pending::Operator(op));
                expect_operand = true;
            }
            Lexeme::ParenthesisOpen => {
                if !expect_operand {
                    return Err(ExpressionError::Incomplete(
                        "missing operator before `(`".to_string(),
                    ));
                }
                stack.push(Pending::Parenthesis);
            }
            Lexeme::ParenthesisClose => {
                if expect_operand {
                    return Err(ExpressionError::Incomplete(
                        "missing operand before `)`".to_string(),
                    ));
                }
                loop {
                    match stack.pop() {
                        Some(Pending::Operator(op)) => output.push(Lexeme::Operator(op)),
                        Some(Pending::Parenthesis) => break,
                        None => return Err(ExpressionError::UnbalancedParenthesis),
                    }
                }
            }
            operand => {
                if !expect_operand {
                    return Err(ExpressionError::Incomplete(format!(
                        "missing operator before `{}`",
                        operand
                    )));
                }
                output.push(operand);
                expect_operand = false;
            }
        }
    }

    if expect_operand {
        return Err(ExpressionError::Incomplete(
            "expression ends with an operator".to_string(),
        ));
    }

    while let Some(pending) = stack.pop() {
        match pending {
            Pending::Operator(op) => output.push(Lexeme::Operator(op)),
            Pending::Parenthesis => return Err(ExpressionError::UnbalancedParenthesis),
        }
    }

    Ok(output)
}

/// Build a tree from lexemes in reverse polish notation
pub fn build_tree(rpn: Vec<Lexeme>) -> Result<Expression, ExpressionError> {
    let mut stack: Vec<Expression> = Vec::new();

    for lexeme in rpn {
        let node = match lexeme {
            Lexeme::Variable(name) => Expression::Variable(name),
            Lexeme::String(text) => Expression::String(text),
            Lexeme::Pattern(pattern) => Expression::Pattern(pattern),
            Lexeme::Null => Expression::Null,
            Lexeme::Operator(op) => {
                let right = stack.pop();
                let left = stack.pop();
                match (left, right) {
                    (Some(left), Some(right)) => Expression::binary(op, left, right),
                    _ => {
                        return Err(ExpressionError::Incomplete(format!(
                            "`{}` needs two operands",
                            op
                        )))
                    }
                }
            }
            Lexeme::ParenthesisOpen | Lexeme::ParenthesisClose => {
                return Err(ExpressionError::UnbalancedParenthesis)
            }
        };
        stack.push(node);
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(root), true) => Ok(root),
        (None, _) => Err(ExpressionError::Empty),
        (Some(_), false) => Err(ExpressionError::Incomplete(
            "operands without an operator".to_string(),
        )),
    }
}
