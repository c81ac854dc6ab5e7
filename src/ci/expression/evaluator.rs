// SPDX-License-Identifier: MIT

//! Expression evaluator
//!
//! Evaluation is post-order: both operands of a comparison are evaluated
//! before the operator combines them. Unresolved variables evaluate to
//! `null` and every operator accepts `null` operands.

use super::ast::Expression;
use super::lexeme::Operator;
use super::value::Value;
use crate::ci::variables::Variables;

/// Evaluate an expression tree against a variable context
pub fn evaluate(expr: &Expression, variables: &Variables) -> Value {
    match expr {
        Expression::Variable(name) => Value::from(variables.get(name)),
        Expression::String(text) => Value::String(text.clone()),
        Expression::Pattern(pattern) => Value::Pattern(pattern.clone()),
        Expression::Null => Value::Null,
        Expression::Binary { op, left, right } => evaluate_binary(*op, left, right, variables),
    }
}

fn evaluate_binary(op: Operator, left: &Expression, right: &Expression, variables: &Variables) -> Value {
    match op {
        Operator::And => {
            let left = evaluate(left, variables);
            if left.is_truthy() {
                evaluate(right, variables)
            } else {
                left
            }
        }
        Operator::Or => {
            let left = evaluate(left, variables);
            if left.is_truthy() {
                left
            } else {
                evaluate(right, variables)
            }
        }
        Operator::Equals => {
            Value::Bool(evaluate(left, variables) == evaluate(right, variables))
        }
        Operator::NotEquals => {
            Value::Bool(evaluate(left, variables) != evaluate(right, variables))
        }
        Operator::Matches => {
            let text = evaluate(left, variables);
            let pattern = evaluate(right, variables);
            Value::Bool(matches(&text, &pattern))
        }
        Operator::NotMatches => {
            let text = evaluate(left, variables);
            let pattern = evaluate(right, variables);
            Value::Bool(not_matches(&text, &pattern))
        }
    }
}

/// `text =~ pattern`: a missing or invalid pattern never matches
pub fn matches(text: &Value, pattern: &Value) -> bool {
    match pattern.to_pattern() {
        Some(pattern) => !pattern.scan(&text.as_text()).is_empty(),
        None => false,
    }
}

/// `text !~ pattern`: a missing or invalid pattern never matches, so the
/// negation holds
pub fn not_matches(text: &Value, pattern: &Value) -> bool {
    match pattern.to_pattern() {
        Some(pattern) => pattern.scan(&text.as_text()).is_empty(),
        None => true,
    }
}
