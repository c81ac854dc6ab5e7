// SPDX-License-Identifier: MIT

//! CI variable expressions
//!
//! Expressions decide whether a job or pipeline runs, e.g.:
//! - `$CI_COMMIT_REF_NAME == "main"`
//! - `$CI_COMMIT_TAG =~ /^v\d+/`
//! - `$DEPLOY && $CI_PIPELINE_SOURCE != "schedule"`

mod ast;
mod evaluator;
mod lexeme;
mod lexer;
mod parser;
mod pattern;
mod statement;
mod value;

pub use ast::Expression;
pub use evaluator::{evaluate, matches, not_matches};
pub use lexeme::{Lexeme, LexemeKind, Operator};
pub use lexer::{tokenize, MAX_TOKENS};
pub use parser::{build_tree, parse, to_rpn};
pub use pattern::Pattern;
pub use statement::Statement;
pub use value::Value;
