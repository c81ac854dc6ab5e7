// SPDX-License-Identifier: MIT

//! Tokenizer for CI variable expressions

use super::lexeme::{Lexeme, LexemeKind};
use crate::ci::error::ExpressionError;

/// Maximum number of lexemes in one expression
pub const MAX_TOKENS: usize = 100;

/// Split an expression into lexemes
pub fn tokenize(input: &str) -> Result<Vec<Lexeme>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut offset = 0;

    while offset < input.len() {
        let rest = &input[offset..];
        let trimmed = rest.trim_start();
        offset += rest.len() - trimmed.len();
        if trimmed.is_empty() {
            break;
        }

        let (lexeme, consumed) = next_lexeme(trimmed, offset)?;
        tokens.push(lexeme);
        offset += consumed;

        if tokens.len() > MAX_TOKENS {
            return Err(ExpressionError::TooManyTokens { limit: MAX_TOKENS });
        }
    }

    Ok(tokens)
}

fn next_lexeme(input: &str, offset: usize) -> Result<(Lexeme, usize), ExpressionError> {
    for kind in LexemeKind::ALL {
        if let Some(found) = kind.scan(input)? {
            return Ok(found);
        }
    }

    let fragment: String = input
        .chars()
        .take_while(|c| !c.is_whitespace())
        .take(20)
        .collect();
    Err(ExpressionError::InvalidToken {
        position: offset,
        fragment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ci::expression::lexeme::Operator;

    #[test]
    fn test_tokenize_comparison() {
        let tokens = tokenize(r#"$VAR == "value""#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Lexeme::Variable("VAR".to_string()),
                Lexeme::Operator(Operator::Equals),
                Lexeme::String("value".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_without_whitespace() {
        let tokens = tokenize("($A=~/x/)&&$B!=null").unwrap();
        assert_eq!(tokens.len(), 9);
        assert_eq!(tokens[0], Lexeme::ParenthesisOpen);
        assert_eq!(tokens[2], Lexeme::Operator(Operator::Matches));
        assert_eq!(tokens[4], Lexeme::ParenthesisClose);
        assert_eq!(tokens[5], Lexeme::Operator(Operator::And));
        assert_eq!(tokens[8], Lexeme::Null);
    }

    #[test]
    fn test_tokenize_all_operators() {
        let tokens = tokenize("== != =~ !~ && ||").unwrap();
        let ops: Vec<Operator> = tokens
            .into_iter()
            .map(|t| match t {
                Lexeme::Operator(op) => op,
                other => panic!("Expected operator, got {:?}", other),
            })
            .collect();
        assert_eq!(
            ops,
            vec![
                Operator::Equals,
                Operator::NotEquals,
                Operator::Matches,
                Operator::NotMatches,
                Operator::And,
                Operator::Or,
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("   ").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_token_reports_position() {
        let err = tokenize("$A == value").unwrap_err();
        assert_eq!(
            err,
            ExpressionError::InvalidToken {
                position: 6,
                fragment: "value".to_string(),
            }
        );
    }

    #[test]
    fn test_single_equals_is_invalid() {
        assert!(matches!(
            tokenize("$A = 'x'"),
            Err(ExpressionError::InvalidToken { position: 3, .. })
        ));
    }

    #[test]
    fn test_too_many_tokens() {
        let input = vec!["$A"; MAX_TOKENS + 1].join(" ");
        assert_eq!(
            tokenize(&input),
            Err(ExpressionError::TooManyTokens { limit: MAX_TOKENS })
        );
    }

    #[test]
    fn test_exactly_max_tokens() {
        let input = vec!["$A"; MAX_TOKENS].join(" ");
        assert_eq!(tokenize(&input).unwrap().len(), MAX_TOKENS);
    }
}
