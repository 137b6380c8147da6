//! Independent reference evaluator for arithmetic expressions.
//!
//! Grammar (left-associative, `* /` bind tighter than `+ -`):
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := ('+' | '-') factor | atom
//! atom   := NUMBER | '(' expr ')'
//! ```
//!
//! Arithmetic is plain `f64`, evaluated in the same order a conforming server
//! would evaluate it.

use crate::domain::model::{Expression, InputBatch};
use crate::utils::error::{HarnessError, Result};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("expected '-', '+', '(' or a number at end of input")]
    UnexpectedEnd,

    #[error("unexpected character '{ch}' at offset {pos}")]
    UnexpectedChar { pos: usize, ch: char },

    #[error("expected '-', '+', '(' or a number at offset {pos}")]
    ExpectedOperand { pos: usize },

    #[error("invalid number '{text}' at offset {pos}")]
    InvalidNumber { pos: usize, text: String },

    #[error("missing closing ')' for '(' at offset {pos}")]
    MissingClosingParen { pos: usize },

    #[error("expected a binary operator at offset {pos}")]
    TrailingInput { pos: usize },

    #[error("division by zero")]
    DivisionByZero,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TokenKind {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LeftParen,
    RightParen,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Token {
    kind: TokenKind,
    pos: usize,
}

fn tokenize(input: &str) -> std::result::Result<Vec<Token>, EvalError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let b = bytes[pos];
        let kind = match b {
            b' ' | b'\t' | b'\r' | b'\n' => {
                pos += 1;
                continue;
            }
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'(' => TokenKind::LeftParen,
            b')' => TokenKind::RightParen,
            b'0'..=b'9' | b'.' => {
                let start = pos;
                let end = scan_number(bytes, pos);
                let text = &input[start..end];
                let value = text.parse::<f64>().map_err(|_| EvalError::InvalidNumber {
                    pos: start,
                    text: text.to_string(),
                })?;
                tokens.push(Token {
                    kind: TokenKind::Number(value),
                    pos: start,
                });
                pos = end;
                continue;
            }
            _ => {
                // 非 ASCII 也要回報完整字元
                let ch = input[pos..].chars().next().unwrap_or('?');
                return Err(EvalError::UnexpectedChar { pos, ch });
            }
        };
        tokens.push(Token { kind, pos });
        pos += 1;
    }

    Ok(tokens)
}

// digits [. digits] [(e|E) [+|-] digits]
fn scan_number(bytes: &[u8], start: usize) -> usize {
    let mut pos = start;
    while pos < bytes.len() && (bytes[pos].is_ascii_digit() || bytes[pos] == b'.') {
        pos += 1;
    }
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut exp_end = pos + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            pos = exp_end;
        }
    }
    pos
}

struct Parser {
    tokens: Vec<Token>,
    next: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.next).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.next += 1;
        }
        token
    }

    fn exec(mut self) -> std::result::Result<f64, EvalError> {
        let value = self.expr()?;
        match self.peek() {
            Some(token) => Err(EvalError::TrailingInput { pos: token.pos }),
            None => Ok(value),
        }
    }

    fn expr(&mut self) -> std::result::Result<f64, EvalError> {
        let mut lhs = self.term()?;
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Plus => {
                    self.bump();
                    lhs += self.term()?;
                }
                TokenKind::Minus => {
                    self.bump();
                    lhs -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn term(&mut self) -> std::result::Result<f64, EvalError> {
        let mut lhs = self.factor()?;
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Star => {
                    self.bump();
                    lhs *= self.factor()?;
                }
                TokenKind::Slash => {
                    self.bump();
                    let rhs = self.factor()?;
                    if rhs == 0.0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    lhs /= rhs;
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn factor(&mut self) -> std::result::Result<f64, EvalError> {
        match self.peek().map(|t| t.kind) {
            Some(TokenKind::Minus) => {
                self.bump();
                Ok(-self.factor()?)
            }
            Some(TokenKind::Plus) => {
                self.bump();
                self.factor()
            }
            _ => self.atom(),
        }
    }

    fn atom(&mut self) -> std::result::Result<f64, EvalError> {
        let token = self.bump().ok_or(EvalError::UnexpectedEnd)?;
        match token.kind {
            TokenKind::Number(value) => Ok(value),
            TokenKind::LeftParen => {
                let inner = self.expr()?;
                match self.bump() {
                    Some(Token {
                        kind: TokenKind::RightParen,
                        ..
                    }) => Ok(inner),
                    _ => Err(EvalError::MissingClosingParen { pos: token.pos }),
                }
            }
            _ => Err(EvalError::ExpectedOperand { pos: token.pos }),
        }
    }
}

/// Evaluates a single expression string.
pub fn eval_str(input: &str) -> std::result::Result<f64, EvalError> {
    let tokens = tokenize(input)?;
    Parser { tokens, next: 0 }.exec()
}

pub fn evaluate(expr: &Expression) -> Result<f64> {
    eval_str(expr.as_str()).map_err(|e| {
        tracing::error!("Couldn't evaluate expression: {}", expr);
        HarnessError::EvaluationError {
            expression: expr.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Expected client output for `batch`, one value per expression in order.
pub fn expected_output(batch: &InputBatch) -> Result<Vec<f64>> {
    batch.expressions().iter().map(evaluate).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_addition() {
        assert_eq!(eval_str("2 + 2"), Ok(4.0));
    }

    #[test]
    fn test_precedence_and_left_associativity() {
        assert_eq!(eval_str("2 + 3 * 4"), Ok(14.0));
        assert_eq!(eval_str("10 - 4 - 3"), Ok(3.0));
        assert_eq!(eval_str("100 / 10 / 5"), Ok(2.0));
        assert_eq!(eval_str("8 / 4 * 2"), Ok(4.0));
        assert_eq!(eval_str("1 - 2 * 3 + 4 / 2"), Ok(-3.0));
    }

    #[test]
    fn test_negative_operands_from_generator() {
        assert_eq!(eval_str("-5 - -3"), Ok(-2.0));
        assert_eq!(eval_str("-2 * -3 + -1"), Ok(5.0));
        assert_eq!(eval_str("+7 / -2"), Ok(-3.5));
    }

    #[test]
    fn test_parentheses() {
        assert_eq!(eval_str("(2 + 3) * 4"), Ok(20.0));
        assert_eq!(eval_str("-(1 - 4)"), Ok(3.0));
        assert_eq!(
            eval_str("(1 + 2"),
            Err(EvalError::MissingClosingParen { pos: 0 })
        );
    }

    #[test]
    fn test_decimal_and_exponent_literals() {
        assert_eq!(eval_str("1.5 * 2"), Ok(3.0));
        assert_eq!(eval_str("1e3 + 2.5E-1"), Ok(1000.25));
    }

    #[test]
    fn test_large_integers_are_exact() {
        assert_eq!(
            eval_str("100000000000 - 99999999999"),
            Ok(1.0)
        );
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval_str("1 / 0"), Err(EvalError::DivisionByZero));
        assert_eq!(eval_str("1 / (2 - 2)"), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_malformed_input() {
        assert_eq!(eval_str(""), Err(EvalError::UnexpectedEnd));
        assert_eq!(eval_str("1 +"), Err(EvalError::UnexpectedEnd));
        assert_eq!(eval_str("1 2"), Err(EvalError::TrailingInput { pos: 2 }));
        assert_eq!(eval_str("* 2"), Err(EvalError::ExpectedOperand { pos: 0 }));
        assert_eq!(
            eval_str("2 % 3"),
            Err(EvalError::UnexpectedChar { pos: 2, ch: '%' })
        );
        assert!(matches!(
            eval_str("1..2"),
            Err(EvalError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_expected_output_preserves_order() {
        let batch = InputBatch::new(vec![
            Expression::new("1 + 1"),
            Expression::new("2 * 3"),
            Expression::new("9 / 3"),
        ]);
        assert_eq!(expected_output(&batch).unwrap(), vec![2.0, 6.0, 3.0]);
    }

    #[test]
    fn test_evaluate_reports_offending_expression() {
        let err = evaluate(&Expression::new("4 / 0")).unwrap_err();
        match err {
            HarnessError::EvaluationError { expression, reason } => {
                assert_eq!(expression, "4 / 0");
                assert_eq!(reason, "division by zero");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
