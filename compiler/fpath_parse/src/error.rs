//! Parse errors.

use std::fmt;

use fpath_ir::Span;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// `${` without a matching `}`.
    UnterminatedExpression,
    UnterminatedString,
    /// `[` without a matching `]`.
    UnterminatedKey,
    EmptyExpression,
    Expected { expected: &'static str, found: String },
    InvalidNumber(String),
    UnknownCastType(String),
    /// A join must be the last step of its path.
    JoinNotLast,
    /// Paths nested deeper than the parser allows.
    TooDeep { max: usize },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::UnterminatedExpression => f.write_str("unterminated `${` expression"),
            ParseErrorKind::UnterminatedString => f.write_str("unterminated string literal"),
            ParseErrorKind::UnterminatedKey => f.write_str("unterminated `[` key"),
            ParseErrorKind::EmptyExpression => f.write_str("empty expression"),
            ParseErrorKind::Expected { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            ParseErrorKind::InvalidNumber(text) => write!(f, "invalid number `{text}`"),
            ParseErrorKind::UnknownCastType(name) => write!(
                f,
                "unknown cast target `{name}` (expected byte, short, int, long, float, double or string)"
            ),
            ParseErrorKind::JoinNotLast => f.write_str("a `.{...}` join must be the last step"),
            ParseErrorKind::TooDeep { max } => {
                write!(f, "expression nested more than {max} levels deep")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind} at {span}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        ParseError { kind, span }
    }
}
