use miette::Diagnostic;
use nom::{error::ErrorKind, IResult};
use nom_miette::{FromExternalError, LabeledError, LabeledErrorKind, LabeledParseError};
use thiserror::Error;

use crate::symbolic::errors::AlgebraError;

pub type ExpressionError = LabeledError<CrnErrorKind>;
pub type ParseResult<'a, O> = IResult<&'a str, O, LabeledParseError<'a, CrnErrorKind>>;

#[derive(Clone, Eq, PartialEq, Debug, Diagnostic, Error)]
pub enum CrnErrorKind {
    #[error("expected an expression, like 2 x + y")]
    ExpectedExpression,

    #[error("expected a product of factors, like 2 x*y")]
    ExpectedTerm,

    #[error("expected a number, an identifier, or a parenthesised expression")]
    ExpectedAtom,

    #[error("expected an identifier made of letters, digits, and underscores, not starting with a digit")]
    ExpectedIdentifier,

    #[error("expected a number, like 2 or 0.5")]
    ExpectedNumber,

    #[error("expected '(' to open a group")]
    ExpectedOpeningParen,

    #[diagnostic(help("you've probably forgotten to close an earlier '(' bracket"))]
    #[error("expected ')' to close a group")]
    ExpectedClosingParen,

    #[error("expected an equation, like dx/dt = -k*x")]
    ExpectedEquation,

    #[error("expected the derivative of a variable, like dx/dt")]
    ExpectedDerivative,

    #[error("expected '=' between the derivative and its expression")]
    ExpectedEquals,

    #[diagnostic(transparent)]
    #[error(transparent)]
    Algebra(AlgebraError),

    #[diagnostic(help(
        "this is an internal error that you shouldn't ever see! If you have gotten this error, \
        then please report it as a bug!"
    ))]
    #[error("internal `nom` error: {0:?}")]
    NomError(ErrorKind),

    #[diagnostic(help("check the unparsed region for errors, or remove it from the rest of the input"))]
    #[error("could not interpret the full input as a valid expression")]
    Incomplete,
}

impl LabeledErrorKind for CrnErrorKind {
    fn label(&self) -> Option<&'static str> {
        Some(match self {
            Self::Algebra(e) => match e {
                AlgebraError::UnsupportedPower { .. } => "unsupported power",
                AlgebraError::NonConstantExponent { .. } => "non-constant exponent",
                AlgebraError::NonConstantDivisor { .. } => "non-constant divisor",
                AlgebraError::DivisionByZero => "division by zero",
                AlgebraError::InvalidNumber { .. } => "invalid number",
                AlgebraError::Overflow { .. } => "overflow",
                AlgebraError::ConstantTerm { .. } => "constant term",
                AlgebraError::NonLinearTerm { .. } => "non-linear term",
            },
            Self::ExpectedIdentifier => "identifier",
            Self::ExpectedNumber => "number",
            Self::ExpectedOpeningParen => "'('",
            Self::ExpectedClosingParen => "expected ')'",
            Self::ExpectedDerivative => "expected dX/dt",
            Self::ExpectedEquals => "expected '='",
            Self::Incomplete => "input was valid up until this point",
            Self::NomError(_) => "the region that triggered this bug!",
            _ => return None,
        })
    }
}

impl<'a> FromExternalError<'a, AlgebraError> for LabeledParseError<'a, CrnErrorKind> {
    const FATAL: bool = true;

    fn from_external_error(input: &'a str, e: AlgebraError) -> Self {
        Self::new(input, CrnErrorKind::Algebra(e))
    }
}

impl From<ErrorKind> for CrnErrorKind {
    fn from(value: ErrorKind) -> Self {
        match value {
            ErrorKind::Eof => Self::Incomplete,
            kind => Self::NomError(kind),
        }
    }
}
