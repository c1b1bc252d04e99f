use std::fmt::Display;

use miette::Diagnostic;
use thiserror::Error;

use crate::{Coefficient, Expr};

// NOTE: Raised while building or simplifying expressions, then surfaced through the expression parser or while
// deriving the equations of a network
#[derive(Debug, Diagnostic, Clone, Eq, PartialEq, Error)]
pub enum AlgebraError {
    #[diagnostic(help(
        "only whole-number powers of an expression, or arbitrary powers of a lone product of symbols (like x^0.5), \
        can be expanded, and only while the expansion stays reasonably small"
    ))]
    #[error("cannot raise {base} to the power of {exponent}")]
    UnsupportedPower { base: String, exponent: Coefficient },

    #[diagnostic(help("exponents must be plain numbers, like 2 or (1/2)"))]
    #[error("the exponent {exponent} is not a constant")]
    NonConstantExponent { exponent: String },

    #[diagnostic(help("expressions can only be divided by plain numbers, like 2 or 0.5"))]
    #[error("cannot divide by {divisor}, which is not a constant")]
    NonConstantDivisor { divisor: String },

    #[error("cannot divide by zero")]
    DivisionByZero,

    #[diagnostic(help("numbers must fit within 28 significant digits"))]
    #[error("the number {number} cannot be represented exactly")]
    InvalidNumber { number: String },

    #[diagnostic(help("coefficients and exponents must stay within 28 significant digits, try smaller numbers"))]
    #[error("the result of {operation} is too large to represent")]
    Overflow { operation: String },

    #[diagnostic(help("every term of a complex should name a species, like 2 A"))]
    #[error("the constant term {term} does not refer to any species")]
    ConstantTerm { term: Coefficient },

    #[diagnostic(help(
        "complexes must be linear combinations of species, like A + 2 B, without products or powers of \
        species"
    ))]
    #[error("the term {term} is not linear in a single species")]
    NonLinearTerm { term: String },
}

impl AlgebraError {
    pub(crate) fn unsupported_power(base: &Expr, exponent: Coefficient) -> Self {
        let base = base.to_string();

        Self::UnsupportedPower { base, exponent }
    }

    pub(crate) fn non_constant_exponent(exponent: &Expr) -> Self {
        let exponent = exponent.to_string();

        Self::NonConstantExponent { exponent }
    }

    pub(crate) fn non_constant_divisor(divisor: &Expr) -> Self {
        let divisor = divisor.to_string();

        Self::NonConstantDivisor { divisor }
    }

    pub(crate) fn invalid_number(number: &str) -> Self {
        let number = number.to_owned();

        Self::InvalidNumber { number }
    }

    pub(crate) fn overflow(lhs: &impl Display, operator: char, rhs: &impl Display) -> Self {
        let operation = format!("{lhs} {operator} {rhs}");

        Self::Overflow { operation }
    }

    pub(crate) fn non_linear_term(term: &Expr) -> Self {
        let term = term.to_string();

        Self::NonLinearTerm { term }
    }
}
