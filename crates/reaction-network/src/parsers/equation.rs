use nom::{
    bytes::complete::tag,
    character::complete::{char, space0},
    combinator::{cut, map},
    sequence::{delimited, separated_pair},
};
use nom_miette::{expect, wrap_err};

use super::{
    errors::{CrnErrorKind, ParseResult},
    expression::expression,
    primitives::identifier,
};
use crate::{Derivative, Expr, Symbol};

/// Equation = Derivative , "=" , Expression ;
pub fn equation(i: &str) -> ParseResult<(Derivative, Expr)> {
    let equals = expect(
        delimited(space0, char('='), space0),
        CrnErrorKind::ExpectedEquals,
    );
    let parser = separated_pair(derivative, cut(equals), cut(expression));
    wrap_err(parser, CrnErrorKind::ExpectedEquation)(i)
}

/// Derivative = "d" , Identifier , "/dt" ;
fn derivative(i: &str) -> ParseResult<Derivative> {
    let parser = delimited(char('d'), identifier, tag("/dt"));
    expect(
        map(parser, |name| Derivative(Symbol(name.to_owned()))),
        CrnErrorKind::ExpectedDerivative,
    )(i)
}
