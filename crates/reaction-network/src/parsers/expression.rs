use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, space0},
    combinator::{cut, map, not, opt, value},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated},
};
use nom_miette::{expect, map_res, wrap_err};

use super::{
    errors::{CrnErrorKind, ParseResult},
    primitives::{identifier, number, sign, Sign},
};
use crate::{symbolic::errors::AlgebraError, Coefficient, Expr, Symbol};

// Public API ==========================================================================================================

/// Expression = [ Sign ] , Term , { Sign , Term } ;
pub fn expression(i: &str) -> ParseResult<Expr> {
    wrap_err(map_res(signed_terms, sum_terms), CrnErrorKind::ExpectedExpression)(i)
}

// Private Sub-Parsers =================================================================================================

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Operator {
    Multiply,
    Divide,
}

fn signed_terms(i: &str) -> ParseResult<(Expr, Vec<(Sign, Expr)>)> {
    let first_term = map(pair(opt(terminated(sign, space0)), term), |(sign, term)| {
        sign.unwrap_or_default().apply(term)
    });
    let other_terms = many0(pair(delimited(space0, sign, space0), cut(term)));
    pair(first_term, other_terms)(i)
}

fn sum_terms((first, rest): (Expr, Vec<(Sign, Expr)>)) -> Result<Expr, AlgebraError> {
    rest.into_iter()
        .try_fold(first, |sum, (sign, term)| sum.checked_add(sign.apply(term)))
}

/// Term = Factor , { [ Operator ] , Factor } ;
fn term(i: &str) -> ParseResult<Expr> {
    wrap_err(map_res(factors, fold_factors), CrnErrorKind::ExpectedTerm)(i)
}

fn factors(i: &str) -> ParseResult<(Expr, Vec<(Operator, Expr)>)> {
    let explicit = pair(delimited(space0, operator, space0), cut(factor));
    let implicit = pair(value(Operator::Multiply, space0), factor);
    pair(factor, many0(alt((explicit, implicit))))(i)
}

/// Operator = "*" - "**" | "/" ;
fn operator(i: &str) -> ParseResult<Operator> {
    let multiply = value(Operator::Multiply, terminated(char('*'), not(char('*'))));
    let divide = value(Operator::Divide, char('/'));
    alt((multiply, divide))(i)
}

fn fold_factors((first, rest): (Expr, Vec<(Operator, Expr)>)) -> Result<Expr, AlgebraError> {
    rest.into_iter()
        .try_fold(first, |product, (operator, factor)| match operator {
            Operator::Multiply => product.checked_mul(&factor),
            Operator::Divide => product.checked_div(&factor),
        })
}

/// Factor = Atom , [ ( "^" | "**" ) , Exponent ] ;
fn factor(i: &str) -> ParseResult<Expr> {
    map_res(power, |(base, exponent): (Expr, Option<Coefficient>)| match exponent {
        Some(exponent) => base.pow(exponent),
        None => Ok(base),
    })(i)
}

fn power(i: &str) -> ParseResult<(Expr, Option<Coefficient>)> {
    let power_operator = delimited(space0, alt((tag("**"), tag("^"))), space0);
    pair(atom, opt(preceded(power_operator, cut(exponent))))(i)
}

/// Exponent = [ Sign ] , Atom ;
fn exponent(i: &str) -> ParseResult<Coefficient> {
    map_res(signed_atom, |exponent: Expr| {
        exponent
            .as_constant()
            .ok_or_else(|| AlgebraError::non_constant_exponent(&exponent))
    })(i)
}

fn signed_atom(i: &str) -> ParseResult<Expr> {
    map(pair(opt(sign), atom), |(sign, atom)| {
        sign.unwrap_or_default().apply(atom)
    })(i)
}

/// Atom = Number | Identifier | "(" , Expression , ")" ;
fn atom(i: &str) -> ParseResult<Expr> {
    let constant = map(number, Expr::constant);
    let symbol = map(identifier, |name| Expr::from(Symbol(name.to_owned())));
    let opening_paren = expect(
        terminated(char('('), space0),
        CrnErrorKind::ExpectedOpeningParen,
    );
    let group = preceded(opening_paren, cut(terminated(expression, closing_paren)));
    wrap_err(alt((constant, symbol, group)), CrnErrorKind::ExpectedAtom)(i)
}

fn closing_paren(i: &str) -> ParseResult<char> {
    expect(preceded(space0, char(')')), CrnErrorKind::ExpectedClosingParen)(i)
}

// Module Tests ========================================================================================================
