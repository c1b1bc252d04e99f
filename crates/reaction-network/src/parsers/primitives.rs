use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit1, one_of},
    combinator::{map, opt, recognize},
    multi::many0_count,
    sequence::pair,
};
use nom_miette::{expect, map_res};

use super::errors::{CrnErrorKind, ParseResult};
use crate::{symbolic::errors::AlgebraError, Coefficient, Expr};

/// Identifier = ( letter | "_" ) , { letter | digit | "_" } ;
pub fn identifier(i: &str) -> ParseResult<&str> {
    let head = alt((alpha1, tag("_")));
    let tail = many0_count(alt((alphanumeric1, tag("_"))));
    expect(recognize(pair(head, tail)), CrnErrorKind::ExpectedIdentifier)(i)
}

/// Number = digit , { digit } , [ "." , digit , { digit } ] ;
pub fn number(i: &str) -> ParseResult<Coefficient> {
    map_res(decimal_digits, |digits: &str| {
        Coefficient::from_str_exact(digits)
            .map(|n| n.normalize())
            .map_err(|_| AlgebraError::invalid_number(digits))
    })(i)
}

/// Sign = "+" | "-" ;
pub(crate) fn sign(i: &str) -> ParseResult<Sign> {
    map(one_of("+-"), |c| match c {
        '+' => Sign::Plus,
        '-' => Sign::Minus,
        _ => unreachable!(),
    })(i)
}

#[derive(Copy, Clone, Default, Eq, PartialEq, Debug)]
pub(crate) enum Sign {
    #[default]
    Plus,
    Minus,
}

impl Sign {
    pub(crate) fn apply(self, expr: Expr) -> Expr {
        match self {
            Self::Plus => expr,
            Self::Minus => -expr,
        }
    }
}

fn decimal_digits(i: &str) -> ParseResult<&str> {
    let fraction = opt(pair(char('.'), digit1));
    expect(recognize(pair(digit1, fraction)), CrnErrorKind::ExpectedNumber)(i)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_identifier() {
        // Valid Identifiers
        assert_eq!(identifier("x1"), Ok(("", "x1")));
        assert_eq!(identifier("k_0_1"), Ok(("", "k_0_1")));
        assert_eq!(identifier("_tmp"), Ok(("", "_tmp")));
        assert_eq!(identifier("ATP"), Ok(("", "ATP")));
        // Invalid Identifiers
        assert!(identifier("").is_err());
        assert!(identifier("1x").is_err());
        assert!(identifier("+x").is_err());
        assert!(identifier(" x").is_err());
        // Multiple Identifiers
        assert_eq!(identifier("x1 + x2"), Ok((" + x2", "x1")));
        assert_eq!(identifier("x1*x2"), Ok(("*x2", "x1")));
        assert_eq!(identifier("dx1/dt"), Ok(("/dt", "dx1")));
    }

    #[test]
    fn test_number() {
        // Valid Numbers
        assert_eq!(number("2"), Ok(("", dec!(2))));
        assert_eq!(number("0.5"), Ok(("", dec!(0.5))));
        assert_eq!(number("2.50"), Ok(("", dec!(2.5))));
        assert_eq!(number("007"), Ok(("", dec!(7))));
        // Invalid Numbers
        assert!(number("").is_err());
        assert!(number(".5").is_err());
        assert!(number("-1").is_err());
        assert!(number("x").is_err());
        assert!(number("123456789012345678901234567890").is_err());
        // Partial Numbers
        assert_eq!(number("2 x"), Ok((" x", dec!(2))));
        assert_eq!(number("3."), Ok((".", dec!(3))));
        assert_eq!(number("4x"), Ok(("x", dec!(4))));
    }

    #[test]
    fn test_sign() {
        assert_eq!(sign("+"), Ok(("", Sign::Plus)));
        assert_eq!(sign("- x"), Ok((" x", Sign::Minus)));
        assert!(sign("*").is_err());
        assert!(sign("").is_err());
    }
}
