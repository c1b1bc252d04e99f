use std::{
    collections::{btree_map::Entry, BTreeMap, BTreeSet},
    fmt::{self, Display, Formatter},
    iter::{Product, Sum},
    ops::{Add, Mul, Neg, Sub},
};

use itertools::{iproduct, Itertools};
use nom_miette::final_parser;
use rust_decimal::prelude::ToPrimitive;

use super::errors::AlgebraError;
use crate::{parsers::expression::expression, Coefficient, Expr, Monomial, Result, Symbol};

const ONE: Coefficient = Coefficient::ONE;

// NOTE: Bounds the number of term pairs multiplied out at each step of expanding a power of a sum
const MAX_EXPANSION_PRODUCTS: usize = 10_000;

impl Expr {
    /// Parses expressions like `2*x^2 - (k1 + k2) y / 4`
    ///
    /// Juxtaposition (`2 x`) multiplies, and both `^` and `**` raise to a power. The result is fully expanded.
    pub fn parse(text: impl AsRef<str>) -> Result<Self> {
        let expr = final_parser(expression)(text.as_ref().trim())?;
        Ok(expr)
    }

    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn constant(value: Coefficient) -> Self {
        Self::term(value, Monomial::one())
    }

    pub fn symbol(name: impl AsRef<str>) -> Result<Self> {
        Ok(Symbol::new(name)?.into())
    }

    #[must_use]
    pub fn term(coefficient: Coefficient, monomial: Monomial) -> Self {
        if coefficient.is_zero() {
            return Self::zero();
        }
        Self(BTreeMap::from([(monomial, coefficient.normalize())]))
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_constant(&self) -> Option<Coefficient> {
        match self.0.iter().at_most_one() {
            Ok(None) => Some(Coefficient::ZERO),
            Ok(Some((monomial, &coefficient))) if monomial.is_one() => Some(coefficient),
            _ => None,
        }
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, Coefficient)> {
        self.0.iter().map(|(monomial, &coefficient)| (monomial, coefficient))
    }

    #[must_use]
    pub fn symbols(&self) -> BTreeSet<&Symbol> {
        self.0.keys().flat_map(Monomial::symbols).collect()
    }

    pub fn checked_add(mut self, rhs: Self) -> Result<Self, AlgebraError> {
        for (monomial, coefficient) in rhs.0 {
            self.add_term(monomial, coefficient)?;
        }
        Ok(self)
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self, AlgebraError> {
        self.checked_add(-rhs)
    }

    pub fn checked_mul(&self, rhs: &Self) -> Result<Self, AlgebraError> {
        let mut product = Self::zero();
        for ((lhs_monomial, &lhs_coefficient), (rhs_monomial, &rhs_coefficient)) in iproduct!(&self.0, &rhs.0) {
            let coefficient = lhs_coefficient
                .checked_mul(rhs_coefficient)
                .ok_or_else(|| AlgebraError::overflow(&lhs_coefficient, '*', &rhs_coefficient))?;
            product.add_term(lhs_monomial.checked_mul(rhs_monomial)?, coefficient)?;
        }
        Ok(product)
    }

    pub fn scale(&self, factor: Coefficient) -> Result<Self, AlgebraError> {
        self.checked_mul(&Self::constant(factor))
    }

    pub fn pow(&self, exponent: Coefficient) -> Result<Self, AlgebraError> {
        let unsupported = || AlgebraError::unsupported_power(self, exponent);

        if let Ok((monomial, &coefficient)) = self.0.iter().exactly_one() {
            let coefficient = if coefficient == ONE {
                ONE
            } else {
                coefficient_pow(coefficient, exponent).ok_or_else(unsupported)?
            };
            return Ok(Self::term(coefficient, monomial.pow(exponent)?));
        }

        if !exponent.fract().is_zero() || exponent.is_sign_negative() {
            return Err(unsupported());
        }
        let mut remaining = exponent.to_u32().ok_or_else(unsupported)?;

        // NOTE: Each power of a sum has more terms than the last, so large exponents hit this limit quickly
        let expand = |lhs: &Self, rhs: &Self| {
            if lhs.0.len().saturating_mul(rhs.0.len()) > MAX_EXPANSION_PRODUCTS {
                Err(unsupported())
            } else {
                lhs.checked_mul(rhs)
            }
        };

        let mut base = self.clone();
        let mut power = Self::constant(ONE);
        while remaining > 0 {
            if remaining & 1 == 1 {
                power = expand(&power, &base)?;
            }
            remaining >>= 1;
            if remaining > 0 {
                base = expand(&base, &base)?;
            }
        }
        Ok(power)
    }

    pub fn checked_div(&self, divisor: &Self) -> Result<Self, AlgebraError> {
        let divisor = divisor
            .as_constant()
            .ok_or_else(|| AlgebraError::non_constant_divisor(divisor))?;
        if divisor.is_zero() {
            return Err(AlgebraError::DivisionByZero);
        }

        let mut quotient = Self::zero();
        for (monomial, &coefficient) in &self.0 {
            let coefficient = coefficient
                .checked_div(divisor)
                .ok_or_else(|| AlgebraError::invalid_number(&format!("{coefficient}/{divisor}")))?;
            quotient.add_term(monomial.clone(), coefficient)?;
        }
        Ok(quotient)
    }

    /// Splits an expression like `x + 2 y` into its symbols and their coefficients, `[(x, 1), (y, 2)]`
    ///
    /// Fails if any term is a constant or isn't a single symbol raised to the first power
    pub fn linear_coefficients(&self) -> Result<Vec<(Symbol, Coefficient)>, AlgebraError> {
        self.0
            .iter()
            .map(|(monomial, &coefficient)| match monomial.as_symbol() {
                Some(symbol) => Ok((symbol.clone(), coefficient)),
                None if monomial.is_one() => Err(AlgebraError::ConstantTerm { term: coefficient }),
                None => Err(AlgebraError::non_linear_term(&Self::term(
                    coefficient,
                    monomial.clone(),
                ))),
            })
            .collect()
    }

    fn add_term(&mut self, monomial: Monomial, coefficient: Coefficient) -> Result<(), AlgebraError> {
        match self.0.entry(monomial) {
            Entry::Vacant(e) => {
                if !coefficient.is_zero() {
                    e.insert(coefficient.normalize());
                }
            }
            Entry::Occupied(mut e) => {
                let existing = *e.get();
                let total = existing
                    .checked_add(coefficient)
                    .ok_or_else(|| AlgebraError::overflow(&existing, '+', &coefficient))?
                    .normalize();
                if total.is_zero() {
                    e.remove();
                } else {
                    e.insert(total);
                }
            }
        }
        Ok(())
    }
}

// NOTE: Only whole-number powers of a number are exact, everything else is left to `Expr::pow` to reject
fn coefficient_pow(base: Coefficient, exponent: Coefficient) -> Option<Coefficient> {
    if !exponent.fract().is_zero() {
        return None;
    }
    let mut remaining = exponent.abs().to_u32()?;

    let mut base_power = base;
    let mut power = ONE;
    while remaining > 0 {
        if remaining & 1 == 1 {
            power = power.checked_mul(base_power)?;
        }
        remaining >>= 1;
        if remaining > 0 {
            base_power = base_power.checked_mul(base_power)?;
        }
    }

    if exponent.is_sign_negative() {
        ONE.checked_div(power)
    } else {
        Some(power)
    }
}

// NOTE: Operators panic if a coefficient overflows, just like the `Decimal` operators do. Use the `checked_*` methods
// for anything built from user input
fn or_overflow(result: Result<Expr, AlgebraError>) -> Expr {
    result.unwrap_or_else(|error| panic!("{error}"))
}

impl From<Symbol> for Expr {
    fn from(symbol: Symbol) -> Self {
        Self::term(ONE, Monomial::from(symbol))
    }
}

impl Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        or_overflow(self.checked_add(rhs))
    }
}

impl Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        or_overflow(self.checked_sub(rhs))
    }
}

impl Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(
            self.0
                .into_iter()
                .map(|(monomial, coefficient)| (monomial, -coefficient))
                .collect(),
        )
    }
}

impl Mul for &Expr {
    type Output = Expr;

    fn mul(self, rhs: Self) -> Self::Output {
        or_overflow(self.checked_mul(rhs))
    }
}

impl Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        &self * &rhs
    }
}

impl Sum for Expr {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), Add::add)
    }
}

impl Product for Expr {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::constant(ONE), Mul::mul)
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }

        for (index, (monomial, coefficient)) in self.0.iter().enumerate() {
            match (index, coefficient.is_sign_negative()) {
                (0, true) => write!(f, "-")?,
                (0, false) => (),
                (_, true) => write!(f, " - ")?,
                (_, false) => write!(f, " + ")?,
            }

            let magnitude = coefficient.abs();
            if monomial.is_one() {
                write!(f, "{magnitude}")?;
            } else if magnitude == ONE {
                write!(f, "{monomial}")?;
            } else {
                write!(f, "{magnitude}*{monomial}")?;
            }
        }
        Ok(())
    }
}
