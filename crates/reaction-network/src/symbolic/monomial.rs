use std::{
    collections::{btree_map::Entry, BTreeMap},
    fmt::{self, Display, Formatter},
};

use itertools::Itertools;

use super::errors::AlgebraError;
use crate::{Coefficient, Monomial, Symbol};

impl Monomial {
    #[must_use]
    pub fn one() -> Self {
        Self::default()
    }

    /// Multiplies out `symbol^exponent` factors, adding the exponents of repeated symbols
    pub fn from_powers(powers: impl IntoIterator<Item = (Symbol, Coefficient)>) -> Result<Self, AlgebraError> {
        let mut monomial = Self::one();
        for (symbol, exponent) in powers {
            monomial.raise(symbol, exponent)?;
        }
        Ok(monomial)
    }

    #[must_use]
    pub fn is_one(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the lone symbol of a monomial like `x`, but not of `x^2`, `x*y`, or `1`
    #[must_use]
    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self.0.iter().exactly_one() {
            Ok((symbol, exponent)) if *exponent == Coefficient::ONE => Some(symbol),
            _ => None,
        }
    }

    pub fn powers(&self) -> impl Iterator<Item = (&Symbol, Coefficient)> {
        self.0.iter().map(|(symbol, &exponent)| (symbol, exponent))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.0.keys()
    }

    pub fn pow(&self, exponent: Coefficient) -> Result<Self, AlgebraError> {
        let powers: Vec<_> = self
            .0
            .iter()
            .map(|(symbol, &power)| {
                let power = power
                    .checked_mul(exponent)
                    .ok_or_else(|| AlgebraError::overflow(&power, '*', &exponent))?;
                Ok((symbol.clone(), power))
            })
            .collect::<Result<_, AlgebraError>>()?;
        Self::from_powers(powers)
    }

    pub fn checked_mul(&self, rhs: &Self) -> Result<Self, AlgebraError> {
        let mut product = self.clone();
        for (symbol, &exponent) in &rhs.0 {
            product.raise(symbol.clone(), exponent)?;
        }
        Ok(product)
    }

    fn raise(&mut self, symbol: Symbol, exponent: Coefficient) -> Result<(), AlgebraError> {
        match self.0.entry(symbol) {
            Entry::Vacant(e) => {
                if !exponent.is_zero() {
                    e.insert(exponent.normalize());
                }
            }
            Entry::Occupied(mut e) => {
                let power = *e.get();
                let total = power
                    .checked_add(exponent)
                    .ok_or_else(|| AlgebraError::overflow(&power, '+', &exponent))?
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

impl From<Symbol> for Monomial {
    fn from(symbol: Symbol) -> Self {
        Self(BTreeMap::from([(symbol, Coefficient::ONE)]))
    }
}

impl Display for Monomial {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_one() {
            return write!(f, "1");
        }

        let factors = self.0.iter().map(|(symbol, exponent)| {
            if *exponent == Coefficient::ONE {
                symbol.to_string()
            } else if exponent.is_sign_negative() || !exponent.fract().is_zero() {
                format!("{symbol}^({exponent})")
            } else {
                format!("{symbol}^{exponent}")
            }
        });
        write!(f, "{}", factors.format("*"))
    }
}
