//! Mass-action ODEs for chemical reaction networks
//!
//! A [`ReactionNetwork`] is built either from explicit lists of [`Species`], [`Complex`]es, and [`Reaction`]s, from a
//! textual reaction diagram (like `x1 + x2 -> 2 x2`), or from a KDL network description. Once built, the network
//! derives the system of ordinary differential equations governing species concentrations under the law of mass
//! action: `dx/dt = S v(x)`, where `S` is the stoichiometric matrix and `v` the vector of rate laws.

pub mod errors;
pub mod network;
pub mod parsers;
pub mod symbolic;
#[cfg(test)]
mod testing_tools;

use std::collections::BTreeMap;

// External Crate Imports
use derive_more::Display;
use rust_decimal::Decimal;
use static_assertions::assert_impl_all;

pub use errors::{CrnError, Result};

// NOTE: Stoichiometric coefficients, exponents, and term coefficients all share this type. Integers and terminating
// decimals (like 0.5) are exact, everything the diagram syntax can write down is representable
pub type Coefficient = Decimal;

// Reaction Network Types ==============================================================================================

/// A chemical species, identified solely by its name
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub struct Species(String);

/// A linear combination of species, such as one side of a reaction
///
/// Entries keep their insertion order, but equality and hashing ignore it
#[derive(Clone, Default, Debug)]
pub struct Complex(Vec<(Species, Coefficient)>);

/// A directed transformation from a reactant complex to a product complex
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Reaction {
    reactant: Complex,
    product: Complex,
}

/// A validated, read-only network of species, complexes, and the reactions between them
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ReactionNetwork {
    species: Vec<Species>,
    complexes: Vec<Complex>,
    reactions: Vec<Reaction>,
    // NOTE: The positions of each reaction's (reactant, product) within `complexes`, found during validation
    complex_indices: Vec<(usize, usize)>,
    // NOTE: Derived once during validation, so that coefficient overflow is reported when the network is built
    rates: Vec<Expr>,
    stoichiometry: Vec<Vec<Coefficient>>,
    equations: Vec<Expr>,
}

// Symbolic Types ======================================================================================================

/// A named variable, like a species concentration or a rate constant
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub struct Symbol(String);

/// A product of symbols raised to (non-zero) powers. The empty product is `1`
#[derive(Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Monomial(BTreeMap<Symbol, Coefficient>);

/// A sum of (non-zero) coefficients multiplied by distinct monomials
///
/// Terms are kept in a canonical order, so two expressions are equal exactly when they are algebraically equal
#[derive(Clone, Default, Eq, PartialEq, Hash, Debug)]
pub struct Expr(BTreeMap<Monomial, Coefficient>);

/// Marks the time-derivative of a state variable, `dX/dt`
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
#[display("d{_0}/dt")]
pub struct Derivative(Symbol);

/// A system of ODEs, mapping the derivative of each state variable to its right-hand side
#[derive(Clone, Default, Debug)]
pub struct OdeSystem {
    equations: Vec<(Derivative, Expr)>,
}

// NOTE: Everything here is an immutable value type that is freely shared between threads
assert_impl_all!(Species: Clone, Eq, std::hash::Hash, Send, Sync);
assert_impl_all!(Complex: Clone, Eq, std::hash::Hash, Send, Sync);
assert_impl_all!(Reaction: Clone, Eq, std::hash::Hash, Send, Sync);
assert_impl_all!(ReactionNetwork: Clone, Eq, Send, Sync);
assert_impl_all!(Expr: Clone, Eq, std::hash::Hash, Send, Sync);
assert_impl_all!(OdeSystem: Clone, Eq, Send, Sync);
