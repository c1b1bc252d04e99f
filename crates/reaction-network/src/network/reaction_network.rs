// Standard Library Imports
use std::{
    fmt::{self, Display, Formatter},
    iter::zip,
};

// External Crate Imports
use ahash::{HashSet, HashSetExt};
use itertools::Itertools;
use tracing::{debug, trace};

// Local Crate Imports
use crate::{
    symbolic::errors::AlgebraError, Coefficient, Complex, CrnError, Derivative, Expr, Monomial, OdeSystem, Reaction,
    ReactionNetwork, Result, Species, Symbol,
};

// Public API ==========================================================================================================

impl ReactionNetwork {
    /// Validates and stores a network, fixing the order of its species and complexes for good
    ///
    /// Every species must be unique and must not be named like a rate constant (`k_0_1`). Every complex may only
    /// contain listed species, and the reactant and product of every reaction must be (structurally) equal to one of
    /// the listed complexes. The mass-action equations are derived here too, failing if any coefficient overflows.
    pub fn new(
        species: impl IntoIterator<Item = Species>,
        complexes: impl IntoIterator<Item = Complex>,
        reactions: impl IntoIterator<Item = Reaction>,
    ) -> Result<Self> {
        let species: Vec<_> = species.into_iter().collect();
        let complexes: Vec<_> = complexes.into_iter().collect();
        let reactions: Vec<_> = reactions.into_iter().collect();

        // NOTE: Repeated species are rejected rather than silently accepted, since each copy would get its own row in
        // the stoichiometric matrix and its own equation for the same variable
        let mut known_species = HashSet::with_capacity(species.len());
        for s in &species {
            if !known_species.insert(s) {
                return Err(Box::new(CrnError::duplicate_species(s)));
            }
            if s.symbol().is_rate_constant() {
                return Err(Box::new(CrnError::reserved_species(s)));
            }
        }

        for complex in &complexes {
            if let Some(unknown) = complex.species().find(|s| !known_species.contains(s)) {
                return Err(Box::new(CrnError::undeclared_species(complex, unknown)));
            }
        }

        let complex_indices: Vec<_> = reactions
            .iter()
            .map(|reaction| -> Result<_> {
                let index_of = |complex: &Complex| {
                    complexes
                        .iter()
                        .position(|c| c == complex)
                        .ok_or_else(|| Box::new(CrnError::undeclared_complex(reaction, complex)))
                };
                Ok((index_of(&reaction.reactant)?, index_of(&reaction.product)?))
            })
            .collect::<Result<_>>()?;

        let (n, r) = (species.len(), reactions.len());

        let rates = rate_laws(&species, &reactions, &complex_indices)?;
        assert_eq!(rates.len(), r, "the rate vector must have shape ({r}, 1)");

        let stoichiometry = stoichiometric_matrix(&species, &reactions)?;
        assert!(
            stoichiometry.len() == n && stoichiometry.iter().all(|row| row.len() == r),
            "the stoichiometric matrix must have shape ({n}, {r})"
        );

        let equations = mass_action_equations(&stoichiometry, &rates)?;
        assert_eq!(equations.len(), n, "there must be one equation per species");

        debug!(n, p = complexes.len(), r, "validated reaction network");
        Ok(Self {
            species,
            complexes,
            reactions,
            complex_indices,
            rates,
            stoichiometry,
            equations,
        })
    }

    #[must_use]
    pub fn species(&self) -> &[Species] {
        &self.species
    }

    #[must_use]
    pub fn complexes(&self) -> &[Complex] {
        &self.complexes
    }

    #[must_use]
    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    /// The number of species
    #[must_use]
    pub fn n(&self) -> usize {
        self.species.len()
    }

    /// The number of complexes
    #[must_use]
    pub fn p(&self) -> usize {
        self.complexes.len()
    }

    /// The number of reactions
    #[must_use]
    pub fn r(&self) -> usize {
        self.reactions.len()
    }

    /// The position of the first complex equal to `complex`
    #[must_use]
    pub fn complex_index(&self, complex: &Complex) -> Option<usize> {
        self.complexes.iter().position(|c| c == complex)
    }

    /// The rate constant of the reaction at `reaction_index`, `k_{i}_{j}` for a reaction from complex `i` to `j`
    ///
    /// Rate constants share a namespace with species concentrations, which is why no species may be named like one
    #[must_use]
    pub fn rate_constant(&self, reaction_index: usize) -> Option<Symbol> {
        self.complex_indices
            .get(reaction_index)
            .map(|&(reactant, product)| Symbol::rate_constant(reactant, product))
    }

    /// The mass-action rate law of each reaction, in reaction order: `k * x1^a1 * x2^a2 * ...`, where each exponent
    /// is the coefficient of that species in the reactant complex
    #[must_use]
    pub fn rate_vector(&self) -> &[Expr] {
        &self.rates
    }

    /// The `n × r` matrix whose columns are the net change in each species caused by each reaction
    #[must_use]
    pub fn stoichiometric_matrix(&self) -> &[Vec<Coefficient>] {
        &self.stoichiometry
    }

    /// The right-hand sides of the mass-action ODEs, `S · v`, with one equation per species in species order
    #[must_use]
    pub fn ode_equations(&self) -> &[Expr] {
        &self.equations
    }

    /// Pairs `dX/dt` for every species with its equation from [`ReactionNetwork::ode_equations`]
    #[must_use]
    pub fn to_ode_system(&self) -> OdeSystem {
        let derivatives = self.species.iter().map(|s| Derivative::of(s.symbol()));
        OdeSystem::from_derivatives(zip(derivatives, self.equations.iter().cloned()))
    }
}

impl Display for ReactionNetwork {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reactions.iter().format("\n"))
    }
}

// Private Helper Functions ============================================================================================

fn rate_laws(
    species: &[Species],
    reactions: &[Reaction],
    complex_indices: &[(usize, usize)],
) -> Result<Vec<Expr>, AlgebraError> {
    let concentrations: Vec<_> = species.iter().map(Species::symbol).collect();

    zip(reactions, complex_indices)
        .map(|(reaction, &(reactant, product))| -> Result<_, AlgebraError> {
            let rate_constant = Monomial::from(Symbol::rate_constant(reactant, product));
            let exponents = reaction.reactant.as_vector(species);
            let powers = Monomial::from_powers(zip(concentrations.iter().cloned(), exponents))?;
            let rate = Expr::term(Coefficient::ONE, rate_constant.checked_mul(&powers)?);
            trace!(%reaction, %rate, "derived rate law");
            Ok(rate)
        })
        .collect()
}

fn stoichiometric_matrix(species: &[Species], reactions: &[Reaction]) -> Result<Vec<Vec<Coefficient>>, AlgebraError> {
    let columns: Vec<Vec<_>> = reactions
        .iter()
        .map(|reaction| -> Result<Vec<_>, AlgebraError> {
            let reactant = reaction.reactant.as_vector(species);
            let product = reaction.product.as_vector(species);
            zip(product, reactant)
                .map(|(p, r)| p.checked_sub(r).ok_or_else(|| AlgebraError::overflow(&p, '-', &r)))
                .collect()
        })
        .collect::<Result<_, _>>()?;

    Ok((0..species.len())
        .map(|row| columns.iter().map(|column| column[row]).collect())
        .collect())
}

fn mass_action_equations(stoichiometry: &[Vec<Coefficient>], rates: &[Expr]) -> Result<Vec<Expr>, AlgebraError> {
    let equations = stoichiometry
        .iter()
        .map(|row| {
            zip(row, rates).try_fold(Expr::zero(), |equation, (&s, rate)| -> Result<_, AlgebraError> {
                equation.checked_add(rate.scale(s)?)
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(equations = equations.len(), "derived mass-action equations");
    Ok(equations)
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use insta::assert_snapshot;
    use once_cell::sync::Lazy;
    use rust_decimal_macros::dec;

    use super::*;

    fn species(name: &str) -> Species {
        Species::new(name).unwrap()
    }

    fn complex(text: &str) -> Complex {
        Complex::parse(text).unwrap()
    }

    fn reaction(reactant: &str, product: &str) -> Reaction {
        Reaction::new(complex(reactant), complex(product))
    }

    // NOTE: Complexes are listed in the order {x1 + x2, 2 x2, x1, x2}, so `x2 -> x1` goes from complex 3 to 2
    static AUTOCATALYSIS: Lazy<ReactionNetwork> = Lazy::new(|| {
        ReactionNetwork::new(
            [species("x1"), species("x2")],
            [complex("x1 + x2"), complex("2 x2"), complex("x1"), complex("x2")],
            [reaction("x1 + x2", "2 x2"), reaction("x2", "x1")],
        )
        .unwrap()
    });

    #[test]
    fn sizes() {
        assert_eq!(AUTOCATALYSIS.n(), 2);
        assert_eq!(AUTOCATALYSIS.p(), 4);
        assert_eq!(AUTOCATALYSIS.r(), 2);
    }

    #[test]
    fn mass_action_equations() {
        let equations = AUTOCATALYSIS.ode_equations();
        assert_eq!(equations.len(), AUTOCATALYSIS.n());
        assert_eq!(equations[0].to_string(), "-k_0_1*x1*x2 + k_3_2*x2");
        assert_eq!(equations[1].to_string(), "k_0_1*x1*x2 - k_3_2*x2");
    }

    #[test]
    fn ode_system() {
        let system = AUTOCATALYSIS.to_ode_system();
        assert_snapshot!(system.to_string(), @r"
        dx1/dt = -k_0_1*x1*x2 + k_3_2*x2
        dx2/dt = k_0_1*x1*x2 - k_3_2*x2
        ");

        let expected = OdeSystem::from_equations(indoc! {"
            dx2/dt = k_0_1*x1*x2 - k_3_2*x2
            dx1/dt = k_3_2*x2 - k_0_1*x1*x2
        "})
        .unwrap();
        assert_eq!(system, expected);

        let parameters: Vec<_> = system.parameters().into_iter().map(Symbol::name).collect();
        assert_eq!(parameters, ["k_0_1", "k_3_2"]);
    }

    #[test]
    fn rate_constants() {
        assert_eq!(AUTOCATALYSIS.rate_constant(0).unwrap().name(), "k_0_1");
        assert_eq!(AUTOCATALYSIS.rate_constant(1).unwrap().name(), "k_3_2");
        assert_eq!(AUTOCATALYSIS.rate_constant(2), None);
    }

    #[test]
    fn rate_vector() {
        let rates: Vec<_> = AUTOCATALYSIS.rate_vector().iter().map(ToString::to_string).collect();
        assert_eq!(rates, ["k_0_1*x1*x2", "k_3_2*x2"]);
    }

    #[test]
    fn stoichiometric_matrix() {
        let matrix = AUTOCATALYSIS.stoichiometric_matrix();
        assert_eq!(matrix.len(), AUTOCATALYSIS.n());
        assert!(matrix.iter().all(|row| row.len() == AUTOCATALYSIS.r()));
        assert_eq!(matrix, [[dec!(-1), dec!(1)], [dec!(1), dec!(-1)]]);
    }

    #[test]
    fn complex_index() {
        assert_eq!(AUTOCATALYSIS.complex_index(&complex("x2 + x1")), Some(0));
        assert_eq!(AUTOCATALYSIS.complex_index(&complex("x2")), Some(3));
        assert_eq!(AUTOCATALYSIS.complex_index(&complex("3 x1")), None);
    }

    #[test]
    fn display() {
        assert_snapshot!(AUTOCATALYSIS.to_string(), @r"
        x1 + x2 -> 2 x2
        x2 -> x1
        ");
    }

    #[test]
    fn higher_order_rate_laws() {
        let network = ReactionNetwork::new(
            [species("A"), species("B")],
            [complex("2 A + B"), complex("")],
            [reaction("2 A + B", "")],
        )
        .unwrap();
        let equations: Vec<_> = network.ode_equations().iter().map(ToString::to_string).collect();
        // NOTE: Uppercase names sort before lowercase ones
        assert_eq!(equations, ["-2*A^2*B*k_0_1", "-A^2*B*k_0_1"]);
    }

    #[test]
    fn synthesis_has_a_constant_rate() {
        let network = ReactionNetwork::new(
            [species("x1")],
            [complex(""), complex("x1")],
            [reaction("", "x1")],
        )
        .unwrap();
        let rates: Vec<_> = network.rate_vector().iter().map(ToString::to_string).collect();
        assert_eq!(rates, ["k_0_1"]);
        assert_eq!(network.ode_equations()[0].to_string(), "k_0_1");
    }

    #[test]
    fn species_without_reactions() {
        let network =
            ReactionNetwork::new([species("A"), species("B")], [complex("A")], Vec::<Reaction>::new()).unwrap();
        assert_eq!(network.r(), 0);
        assert_eq!(network.stoichiometric_matrix(), vec![Vec::<Coefficient>::new(); 2]);
        assert!(network.ode_equations().iter().all(Expr::is_zero));
        assert_eq!(network.to_string(), "");
    }

    #[test]
    fn duplicate_species() {
        let error = ReactionNetwork::new([species("x1"), species("x1")], Vec::new(), Vec::new()).unwrap_err();
        assert_eq!(
            *error,
            CrnError::DuplicateSpecies {
                species: "x1".to_owned()
            }
        );
    }

    #[test]
    fn species_named_like_rate_constants() {
        let error = ReactionNetwork::new(
            [species("k_0_1"), species("B")],
            [complex("k_0_1"), complex("B")],
            [reaction("k_0_1", "B")],
        )
        .unwrap_err();
        assert_eq!(
            *error,
            CrnError::ReservedSpecies {
                species: "k_0_1".to_owned()
            }
        );

        let network = ReactionNetwork::new([species("k_cat")], [complex("k_cat"), complex("")], [reaction("k_cat", "")])
            .unwrap();
        assert_eq!(network.ode_equations()[0].to_string(), "-k_0_1*k_cat");
    }

    #[test]
    fn overflowing_coefficients() {
        let a = species("A");
        let max_a: Complex = [(a.clone(), Coefficient::MAX)].into_iter().collect();
        let min_a: Complex = [(a.clone(), -Coefficient::MAX)].into_iter().collect();

        // The stoichiometric matrix overflows: MAX - (-MAX)
        let error = ReactionNetwork::new(
            [a.clone()],
            [min_a.clone(), max_a.clone()],
            [Reaction::new(min_a, max_a.clone())],
        )
        .unwrap_err();
        assert!(matches!(
            *error,
            CrnError::Algebra {
                error: AlgebraError::Overflow { .. }
            }
        ));

        // Repeating a reaction doubles its (already huge) contribution to the equations
        let empty = Complex::new();
        let degradation = Reaction::new(max_a.clone(), empty.clone());
        let error = ReactionNetwork::new(
            [a],
            [max_a, empty],
            [degradation.clone(), degradation],
        )
        .unwrap_err();
        assert!(matches!(
            *error,
            CrnError::Algebra {
                error: AlgebraError::Overflow { .. }
            }
        ));
    }

    #[test]
    fn undeclared_species() {
        let error =
            ReactionNetwork::new([species("x1")], [complex("x1 + x2")], Vec::<Reaction>::new()).unwrap_err();
        assert_eq!(
            *error,
            CrnError::UndeclaredSpecies {
                complex: "x1 + x2".to_owned(),
                species: "x2".to_owned()
            }
        );
    }

    #[test]
    fn undeclared_complex() {
        let error = ReactionNetwork::new(
            [species("x1"), species("x2")],
            [complex("x1")],
            [reaction("x1", "x2")],
        )
        .unwrap_err();
        assert_eq!(
            *error,
            CrnError::UndeclaredComplex {
                reaction: "x1 -> x2".to_owned(),
                complex: "x2".to_owned()
            }
        );
    }

    #[test]
    fn complexes_are_matched_by_value() {
        // The reaction's complexes are built separately from the network's, and with a different species order
        let network = ReactionNetwork::new(
            [species("x1"), species("x2")],
            [complex("x1 + x2"), complex("2 x2")],
            [Reaction::new(
                [(species("x2"), dec!(1)), (species("x1"), dec!(1))].into_iter().collect(),
                [(species("x2"), dec!(2.0))].into_iter().collect(),
            )],
        )
        .unwrap();
        assert_eq!(network.rate_constant(0).unwrap().name(), "k_0_1");
    }
}
