use miette::Diagnostic;
use thiserror::Error;

use crate::{parsers::errors::ExpressionError, symbolic::errors::AlgebraError};

pub type Result<T, E = Box<CrnError>> = std::result::Result<T, E>;

#[derive(Debug, Diagnostic, Clone, Eq, PartialEq, Error)]
pub enum CrnError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Expression {
        #[from]
        error: ExpressionError,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Algebra {
        #[from]
        error: AlgebraError,
    },

    #[diagnostic(help("each species should only be listed once, remove the duplicate"))]
    #[error("the species {species:?} appears more than once in the species list")]
    DuplicateSpecies { species: String },

    #[diagnostic(help("names like k_0_1 are given to rate constants, so rename the species"))]
    #[error("the species {species:?} would share its name with one of the network's rate constants")]
    ReservedSpecies { species: String },

    #[diagnostic(help("add {species:?} to the list of species, or remove it from the complex"))]
    #[error("the complex {complex:?} contains the species {species:?}, which is not part of the network")]
    UndeclaredSpecies { complex: String, species: String },

    #[diagnostic(help("add {complex:?} to the list of complexes, or remove the reaction"))]
    #[error("the reaction {reaction:?} involves the complex {complex:?}, which is not part of the network")]
    UndeclaredComplex { reaction: String, complex: String },

    #[diagnostic(help("every reaction should be written as `reactants -> products`"))]
    #[error("invalid reaction on line {line_number}: {line:?} contains {arrows} arrows, but exactly one is required")]
    InvalidReaction {
        line_number: usize,
        line: String,
        arrows: usize,
    },
}

impl CrnError {
    pub(crate) fn duplicate_species(species: &impl ToString) -> Self {
        let species = species.to_string();

        Self::DuplicateSpecies { species }
    }

    pub(crate) fn reserved_species(species: &impl ToString) -> Self {
        let species = species.to_string();

        Self::ReservedSpecies { species }
    }

    pub(crate) fn undeclared_species(complex: &impl ToString, species: &impl ToString) -> Self {
        let complex = complex.to_string();
        let species = species.to_string();

        Self::UndeclaredSpecies { complex, species }
    }

    pub(crate) fn undeclared_complex(reaction: &impl ToString, complex: &impl ToString) -> Self {
        let reaction = reaction.to_string();
        let complex = complex.to_string();

        Self::UndeclaredComplex { reaction, complex }
    }

    pub(crate) fn invalid_reaction(line_number: usize, line: &str, arrows: usize) -> Self {
        let line = line.to_owned();

        Self::InvalidReaction {
            line_number,
            line,
            arrows,
        }
    }
}

impl From<ExpressionError> for Box<CrnError> {
    fn from(error: ExpressionError) -> Self {
        Box::new(error.into())
    }
}

impl From<AlgebraError> for Box<CrnError> {
    fn from(error: AlgebraError) -> Self {
        Box::new(error.into())
    }
}
