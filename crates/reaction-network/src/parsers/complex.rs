use nom::combinator::map;
use nom_miette::map_res;

use super::{
    errors::ParseResult,
    expression::expression,
    primitives::identifier,
};
use crate::{Complex, Species};

/// Species = Identifier ;
pub fn species(i: &str) -> ParseResult<Species> {
    map(identifier, |name| Species(name.to_owned()))(i)
}

/// Complex = Expression ; (* expanding to a linear combination of species *)
pub fn complex(i: &str) -> ParseResult<Complex> {
    map_res(expression, Complex::from_linear_combination)(i)
}
