use std::fmt::{self, Display, Formatter};

use crate::{Complex, Reaction};

impl Reaction {
    #[must_use]
    pub const fn new(reactant: Complex, product: Complex) -> Self {
        Self { reactant, product }
    }

    #[must_use]
    pub const fn reactant(&self) -> &Complex {
        &self.reactant
    }

    #[must_use]
    pub const fn product(&self) -> &Complex {
        &self.product
    }
}

// NOTE: Written in diagram syntax, so an empty side leaves the arrow bare, as in `-> x1`
impl Display for Reaction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match (self.reactant.is_empty(), self.product.is_empty()) {
            (true, true) => write!(f, "->"),
            (true, false) => write!(f, "-> {}", self.product),
            (false, true) => write!(f, "{} ->", self.reactant),
            (false, false) => write!(f, "{} -> {}", self.reactant, self.product),
        }
    }
}
