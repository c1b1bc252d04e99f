use nom_miette::final_parser;

use crate::{parsers::complex::species, Result, Species, Symbol};

impl Species {
    /// Species names follow the identifier rules of expressions, like `x1`, `ATP`, or `E_S`
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let species = final_parser(species)(name.as_ref().trim())?;
        Ok(species)
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.0
    }

    /// The concentration variable of this species
    #[must_use]
    pub fn symbol(&self) -> Symbol {
        Symbol(self.0.clone())
    }
}

impl From<Symbol> for Species {
    fn from(Symbol(name): Symbol) -> Self {
        Self(name)
    }
}
