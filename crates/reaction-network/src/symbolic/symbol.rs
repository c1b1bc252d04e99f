use nom_miette::final_parser;

use crate::{parsers::primitives::identifier, Result, Symbol};

impl Symbol {
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let name = final_parser(identifier)(name.as_ref().trim())?;
        Ok(Self(name.to_owned()))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    // NOTE: Named after the positions of the reactant and product complexes, which is always a valid identifier
    pub(crate) fn rate_constant(reactant_index: usize, product_index: usize) -> Self {
        Self(format!("k_{reactant_index}_{product_index}"))
    }

    /// Matches every name `rate_constant` could produce, `k_{i}_{j}`
    pub(crate) fn is_rate_constant(&self) -> bool {
        let is_index = |index: &str| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit());
        self.0
            .strip_prefix("k_")
            .and_then(|indices| indices.split_once('_'))
            .is_some_and(|(i, j)| is_index(i) && is_index(j))
    }
}
