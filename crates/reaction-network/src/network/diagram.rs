use itertools::Itertools;
use tracing::{debug, trace};

use crate::{Complex, CrnError, Reaction, ReactionNetwork, Result};

const ARROW: &str = "->";

impl ReactionNetwork {
    /// Builds a network from a reaction diagram with one `reactants -> products` reaction per line
    ///
    /// Either side may be left empty for synthesis or degradation. Species and complexes are numbered in the order
    /// they're first seen, which fixes the names of the rate constants.
    ///
    /// ```
    /// # use reaction_network::ReactionNetwork;
    /// let network = ReactionNetwork::from_diagram("x1 + x2 -> 2 x2\nx2 -> x1")?;
    /// assert_eq!(network.n(), 2);
    /// assert_eq!(network.p(), 4);
    /// # Ok::<(), Box<reaction_network::CrnError>>(())
    /// ```
    pub fn from_diagram(diagram: impl AsRef<str>) -> Result<Self> {
        let mut species = Vec::new();
        let mut complexes = Vec::new();
        let mut reactions = Vec::new();

        for (index, line) in diagram.as_ref().lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let reaction = parse_reaction(index + 1, line)?;
            species.extend(
                reaction
                    .reactant()
                    .species()
                    .chain(reaction.product().species())
                    .cloned(),
            );
            complexes.extend([reaction.reactant().clone(), reaction.product().clone()]);
            reactions.push(reaction);
        }

        debug!(reactions = reactions.len(), "parsed reaction diagram");
        Self::new(species.into_iter().unique(), complexes.into_iter().unique(), reactions)
    }
}

fn parse_reaction(line_number: usize, line: &str) -> Result<Reaction> {
    let sides: Vec<_> = line.split(ARROW).collect();
    let [reactant, product] = sides[..] else {
        return Err(Box::new(CrnError::invalid_reaction(line_number, line, sides.len() - 1)));
    };

    let reaction = Reaction::new(Complex::parse(reactant)?, Complex::parse(product)?);
    trace!(line_number, %reaction, "parsed reaction");
    Ok(reaction)
}
