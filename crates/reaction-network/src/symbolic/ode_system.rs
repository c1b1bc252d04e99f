use std::{
    collections::BTreeSet,
    fmt::{self, Display, Formatter},
};

use nom_miette::final_parser;

use crate::{parsers::equation::equation, Derivative, Expr, OdeSystem, Result, Symbol};

impl Derivative {
    #[must_use]
    pub const fn of(variable: Symbol) -> Self {
        Self(variable)
    }

    #[must_use]
    pub const fn variable(&self) -> &Symbol {
        &self.0
    }
}

impl OdeSystem {
    /// Builds a system from `(dX/dt, rhs)` pairs, keeping their order
    ///
    /// If the same derivative appears more than once, the last right-hand side wins but the first position is kept
    pub fn from_derivatives(derivatives: impl IntoIterator<Item = (Derivative, Expr)>) -> Self {
        let mut equations: Vec<(Derivative, Expr)> = Vec::new();
        for (derivative, rhs) in derivatives {
            if let Some((_, existing)) = equations.iter_mut().find(|(d, _)| *d == derivative) {
                *existing = rhs;
            } else {
                equations.push((derivative, rhs));
            }
        }
        Self { equations }
    }

    /// Parses one `dX/dt = expression` equation per line, skipping blank lines
    pub fn from_equations(text: impl AsRef<str>) -> Result<Self> {
        let mut parser = final_parser(equation);
        let equations = text
            .as_ref()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| parser(line))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_derivatives(equations))
    }

    pub fn equations(&self) -> impl Iterator<Item = (&Derivative, &Expr)> {
        self.equations.iter().map(|(derivative, rhs)| (derivative, rhs))
    }

    #[must_use]
    pub fn derivative(&self, variable: &Symbol) -> Option<&Expr> {
        self.equations
            .iter()
            .find_map(|(derivative, rhs)| (derivative.variable() == variable).then_some(rhs))
    }

    pub fn variables(&self) -> impl Iterator<Item = &Symbol> {
        self.equations.iter().map(|(derivative, _)| derivative.variable())
    }

    /// Every symbol on a right-hand side that isn't one of the state variables, like rate constants
    #[must_use]
    pub fn parameters(&self) -> BTreeSet<&Symbol> {
        let variables: BTreeSet<_> = self.variables().collect();
        self.equations
            .iter()
            .flat_map(|(_, rhs)| rhs.symbols())
            .filter(|symbol| !variables.contains(symbol))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.equations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.equations.is_empty()
    }
}

// NOTE: Two systems are the same if they assign the same right-hand sides, whatever order the equations are listed in
impl PartialEq for OdeSystem {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .equations()
                .all(|(derivative, rhs)| other.derivative(derivative.variable()) == Some(rhs))
    }
}

impl Eq for OdeSystem {}

impl Display for OdeSystem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (index, (derivative, rhs)) in self.equations().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{derivative} = {rhs}")?;
        }
        Ok(())
    }
}
