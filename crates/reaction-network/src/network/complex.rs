use std::{
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
};

use nom_miette::final_parser;

use crate::{
    parsers::complex::complex, symbolic::errors::AlgebraError, Coefficient, Complex, Expr, Result, Species,
};

impl Complex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a linear combination of species, like `x1 + 2 x2`
    ///
    /// Blank text is the empty complex, `0`, used for synthesis and degradation reactions
    pub fn parse(text: impl AsRef<str>) -> Result<Self> {
        let text = text.as_ref().trim();
        if text.is_empty() {
            return Ok(Self::new());
        }

        let complex = final_parser(complex)(text)?;
        Ok(complex)
    }

    pub(crate) fn from_linear_combination(expr: Expr) -> Result<Self, AlgebraError> {
        let terms = expr.linear_coefficients()?;
        Ok(terms
            .into_iter()
            .map(|(symbol, coefficient)| (Species::from(symbol), coefficient))
            .collect())
    }

    /// Sets the coefficient of `species`, returning its previous coefficient
    pub fn insert(&mut self, species: Species, coefficient: Coefficient) -> Option<Coefficient> {
        let coefficient = coefficient.normalize();
        if let Some((_, existing)) = self.0.iter_mut().find(|(s, _)| *s == species) {
            Some(std::mem::replace(existing, coefficient))
        } else {
            self.0.push((species, coefficient));
            None
        }
    }

    pub fn remove(&mut self, species: &Species) -> Option<Coefficient> {
        let index = self.0.iter().position(|(s, _)| s == species)?;
        Some(self.0.remove(index).1)
    }

    #[must_use]
    pub fn get(&self, species: &Species) -> Option<Coefficient> {
        self.iter().find_map(|(s, c)| (s == species).then_some(c))
    }

    /// Species that aren't part of the complex have a coefficient of zero
    #[must_use]
    pub fn coefficient(&self, species: &Species) -> Coefficient {
        self.get(species).unwrap_or_default()
    }

    #[must_use]
    pub fn contains(&self, species: &Species) -> bool {
        self.get(species).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Species, Coefficient)> {
        self.0.iter().map(|(species, coefficient)| (species, *coefficient))
    }

    pub fn species(&self) -> impl Iterator<Item = &Species> {
        self.0.iter().map(|(species, _)| species)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lays the complex out as a column vector, with one entry for each of the given species
    #[must_use]
    pub fn as_vector(&self, species: &[Species]) -> Vec<Coefficient> {
        species.iter().map(|s| self.coefficient(s)).collect()
    }
}

impl FromIterator<(Species, Coefficient)> for Complex {
    fn from_iter<T: IntoIterator<Item = (Species, Coefficient)>>(iter: T) -> Self {
        let mut complex = Self::new();
        for (species, coefficient) in iter {
            complex.insert(species, coefficient);
        }
        complex
    }
}

impl PartialEq for Complex {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(s, c)| other.get(s) == Some(c))
    }
}

impl Eq for Complex {}

impl Hash for Complex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut entries: Vec<_> = self.0.iter().collect();
        entries.sort_unstable();
        entries.hash(state);
    }
}

impl Display for Complex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (index, (species, coefficient)) in self.iter().enumerate() {
            match (index, coefficient.is_sign_negative()) {
                (0, true) => write!(f, "-")?,
                (0, false) => (),
                (_, true) => write!(f, " - ")?,
                (_, false) => write!(f, " + ")?,
            }

            let magnitude = coefficient.abs();
            if magnitude == Coefficient::ONE {
                write!(f, "{species}")?;
            } else {
                write!(f, "{magnitude} {species}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::hash::BuildHasher;

    use ahash::RandomState;
    use rust_decimal_macros::dec;

    use super::*;

    fn species(name: &str) -> Species {
        Species::new(name).unwrap()
    }

    #[test]
    fn parse_complexes() {
        let complex = Complex::parse("x1 + x2").unwrap();
        assert_eq!(complex.get(&species("x1")), Some(dec!(1)));
        assert_eq!(complex.get(&species("x2")), Some(dec!(1)));
        assert_eq!(complex.get(&species("x3")), None);
        assert_eq!(complex.coefficient(&species("x3")), dec!(0));

        assert_eq!(Complex::parse("   ").unwrap(), Complex::new());
        assert_eq!(Complex::parse("").unwrap(), Complex::new());
        assert!(Complex::parse("x1 +").is_err());
        assert!(Complex::parse("x1 * x2").is_err());
    }

    #[test]
    fn insert_and_remove() {
        let mut complex = Complex::new();
        assert!(complex.is_empty());
        assert_eq!(complex.insert(species("B"), dec!(2)), None);
        assert_eq!(complex.insert(species("A"), dec!(1)), None);
        assert_eq!(complex.insert(species("B"), dec!(3)), Some(dec!(2)));
        assert_eq!(complex.len(), 2);
        assert!(complex.contains(&species("A")));

        // Insertion order is kept
        let order: Vec<_> = complex.species().map(Species::key).collect();
        assert_eq!(order, ["B", "A"]);

        assert_eq!(complex.remove(&species("B")), Some(dec!(3)));
        assert_eq!(complex.remove(&species("B")), None);
        assert_eq!(complex.len(), 1);
    }

    #[test]
    fn equality_ignores_order() {
        let forwards: Complex = [(species("A"), dec!(1)), (species("B"), dec!(2))].into_iter().collect();
        let backwards: Complex = [(species("B"), dec!(2.0)), (species("A"), dec!(1))].into_iter().collect();
        let different: Complex = [(species("A"), dec!(2)), (species("B"), dec!(1))].into_iter().collect();
        let larger: Complex = Complex::parse("A + 2 B + C").unwrap();

        assert_eq!(forwards, backwards);
        assert_eq!(forwards, Complex::parse("2 B + A").unwrap());
        assert_ne!(forwards, different);
        assert_ne!(forwards, larger);
        assert_ne!(larger, forwards);

        let hasher = RandomState::new();
        assert_eq!(hasher.hash_one(&forwards), hasher.hash_one(&backwards));
    }

    #[test]
    fn as_vector() {
        let order = [species("x1"), species("x2"), species("x3")];
        let complex = Complex::parse("2 x3 + x1").unwrap();
        assert_eq!(complex.as_vector(&order), [dec!(1), dec!(0), dec!(2)]);
        assert_eq!(Complex::new().as_vector(&order), [dec!(0); 3]);
    }

    #[test]
    fn display() {
        assert_eq!(Complex::parse("x1 + x2").unwrap().to_string(), "x1 + x2");
        assert_eq!(Complex::parse("2 x2").unwrap().to_string(), "2 x2");
        assert_eq!(Complex::parse("0.5 B + A").unwrap().to_string(), "A + 0.5 B");
        assert_eq!(Complex::new().to_string(), "");

        let mut complex = Complex::new();
        complex.insert(species("B"), dec!(-1));
        complex.insert(species("A"), dec!(3));
        assert_eq!(complex.to_string(), "-B + 3 A");
        assert_eq!(Complex::parse(complex.to_string()).unwrap(), complex);
    }
}
