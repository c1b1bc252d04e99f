// Standard Library Imports
use std::collections::hash_map::Entry;

// External Crate Imports
use ahash::{HashMap, HashMapExt};
use knuffel::{
    span::{Span, Spanned},
    Decode,
};
use miette::{Diagnostic, LabeledSpan, NamedSource, Result};
use thiserror::Error;
use tracing::debug;

// Local Crate Imports
use crate::{Complex, CrnError, Reaction, ReactionNetwork, Species};

// Public API ==========================================================================================================

impl ReactionNetwork {
    /// Loads a network from a KDL description that spells out the order of its species and complexes
    ///
    /// ```kdl
    /// species "x1" "x2"
    /// complexes {
    ///     complex "x1 + x2"
    ///     complex "2 x2"
    /// }
    /// reactions {
    ///     reaction "x1 + x2" "2 x2"
    /// }
    /// ```
    pub fn from_kdl(file_name: impl AsRef<str>, kdl_text: impl AsRef<str>) -> Result<Self> {
        let parsed_network: NetworkKdl = knuffel::parse(file_name.as_ref(), kdl_text.as_ref())?;
        let network = parsed_network
            .validate(())
            .map_err(|e| e.finalize(file_name, kdl_text))?;
        debug!(n = network.n(), p = network.p(), r = network.r(), "loaded network description");
        Ok(network)
    }
}

// KDL File Schema =====================================================================================================

#[derive(Debug, Decode)]
#[knuffel(span_type=Span)]
struct NetworkKdl {
    #[knuffel(child)]
    species: SpeciesKdl,
    #[knuffel(child)]
    complexes: ComplexesKdl,
    #[knuffel(child)]
    reactions: ReactionsKdl,
}

// ---------------------------------------------------------------------------------------------------------------------

#[derive(Debug, Decode)]
#[knuffel(span_type=Span)]
struct SpeciesKdl {
    #[knuffel(arguments)]
    names: Vec<Spanned<String, Span>>,
}

#[derive(Debug, Decode)]
#[knuffel(span_type=Span)]
struct ComplexesKdl {
    #[knuffel(children(name = "complex"))]
    complexes: Vec<ComplexKdl>,
}

#[derive(Debug, Decode)]
#[knuffel(span_type=Span)]
struct ReactionsKdl {
    #[knuffel(children(name = "reaction"))]
    reactions: Vec<ReactionKdl>,
}

// ---------------------------------------------------------------------------------------------------------------------

#[derive(Debug, Decode)]
#[knuffel(span_type=Span)]
struct ComplexKdl {
    #[knuffel(argument)]
    text: ComplexTextKdl,
}

#[derive(Debug, Decode)]
#[knuffel(span_type=Span)]
struct ReactionKdl {
    #[knuffel(span)]
    span: Span,
    #[knuffel(argument)]
    reactant: ComplexTextKdl,
    #[knuffel(argument)]
    product: ComplexTextKdl,
}

type ComplexTextKdl = Spanned<String, Span>;

// Contextual Validation Trait  ========================================================================================

type NetworkResult<T> = Result<T, NetworkErrorKind>;

trait ValidateInto<'c, T> {
    type Context: 'c;

    fn validate(self, ctx: Self::Context) -> NetworkResult<T>;
}

// Reaction Network Validation =========================================================================================

impl ValidateInto<'_, ReactionNetwork> for NetworkKdl {
    type Context = ();

    fn validate(self, _ctx: Self::Context) -> NetworkResult<ReactionNetwork> {
        let species = self.species.validate(())?;
        let complexes = self.complexes.validate(species.as_slice())?;
        let reactions = self.reactions.validate(complexes.as_slice())?;
        // NOTE: Everything has already been checked, but the constructor is the final word on what makes a network
        ReactionNetwork::new(species, complexes, reactions).map_err(|e| NetworkErrorKind::Network(*e))
    }
}

// Validate Species ====================================================================================================

impl ValidateInto<'_, Vec<Species>> for SpeciesKdl {
    type Context = ();

    fn validate(self, _ctx: Self::Context) -> NetworkResult<Vec<Species>> {
        let mut species = Vec::with_capacity(self.names.len());
        let mut seen_species = HashMap::new();

        for name in self.names {
            let span = *name.span();
            let new_species =
                Species::new(name.as_str()).map_err(|e| NetworkErrorKind::InvalidSpecies(span, *e))?;

            match seen_species.entry(new_species.clone()) {
                Entry::Occupied(e) => {
                    let first_defined_at = *e.get();
                    return Err(NetworkErrorKind::DuplicateSpecies(
                        first_defined_at,
                        span,
                        new_species.to_string(),
                    ));
                }
                Entry::Vacant(e) => e.insert(span),
            };
            species.push(new_species);
        }

        Ok(species)
    }
}

// Validate Complexes ==================================================================================================

impl<'s> ValidateInto<'s, Vec<Complex>> for ComplexesKdl {
    type Context = &'s [Species];

    fn validate(self, ctx: Self::Context) -> NetworkResult<Vec<Complex>> {
        let mut complexes = Vec::with_capacity(self.complexes.len());
        let mut seen_complexes = HashMap::new();

        for ComplexKdl { text } in self.complexes {
            let span = *text.span();
            let complex = text.validate(ctx)?;

            match seen_complexes.entry(complex.clone()) {
                Entry::Occupied(e) => {
                    let first_defined_at = *e.get();
                    return Err(NetworkErrorKind::DuplicateComplex(
                        first_defined_at,
                        span,
                        complex.to_string(),
                    ));
                }
                Entry::Vacant(e) => e.insert(span),
            };
            complexes.push(complex);
        }

        Ok(complexes)
    }
}

impl<'s> ValidateInto<'s, Complex> for ComplexTextKdl {
    type Context = &'s [Species];

    fn validate(self, ctx: Self::Context) -> NetworkResult<Complex> {
        let span = *self.span();
        let complex = Complex::parse(self.as_str()).map_err(|e| NetworkErrorKind::InvalidComplex(span, *e))?;

        if let Some(unknown) = complex.species().find(|s| !ctx.contains(s)) {
            return Err(NetworkErrorKind::UndeclaredSpecies(
                span,
                complex.to_string(),
                unknown.to_string(),
            ));
        }

        Ok(complex)
    }
}

// Validate Reactions ==================================================================================================

impl<'c> ValidateInto<'c, Vec<Reaction>> for ReactionsKdl {
    type Context = &'c [Complex];

    fn validate(self, ctx: Self::Context) -> NetworkResult<Vec<Reaction>> {
        self.reactions.into_iter().map(|r| r.validate(ctx)).collect()
    }
}

impl<'c> ValidateInto<'c, Reaction> for ReactionKdl {
    type Context = &'c [Complex];

    fn validate(self, ctx: Self::Context) -> NetworkResult<Reaction> {
        let declared_complex = |text: ComplexTextKdl| -> NetworkResult<Complex> {
            let span = *text.span();
            let complex = Complex::parse(text.as_str()).map_err(|e| NetworkErrorKind::InvalidComplex(span, *e))?;
            if ctx.contains(&complex) {
                Ok(complex)
            } else {
                Err(NetworkErrorKind::UndeclaredComplex(self.span, span, complex.to_string()))
            }
        };

        Ok(Reaction::new(
            declared_complex(self.reactant)?,
            declared_complex(self.product)?,
        ))
    }
}

// Validation Error Types and Trait Implementations  ===================================================================

#[derive(Debug, Error)]
#[error("failed to validate reaction network file")]
struct NetworkError {
    kdl: NamedSource<String>,
    #[source]
    kind: NetworkErrorKind,
}

// NOTE: The labels depend on the kind of error, so this can't be derived
impl Diagnostic for NetworkError {
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.kdl)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        Some(Box::new(self.kind.labels().into_iter().map(|(s, l)| {
            LabeledSpan::new_with_span(Some(l.to_owned()), *s)
        })))
    }

    fn diagnostic_source(&self) -> Option<&dyn Diagnostic> {
        Some(&self.kind)
    }
}

#[derive(Clone, Debug, Diagnostic, Error)]
enum NetworkErrorKind {
    #[error("the species {2:?} has already been defined")]
    #[diagnostic(help("each species should only be listed once, remove the duplicate"))]
    DuplicateSpecies(Span, Span, String),

    #[error("the complex {2:?} has already been defined")]
    #[diagnostic(help(
        "complexes are compared by their contents, so `A + B` and `B + A` are the same complex"
    ))]
    DuplicateComplex(Span, Span, String),

    #[error("the complex {1:?} contains the species {2:?}, which is not in the species list")]
    #[diagnostic(help("double-check for typos, or add {2:?} to the species list"))]
    UndeclaredSpecies(Span, String, String),

    #[error("the complex {2:?} is not in the complexes list")]
    #[diagnostic(help("double-check for typos, or add {2:?} to the complexes section"))]
    UndeclaredComplex(Span, Span, String),

    #[error("network file contained an invalid species name")]
    InvalidSpecies(
        Span,
        #[source]
        #[diagnostic_source]
        CrnError,
    ),

    #[error("network file contained an invalid complex")]
    InvalidComplex(
        Span,
        #[source]
        #[diagnostic_source]
        CrnError,
    ),

    #[error("network file described an invalid reaction network")]
    Network(
        #[source]
        #[diagnostic_source]
        CrnError,
    ),
}

impl NetworkErrorKind {
    fn labels(&self) -> Vec<(&Span, &'static str)> {
        match self {
            Self::DuplicateSpecies(s1, s2, _) | Self::DuplicateComplex(s1, s2, _) => {
                vec![(s1, "first defined here"), (s2, "then again here")]
            }
            Self::UndeclaredSpecies(s, _, _) => vec![(s, "undeclared species")],
            Self::UndeclaredComplex(s1, s2, _) => {
                vec![(s1, "in this reaction"), (s2, "undeclared complex")]
            }
            Self::InvalidSpecies(s, _) => vec![(s, "invalid species name")],
            Self::InvalidComplex(s, _) => vec![(s, "invalid complex")],
            Self::Network(_) => Vec::new(),
        }
    }

    fn finalize(self, file_name: impl AsRef<str>, kdl: impl AsRef<str>) -> NetworkError {
        let kdl = NamedSource::new(file_name, kdl.as_ref().to_owned());
        NetworkError { kdl, kind: self }
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use insta::assert_snapshot;

    use super::*;
    use crate::{parsers::errors::CrnErrorKind, testing_tools::render_report};

    const KDL: &str = include_str!("../../tests/data/autocatalysis.kdl");

    fn validate(kdl: &str) -> NetworkResult<ReactionNetwork> {
        let network: NetworkKdl = knuffel::parse("test", kdl).unwrap();
        network.validate(())
    }

    fn rendered_error(kdl: &str) -> String {
        let error = ReactionNetwork::from_kdl("test.kdl", kdl).unwrap_err();
        render_report(&*error)
    }

    #[test]
    fn load_autocatalysis() {
        let network = ReactionNetwork::from_kdl("autocatalysis.kdl", KDL).unwrap();
        assert_eq!((network.n(), network.p(), network.r()), (2, 4, 2));
        assert_snapshot!(network.to_ode_system().to_string(), @r"
        dx1/dt = -k_0_1*x1*x2 + k_3_2*x2
        dx2/dt = k_0_1*x1*x2 - k_3_2*x2
        ");
    }

    #[test]
    fn explicit_order_beats_first_seen_order() {
        let loaded = ReactionNetwork::from_kdl("autocatalysis.kdl", KDL).unwrap();
        let from_diagram = ReactionNetwork::from_diagram(loaded.to_string()).unwrap();
        assert_ne!(loaded, from_diagram);
        assert_eq!(loaded.rate_constant(1).unwrap().name(), "k_3_2");
        assert_eq!(from_diagram.rate_constant(1).unwrap().name(), "k_2_3");
    }

    #[test]
    fn empty_complexes_and_sections() {
        let network = validate(indoc! {r#"
            species "x1"
            complexes {
                complex ""
                complex "x1"
            }
            reactions {
                reaction "" "x1"
                reaction "x1" ""
            }
        "#})
        .unwrap();
        assert_eq!(network.to_string(), "-> x1\nx1 ->");

        let network = validate(indoc! {r#"
            species
            complexes
            reactions
        "#})
        .unwrap();
        assert_eq!((network.n(), network.p(), network.r()), (0, 0, 0));
    }

    #[test]
    fn duplicate_species() {
        let kdl = indoc! {r#"
            species "x1" "x2" "x1"
            complexes
            reactions
        "#};
        let error = validate(kdl).unwrap_err();
        assert!(matches!(&error, NetworkErrorKind::DuplicateSpecies(_, _, s) if s == "x1"));

        let report = rendered_error(kdl);
        assert!(report.contains("the species \"x1\" has already been defined"));
        assert!(report.contains("first defined here"));
        assert!(report.contains("then again here"));
    }

    #[test]
    fn invalid_species() {
        let error = validate(indoc! {r#"
            species "x1" "2x"
            complexes
            reactions
        "#})
        .unwrap_err();
        let NetworkErrorKind::InvalidSpecies(_, CrnError::Expression { error }) = error else {
            panic!("expected an invalid species name");
        };
        assert_eq!(error.kind(), Some(&CrnErrorKind::ExpectedIdentifier));
    }

    #[test]
    fn duplicate_complexes() {
        let error = validate(indoc! {r#"
            species "A" "B"
            complexes {
                complex "A + B"
                complex "B + A"
            }
            reactions
        "#})
        .unwrap_err();
        assert!(matches!(&error, NetworkErrorKind::DuplicateComplex(_, _, c) if c == "A + B"));
    }

    #[test]
    fn complexes_with_undeclared_species() {
        let kdl = indoc! {r#"
            species "A"
            complexes {
                complex "A + C"
            }
            reactions
        "#};
        let error = validate(kdl).unwrap_err();
        assert!(matches!(
            &error,
            NetworkErrorKind::UndeclaredSpecies(_, c, s) if c == "A + C" && s == "C"
        ));
        assert!(rendered_error(kdl).contains("undeclared species"));
    }

    #[test]
    fn invalid_complexes() {
        let kdl = indoc! {r#"
            species "A" "B"
            complexes {
                complex "A * B"
            }
            reactions
        "#};
        let error = validate(kdl).unwrap_err();
        assert!(matches!(error, NetworkErrorKind::InvalidComplex(..)));
        assert!(rendered_error(kdl).contains("invalid complex"));
    }

    #[test]
    fn reactions_with_undeclared_complexes() {
        let kdl = indoc! {r#"
            species "A" "B"
            complexes {
                complex "A"
                complex "B"
            }
            reactions {
                reaction "A" "B"
                reaction "B" "2 A"
            }
        "#};
        let error = validate(kdl).unwrap_err();
        assert!(matches!(&error, NetworkErrorKind::UndeclaredComplex(_, _, c) if c == "2 A"));

        let report = rendered_error(kdl);
        assert!(report.contains("in this reaction"));
        assert!(report.contains("undeclared complex"));
    }

    #[test]
    fn malformed_kdl() {
        // Missing sections
        assert!(ReactionNetwork::from_kdl("test.kdl", r#"species "A""#).is_err());
        // Reactions need both sides
        assert!(ReactionNetwork::from_kdl(
            "test.kdl",
            indoc! {r#"
                species "A"
                complexes {
                    complex "A"
                }
                reactions {
                    reaction "A"
                }
            "#}
        )
        .is_err());
    }
}
