//! Glue between `nom` parsers and `miette` diagnostics
//!
//! Parsers produce [`LabeledParseError`]s, which borrow the input and remember which alternatives were tried. Once a
//! parse has finished, [`final_parser`] turns that borrowed error into an owned [`LabeledError`] that can be rendered
//! with labels pointing into the original source text.

use std::fmt;

// External Crate Imports
use ahash::{HashMap, HashMapExt};
use miette::{Diagnostic, LabeledSpan, SourceSpan};
use nom::{
    combinator::{all_consuming, complete, consumed},
    error::ParseError,
    Err, Finish, IResult, Parser,
};
use thiserror::Error;

// Public API ==========================================================================================================

/// An owned parsing error, ready to be reported as a [`Diagnostic`]
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("{error}")]
pub struct LabeledError<E: LabeledErrorKind> {
    full_input: String,
    labels: Vec<LabeledSpan>,
    error: ErrorTree<E>,
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ErrorTree<E: LabeledErrorKind> {
    #[error("{kind}")]
    Node {
        kind: E,
        #[source]
        source: Option<Box<LabeledError<E>>>,
    },
    #[error("attempted {} parse branches unsuccessfully", .0.len())]
    Branch(Vec<LabeledError<E>>),
}

/// The borrowed error type threaded through `nom` parsers
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LabeledParseError<'a, E> {
    input: &'a str,
    length: usize,
    kind: E,
    alternatives: Vec<LabeledParseError<'a, E>>,
    source: Option<Box<LabeledParseError<'a, E>>>,
}

pub trait LabeledErrorKind: Diagnostic + Clone + Eq + From<nom::error::ErrorKind> {
    fn label(&self) -> Option<&'static str> {
        None
    }
}

/// Converts errors from outside of `nom` (semantic validation, lookups, arithmetic) into parse errors
pub trait FromExternalError<'a, E> {
    /// Fatal errors stop `alt()` from trying other branches
    const FATAL: bool = false;

    fn from_external_error(input: &'a str, error: E) -> Self;
}

impl<E: LabeledErrorKind> LabeledError<E> {
    pub fn kind(&self) -> Option<&E> {
        match &self.error {
            ErrorTree::Node { kind, .. } => Some(kind),
            ErrorTree::Branch(_) => None,
        }
    }

    /// Walks down the chain of wrapped errors, returning the most specific error kind
    pub fn root_kind(&self) -> Option<&E> {
        match &self.error {
            ErrorTree::Node {
                source: Some(source),
                ..
            } => source.root_kind(),
            ErrorTree::Node { kind, .. } => Some(kind),
            ErrorTree::Branch(_) => None,
        }
    }

    pub fn labeled_spans(&self) -> &[LabeledSpan] {
        &self.labels
    }
}

impl<'a, E: LabeledErrorKind> LabeledParseError<'a, E> {
    pub fn new(input: &'a str, kind: E) -> Self {
        Self::new_with_source(input, kind, None)
    }

    pub fn new_with_source(input: &'a str, kind: E, source: Option<Self>) -> Self {
        Self {
            input,
            length: 0,
            kind,
            alternatives: Vec::new(),
            source: source.map(Box::new),
        }
    }
}

/// Runs `parser` to completion, requiring that it consumes all of its input
pub fn final_parser<'a, O, P, E>(parser: P) -> impl FnMut(&'a str) -> Result<O, LabeledError<E>>
where
    E: LabeledErrorKind,
    P: Parser<&'a str, O, LabeledParseError<'a, E>>,
{
    let mut parser = all_consuming(complete(parser));
    move |input| {
        parser.parse(input).finish().map(|(_, o)| o).map_err(|e| {
            let mut error = e.into_final_error(input);
            error.bubble_labels();
            error
        })
    }
}

/// Like `nom::combinator::map_res`, but the error returned by `f` is kept and labels the whole consumed span
pub fn map_res<'a, O1, O2, E1, E2, F, G>(
    parser: F,
    mut f: G,
) -> impl FnMut(&'a str) -> IResult<&'a str, O2, LabeledParseError<'a, E1>>
where
    E1: LabeledErrorKind,
    F: Copy + Parser<&'a str, O1, LabeledParseError<'a, E1>>,
    G: Copy + FnMut(O1) -> Result<O2, E2>,
    LabeledParseError<'a, E1>: FromExternalError<'a, E2>,
{
    move |input| {
        let (rest, (consumed_input, o1)) = consumed(parser)(input)?;
        f(o1).map(|o2| (rest, o2)).map_err(|e| {
            let error = LabeledParseError {
                length: consumed_input.len(),
                ..LabeledParseError::from_external_error(input, e)
            };
            if <LabeledParseError<'a, E1> as FromExternalError<'a, E2>>::FATAL {
                Err::Failure(error)
            } else {
                Err::Error(error)
            }
        })
    }
}

/// Wraps any error from `parser` in a new error of `kind`, keeping the original as its source
pub fn wrap_err<'a, O, P, E>(
    mut parser: P,
    kind: E,
) -> impl FnMut(&'a str) -> IResult<&'a str, O, LabeledParseError<'a, E>>
where
    E: LabeledErrorKind,
    P: Parser<&'a str, O, LabeledParseError<'a, E>>,
{
    move |i| {
        parser
            .parse(i)
            .map_err(|e| e.map(|e| LabeledParseError::new_with_source(i, kind.clone(), Some(e))))
    }
}

/// Replaces any error from `parser` with a new error of `kind`, discarding the original
pub fn expect<'a, O, P, E>(
    mut parser: P,
    kind: E,
) -> impl FnMut(&'a str) -> IResult<&'a str, O, LabeledParseError<'a, E>>
where
    E: LabeledErrorKind,
    P: Parser<&'a str, O, LabeledParseError<'a, E>>,
{
    move |i| {
        parser
            .parse(i)
            .map_err(|e| e.map(|_| LabeledParseError::new(i, kind.clone())))
    }
}

// Trait Implementations ===============================================================================================

impl<E: LabeledErrorKind> Diagnostic for LabeledError<E> {
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.full_input)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.kind().and_then(|kind| kind.help())
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(self.labels.iter().cloned()))
    }

    fn related<'a>(&'a self) -> Option<Box<dyn Iterator<Item = &'a dyn Diagnostic> + 'a>> {
        if let ErrorTree::Branch(related) = &self.error {
            Some(Box::new(related.iter().map(|e| e as &dyn Diagnostic)))
        } else {
            None
        }
    }

    fn diagnostic_source(&self) -> Option<&dyn Diagnostic> {
        if let ErrorTree::Node {
            source: Some(source),
            ..
        } = &self.error
        {
            Some(&**source)
        } else {
            None
        }
    }
}

impl<'a, E: LabeledErrorKind> ParseError<&'a str> for LabeledParseError<'a, E> {
    fn from_error_kind(input: &'a str, kind: nom::error::ErrorKind) -> Self {
        Self::new(input, kind.into())
    }

    fn append(_input: &str, _kind: nom::error::ErrorKind, other: Self) -> Self {
        other
    }

    fn or(mut self, other: Self) -> Self {
        self.alternatives.push(other);
        self
    }
}

// Private Helper Methods ==============================================================================================

impl<E: LabeledErrorKind> LabeledError<E> {
    // NOTE: Wrapping errors don't carry labels of their own, so the labels of their children are hoisted up until
    // something at the top of the tree has a label to show
    fn bubble_labels(&mut self) {
        if !self.labels.is_empty() {
            return;
        }

        match &mut self.error {
            ErrorTree::Node {
                source: Some(child),
                ..
            } => {
                child.bubble_labels();
                self.labels = child.labels.drain(..).collect();
            }
            ErrorTree::Branch(alternatives) => {
                let labels = alternatives.iter_mut().flat_map(|child| {
                    child.bubble_labels();
                    child.labels.drain(..)
                });
                self.labels = Self::merge_labels(labels);
            }
            ErrorTree::Node { source: None, .. } => (),
        }
    }

    // Labels pointing at the same span are joined with "or", labels with different spans are kept separate
    fn merge_labels(labels: impl Iterator<Item = LabeledSpan>) -> Vec<LabeledSpan> {
        let mut spans: Vec<SourceSpan> = Vec::new();
        let mut span_labels: HashMap<SourceSpan, Vec<String>> = HashMap::new();
        for labeled_span in labels {
            let span = *labeled_span.inner();
            let label = labeled_span.label().unwrap_or_default().to_owned();
            span_labels
                .entry(span)
                .or_insert_with(|| {
                    spans.push(span);
                    Vec::new()
                })
                .push(label);
        }

        spans
            .into_iter()
            .map(|span| {
                let label = span_labels[&span].join(" or ");
                LabeledSpan::new_with_span(Some(label), span)
            })
            .collect()
    }
}

impl<'a, E: LabeledErrorKind> LabeledParseError<'a, E> {
    fn into_final_error(self, full_input: &str) -> LabeledError<E> {
        // NOTE: The trailing space gives labels pointing at the end of the input something to underline
        let padded_input = format!("{full_input} ");

        if !self.alternatives.is_empty() {
            let Self {
                input,
                length,
                kind,
                alternatives,
                source,
            } = self;
            let first = Self {
                input,
                length,
                kind,
                alternatives: Vec::new(),
                source,
            };
            let branches = std::iter::once(first)
                .chain(alternatives)
                .map(|e| e.into_final_error(full_input))
                .collect();
            return LabeledError {
                full_input: padded_input,
                labels: Vec::new(),
                error: ErrorTree::Branch(branches),
            };
        }

        let span = self.span_within(full_input);
        let labels = self
            .kind
            .label()
            .map(|label| LabeledSpan::new_with_span(Some(label.to_owned()), span))
            .into_iter()
            .collect();
        let source = self
            .source
            .map(|e| Box::new(e.into_final_error(full_input)));

        LabeledError {
            full_input: padded_input,
            labels,
            error: ErrorTree::Node {
                kind: self.kind,
                source,
            },
        }
    }

    fn span_within(&self, full_input: &str) -> SourceSpan {
        let base_addr = full_input.as_ptr() as usize;
        let substr_addr = self.input.as_ptr() as usize;
        assert!(
            substr_addr >= base_addr,
            "tried to get the span of a non-substring!"
        );
        let start = substr_addr - base_addr;
        SourceSpan::from(start..start + self.length)
    }
}

// Module Tests ========================================================================================================
