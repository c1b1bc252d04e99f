pub(crate) mod complex;
pub(crate) mod equation;
pub mod errors;
pub(crate) mod expression;
pub mod primitives;

// Re-exports
pub use errors::{CrnErrorKind, ExpressionError};
