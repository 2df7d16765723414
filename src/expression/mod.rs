//! Symbolic representation of the repulsion energy and its derivatives.
//!
//! The energy `sum_{i<j} Z_i Z_j / R_ij` and every derivative of it are kept as a flat sum of
//! `Term`s. Each term knows how to differentiate itself by one coordinate and how to evaluate
//! itself at a geometry; `Expression` owns the sum.

mod sum;
mod term;

pub use sum::Expression;
pub use term::{AtomPair, LinearFactor, Sign, Term};
