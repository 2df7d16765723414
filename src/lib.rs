//! Exact analytic derivatives of the nuclear repulsion energy.
//!
//! The energy `E = sum_{i<j} Z_i Z_j / R_ij` of a set of point charges is expanded symbolically
//! into a flat sum of terms, each a product of linear coordinate differences over a power of an
//! interatomic distance. Differentiating by any Cartesian coordinate maps every term to at most
//! two new terms, so mixed partial derivatives of arbitrary order are obtained without numerical
//! differencing and can then be evaluated at any geometry.
//!
//! ```
//! use nucrep::{Differentiator, Expression, System, Variable};
//!
//! let system = System::new(
//!     vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
//!     vec![1.0, 1.0],
//! )
//! .unwrap();
//!
//! let seed = Expression::for_system(&system).unwrap();
//! let x0: Variable = "x0".parse().unwrap();
//! let gradient_x0 = seed.differentiate(x0).unwrap();
//! assert!((gradient_x0.evaluate(&system).unwrap() - 1.0).abs() < 1e-15);
//!
//! let hessian = Differentiator::new().hessian(&system).unwrap();
//! assert_eq!(hessian.len(), 6);
//! ```

pub mod engine;
pub mod error;
pub mod expression;
pub mod latex;
pub mod types;

pub use engine::{Differentiator, EngineOptions};
pub use error::NucrepError;
pub use expression::{AtomPair, Expression, LinearFactor, Sign, Term};
pub use latex::variables_to_latex;
pub use types::{Atom, AtomView, Axis, System, Variable};
