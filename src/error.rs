use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for all fallible operations in the `nucrep` library.
///
/// Every variant is raised at the API boundary (seed construction, differentiation request,
/// evaluation call) so that malformed input never degrades into a silently wrong zero deep
/// inside the term rewriting.
#[derive(Error, Debug)]
pub enum NucrepError {
    /// A differentiation variable does not name a valid coordinate.
    ///
    /// Raised when the Cartesian component is not one of 0, 1, 2 or when the atom index lies
    /// outside the molecule the expression was built for.
    #[error("Invalid differentiation variable (component {component}, atom {atom}): {reason}")]
    InvalidVariable {
        /// The requested Cartesian component index.
        component: usize,
        /// The requested atom index.
        atom: usize,
        /// Why the variable was rejected.
        reason: String,
    },

    /// A textual variable such as `x0` or `z_12` could not be parsed.
    #[error("Cannot parse differentiation variable '{0}': expected an axis letter followed by an atom index, e.g. 'x0' or 'y_3'")]
    VariableSyntax(String),

    /// Fewer than two atoms were supplied, so there is no atom pair to seed the energy with.
    #[error("At least two atoms are required to build the repulsion energy, got {atoms}")]
    EmptyMolecule {
        /// The number of atoms that was supplied.
        atoms: usize,
    },

    /// The charge list is not index-aligned with the geometry.
    #[error("Charge count ({charges}) does not match the number of positions ({positions})")]
    MismatchedChargeLength {
        /// Number of atomic positions.
        positions: usize,
        /// Number of charges.
        charges: usize,
    },

    /// An expression was evaluated against a system with a different number of atoms than the
    /// one it was seeded for.
    #[error("Expression was built for {expected} atoms but the system has {found}")]
    AtomCountMismatch {
        /// Atom count of the expression.
        expected: usize,
        /// Atom count of the system.
        found: usize,
    },

    /// A term evaluated to infinity or NaN, which happens for coincident atoms.
    ///
    /// The engine does not regularize the Coulomb singularity; the offending pair is reported.
    #[error("Non-finite contribution from atom pair ({first}, {second}); are the atoms coincident?")]
    NonFiniteValue {
        /// First atom of the pair.
        first: usize,
        /// Second atom of the pair.
        second: usize,
    },

    /// The configured term limit was exceeded while expanding a derivative.
    #[error("Derivative of order {order} expanded to {terms} terms, exceeding the limit of {limit}")]
    TermLimitExceeded {
        /// The configured maximum number of terms.
        limit: usize,
        /// The number of terms that were produced.
        terms: usize,
        /// The derivative order at which the limit was hit.
        order: usize,
    },

    /// An I/O error that occurred while reading an engine configuration file.
    #[error("I/O error at path '{path}': {source}")]
    IoError {
        /// The path of the file that caused the I/O error.
        path: PathBuf,
        /// The underlying `std::io::Error`.
        #[source]
        source: std::io::Error,
    },

    /// The engine configuration is not valid TOML or does not match `EngineOptions`.
    #[error("Failed to deserialize TOML engine options: {0}")]
    DeserializationError(#[from] toml::de::Error),
}
