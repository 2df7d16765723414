use super::term::{AtomPair, Term};
use crate::engine::Differentiator;
use crate::error::NucrepError;
use crate::types::{System, Variable};
use tracing::trace;

/// A repulsion-energy derivative expanded into a flat sum of terms.
///
/// An `Expression` remembers the number of atoms it was seeded for and how many
/// differentiations have been applied. Downstream code can do two things with it: evaluate it at
/// a geometry, or differentiate it once more. Term order carries no meaning.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    n_atoms: usize,
    order: usize,
    terms: Vec<Term>,
}

impl Expression {
    /// The zero-order expression: one `Z_i Z_j / R_ij` term per unordered pair `i < j`.
    ///
    /// # Errors
    ///
    /// Returns `NucrepError::EmptyMolecule` if fewer than two atoms are given.
    ///
    /// # Examples
    ///
    /// ```
    /// use nucrep::Expression;
    ///
    /// let seed = Expression::seed(4).unwrap();
    /// assert_eq!(seed.len(), 6);
    /// assert!(Expression::seed(1).is_err());
    /// ```
    pub fn seed(n_atoms: usize) -> Result<Self, NucrepError> {
        if n_atoms < 2 {
            return Err(NucrepError::EmptyMolecule { atoms: n_atoms });
        }
        let terms = (0..n_atoms)
            .flat_map(|i| ((i + 1)..n_atoms).filter_map(move |j| AtomPair::new(i, j)))
            .map(Term::seed)
            .collect();
        Ok(Self {
            n_atoms,
            order: 0,
            terms,
        })
    }

    /// Seeds the zero-order expression for the atoms of `system`.
    pub fn for_system(system: &System) -> Result<Self, NucrepError> {
        Self::seed(system.len())
    }

    pub(crate) fn from_parts(n_atoms: usize, order: usize, terms: Vec<Term>) -> Self {
        Self {
            n_atoms,
            order,
            terms,
        }
    }

    pub fn n_atoms(&self) -> usize {
        self.n_atoms
    }

    /// How many differentiations have been applied to the seed.
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Differentiates once more using the default engine options.
    pub fn differentiate(&self, variable: Variable) -> Result<Self, NucrepError> {
        Differentiator::new().differentiate(self, variable)
    }

    /// Applies a sequence of differentiations, left to right, using the default engine options.
    pub fn differentiate_by(&self, variables: &[Variable]) -> Result<Self, NucrepError> {
        Differentiator::new().differentiate_by(self, variables)
    }

    /// Sums the values of all terms at the given geometry and charges.
    ///
    /// The sum uses Neumaier compensation so that large cancelling contributions at high order do
    /// not swamp the small ones.
    ///
    /// # Errors
    ///
    /// Returns `NucrepError::AtomCountMismatch` if `system` does not have the atom count this
    /// expression was seeded for, or `NucrepError::NonFiniteValue` for coincident atoms.
    pub fn evaluate(&self, system: &System) -> Result<f64, NucrepError> {
        if system.len() != self.n_atoms {
            return Err(NucrepError::AtomCountMismatch {
                expected: self.n_atoms,
                found: system.len(),
            });
        }

        let mut sum = 0.0;
        let mut compensation = 0.0;
        for term in &self.terms {
            let value = term.evaluate(system)?;
            let t = sum + value;
            if f64::abs(sum) >= f64::abs(value) {
                compensation += (sum - t) + value;
            } else {
                compensation += (value - t) + sum;
            }
            sum = t;
        }
        let total = sum + compensation;

        trace!(order = self.order, terms = self.terms.len(), total, "evaluated expression");
        Ok(total)
    }
}
