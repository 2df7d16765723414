//! This module implements the `Differentiator`, which drives the symbolic expansion.
//!
//! One differentiation step replaces every term of an `Expression` by its surviving product-rule
//! children. Terms are independent of each other, so large steps are fanned out over the rayon
//! thread pool and the children concatenated in whatever order they arrive. A mixed partial
//! derivative is a left fold of such steps over the requested variables. On top of that the
//! differentiator offers the usual consumers of the expansion: the energy itself, a single
//! derivative value, the full gradient and the full Hessian.

use super::options::EngineOptions;
use crate::{
    error::NucrepError,
    expression::{Expression, Term},
    types::{System, Variable},
};
use rayon::prelude::*;
use tracing::debug;

/// Expands and evaluates derivatives of the nuclear repulsion energy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Differentiator {
    options: EngineOptions,
}

impl Differentiator {
    /// Creates a differentiator with default `EngineOptions`.
    pub fn new() -> Self {
        Self {
            options: EngineOptions::default(),
        }
    }

    /// Configures the differentiator with custom options.
    ///
    /// # Examples
    ///
    /// ```
    /// use nucrep::{Differentiator, EngineOptions};
    ///
    /// let options = EngineOptions {
    ///     max_terms: Some(1_000_000),
    ///     ..Default::default()
    /// };
    /// let engine = Differentiator::new().with_options(options);
    /// assert_eq!(engine.options().max_terms, Some(1_000_000));
    /// ```
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Differentiates every term of `expression` by `variable` (one product-rule step).
    ///
    /// # Errors
    ///
    /// Returns `NucrepError::InvalidVariable` if the variable's atom is not part of the molecule
    /// the expression was seeded for, and `NucrepError::TermLimitExceeded` if the result is larger
    /// than `EngineOptions::max_terms`.
    pub fn differentiate(
        &self,
        expression: &Expression,
        variable: Variable,
    ) -> Result<Expression, NucrepError> {
        let n_atoms = expression.n_atoms();
        if variable.atom >= n_atoms {
            return Err(NucrepError::InvalidVariable {
                component: variable.axis.index(),
                atom: variable.atom,
                reason: format!("atom index out of range for a molecule of {} atoms", n_atoms),
            });
        }

        let parents = expression.terms();
        let children: Vec<Term> = if parents.len() >= self.options.parallel_threshold {
            parents
                .par_iter()
                .flat_map_iter(|term| term.derivatives(variable))
                .collect()
        } else {
            parents
                .iter()
                .flat_map(|term| term.derivatives(variable))
                .collect()
        };

        let order = expression.order() + 1;
        debug!(
            order,
            %variable,
            parents = parents.len(),
            children = children.len(),
            "differentiated expression"
        );

        if let Some(limit) = self.options.max_terms {
            if children.len() > limit {
                return Err(NucrepError::TermLimitExceeded {
                    limit,
                    terms: children.len(),
                    order,
                });
            }
        }

        Ok(Expression::from_parts(n_atoms, order, children))
    }

    /// Applies `variables` left to right, yielding the mixed partial derivative expression.
    ///
    /// An empty sequence returns a copy of `expression`.
    pub fn differentiate_by(
        &self,
        expression: &Expression,
        variables: &[Variable],
    ) -> Result<Expression, NucrepError> {
        variables
            .iter()
            .try_fold(expression.clone(), |current, &variable| {
                self.differentiate(&current, variable)
            })
    }

    /// The nuclear repulsion energy `sum_{i<j} Z_i Z_j / R_ij` of `system`.
    ///
    /// # Examples
    ///
    /// ```
    /// use nucrep::{Differentiator, System};
    ///
    /// let system = System::new(vec![[0.0; 3], [0.0, 0.0, 2.0]], vec![1.0, 1.0]).unwrap();
    /// let energy = Differentiator::new().energy(&system).unwrap();
    /// assert!((energy - 0.5).abs() < 1e-15);
    /// ```
    pub fn energy(&self, system: &System) -> Result<f64, NucrepError> {
        Expression::for_system(system)?.evaluate(system)
    }

    /// Value of the mixed partial derivative by `variables` at `system`.
    ///
    /// # Examples
    ///
    /// ```
    /// use nucrep::{Differentiator, System, Variable};
    ///
    /// let system = System::new(vec![[0.0; 3], [1.0, 0.0, 0.0]], vec![1.0, 1.0]).unwrap();
    /// let x0: Variable = "x0".parse().unwrap();
    /// let value = Differentiator::new().derivative(&system, &[x0]).unwrap();
    /// assert!((value - 1.0).abs() < 1e-15);
    /// ```
    pub fn derivative(&self, system: &System, variables: &[Variable]) -> Result<f64, NucrepError> {
        let seed = Expression::for_system(system)?;
        self.differentiate_by(&seed, variables)?.evaluate(system)
    }

    /// All `3N` first derivatives, ordered atom-major as in [`Variable::all`].
    pub fn gradient(&self, system: &System) -> Result<Vec<f64>, NucrepError> {
        let seed = Expression::for_system(system)?;
        let variables: Vec<Variable> = Variable::all(system.len()).collect();

        variables
            .par_iter()
            .map(|&variable| self.differentiate(&seed, variable)?.evaluate(system))
            .collect()
    }

    /// The symmetric `3N x 3N` matrix of second derivatives, rows and columns atom-major.
    ///
    /// The first-order expressions are expanded once and shared as the prefix of every second
    /// derivative; only the upper triangle is computed and then mirrored.
    pub fn hessian(&self, system: &System) -> Result<Vec<Vec<f64>>, NucrepError> {
        let seed = Expression::for_system(system)?;
        let variables: Vec<Variable> = Variable::all(system.len()).collect();
        let dim = variables.len();

        let first_order: Vec<Expression> = variables
            .par_iter()
            .map(|&variable| self.differentiate(&seed, variable))
            .collect::<Result<_, _>>()?;

        let upper: Vec<(usize, usize, f64)> = (0..dim)
            .into_par_iter()
            .flat_map_iter(|i| (i..dim).map(move |j| (i, j)))
            .map(|(i, j)| {
                let value = self
                    .differentiate(&first_order[i], variables[j])?
                    .evaluate(system)?;
                Ok::<_, NucrepError>((i, j, value))
            })
            .collect::<Result<_, NucrepError>>()?;

        let mut hessian = vec![vec![0.0; dim]; dim];
        for (i, j, value) in upper {
            hessian[i][j] = value;
            hessian[j][i] = value;
        }
        Ok(hessian)
    }
}
