//! A single summand of an expanded repulsion-energy derivative.
//!
//! A `Term` stands for
//!
//! ```text
//! sign * coefficient * Z_a Z_b * prod_k (k_a - k_b)^m_k / R_ab^power
//! ```
//!
//! where `(a, b)` is the term's `AtomPair` and the product runs over the linear factors recorded
//! in the factor map. Differentiating a term by one coordinate applies the product rule to its
//! two parts: the polynomial (`polynomial_derivative`) and the inverse distance power
//! (`power_derivative`). Terms are values; both rules build a fresh child and leave the parent
//! untouched.
//!
//! Every linear factor is oriented `(k_first - k_second)` following the term's own pair, so the
//! sign flip for differentiating by the second atom's coordinate is always decided against the
//! pair, never against the history of how the factor was introduced.

use crate::error::NucrepError;
use crate::types::{Axis, System, Variable};
use std::collections::BTreeMap;

/// The sign of a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    #[inline]
    pub fn flip(self) -> Self {
        match self {
            Sign::Plus => Sign::Minus,
            Sign::Minus => Sign::Plus,
        }
    }

    #[inline]
    pub fn value(self) -> f64 {
        match self {
            Sign::Plus => 1.0,
            Sign::Minus => -1.0,
        }
    }
}

/// An ordered atom pair `(first, second)` with `first < second`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AtomPair {
    first: usize,
    second: usize,
}

impl AtomPair {
    /// Orders the two indices; returns `None` for a self-pair.
    pub fn new(i: usize, j: usize) -> Option<Self> {
        match i.cmp(&j) {
            std::cmp::Ordering::Less => Some(Self { first: i, second: j }),
            std::cmp::Ordering::Greater => Some(Self { first: j, second: i }),
            std::cmp::Ordering::Equal => None,
        }
    }

    #[inline]
    pub fn first(&self) -> usize {
        self.first
    }

    #[inline]
    pub fn second(&self) -> usize {
        self.second
    }

    #[inline]
    pub fn contains(&self, atom: usize) -> bool {
        atom == self.first || atom == self.second
    }
}

/// The linear factor `(k_first - k_second)` for one Cartesian component `k` of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinearFactor {
    pub axis: Axis,
    pub pair: AtomPair,
}

impl LinearFactor {
    pub fn new(axis: Axis, pair: AtomPair) -> Self {
        Self { axis, pair }
    }

    /// The value `k_first - k_second` at the given geometry.
    #[inline]
    fn value(&self, first: [f64; 3], second: [f64; 3]) -> f64 {
        let k = self.axis.index();
        first[k] - second[k]
    }
}

/// One summand of a repulsion-energy expression.
///
/// Factor multiplicities are always at least one; a factor whose multiplicity drops to zero is
/// removed from the map. A coefficient of zero marks an extinct term.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    sign: Sign,
    power: u32,
    pair: AtomPair,
    factors: BTreeMap<LinearFactor, u32>,
    coefficient: f64,
}

impl Term {
    /// The undifferentiated `Z_a Z_b / R_ab` term for one pair.
    pub fn seed(pair: AtomPair) -> Self {
        Self {
            sign: Sign::Plus,
            power: 1,
            pair,
            factors: BTreeMap::new(),
            coefficient: 1.0,
        }
    }

    pub fn sign(&self) -> Sign {
        self.sign
    }

    /// The exponent `n` of the `1 / R^n` factor.
    pub fn power(&self) -> u32 {
        self.power
    }

    pub fn pair(&self) -> AtomPair {
        self.pair
    }

    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    /// Linear factors with their multiplicities, in a stable order.
    pub fn factors(&self) -> impl Iterator<Item = (LinearFactor, u32)> + '_ {
        self.factors.iter().map(|(factor, &m)| (*factor, m))
    }

    /// Multiplicity of the linear factor along `axis`; zero if absent.
    pub fn multiplicity(&self, axis: Axis) -> u32 {
        self.factors
            .get(&LinearFactor::new(axis, self.pair))
            .copied()
            .unwrap_or(0)
    }

    #[inline]
    pub fn is_extinct(&self) -> bool {
        self.coefficient == 0.0
    }

    fn extinguished(&self) -> Self {
        Self {
            coefficient: 0.0,
            ..self.clone()
        }
    }

    /// Differentiates the polynomial part, holding `1 / R^power` constant.
    pub fn polynomial_derivative(&self, variable: Variable) -> Self {
        if self.is_extinct() {
            return self.clone();
        }
        if !self.pair.contains(variable.atom) || self.factors.is_empty() {
            return self.extinguished();
        }

        let key = LinearFactor::new(variable.axis, self.pair);
        let Some(multiplicity) = self.factors.get(&key).copied() else {
            return self.extinguished();
        };

        let mut factors = self.factors.clone();
        if multiplicity > 1 {
            factors.insert(key, multiplicity - 1);
        } else {
            factors.remove(&key);
        }

        // d(k_a - k_b)/dk_b = -1
        let sign = if variable.atom == self.pair.second {
            self.sign.flip()
        } else {
            self.sign
        };

        Self {
            sign,
            power: self.power,
            pair: self.pair,
            factors,
            coefficient: self.coefficient * f64::from(multiplicity),
        }
    }

    /// Differentiates `1 / R^power` by the chain rule, holding the polynomial constant.
    ///
    /// `d/dk_a R^-n = -n (k_a - k_b) R^-(n+2)`; for `k_b` the linear factor enters with the
    /// opposite sign.
    pub fn power_derivative(&self, variable: Variable) -> Self {
        if self.is_extinct() || !self.pair.contains(variable.atom) {
            return self.extinguished();
        }

        let mut sign = self.sign.flip();
        if variable.atom == self.pair.second {
            sign = sign.flip();
        }

        let mut factors = self.factors.clone();
        *factors
            .entry(LinearFactor::new(variable.axis, self.pair))
            .or_insert(0) += 1;

        Self {
            sign,
            power: self.power + 2,
            pair: self.pair,
            factors,
            coefficient: self.coefficient * f64::from(self.power),
        }
    }

    /// The product-rule children of this term that survive, i.e. have a nonzero coefficient.
    pub fn derivatives(&self, variable: Variable) -> impl Iterator<Item = Term> {
        [
            self.polynomial_derivative(variable),
            self.power_derivative(variable),
        ]
        .into_iter()
        .filter(|child| !child.is_extinct())
    }

    /// Numeric value of the term at the given geometry and charges.
    ///
    /// # Errors
    ///
    /// Returns `NucrepError::AtomCountMismatch` if the pair refers to an atom the system does not
    /// have, and `NucrepError::NonFiniteValue` if the value is infinite or NaN (coincident atoms).
    pub fn evaluate(&self, system: &System) -> Result<f64, NucrepError> {
        if self.is_extinct() {
            return Ok(0.0);
        }

        let AtomPair { first, second } = self.pair;
        let lookup = || NucrepError::AtomCountMismatch {
            expected: second + 1,
            found: system.len(),
        };
        let (pos_a, pos_b) = (
            system.position(first).ok_or_else(lookup)?,
            system.position(second).ok_or_else(lookup)?,
        );
        let (z_a, z_b) = (
            system.charge(first).ok_or_else(lookup)?,
            system.charge(second).ok_or_else(lookup)?,
        );

        let mut polynomial = 1.0;
        for (factor, &multiplicity) in &self.factors {
            let value = factor.value(pos_a, pos_b);
            if value == 0.0 {
                return Ok(0.0);
            }
            polynomial *= value.powi(multiplicity as i32);
        }

        let dist_sq = (pos_a[0] - pos_b[0]).powi(2)
            + (pos_a[1] - pos_b[1]).powi(2)
            + (pos_a[2] - pos_b[2]).powi(2);
        let denominator = dist_sq.sqrt().powi(self.power as i32);

        let value = z_a * z_b * self.sign.value() * self.coefficient * polynomial / denominator;
        if !value.is_finite() {
            return Err(NucrepError::NonFiniteValue { first, second });
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pair01() -> AtomPair {
        AtomPair::new(0, 1).unwrap()
    }

    fn var(axis: Axis, atom: usize) -> Variable {
        Variable::new(axis, atom)
    }

    fn two_atoms() -> System {
        System::new(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]], vec![1.0, 1.0]).unwrap()
    }

    #[test]
    fn atom_pair_is_ordered_and_rejects_self_pairs() {
        let pair = AtomPair::new(4, 2).unwrap();
        assert_eq!((pair.first(), pair.second()), (2, 4));
        assert!(pair.contains(4));
        assert!(!pair.contains(3));
        assert!(AtomPair::new(1, 1).is_none());
    }

    #[test]
    fn seed_term_has_unit_shape() {
        let term = Term::seed(pair01());
        assert_eq!(term.sign(), Sign::Plus);
        assert_eq!(term.power(), 1);
        assert_eq!(term.coefficient(), 1.0);
        assert_eq!(term.factors().count(), 0);
    }

    #[test]
    fn first_derivative_of_seed_by_first_atom() {
        let seed = Term::seed(pair01());
        let x0 = var(Axis::X, 0);

        assert!(seed.polynomial_derivative(x0).is_extinct());

        let child = seed.power_derivative(x0);
        assert_eq!(child.sign(), Sign::Minus);
        assert_eq!(child.power(), 3);
        assert_eq!(child.coefficient(), 1.0);
        assert_eq!(child.multiplicity(Axis::X), 1);
        assert_eq!(child.factors().count(), 1);

        // (x0 - x1) = -1, R = 1: 1 * (-1) * 1 * (-1) / 1 = 1
        assert_relative_eq!(child.evaluate(&two_atoms()).unwrap(), 1.0);
    }

    #[test]
    fn power_rule_flips_sign_again_for_second_atom() {
        let child = Term::seed(pair01()).power_derivative(var(Axis::X, 1));
        assert_eq!(child.sign(), Sign::Plus);
        assert_relative_eq!(child.evaluate(&two_atoms()).unwrap(), -1.0);
    }

    #[test]
    fn power_rule_merges_repeated_factors_and_accumulates_coefficient() {
        let x0 = var(Axis::X, 0);
        let term = Term::seed(pair01()).power_derivative(x0).power_derivative(x0);
        assert_eq!(term.power(), 5);
        assert_eq!(term.coefficient(), 3.0);
        assert_eq!(term.sign(), Sign::Plus);
        assert_eq!(term.multiplicity(Axis::X), 2);
        assert_eq!(term.factors().count(), 1);
    }

    #[test]
    fn polynomial_rule_lowers_multiplicity_and_drops_empty_factors() {
        let x0 = var(Axis::X, 0);
        let squared = Term::seed(pair01()).power_derivative(x0).power_derivative(x0);

        let once = squared.polynomial_derivative(x0);
        assert_eq!(once.multiplicity(Axis::X), 1);
        assert_eq!(once.coefficient(), 6.0);
        assert_eq!(once.sign(), squared.sign());

        let twice = once.polynomial_derivative(var(Axis::X, 1));
        assert_eq!(twice.factors().count(), 0);
        assert_eq!(twice.coefficient(), 6.0);
        assert_eq!(twice.sign(), once.sign().flip());
    }

    #[test]
    fn polynomial_rule_without_matching_factor_extinguishes() {
        let term = Term::seed(pair01()).power_derivative(var(Axis::X, 0));
        assert!(term.polynomial_derivative(var(Axis::Y, 0)).is_extinct());
    }

    #[test]
    fn unrelated_atom_extinguishes_both_rules() {
        let pair = AtomPair::new(1, 2).unwrap();
        let term = Term::seed(pair).power_derivative(var(Axis::Z, 1));
        let z0 = var(Axis::Z, 0);
        assert!(term.polynomial_derivative(z0).is_extinct());
        assert!(term.power_derivative(z0).is_extinct());
        assert_eq!(term.derivatives(z0).count(), 0);
    }

    #[test]
    fn extinct_terms_stay_extinct() {
        let dead = Term::seed(pair01()).polynomial_derivative(var(Axis::X, 0));
        assert!(dead.is_extinct());
        assert_eq!(dead.polynomial_derivative(var(Axis::X, 0)), dead);
        assert!(dead.power_derivative(var(Axis::X, 0)).is_extinct());
        assert_eq!(dead.evaluate(&two_atoms()).unwrap(), 0.0);
    }

    #[test]
    fn rules_leave_the_parent_untouched() {
        let parent = Term::seed(pair01()).power_derivative(var(Axis::Y, 0));
        let snapshot = parent.clone();
        let _ = parent.power_derivative(var(Axis::Y, 1));
        let _ = parent.polynomial_derivative(var(Axis::Y, 1));
        assert_eq!(parent, snapshot);
    }

    #[test]
    fn vanishing_linear_factor_evaluates_to_zero() {
        // y-factor is identically zero on the x axis
        let term = Term::seed(pair01()).power_derivative(var(Axis::Y, 0));
        assert_eq!(term.evaluate(&two_atoms()).unwrap(), 0.0);
    }

    #[test]
    fn coincident_atoms_surface_as_error() {
        let system = System::new(vec![[0.5; 3], [0.5; 3]], vec![1.0, 1.0]).unwrap();
        let err = Term::seed(pair01()).evaluate(&system).unwrap_err();
        assert!(matches!(
            err,
            NucrepError::NonFiniteValue {
                first: 0,
                second: 1
            }
        ));
    }

    #[test]
    fn out_of_range_pair_is_rejected() {
        let term = Term::seed(AtomPair::new(0, 2).unwrap());
        assert!(matches!(
            term.evaluate(&two_atoms()),
            Err(NucrepError::AtomCountMismatch {
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn evaluation_includes_charges_and_power() {
        let system = System::new(vec![[0.0, 0.0, 0.0], [0.0, 2.0, 0.0]], vec![8.0, 1.0]).unwrap();
        let term = Term::seed(pair01()).power_derivative(var(Axis::Y, 1));
        // d/dy1 (8 / |y1 - y0|) at distance 2 = -8 / 4
        assert_relative_eq!(term.evaluate(&system).unwrap(), -2.0, epsilon = 1e-14);
    }
}
