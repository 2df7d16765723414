//! Input types describing what is differentiated and where it is evaluated.
//!
//! A `Variable` names one Cartesian coordinate of one atom. A `System` bundles the geometry and
//! the index-aligned point charges that an expression is evaluated against. The `AtomView` trait
//! lets callers build a `System` directly from their own atom representation.

use crate::error::NucrepError;
use std::fmt;
use std::str::FromStr;

/// A trait for viewing atom data without owning it.
pub trait AtomView {
    /// Returns the atomic number of the atom.
    fn atomic_number(&self) -> u8;

    /// Returns the 3D position of the atom in Cartesian coordinates.
    fn position(&self) -> [f64; 3];

    /// Returns the point charge of the bare nucleus.
    ///
    /// Defaults to the atomic number, which is what the nuclear repulsion energy uses.
    fn nuclear_charge(&self) -> f64 {
        f64::from(self.atomic_number())
    }
}

/// A concrete atom with an atomic number and a position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atom {
    /// The atomic number of the atom, identifying its chemical element.
    pub atomic_number: u8,
    /// The 3D position of the atom in Cartesian coordinates.
    pub position: [f64; 3],
}

impl AtomView for Atom {
    #[inline(always)]
    fn atomic_number(&self) -> u8 {
        self.atomic_number
    }

    #[inline(always)]
    fn position(&self) -> [f64; 3] {
        self.position
    }
}

/// A Cartesian component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All three components in index order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// The component index (0, 1 or 2).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// The lowercase coordinate letter.
    pub fn letter(self) -> char {
        match self {
            Axis::X => 'x',
            Axis::Y => 'y',
            Axis::Z => 'z',
        }
    }
}

impl TryFrom<usize> for Axis {
    type Error = usize;

    fn try_from(component: usize) -> Result<Self, Self::Error> {
        match component {
            0 => Ok(Axis::X),
            1 => Ok(Axis::Y),
            2 => Ok(Axis::Z),
            other => Err(other),
        }
    }
}

/// One differentiation variable: a Cartesian component of one atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable {
    /// The Cartesian component being varied.
    pub axis: Axis,
    /// The index of the atom whose coordinate is varied.
    pub atom: usize,
}

impl Variable {
    pub fn new(axis: Axis, atom: usize) -> Self {
        Self { axis, atom }
    }

    /// Builds a variable from a raw component index and an atom index.
    ///
    /// # Errors
    ///
    /// Returns `NucrepError::InvalidVariable` if `component` is not 0, 1 or 2. The atom index is
    /// checked later, against the expression being differentiated.
    ///
    /// # Examples
    ///
    /// ```
    /// use nucrep::{Axis, Variable};
    ///
    /// let var = Variable::from_indices(1, 4).unwrap();
    /// assert_eq!(var, Variable::new(Axis::Y, 4));
    /// assert!(Variable::from_indices(3, 0).is_err());
    /// ```
    pub fn from_indices(component: usize, atom: usize) -> Result<Self, NucrepError> {
        let axis = Axis::try_from(component).map_err(|component| NucrepError::InvalidVariable {
            component,
            atom,
            reason: "component must be 0 (x), 1 (y) or 2 (z)".to_string(),
        })?;
        Ok(Self { axis, atom })
    }

    /// Enumerates all `3 * n_atoms` variables atom-major: `x0 y0 z0 x1 y1 z1 ...`.
    pub fn all(n_atoms: usize) -> impl Iterator<Item = Variable> {
        (0..n_atoms).flat_map(|atom| Axis::ALL.into_iter().map(move |axis| Variable { axis, atom }))
    }

    /// Position of this variable in the atom-major ordering of [`Variable::all`].
    #[inline]
    pub fn flat_index(&self) -> usize {
        3 * self.atom + self.axis.index()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.axis.letter(), self.atom)
    }
}

impl FromStr for Variable {
    type Err = NucrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let syntax = || NucrepError::VariableSyntax(s.to_string());
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let axis = match chars.next().map(|c| c.to_ascii_lowercase()) {
            Some('x') => Axis::X,
            Some('y') => Axis::Y,
            Some('z') => Axis::Z,
            _ => return Err(syntax()),
        };
        let rest = chars.as_str();
        let digits = rest.strip_prefix('_').unwrap_or(rest);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(syntax());
        }
        let atom = digits.parse().map_err(|_| syntax())?;
        Ok(Variable { axis, atom })
    }
}

/// Point charges at fixed positions: the data an expression is evaluated against.
#[derive(Debug, Clone, PartialEq)]
pub struct System {
    positions: Vec<[f64; 3]>,
    charges: Vec<f64>,
}

impl System {
    /// Creates a system from index-aligned positions and charges.
    ///
    /// # Errors
    ///
    /// Returns `NucrepError::MismatchedChargeLength` if the two slices differ in length.
    pub fn new(positions: Vec<[f64; 3]>, charges: Vec<f64>) -> Result<Self, NucrepError> {
        if positions.len() != charges.len() {
            return Err(NucrepError::MismatchedChargeLength {
                positions: positions.len(),
                charges: charges.len(),
            });
        }
        Ok(Self { positions, charges })
    }

    /// Creates a system whose charges are the nuclear charges of the given atoms.
    pub fn from_atoms<A: AtomView>(atoms: &[A]) -> Self {
        Self {
            positions: atoms.iter().map(AtomView::position).collect(),
            charges: atoms.iter().map(AtomView::nuclear_charge).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[[f64; 3]] {
        &self.positions
    }

    pub fn charges(&self) -> &[f64] {
        &self.charges
    }

    #[inline]
    pub fn position(&self, atom: usize) -> Option<[f64; 3]> {
        self.positions.get(atom).copied()
    }

    #[inline]
    pub fn charge(&self, atom: usize) -> Option<f64> {
        self.charges.get(atom).copied()
    }

    /// Euclidean distance between two atoms, or `None` if either index is out of range.
    pub fn distance(&self, i: usize, j: usize) -> Option<f64> {
        let (a, b) = (self.position(i)?, self.position(j)?);
        Some(
            ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt(),
        )
    }

    /// Returns a copy with the coordinate named by `variable` shifted by `delta`.
    ///
    /// # Errors
    ///
    /// Returns `NucrepError::InvalidVariable` if the variable's atom is not part of the system.
    pub fn displaced(&self, variable: Variable, delta: f64) -> Result<Self, NucrepError> {
        let mut displaced = self.clone();
        let n_atoms = self.len();
        let position = displaced
            .positions
            .get_mut(variable.atom)
            .ok_or_else(|| NucrepError::InvalidVariable {
                component: variable.axis.index(),
                atom: variable.atom,
                reason: format!("atom index out of range for a system of {} atoms", n_atoms),
            })?;
        position[variable.axis.index()] += delta;
        Ok(displaced)
    }
}
