#![allow(dead_code)]

use approx::relative_eq;
use itertools::Itertools;
use nucrep::{Atom, Differentiator, Expression, System, Variable};

/// Displacement used for central differences.
pub const STEP: f64 = 1e-5;

pub struct Molecule<'a> {
    pub name: &'a str,
    pub atoms: Vec<Atom>,
}

impl Molecule<'_> {
    pub fn system(&self) -> System {
        System::from_atoms(&self.atoms)
    }
}

fn atom(atomic_number: u8, position: [f64; 3]) -> Atom {
    Atom {
        atomic_number,
        position,
    }
}

pub fn hydrogen_fluoride() -> Molecule<'static> {
    Molecule {
        name: "HF",
        atoms: vec![atom(1, [0.0, 0.0, 0.0]), atom(9, [0.0, 0.0, 0.917])],
    }
}

pub fn water() -> Molecule<'static> {
    Molecule {
        name: "H2O",
        atoms: vec![
            atom(8, [0.0, 0.0, 0.117]),
            atom(1, [0.0, 0.757, -0.469]),
            atom(1, [0.0, -0.757, -0.469]),
        ],
    }
}

pub fn methane() -> Molecule<'static> {
    let s = 1.087 / 3.0f64.sqrt();
    Molecule {
        name: "CH4",
        atoms: vec![
            atom(6, [0.0, 0.0, 0.0]),
            atom(1, [s, s, s]),
            atom(1, [s, -s, -s]),
            atom(1, [-s, s, -s]),
            atom(1, [-s, -s, s]),
        ],
    }
}

pub fn formic_acid() -> Molecule<'static> {
    Molecule {
        name: "HCOOH",
        atoms: vec![
            atom(6, [0.0, 0.419376, 0.0]),
            atom(8, [-1.025551, -0.441399, 0.0]),
            atom(8, [1.153173, 0.112123, 0.0]),
            atom(1, [-0.374635, 1.445556, 0.0]),
            atom(1, [-0.646343, -1.327598, 0.0]),
        ],
    }
}

/// `sum_{i<j} Z_i Z_j / R_ij`, computed directly without the symbolic engine.
pub fn direct_energy(system: &System) -> f64 {
    let mut energy = 0.0;
    for i in 0..system.len() {
        for j in (i + 1)..system.len() {
            energy += system.charges()[i] * system.charges()[j] / system.distance(i, j).unwrap();
        }
    }
    energy
}

/// Central-difference estimate of the derivative by `variables`.
///
/// The last variable is differenced numerically; the preceding ones are taken from the symbolic
/// expansion (or, at first order, from the directly summed energy).
pub fn central_difference(system: &System, variables: &[Variable], h: f64) -> f64 {
    let (last, prefix) = variables
        .split_last()
        .expect("at least one variable is required");
    let up = system.displaced(*last, h).unwrap();
    let down = system.displaced(*last, -h).unwrap();

    if prefix.is_empty() {
        return (direct_energy(&up) - direct_energy(&down)) / (2.0 * h);
    }

    let partial = Expression::for_system(system)
        .unwrap()
        .differentiate_by(prefix)
        .unwrap();
    (partial.evaluate(&up).unwrap() - partial.evaluate(&down).unwrap()) / (2.0 * h)
}

/// Every multiset of `order` variables, as in `combinations_with_replacement`.
pub fn variable_combinations(n_atoms: usize, order: usize) -> Vec<Vec<Variable>> {
    Variable::all(n_atoms)
        .combinations_with_replacement(order)
        .collect()
}

/// Compares every analytic derivative of the given order with its central-difference estimate.
pub fn run_cross_validation(molecule: &Molecule, order: usize, tolerance: f64) {
    let system = molecule.system();
    let engine = Differentiator::new();

    let mut checked = 0;
    let mut max_error: f64 = 0.0;
    let mut failures = Vec::new();

    println!("\nCross-validating {} at order {}", molecule.name, order);
    println!("{:-<80}", "");

    for variables in variable_combinations(system.len(), order) {
        let analytic = engine
            .derivative(&system, &variables)
            .expect("Analytic derivative failed");
        let numeric = central_difference(&system, &variables, STEP);
        let error = (analytic - numeric).abs();

        if !relative_eq!(analytic, numeric, epsilon = tolerance, max_relative = 1e-6) {
            failures.push(format!(
                "{:<24} analytic {:>16.8} numeric {:>16.8} (Err: {:.2e})",
                nucrep::variables_to_latex(&variables),
                analytic,
                numeric,
                error
            ));
        }

        max_error = max_error.max(error);
        checked += 1;
    }

    println!("  Derivatives checked: {}", checked);
    println!("  Max absolute error:  {:.3e} (Limit: {:.1e})", max_error, tolerance);
    for failure in &failures {
        println!("  FAILED {}", failure);
    }
    println!("{:-<80}\n", "");

    assert!(
        failures.is_empty(),
        "{} of {} order-{} derivatives of {} disagree with finite differences",
        failures.len(),
        checked,
        order,
        molecule.name
    );
}
