mod common;

use approx::assert_relative_eq;
use common::{direct_energy, formic_acid, methane, variable_combinations, water};
use itertools::Itertools;
use nucrep::{Axis, Differentiator, EngineOptions, Expression, NucrepError, System, Variable};

#[test]
fn test_zero_order_reproduces_pair_sum() {
    for molecule in [water(), methane(), formic_acid()] {
        let system = molecule.system();
        let seed = Expression::for_system(&system).unwrap();
        let n = system.len();
        assert_eq!(seed.len(), n * (n - 1) / 2);
        assert_relative_eq!(
            seed.evaluate(&system).unwrap(),
            direct_energy(&system),
            max_relative = 1e-14
        );
    }
}

#[test]
fn test_second_order_mixed_partials_commute() {
    let system = formic_acid().system();
    let engine = Differentiator::new();
    let seed = Expression::for_system(&system).unwrap();

    for pair in variable_combinations(system.len(), 2) {
        let (a, b) = (pair[0], pair[1]);
        let ab = engine.differentiate_by(&seed, &[a, b]).unwrap();
        let ba = engine.differentiate_by(&seed, &[b, a]).unwrap();
        assert_relative_eq!(
            ab.evaluate(&system).unwrap(),
            ba.evaluate(&system).unwrap(),
            epsilon = 1e-10,
            max_relative = 1e-12
        );
    }
}

#[test]
fn test_third_order_permutations_agree() {
    let system = water().system();
    let engine = Differentiator::new();

    for triple in variable_combinations(system.len(), 3) {
        let reference = engine.derivative(&system, &triple).unwrap();
        for permutation in triple.iter().copied().permutations(3) {
            let value = engine.derivative(&system, &permutation).unwrap();
            assert_relative_eq!(value, reference, epsilon = 1e-9, max_relative = 1e-11);
        }
    }
}

#[test]
fn test_differentiation_order_changes_intermediate_size_not_value() {
    let system = water().system();
    let engine = Differentiator::new();
    let seed = Expression::for_system(&system).unwrap();
    let (x0, y1) = (Variable::new(Axis::X, 0), Variable::new(Axis::Y, 1));

    let a_prefix = engine.differentiate_by(&seed, &[x0, x0]).unwrap();
    let b_prefix = engine.differentiate_by(&seed, &[y1, x0]).unwrap();
    assert_eq!(a_prefix.len(), 4);
    assert_eq!(b_prefix.len(), 1);

    let a = engine.differentiate(&a_prefix, y1).unwrap();
    let b = engine.differentiate(&b_prefix, x0).unwrap();
    assert_relative_eq!(
        a.evaluate(&system).unwrap(),
        b.evaluate(&system).unwrap(),
        epsilon = 1e-12,
        max_relative = 1e-12
    );
}

#[test]
fn test_every_surviving_term_involves_every_variable_atom() {
    let seed = Expression::seed(5).unwrap();
    let vars = [
        Variable::new(Axis::X, 1),
        Variable::new(Axis::Z, 3),
        Variable::new(Axis::X, 1),
    ];
    let expr = seed.differentiate_by(&vars).unwrap();
    assert_eq!(expr.order(), 3);
    assert!(!expr.is_empty());
    for term in expr.terms() {
        assert!(term.pair().contains(1) && term.pair().contains(3));
        assert!(!term.is_extinct());
        for (factor, multiplicity) in term.factors() {
            assert_eq!(factor.pair, term.pair());
            assert!(multiplicity >= 1);
        }
    }
}

#[test]
fn test_three_distinct_atoms_annihilate_every_term() {
    let expr = Expression::seed(4)
        .unwrap()
        .differentiate_by(&[
            Variable::new(Axis::X, 0),
            Variable::new(Axis::Y, 1),
            Variable::new(Axis::Z, 2),
        ])
        .unwrap();
    assert!(expr.is_empty());
    assert_eq!(expr.evaluate(&System::from_atoms(&methane().atoms[..4])).unwrap(), 0.0);
}

#[test]
fn test_translation_invariance_at_third_order() {
    let system = methane().system();
    let engine = Differentiator::new();
    let prefix = [Variable::new(Axis::Y, 1), Variable::new(Axis::Z, 2)];

    for axis in Axis::ALL {
        let total: f64 = (0..system.len())
            .map(|atom| {
                let mut vars = prefix.to_vec();
                vars.push(Variable::new(axis, atom));
                engine.derivative(&system, &vars).unwrap()
            })
            .sum();
        assert_relative_eq!(total, 0.0, epsilon = 1e-8);
    }
}

#[test]
fn test_hessian_matches_second_derivatives() {
    let system = formic_acid().system();
    let engine = Differentiator::new();
    let hessian = engine.hessian(&system).unwrap();

    for pair in variable_combinations(system.len(), 2) {
        let (i, j) = (pair[0].flat_index(), pair[1].flat_index());
        let expected = engine.derivative(&system, &pair).unwrap();
        assert_relative_eq!(hessian[i][j], expected, epsilon = 1e-10, max_relative = 1e-10);
        assert_eq!(hessian[i][j], hessian[j][i]);
    }
}

#[test]
fn test_term_growth_for_repeated_coordinate() {
    let seed = Expression::seed(2).unwrap();
    let x0 = Variable::new(Axis::X, 0);
    let counts: Vec<usize> = (1..=4)
        .map(|order| seed.differentiate_by(&vec![x0; order]).unwrap().len())
        .collect();
    assert_eq!(counts, vec![1, 2, 3, 6]);
}

#[test]
fn test_term_limit_stops_runaway_expansion() {
    let system = formic_acid().system();
    let engine = Differentiator::new().with_options(EngineOptions {
        max_terms: Some(50),
        ..Default::default()
    });
    let vars = vec![Variable::new(Axis::X, 0); 6];
    match engine.derivative(&system, &vars) {
        Err(NucrepError::TermLimitExceeded { limit, terms, .. }) => {
            assert_eq!(limit, 50);
            assert!(terms > 50);
        }
        other => panic!("expected TermLimitExceeded, got {:?}", other),
    }
}

#[test]
fn test_boundary_errors() {
    let engine = Differentiator::new();
    let system = water().system();

    assert!(matches!(
        engine.derivative(&system, &[Variable::new(Axis::X, 3)]),
        Err(NucrepError::InvalidVariable { atom: 3, .. })
    ));
    assert!(matches!(
        Variable::from_indices(3, 0),
        Err(NucrepError::InvalidVariable { component: 3, .. })
    ));
    assert!(matches!(
        System::new(vec![[0.0; 3]; 3], vec![1.0; 2]),
        Err(NucrepError::MismatchedChargeLength { .. })
    ));

    let lonely = System::new(vec![[0.0; 3]], vec![1.0]).unwrap();
    assert!(matches!(
        engine.gradient(&lonely),
        Err(NucrepError::EmptyMolecule { atoms: 1 })
    ));

    let collapsed = System::new(vec![[0.0; 3]; 2], vec![1.0; 2]).unwrap();
    assert!(matches!(
        engine.energy(&collapsed),
        Err(NucrepError::NonFiniteValue { .. })
    ));
}
