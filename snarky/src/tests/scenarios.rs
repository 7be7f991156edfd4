use ark_ff::{One, Zero};
use snarky_curves::pasta::Fp;

use crate::{
    constraint::Constraint,
    errors::{SnarkyCompilationError, SnarkyError, SnarkyRuntimeError},
    mode::Mode,
    prelude::*,
};

fn f(x: u64) -> Fp {
    Fp::from(x)
}

fn c(x: u64) -> FieldVar<Fp> {
    FieldVar::constant(f(x))
}

fn state() -> RunState<Fp> {
    RunState::with_config(OptimizationMode::Aggressive.into())
}

#[test]
fn test_sum_equal_to_constant_is_unified() {
    let mut state = state();
    let (cs, witness) = state
        .prove(2, |sys| {
            let x = sys.compute(|_| Ok(f(5)))?;
            let y = sys.compute(|_| Ok(f(7)))?;
            sys.assert_equal(Some("x + y = 12"), &x + &y, c(12))
        })
        .unwrap();

    assert_eq!(cs.rows(), 0);
    assert_eq!(cs.stats().equalities_unified, 1);
    assert_eq!(witness.values(), &[Some(f(5)), Some(f(7))]);
}

#[test]
fn test_square_against_constant() {
    let mut state = state();
    let (cs, witness) = state
        .prove(2, |sys| {
            let x = sys.compute(|_| Ok(f(3)))?;
            let r = x.mul(&x, Some("x * x"), sys)?;
            sys.assert_equal(Some("r = 9"), r, c(9))
        })
        .unwrap();

    // x·x - 9 = 0
    assert_eq!(cs.rows(), 1);
    let gate = &cs.gates()[0];
    assert_eq!(gate.typ, GateType::Generic);
    assert_eq!(&gate.wires[..3], &[1, 1, 0]);
    assert_eq!(
        gate.coeffs,
        vec![Fp::zero(), Fp::zero(), Fp::zero(), Fp::one(), -f(9)]
    );

    let rows = cs.compute_witness(&witness).unwrap();
    cs.verify_witness(&rows, &[]).unwrap();
}

#[test]
fn test_self_equality_is_free() {
    let mut state = state();
    let (cs, _) = state
        .prove(1, |sys| {
            let x = sys.compute(|_| Ok(f(5)))?;
            sys.assert_equal(None, x.clone(), x)
        })
        .unwrap();
    assert_eq!(cs.rows(), 0);
}

#[test]
fn test_constant_product() {
    let mut state = state();
    let mut product = None;
    let cs = state
        .constraint_system(|sys| {
            product = Some(c(2).mul(&c(3), None, sys)?);
            Ok(())
        })
        .unwrap();
    assert_eq!(product, Some(c(6)));
    assert_eq!(cs.rows(), 0);
    assert_eq!(cs.num_vars(), 0);
}

#[test]
fn test_read_var_while_compiling() {
    let mut state = state();
    let mut guard = state.enter_constraint_system();
    let x = guard.compute(|_| Ok(f(5))).unwrap();
    assert!(matches!(
        guard.read_var(&x),
        Err(SnarkyError::RuntimeError(SnarkyRuntimeError::Mode {
            mode: Mode::ConstraintGeneration,
            ..
        }))
    ));
}

#[test]
fn test_unsatisfied_while_proving() {
    let mut state = state();
    let res = state.prove(1, |sys| {
        let x = sys.compute(|_| Ok(f(5)))?;
        sys.assert_equal(Some("x = 6"), x, c(6))
    });

    match res {
        Err(SnarkyError::RuntimeError(SnarkyRuntimeError::UnsatisfiedConstraint {
            label,
            values,
            ..
        })) => {
            assert_eq!(label, "x = 6");
            assert_eq!(values, vec!["5".to_string(), "6".to_string()]);
        }
        other => panic!("expected an unsatisfied constraint, got {other:?}"),
    }
}

#[test]
fn test_literal_arithmetic_compiles_to_nothing() {
    let mut state = state();
    let cs = state
        .constraint_system(|sys| {
            let a = &c(2) + &c(3).scale(f(4));
            let b = a.mul(&c(7), None, sys)?;
            let d = b.square(None, sys)?;
            let e = d.div(&c(2), None, sys)?;
            sys.assert_equal(None, e, c(4802))?;
            sys.assert_boolean(None, c(1))?;
            sys.assert_r1cs(None, c(2), c(3), c(6))
        })
        .unwrap();
    assert_eq!(cs.rows(), 0);
}

#[test]
fn test_constant_contradiction_while_compiling() {
    let mut state = state();
    let res = state.constraint_system(|sys| sys.assert_equal(Some("1 = 2"), c(1), c(2)));
    assert!(matches!(
        res,
        Err(SnarkyError::RuntimeError(
            SnarkyRuntimeError::UnsatisfiedConstraint { .. }
        ))
    ));
}

#[test]
fn test_many_variables_equal_to_one_constant() {
    let mut state = state();
    let cs = state
        .constraint_system(|sys| {
            for _ in 0..10 {
                let x = sys.alloc_var()?;
                sys.assert_equal(None, x, c(42))?;
            }
            Ok(())
        })
        .unwrap();
    assert_eq!(cs.rows(), 0);
    assert_eq!(cs.stats().equalities_unified, 10);

    // without unification, every equality is a gate
    let mut state = RunState::<Fp>::with_config(OptimizationMode::Debug.into());
    let cs = state
        .constraint_system(|sys| {
            for _ in 0..10 {
                let x = sys.alloc_var()?;
                sys.assert_equal(None, x, c(42))?;
            }
            Ok(())
        })
        .unwrap();
    assert_eq!(cs.rows(), 10);
}

#[test]
fn test_equal_and_if() {
    let mut state = state();
    let (cs, witness) = state
        .prove(8, |sys| {
            let x = sys.compute(|_| Ok(f(4)))?;
            let y = sys.compute(|_| Ok(f(4)))?;
            let z = sys.compute(|_| Ok(f(5)))?;

            let same = x.equal(sys, &y)?;
            let different = x.equal(sys, &z)?;
            sys.assert_boolean(None, same.clone())?;

            let picked = FieldVar::if_(&same, &z, &x, sys)?;
            let mut values = vec![];
            sys.as_prover(|env| {
                values = vec![
                    env.read_var(&same)?,
                    env.read_var(&different)?,
                    env.read_var(&picked)?,
                ];
                Ok(())
            })?;
            assert_eq!(values, vec![Fp::one(), Fp::zero(), f(5)]);
            Ok(())
        })
        .unwrap();

    let rows = cs.compute_witness(&witness).unwrap();
    cs.verify_witness(&rows, &[]).unwrap();
}

#[test]
fn test_inverse_of_zero() {
    let mut state = state();
    let res = state.generate_witness(|sys| {
        let x = sys.compute(|_| Ok(Fp::zero()))?;
        x.inv(Some("1 / x"), sys).map(|_| ())
    });
    assert!(matches!(
        res,
        Err(SnarkyError::RuntimeError(
            SnarkyRuntimeError::UnsatisfiedConstraint { .. }
        ))
    ));

    let res = state.constraint_system(|sys| c(0).inv(None, sys).map(|_| ()));
    assert!(res.is_err());
}

#[test]
fn test_range_checks() {
    let mut state = state();
    let (cs, _) = state
        .prove(2, |sys| {
            let x = sys.compute(|_| Ok(f(255)))?;
            sys.range_check(None, x.clone(), 8, RangeCheckVariant::Single)?;
            sys.range_check(None, x, 64, RangeCheckVariant::Lookup)?;
            // folded away
            sys.range_check(None, c(3), 2, RangeCheckVariant::Compact)
        })
        .unwrap();
    let kinds: Vec<_> = cs.gates().iter().map(|gate| gate.typ).collect();
    assert_eq!(kinds, vec![GateType::RangeCheck0, GateType::Lookup]);
    assert_eq!(cs.gates()[0].coeffs, vec![f(8)]);

    let res = state.prove(1, |sys| {
        let x = sys.compute(|_| Ok(f(256)))?;
        sys.range_check(Some("8 bits"), x, 8, RangeCheckVariant::Single)
    });
    assert!(res.is_err());

    // zero bits means zero
    let cs = state
        .constraint_system(|sys| {
            let x = sys.alloc_var()?;
            sys.range_check(None, x, 0, RangeCheckVariant::Single)
        })
        .unwrap();
    assert_eq!(cs.rows(), 1);
    assert_eq!(cs.gates()[0].typ, GateType::Generic);
}

#[test]
fn test_raw_gates() {
    let mut state = state();
    let cs = state
        .constraint_system(|sys| {
            let x = sys.alloc_var()?;
            let y = sys.alloc_var()?;
            let z = sys.alloc_var()?;
            sys.generic(
                Some("x + y = z"),
                GenericGate::Add {
                    left_coeff: None,
                    right_coeff: None,
                    output_coeff: None,
                },
                x.clone(),
                y.clone(),
                z,
            )?;
            sys.raw_gate(None, GateType::Xor16, vec![x, y], vec![])
        })
        .unwrap();
    let kinds: Vec<_> = cs.gates().iter().map(|gate| gate.typ).collect();
    assert_eq!(kinds, vec![GateType::Generic, GateType::Xor16]);
    assert!(!cs.to_asm().is_empty());

    let res = state.constraint_system(|sys| {
        let x = sys.alloc_var()?;
        sys.raw_gate(None, GateType::RangeCheck0, vec![x], vec![f(1), f(2)])
    });
    assert!(matches!(
        res,
        Err(SnarkyError::CompilationError(
            SnarkyCompilationError::GateOverflow { .. }
        ))
    ));
}

#[test]
fn test_oversized_generic_constraint_is_refused() {
    // eight wires and twelve coefficients do not fit one generic row
    let oversized = |sys: &mut RunState<Fp>| -> SnarkyResult<()> {
        let mut vars = vec![];
        for _ in 0..8 {
            vars.push(sys.compute(|_| Ok(Fp::zero()))?);
        }
        sys.add_constraint(
            Constraint::Raw {
                kind: GateType::Generic,
                vars,
                coeffs: vec![f(1); 12],
            },
            Some("oversized"),
        )
    };
    let overflow = |res: SnarkyResult<_>| {
        matches!(
            res,
            Err(SnarkyError::CompilationError(
                SnarkyCompilationError::GateOverflow {
                    kind: GateType::Generic,
                    wires: 8,
                    coeffs: 12,
                    ..
                }
            ))
        )
    };

    let mut state = state();
    assert!(overflow(state.constraint_system(oversized).map(|_| ())));
    assert!(overflow(state.generate_witness(oversized).map(|_| ())));
    assert!(overflow(state.prove(8, oversized).map(|_| ())));
}
