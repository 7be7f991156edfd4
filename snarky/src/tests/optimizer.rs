use proptest::prelude::*;
use proptest_derive::Arbitrary;
use snarky_curves::pasta::Fp;

use crate::{
    config::{Unification, OPTIMIZATION_ENV_VAR},
    prelude::*,
};

fn f(x: u64) -> Fp {
    Fp::from(x)
}

/// One step of a random circuit. Indices pick among the variables created so
/// far, and every step keeps the witness satisfying.
#[derive(Clone, Copy, Debug, Arbitrary)]
enum Op {
    Mul(usize, usize),
    Square(usize),
    /// `w = k·a + b`
    Lin(usize, usize, u8),
    /// a copy of a variable, asserted equal to it
    Copy(usize),
    /// a fresh bit
    Bit(bool),
}

fn trace_circuit<'a>(
    inputs: &'a [u64],
    ops: &'a [Op],
) -> impl FnOnce(&mut RunState<Fp>) -> SnarkyResult<()> + 'a {
    move |sys| {
        let mut pool = Vec::with_capacity(inputs.len() + ops.len());
        for input in inputs {
            let value = f(*input);
            pool.push(sys.compute(move |_| Ok(value))?);
        }

        for op in ops {
            let n = pool.len();
            let var = match *op {
                Op::Mul(i, j) => pool[i % n].mul(&pool[j % n], None, sys)?,
                Op::Square(i) => pool[i % n].square(None, sys)?,
                Op::Lin(i, j, k) => {
                    let expr = &pool[i % n].scale(f(u64::from(k))) + &pool[j % n];
                    let to_read = expr.clone();
                    let w = sys.compute(move |env| env.read_var(&to_read))?;
                    sys.assert_equal(Some("lin"), w.clone(), expr)?;
                    w
                }
                Op::Copy(i) => {
                    let original = pool[i % n].clone();
                    let to_read = original.clone();
                    let copy = sys.compute(move |env| env.read_var(&to_read))?;
                    sys.assert_equal(Some("copy"), copy.clone(), original)?;
                    copy
                }
                Op::Bit(bit) => {
                    let b = sys.compute(move |_| Ok(f(u64::from(bit))))?;
                    sys.assert_boolean(Some("bit"), b.clone())?;
                    b
                }
            };
            pool.push(var);
        }
        Ok(())
    }
}

fn prove(
    mode: OptimizationMode,
    inputs: &[u64],
    ops: &[Op],
) -> (ConstraintSystem<Fp>, Witness<Fp>) {
    let mut state = RunState::with_config(mode.into());
    state
        .prove(inputs.len() + ops.len(), trace_circuit(inputs, ops))
        .unwrap()
}

fn digest_of(mode: OptimizationMode, circuit: fn(&mut RunState<Fp>) -> SnarkyResult<()>) -> [u8; 32] {
    let mut state = RunState::with_config(mode.into());
    state.constraint_system(circuit).unwrap().digest()
}

fn sum_xy(sys: &mut RunState<Fp>) -> SnarkyResult<()> {
    let x = sys.alloc_var()?;
    let y = sys.alloc_var()?;
    let z = sys.alloc_var()?;
    sys.assert_equal(None, &x + &y, z)
}

fn sum_yx(sys: &mut RunState<Fp>) -> SnarkyResult<()> {
    let x = sys.alloc_var()?;
    let y = sys.alloc_var()?;
    let z = sys.alloc_var()?;
    sys.assert_equal(None, &y + &x, z)
}

#[test]
fn test_operand_order_does_not_matter() {
    assert_eq!(
        digest_of(OptimizationMode::Aggressive, sum_xy),
        digest_of(OptimizationMode::Aggressive, sum_yx)
    );
    // without normalization the terms keep their order
    assert_ne!(
        digest_of(OptimizationMode::Debug, sum_xy),
        digest_of(OptimizationMode::Debug, sum_yx)
    );
}

#[test]
fn test_presets_on_one_circuit() {
    let circuit = |sys: &mut RunState<Fp>| -> SnarkyResult<()> {
        let x = sys.compute(|_| Ok(f(5)))?;
        let y = sys.compute(|_| Ok(f(7)))?;
        let z = x.mul(&y, None, sys)?;
        sys.assert_equal(None, &x + &y, FieldVar::constant(f(12)))?;
        sys.assert_equal(None, z.clone(), y.scale(f(5)))?;
        sys.assert_boolean(None, &z - &FieldVar::constant(f(34)))
    };

    let rows = |mode: OptimizationMode| {
        let mut state = RunState::<Fp>::with_config(mode.into());
        let (cs, witness) = state.prove(3, circuit).unwrap();
        let assignment = cs.compute_witness(&witness).unwrap();
        cs.verify_witness(&assignment, &[]).unwrap();
        cs.rows()
    };

    // x + y = 12 links y to x, then z = 5·y links z to x, so only the
    // product and the boolean check are left, sharing a row
    assert_eq!(rows(OptimizationMode::Aggressive), 1);
    // neither equality is an alias
    assert_eq!(rows(OptimizationMode::SnarkyCompatible), 2);
    assert_eq!(rows(OptimizationMode::Debug), 4);
}

#[test]
fn test_stats() {
    let ops = [Op::Mul(0, 1), Op::Copy(2), Op::Bit(true), Op::Lin(0, 1, 3)];
    let (cs, _) = prove(OptimizationMode::Aggressive, &[2, 3], &ops);
    let stats = cs.stats();
    assert_eq!(stats.constraints_recorded, 4);
    assert_eq!(stats.equalities_unified, 1);
    assert_eq!(stats.rows, cs.rows());
    assert_eq!(stats.internal_vars, 0);
    assert!(stats.batched_rows <= stats.rows);
}

#[test]
fn test_from_env() {
    std::env::set_var(OPTIMIZATION_ENV_VAR, "debug");
    assert_eq!(OptimizationConfig::from_env(), OptimizationConfig::debug());
    std::env::set_var(OPTIMIZATION_ENV_VAR, " snarky_compatible ");
    assert_eq!(
        OptimizationConfig::from_env().unification,
        Unification::Aliases
    );
    std::env::set_var(OPTIMIZATION_ENV_VAR, "fastest");
    assert_eq!(OptimizationConfig::from_env(), OptimizationConfig::default());
    std::env::remove_var(OPTIMIZATION_ENV_VAR);
    assert_eq!(OptimizationConfig::from_env(), OptimizationConfig::aggressive());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_optimization_never_adds_rows(
        inputs in prop::collection::vec(1u64..1000, 1..4),
        ops in prop::collection::vec(any::<Op>(), 0..40),
    ) {
        let (optimized, witness) = prove(OptimizationMode::Aggressive, &inputs, &ops);
        let (naive, naive_witness) = prove(OptimizationMode::Debug, &inputs, &ops);
        prop_assert!(optimized.rows() <= naive.rows());
        prop_assert_eq!(witness.values(), naive_witness.values());

        // both lowerings hold on the witness
        for cs in [&optimized, &naive] {
            let assignment = cs.compute_witness(&witness).unwrap();
            prop_assert!(cs.verify_witness(&assignment, &[]).is_ok());
        }
    }

    #[test]
    fn test_compilation_is_deterministic(
        inputs in prop::collection::vec(1u64..1000, 1..4),
        ops in prop::collection::vec(any::<Op>(), 0..40),
    ) {
        let (first, _) = prove(OptimizationMode::Aggressive, &inputs, &ops);
        let (second, _) = prove(OptimizationMode::Aggressive, &inputs, &ops);
        prop_assert_eq!(first.digest(), second.digest());
        prop_assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());

        // the structure does not depend on the witness
        let mut state = RunState::<Fp>::with_config(OptimizationMode::Aggressive.into());
        let compiled = state.constraint_system(trace_circuit(&inputs, &ops)).unwrap();
        prop_assert_eq!(compiled.gates(), first.gates());
    }
}
