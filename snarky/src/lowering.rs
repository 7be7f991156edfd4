//! The constraint system being recorded, and its lowering to gates.
//!
//! Recording runs the cheap passes eagerly: equalities are absorbed by the
//! variable classes as soon as they are added, and multiplications by a
//! constant become equalities. [SnarkyConstraintSystem::finalize] then
//! rescans what is left (classes may have grown since), and emits the gates:
//!
//! - one generic row per public input, first;
//! - every other constraint is reduced to generic halves
//!   `cl·l + cr·r + co·o + cm·l·r + cc = 0` over the representatives of its
//!   variables, or to the gate it asked for;
//! - consecutive halves share a row.
//!
//! Every step is deterministic: constraints are visited in the order they
//! were added, and nothing is ever reordered.

use std::collections::HashMap;

use ark_ff::PrimeField;
use log::debug;

use crate::{
    asm::pretty,
    config::OptimizationConfig,
    constraint::{fits_in_bits, AnnotatedConstraint, Constraint},
    constraint_system::ConstraintSystem,
    cvar::FieldVar,
    errors::{
        SnarkyCompilationError, SnarkyCompileResult, SnarkyError, SnarkyResult, SnarkyRuntimeError,
    },
    gate::{Gate, GateType, Wire},
    generic::{GenericGate, DOUBLE_GENERIC_COEFFS, GENERIC_COEFFS, GENERIC_REGISTERS},
    linear_combination::LinearCombination,
    variables::VariableTable,
};

/// A variable of the lowered circuit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum V {
    /// A variable allocated by the circuit.
    External(usize),
    /// An intermediate value introduced by the lowering, for instance to
    /// split a long linear combination.
    Internal(usize),
}

/// How to compute an internal variable: `Σ cᵢ·vᵢ + c`.
pub type InternalVar<F> = (Vec<(F, V)>, F);

/// What the passes did to a circuit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OptimizationStats {
    /// Constraints added by the circuit.
    pub constraints_recorded: usize,
    /// Equalities absorbed by the variable classes instead of producing
    /// gates.
    pub equalities_unified: usize,
    pub rows: usize,
    /// Rows holding two generic constraints.
    pub batched_rows: usize,
    pub internal_vars: usize,
}

/// The constraints of a circuit, as recorded.
#[derive(Clone, Debug)]
pub struct SnarkyConstraintSystem<F: PrimeField> {
    config: OptimizationConfig,
    constraints: Vec<AnnotatedConstraint<F>>,
    constraints_recorded: usize,
    equalities_unified: usize,
}

impl<F: PrimeField> SnarkyConstraintSystem<F> {
    pub fn new(config: OptimizationConfig) -> Self {
        SnarkyConstraintSystem {
            config,
            constraints: vec![],
            constraints_recorded: 0,
            equalities_unified: 0,
        }
    }

    pub fn config(&self) -> OptimizationConfig {
        self.config
    }

    /// Number of constraints still waiting to be lowered.
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Records a constraint. Equalities that the classes of `vars` can
    /// absorb are not kept.
    pub fn add_constraint(
        &mut self,
        vars: &mut VariableTable<F>,
        constraint: AnnotatedConstraint<F>,
    ) -> SnarkyResult<()> {
        constraint.constraint.check_arity()?;
        self.constraints_recorded += 1;
        if let Some(constraint) = self.absorb(vars, constraint)? {
            self.constraints.push(constraint);
        }
        Ok(())
    }

    /// Returns the constraint if it is still needed once the known constants
    /// are folded and equalities unified.
    fn absorb(
        &mut self,
        vars: &mut VariableTable<F>,
        AnnotatedConstraint {
            annotation,
            constraint,
        }: AnnotatedConstraint<F>,
    ) -> SnarkyResult<Option<AnnotatedConstraint<F>>> {
        let constraint = if self.config.constant_folding {
            linearize(vars, constraint)
        } else {
            constraint
        };

        if let Constraint::Equal(a, b) = &constraint {
            let lc = LinearCombination::from_field_var(a, false)
                .sub(&LinearCombination::from_field_var(b, false));
            if vars.unify(&lc, self.config.unification, annotation)? {
                self.equalities_unified += 1;
                return Ok(None);
            }
        }

        Ok(Some(AnnotatedConstraint {
            annotation,
            constraint,
        }))
    }

    /// Lowers the recorded constraints to gates.
    pub fn finalize(mut self, vars: &mut VariableTable<F>) -> SnarkyResult<ConstraintSystem<F>> {
        // classes may have grown since a constraint was recorded
        let recorded = std::mem::take(&mut self.constraints);
        for constraint in recorded {
            if let Some(constraint) = self.absorb(vars, constraint)? {
                self.constraints.push(constraint);
            }
        }

        let num_external = vars.len();
        let public_input_size = vars.public_input_size();
        let mut emitter = Emitter::new(self.config, vars);

        for var in 0..public_input_size {
            emitter.public_input(var)?;
        }
        for constraint in &self.constraints {
            emitter.lower(constraint)?;
        }
        emitter.flush()?;

        let Emitter {
            gates,
            internal_vars,
            batched_rows,
            ..
        } = emitter;

        let stats = OptimizationStats {
            constraints_recorded: self.constraints_recorded,
            equalities_unified: self.equalities_unified,
            rows: gates.len(),
            batched_rows,
            internal_vars: internal_vars.len(),
        };
        debug!(
            "finalized circuit: {} constraints recorded, {} unified, {} rows ({} batched), {} internal variables",
            stats.constraints_recorded,
            stats.equalities_unified,
            stats.rows,
            stats.batched_rows,
            stats.internal_vars
        );

        ConstraintSystem::new(gates, public_input_size, num_external, internal_vars, stats)
    }
}

/// Rewrites multiplications by a known constant as equalities.
fn linearize<F: PrimeField>(vars: &mut VariableTable<F>, constraint: Constraint<F>) -> Constraint<F> {
    let mut constant_of = |var: &FieldVar<F>| {
        vars.resolve(&LinearCombination::from_field_var(var, true), true)
            .to_constant()
    };

    match constraint {
        Constraint::R1CS(a, b, c) => match (constant_of(&a), constant_of(&b)) {
            (Some(k), _) => Constraint::Equal(b.scale(k), c),
            (None, Some(k)) => Constraint::Equal(a.scale(k), c),
            (None, None) => Constraint::R1CS(a, b, c),
        },
        Constraint::Square(a, b) => match constant_of(&a) {
            Some(k) => Constraint::Equal(FieldVar::constant(k.square()), b),
            None => Constraint::Square(a, b),
        },
        constraint => constraint,
    }
}

/// `scale·var + constant`, an operand reduced to at most one variable.
#[derive(Clone, Copy, Debug)]
struct Affine<F> {
    scale: F,
    var: Option<V>,
    constant: F,
}

impl<F: PrimeField> Affine<F> {
    fn zero() -> Self {
        Affine {
            scale: F::zero(),
            var: None,
            constant: F::zero(),
        }
    }
}

/// One generic constraint, waiting for a row.
#[derive(Clone, Copy, Debug)]
struct Half<F> {
    wires: [Option<V>; GENERIC_REGISTERS],
    coeffs: [F; GENERIC_COEFFS],
}

struct Emitter<'a, F: PrimeField> {
    config: OptimizationConfig,
    vars: &'a mut VariableTable<F>,
    num_external: usize,
    gates: Vec<Gate<F>>,
    /// A generic constraint waiting for a second one to share its row.
    pending: Option<Half<F>>,
    internal_vars: Vec<InternalVar<F>>,
    /// Internal variables by definition, so that an expression is only
    /// materialized once.
    cached: HashMap<InternalVar<F>, V>,
    batched_rows: usize,
}

impl<'a, F: PrimeField> Emitter<'a, F> {
    fn new(config: OptimizationConfig, vars: &'a mut VariableTable<F>) -> Self {
        let num_external = vars.len();
        Emitter {
            config,
            vars,
            num_external,
            gates: vec![],
            pending: None,
            internal_vars: vec![],
            cached: HashMap::new(),
            batched_rows: 0,
        }
    }

    //
    // rows
    //

    fn wire(&self, var: Option<V>) -> SnarkyCompileResult<Wire> {
        let idx = match var {
            None => return Ok(0),
            Some(V::External(i)) => i + 1,
            Some(V::Internal(i)) => self.num_external + i + 1,
        };
        Wire::try_from(idx).map_err(|_| SnarkyCompilationError::WireOverflow(idx))
    }

    fn push_gate(&mut self, typ: GateType, vars: &[Option<V>], coeffs: Vec<F>) -> SnarkyResult<()> {
        let wires = vars
            .iter()
            .map(|var| self.wire(*var))
            .collect::<SnarkyCompileResult<Vec<_>>>()?;
        self.gates.push(Gate::new(typ, &wires, coeffs)?);
        Ok(())
    }

    fn push_half(&mut self, half: Half<F>) -> SnarkyResult<()> {
        if !self.config.batching {
            return self.push_gate(GateType::Generic, &half.wires, half.coeffs.to_vec());
        }

        match self.pending.take() {
            None => {
                self.pending = Some(half);
                Ok(())
            }
            Some(first) => {
                let mut wires = first.wires.to_vec();
                wires.extend(half.wires);
                let mut coeffs = Vec::with_capacity(DOUBLE_GENERIC_COEFFS);
                coeffs.extend(first.coeffs);
                coeffs.extend(half.coeffs);
                self.batched_rows += 1;
                self.push_gate(GateType::Generic, &wires, coeffs)
            }
        }
    }

    /// Emits the pending generic constraint alone on its row.
    fn flush(&mut self) -> SnarkyResult<()> {
        match self.pending.take() {
            Some(half) => self.push_gate(GateType::Generic, &half.wires, half.coeffs.to_vec()),
            None => Ok(()),
        }
    }

    /// A gate of another kind: rows are never reordered, so the pending
    /// generic constraint goes first.
    fn push_other(&mut self, typ: GateType, vars: &[Option<V>], coeffs: Vec<F>) -> SnarkyResult<()> {
        self.flush()?;
        self.push_gate(typ, vars, coeffs)
    }

    fn public_input(&mut self, var: usize) -> SnarkyResult<()> {
        self.push_gate(
            GateType::Generic,
            &[Some(V::External(var))],
            GenericGate::Pub.coeffs().to_vec(),
        )
    }

    //
    // operands
    //

    fn resolve(&mut self, var: &FieldVar<F>) -> LinearCombination<F> {
        let lc = LinearCombination::from_field_var(var, false);
        self.vars.resolve(&lc, self.config.linear_combination)
    }

    /// Introduces `y = t₀ + t₁ + constant` (at most two terms), or reuses an
    /// internal variable with the same definition.
    fn define(&mut self, terms: Vec<(F, V)>, constant: F) -> SnarkyResult<V> {
        assert!(terms.len() <= 2, "an internal variable takes at most two terms");
        let definition = (terms, constant);
        if let Some(var) = self.cached.get(&definition) {
            return Ok(*var);
        }

        let var = V::Internal(self.internal_vars.len());
        let mut half = Half {
            wires: [None, None, Some(var)],
            coeffs: [F::zero(); GENERIC_COEFFS],
        };
        for (i, (coeff, term)) in definition.0.iter().enumerate() {
            half.wires[i] = Some(*term);
            half.coeffs[i] = *coeff;
        }
        half.coeffs[2] = -F::one();
        half.coeffs[4] = constant;

        self.internal_vars.push(definition.clone());
        self.cached.insert(definition, var);
        self.push_half(half)?;
        Ok(var)
    }

    /// Folds the leading terms into internal variables until at most `keep`
    /// terms are left.
    fn reduce(&mut self, mut terms: Vec<(F, V)>, keep: usize) -> SnarkyResult<Vec<(F, V)>> {
        debug_assert!(keep >= 1);
        while terms.len() > keep {
            let rest = terms.split_off(2);
            let acc = self.define(terms, F::zero())?;
            terms = std::iter::once((F::one(), acc)).chain(rest).collect();
        }
        Ok(terms)
    }

    fn affine(&mut self, var: &FieldVar<F>) -> SnarkyResult<Affine<F>> {
        let lc = self.resolve(var);
        let terms = lc.terms.iter().map(|(c, v)| (*c, V::External(*v))).collect();
        let terms = self.reduce(terms, 1)?;
        Ok(match terms.first() {
            None => Affine {
                constant: lc.constant,
                ..Affine::zero()
            },
            Some((scale, var)) => Affine {
                scale: *scale,
                var: Some(*var),
                constant: lc.constant,
            },
        })
    }

    /// A variable holding the operand, materialized unless it already is a
    /// plain variable.
    fn to_wire(&mut self, operand: Affine<F>) -> SnarkyResult<V> {
        match operand.var {
            Some(var) if operand.scale.is_one() && operand.constant.is_zero() => Ok(var),
            var => {
                let terms = var.map(|var| vec![(operand.scale, var)]).unwrap_or_default();
                self.define(terms, operand.constant)
            }
        }
    }

    //
    // constraints
    //

    fn lower(&mut self, constraint: &AnnotatedConstraint<F>) -> SnarkyResult<()> {
        let one = F::one();
        let zero = F::zero();

        match &constraint.constraint {
            Constraint::Equal(a, b) => self.equal(constraint, a, b),
            Constraint::R1CS(a, b, c) => {
                let operands = [self.affine(a)?, self.affine(b)?, self.affine(c)?];
                self.generic(constraint, operands, [zero, zero, -one, one, zero])
            }
            Constraint::Square(a, b) => {
                let a = self.affine(a)?;
                let b = self.affine(b)?;
                self.generic(constraint, [a, a, b], [zero, zero, -one, one, zero])
            }
            Constraint::Boolean(x) => {
                // x² - x = 0
                let x = self.affine(x)?;
                self.generic(constraint, [x, x, Affine::zero()], [-one, zero, zero, one, zero])
            }
            Constraint::RangeCheck { var, bits, .. } if *bits == 0 => {
                self.equal(constraint, var, &FieldVar::zero())
            }
            Constraint::RangeCheck { var, bits, variant } => {
                let x = self.affine(var)?;
                if x.var.is_none() && self.config.constant_folding {
                    if !fits_in_bits(x.constant, *bits) {
                        return Err(unsatisfied(constraint, x.constant));
                    }
                    return Ok(());
                }
                let wire = self.to_wire(x)?;
                self.push_other(variant.gate_type(), &[Some(wire)], vec![F::from(*bits)])
            }
            Constraint::Raw {
                kind: GateType::Generic,
                vars,
                coeffs,
            } => {
                let mut coeffs = coeffs.clone();
                coeffs.resize(DOUBLE_GENERIC_COEFFS, zero);

                for (half, cs) in coeffs.chunks_exact(GENERIC_COEFFS).enumerate() {
                    // a half without coefficients constrains nothing
                    if cs.iter().all(|c| c.is_zero()) {
                        continue;
                    }
                    let mut ops = [Affine::zero(); GENERIC_REGISTERS];
                    let registers = vars.iter().skip(half * GENERIC_REGISTERS).take(GENERIC_REGISTERS);
                    for (op, var) in ops.iter_mut().zip(registers) {
                        *op = self.affine(var)?;
                    }
                    self.generic(constraint, ops, [cs[0], cs[1], cs[2], cs[3], cs[4]])?;
                }
                Ok(())
            }
            Constraint::Raw { kind, vars, coeffs } => {
                let mut wires = Vec::with_capacity(vars.len());
                for var in vars {
                    let operand = self.affine(var)?;
                    wires.push(Some(self.to_wire(operand)?));
                }
                self.push_other(*kind, &wires, coeffs.clone())
            }
        }
    }

    /// `a - b = 0`, as a generic constraint over at most three variables.
    fn equal(
        &mut self,
        constraint: &AnnotatedConstraint<F>,
        a: &FieldVar<F>,
        b: &FieldVar<F>,
    ) -> SnarkyResult<()> {
        let lc = LinearCombination::from_field_var(a, false)
            .sub(&LinearCombination::from_field_var(b, false));
        let lc = self.vars.resolve(&lc, self.config.linear_combination);

        if lc.terms.is_empty() {
            if !lc.constant.is_zero() {
                return Err(unsatisfied(constraint, lc.constant));
            }
            if self.config.constant_folding {
                return Ok(());
            }
        }

        let terms = lc.terms.iter().map(|(c, v)| (*c, V::External(*v))).collect();
        let terms = self.reduce(terms, GENERIC_REGISTERS)?;

        let mut half = Half {
            wires: [None; GENERIC_REGISTERS],
            coeffs: [F::zero(); GENERIC_COEFFS],
        };
        for (i, (coeff, var)) in terms.into_iter().enumerate() {
            half.wires[i] = Some(var);
            half.coeffs[i] = coeff;
        }
        half.coeffs[4] = lc.constant;
        self.push_half(half)
    }

    /// `cl·l + cr·r + co·o + cm·l·r + cc = 0` over affine operands: the
    /// scales and constants of the operands are absorbed in the coefficients.
    fn generic(
        &mut self,
        constraint: &AnnotatedConstraint<F>,
        [l, r, o]: [Affine<F>; GENERIC_REGISTERS],
        [cl, cr, co, cm, cc]: [F; GENERIC_COEFFS],
    ) -> SnarkyResult<()> {
        let coeffs = [
            cl * l.scale + cm * l.scale * r.constant,
            cr * r.scale + cm * l.constant * r.scale,
            co * o.scale,
            cm * l.scale * r.scale,
            cl * l.constant + cr * r.constant + co * o.constant + cm * l.constant * r.constant + cc,
        ];
        let wires = [l.var, r.var, o.var];

        if self.config.constant_folding && wires.iter().all(Option::is_none) {
            if !coeffs[4].is_zero() {
                return Err(unsatisfied(constraint, coeffs[4]));
            }
            return Ok(());
        }

        self.push_half(Half { wires, coeffs })
    }
}

/// A constraint that folded to the non-zero constant `residue`.
fn unsatisfied<F: PrimeField>(constraint: &AnnotatedConstraint<F>, residue: F) -> SnarkyError {
    SnarkyRuntimeError::unsatisfied(
        constraint.annotation,
        &constraint.constraint,
        vec![pretty(residue)],
    )
    .into()
}
