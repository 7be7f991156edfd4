use std::fmt;

use ark_ff::PrimeField;
use itertools::Itertools;

use crate::{
    asm::pretty,
    cvar::FieldVar,
    errors::{SnarkyCompileResult, SnarkyResult, SnarkyRuntimeError},
    gate::GateType,
    generic::{generic_equation, GENERIC_COEFFS, GENERIC_REGISTERS},
};

/// Which gate family proves a range check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RangeCheckVariant {
    /// one [GateType::RangeCheck0] row
    Single,
    /// the compact, multi-row form, anchored by a [GateType::RangeCheck1] row
    Compact,
    /// a [GateType::Lookup] into a range table
    Lookup,
}

impl RangeCheckVariant {
    pub fn gate_type(self) -> GateType {
        match self {
            RangeCheckVariant::Single => GateType::RangeCheck0,
            RangeCheckVariant::Compact => GateType::RangeCheck1,
            RangeCheckVariant::Lookup => GateType::Lookup,
        }
    }
}

/// A constraint as recorded from the circuit, before any lowering.
#[derive(Clone, Debug)]
pub enum Constraint<F: PrimeField> {
    Equal(FieldVar<F>, FieldVar<F>),
    /// `a * b = c`
    R1CS(FieldVar<F>, FieldVar<F>, FieldVar<F>),
    /// `a * a = b`
    Square(FieldVar<F>, FieldVar<F>),
    Boolean(FieldVar<F>),
    /// `0 <= var < 2^bits`
    RangeCheck {
        var: FieldVar<F>,
        bits: u32,
        variant: RangeCheckVariant,
    },
    /// A gate given directly, one variable per register.
    Raw {
        kind: GateType,
        vars: Vec<FieldVar<F>>,
        coeffs: Vec<F>,
    },
}

#[derive(Clone, Debug)]
pub struct AnnotatedConstraint<F: PrimeField> {
    pub annotation: Option<&'static str>,
    pub constraint: Constraint<F>,
}

/// Whether `value` fits in `bits` bits.
pub fn fits_in_bits<F: PrimeField>(value: F, bits: u32) -> bool {
    let big: num_bigint::BigUint = value.into();
    big.bits() <= u64::from(bits)
}

impl<F: PrimeField> Constraint<F> {
    /// Fails if a raw gate has more wires or coefficients than its kind can
    /// hold. Other constraints are lowered to as many rows as they need.
    pub fn check_arity(&self) -> SnarkyCompileResult<()> {
        match self {
            Constraint::Raw { kind, vars, coeffs } => kind.check_arity(vars.len(), coeffs.len()),
            _ => Ok(()),
        }
    }

    /// Checks the constraint against concrete values. Raw gates other than
    /// [GateType::Generic] have no equation here and always pass.
    pub fn check(
        &self,
        label: Option<&str>,
        read: &impl Fn(&FieldVar<F>) -> SnarkyResult<F>,
    ) -> SnarkyResult<()> {
        let unsatisfied =
            |values: Vec<F>| SnarkyRuntimeError::unsatisfied(label, self, values.into_iter().map(pretty).collect());

        match self {
            Constraint::Equal(a, b) => {
                let (x, y) = (read(a)?, read(b)?);
                if x != y {
                    return Err(unsatisfied(vec![x, y]).into());
                }
            }
            Constraint::R1CS(a, b, c) => {
                let (x, y, z) = (read(a)?, read(b)?, read(c)?);
                if x * y != z {
                    return Err(unsatisfied(vec![x, y, z]).into());
                }
            }
            Constraint::Square(a, b) => {
                let (x, y) = (read(a)?, read(b)?);
                if x.square() != y {
                    return Err(unsatisfied(vec![x, y]).into());
                }
            }
            Constraint::Boolean(a) => {
                let x = read(a)?;
                if !x.is_zero() && !x.is_one() {
                    return Err(unsatisfied(vec![x]).into());
                }
            }
            Constraint::RangeCheck { var, bits, .. } => {
                let x = read(var)?;
                if !fits_in_bits(x, *bits) {
                    return Err(unsatisfied(vec![x]).into());
                }
            }
            Constraint::Raw { kind, vars, coeffs } => {
                if *kind != GateType::Generic {
                    return Ok(());
                }
                let mut values = vars.iter().map(read).collect::<SnarkyResult<Vec<_>>>()?;
                values.resize(2 * GENERIC_REGISTERS, F::zero());
                let mut padded = coeffs.clone();
                padded.resize(2 * GENERIC_COEFFS, F::zero());

                for (regs, coeffs) in values
                    .chunks(GENERIC_REGISTERS)
                    .zip(padded.chunks(GENERIC_COEFFS))
                {
                    let regs = [regs[0], regs[1], regs[2]];
                    if !generic_equation(coeffs, regs).is_zero() {
                        return Err(unsatisfied(values.clone()).into());
                    }
                }
            }
        }
        Ok(())
    }
}

impl<F: PrimeField> fmt::Display for Constraint<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Equal(a, b) => write!(f, "{a} = {b}"),
            Constraint::R1CS(a, b, c) => write!(f, "{a} * {b} = {c}"),
            Constraint::Square(a, b) => write!(f, "{a}^2 = {b}"),
            Constraint::Boolean(a) => write!(f, "{a} is boolean"),
            Constraint::RangeCheck { var, bits, variant } => {
                write!(f, "{var} < 2^{bits} ({variant:?})")
            }
            Constraint::Raw { kind, vars, coeffs } => write!(
                f,
                "{kind}<{}>({})",
                coeffs.iter().map(|c| pretty(*c)).join(","),
                vars.iter().join(", ")
            ),
        }
    }
}
