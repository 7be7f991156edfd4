//! This module implements the gate records produced by the constraint-system
//! assembler, and the vocabulary of gate kinds they can use.

use ark_ff::PrimeField;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use snarky_utils::serialization::DecimalString;
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    errors::{SnarkyCompilationError, SnarkyCompileResult},
    generic::{DOUBLE_GENERIC_COEFFS, DOUBLE_GENERIC_REGISTERS},
};

/// Number of registers (cells) of a row. Every gate lists one wire per
/// register, `0` meaning the register is unused.
pub const COLUMNS: usize = 15;

/// A wire names the variable held by a register: `0` for none, otherwise the
/// 1-based variable number (see [crate::constraint_system::ConstraintSystem]).
pub type Wire = u32;

/// The wires of a gate.
pub type GateWires = [Wire; COLUMNS];

/// The different types of gates the system supports.
/// Note that all the gates are mutually exclusive:
/// they cannot be used at the same time on single row.
/// If we were ever to support this feature, we would have to make sure
/// not to re-use powers of alpha across constraints.
#[repr(C)]
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum GateType {
    /// Zero gate
    Zero = 0,
    /// Generic arithmetic gate
    Generic = 1,
    /// Poseidon permutation gate
    Poseidon = 2,
    /// Complete EC addition in Affine form
    CompleteAdd = 3,
    /// EC variable base scalar multiplication
    VarBaseMul = 4,
    /// EC variable base scalar multiplication with group endomorphim optimization
    EndoMul = 5,
    /// Gate for computing the scalar corresponding to an endoscaling
    EndoMulScalar = 6,
    /// Lookup
    Lookup = 7,
    /// Range check
    RangeCheck0 = 8,
    RangeCheck1 = 9,
    /// Foreign field arithmetic
    ForeignFieldAdd = 10,
    ForeignFieldMul = 11,
    /// XOR
    Xor16 = 12,
    /// Rotation
    Rot64 = 13,
}

impl GateType {
    /// The largest number of wires a gate of this kind takes.
    pub fn max_wires(self) -> usize {
        match self {
            GateType::Generic => DOUBLE_GENERIC_REGISTERS,
            _ => COLUMNS,
        }
    }

    /// The largest number of coefficients a gate of this kind takes.
    pub fn max_coeffs(self) -> usize {
        match self {
            GateType::Generic => DOUBLE_GENERIC_COEFFS,
            // 5 rounds of 3 round constants
            GateType::Poseidon => 15,
            // foreign modulus limbs and the operation sign
            GateType::ForeignFieldAdd | GateType::ForeignFieldMul => 4,
            // bit width of the range, or the rotation offset
            GateType::Lookup | GateType::RangeCheck0 | GateType::RangeCheck1 | GateType::Rot64 => 1,
            GateType::Zero
            | GateType::CompleteAdd
            | GateType::VarBaseMul
            | GateType::EndoMul
            | GateType::EndoMulScalar
            | GateType::Xor16 => 0,
        }
    }

    /// Fails with [SnarkyCompilationError::GateOverflow] if a gate of this
    /// kind cannot hold that many wires and coefficients.
    pub fn check_arity(self, wires: usize, coeffs: usize) -> SnarkyCompileResult<()> {
        if wires > self.max_wires() || coeffs > self.max_coeffs() {
            return Err(SnarkyCompilationError::GateOverflow {
                kind: self,
                wires,
                coeffs,
                max_wires: self.max_wires(),
                max_coeffs: self.max_coeffs(),
            });
        }
        Ok(())
    }
}

/// A single gate (one row) of a constraint system.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "F: PrimeField")]
pub struct Gate<F: PrimeField> {
    /// type of the gate
    #[serde(rename = "kind")]
    pub typ: GateType,

    /// the variables held by the registers of the row
    pub wires: GateWires,

    /// public selector polynomials that can used as handy coefficients in gates
    #[serde_as(as = "Vec<DecimalString>")]
    pub coeffs: Vec<F>,
}

impl<F: PrimeField> Gate<F> {
    /// Builds a gate from its used wires, padding the remaining registers
    /// with `0`.
    pub fn new(typ: GateType, wires: &[Wire], coeffs: Vec<F>) -> SnarkyCompileResult<Self> {
        typ.check_arity(wires.len(), coeffs.len())?;
        let mut padded = [0; COLUMNS];
        padded[..wires.len()].copy_from_slice(wires);
        Ok(Gate {
            typ,
            wires: padded,
            coeffs,
        })
    }

    pub fn zero() -> Self {
        Gate {
            typ: GateType::Zero,
            wires: [0; COLUMNS],
            coeffs: vec![],
        }
    }

    /// Number of registers up to the last used one.
    pub fn used_wires(&self) -> usize {
        COLUMNS - self.wires.iter().rev().take_while(|wire| **wire == 0).count()
    }

    /// Checks the gate against the arity of its kind.
    pub fn validate(&self) -> SnarkyCompileResult<()> {
        self.typ.check_arity(self.used_wires(), self.coeffs.len())
    }
}
