//! The generic gate.
//!
//! A generic row holds two independent generic constraints ("halves"), each
//! over three registers `l`, `r`, `o` and five coefficients:
//!
//! `cl·l + cr·r + co·o + cm·l·r + cc = 0`
//!
//! A row that holds a single half only carries its five coefficients.

use ark_ff::PrimeField;

//
// Constants
//

/// Number of registers used by one generic constraint.
pub const GENERIC_REGISTERS: usize = 3;

/// Number of coefficients of one generic constraint.
pub const GENERIC_COEFFS: usize = GENERIC_REGISTERS + 1 /* mul */ + 1 /* cst */;

/// Registers used by a row holding two generic constraints.
pub const DOUBLE_GENERIC_REGISTERS: usize = 2 * GENERIC_REGISTERS;

/// Coefficients of a row holding two generic constraints.
pub const DOUBLE_GENERIC_COEFFS: usize = 2 * GENERIC_COEFFS;

//
// Gadgets
//

/// The different type of computation that are possible with a generic gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenericGate<F> {
    /// Add two values.
    Add {
        /// Optional coefficient that can be multiplied with the left operand.
        left_coeff: Option<F>,
        /// Optional coefficient that can be multiplied with the right operand.
        right_coeff: Option<F>,
        /// Optional coefficient that can be multiplied with the output.
        output_coeff: Option<F>,
    },
    /// Multiplication of two values
    Mul {
        /// Optional coefficient that can be multiplied with the output.
        output_coeff: Option<F>,
        /// Optional coefficient that can be multiplied with the multiplication result.
        mul_coeff: Option<F>,
    },
    /// A constant, the constructor contains the constant itself
    Const(F),
    /// A public input
    Pub,
}

impl<F: PrimeField> GenericGate<F> {
    /// The coefficients `[cl, cr, co, cm, cc]` of this computation.
    pub fn coeffs(self) -> [F; GENERIC_COEFFS] {
        let mut coeffs = [F::zero(); GENERIC_COEFFS];
        match self {
            GenericGate::Add {
                left_coeff,
                right_coeff,
                output_coeff,
            } => {
                coeffs[0] = left_coeff.unwrap_or_else(F::one);
                coeffs[1] = right_coeff.unwrap_or_else(F::one);
                coeffs[2] = output_coeff.unwrap_or_else(|| -F::one());
            }
            GenericGate::Mul {
                output_coeff,
                mul_coeff,
            } => {
                coeffs[2] = output_coeff.unwrap_or_else(|| -F::one());
                coeffs[3] = mul_coeff.unwrap_or_else(F::one);
            }
            GenericGate::Const(cst) => {
                coeffs[0] = F::one();
                coeffs[4] = -cst;
            }
            GenericGate::Pub => {
                coeffs[0] = F::one();
            }
        }
        coeffs
    }
}

/// Evaluates `cl·l + cr·r + co·o + cm·l·r + cc` for one generic constraint;
/// the constraint holds when the result is zero.
pub fn generic_equation<F: PrimeField>(coeffs: &[F], [l, r, o]: [F; GENERIC_REGISTERS]) -> F {
    debug_assert_eq!(coeffs.len(), GENERIC_COEFFS);
    coeffs[0] * l + coeffs[1] * r + coeffs[2] * o + coeffs[3] * l * r + coeffs[4]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::{One, Zero};
    use snarky_curves::pasta::Fp;

    #[test]
    fn test_generic_gates() {
        let three = Fp::from(3u64);
        let four = Fp::from(4u64);

        let add = GenericGate::Add {
            left_coeff: None,
            right_coeff: None,
            output_coeff: None,
        }
        .coeffs();
        assert!(generic_equation(&add, [three, four, Fp::from(7u64)]).is_zero());
        assert!(!generic_equation(&add, [three, four, Fp::from(8u64)]).is_zero());

        let mul = GenericGate::Mul {
            output_coeff: None,
            mul_coeff: Some(Fp::from(2u64)),
        }
        .coeffs();
        assert!(generic_equation(&mul, [three, four, Fp::from(24u64)]).is_zero());

        let cst = GenericGate::Const(Fp::from(5u64)).coeffs();
        assert!(generic_equation(&cst, [Fp::from(5u64), Fp::zero(), Fp::zero()]).is_zero());

        let public = GenericGate::<Fp>::Pub.coeffs();
        assert_eq!(public[0], Fp::one());
        assert!(public[1..].iter().all(Zero::is_zero));
    }
}
