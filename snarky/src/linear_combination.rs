//! Sparse linear combinations `Σ cᵢ·vᵢ + c₀`, the form every constraint
//! operand is reduced to before it is lowered to gates.

use std::collections::BTreeMap;

use ark_ff::PrimeField;

use crate::cvar::{FieldVar, Term};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinearCombination<F> {
    /// Scaled variables. Sorted by variable index, without duplicates and
    /// without zero coefficients once normalized.
    pub terms: Vec<Term<F>>,
    pub constant: F,
}

impl<F> LinearCombination<F>
where
    F: PrimeField,
{
    pub fn constant(constant: F) -> Self {
        LinearCombination {
            terms: vec![],
            constant,
        }
    }

    /// Reads an expression. With `normalize`, duplicate variables are
    /// combined, zero terms dropped and terms sorted by variable index;
    /// otherwise terms are kept as they appear in the expression.
    pub fn from_field_var(var: &FieldVar<F>, normalize: bool) -> Self {
        let (constant, terms) = var.to_constant_and_terms();
        let res = LinearCombination { terms, constant };
        if normalize {
            res.normalized()
        } else {
            res
        }
    }

    pub fn normalized(self) -> Self {
        let mut combined: BTreeMap<usize, F> = BTreeMap::new();
        for (coeff, var) in self.terms {
            *combined.entry(var).or_insert_with(F::zero) += coeff;
        }
        let terms = combined
            .into_iter()
            .filter(|(_, coeff)| !coeff.is_zero())
            .map(|(var, coeff)| (coeff, var))
            .collect();
        LinearCombination {
            terms,
            constant: self.constant,
        }
    }

    /// Returns the constant if there is no variable term left.
    pub fn to_constant(&self) -> Option<F> {
        if self.terms.is_empty() {
            Some(self.constant)
        } else {
            None
        }
    }

    pub fn scale(&self, scalar: F) -> Self {
        LinearCombination {
            terms: self.terms.iter().map(|(c, v)| (*c * scalar, *v)).collect(),
            constant: self.constant * scalar,
        }
    }

    /// `self - other`, concatenating terms (normalize afterwards if needed).
    pub fn sub(&self, other: &Self) -> Self {
        let mut terms = self.terms.clone();
        terms.extend(other.terms.iter().map(|(c, v)| (-*c, *v)));
        LinearCombination {
            terms,
            constant: self.constant - other.constant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snarky_curves::pasta::Fp;

    fn var(i: usize) -> FieldVar<Fp> {
        FieldVar::Var(i)
    }

    #[test]
    fn test_normalization() {
        // 2*v3 + v1 - v3 + 5 - v3 + 0*v2
        let e = &(&(&(&var(3).scale(Fp::from(2u64)) + &var(1)) - &var(3))
            + &FieldVar::constant(Fp::from(5u64)))
            - &var(3);
        let e = &e + &FieldVar::Scale(Fp::from(0u64), Box::new(var(2)));

        let raw = LinearCombination::from_field_var(&e, false);
        assert_eq!(raw.terms.len(), 5);

        let lc = LinearCombination::from_field_var(&e, true);
        assert_eq!(lc.terms, vec![(Fp::from(1u64), 1)]);
        assert_eq!(lc.constant, Fp::from(5u64));
    }

    #[test]
    fn test_order_independence() {
        let a = &(&var(0) + &var(1).scale(Fp::from(3u64))) + &var(2);
        let b = &(&var(2) + &var(0)) + &var(1).scale(Fp::from(3u64));
        assert_eq!(
            LinearCombination::from_field_var(&a, true),
            LinearCombination::from_field_var(&b, true)
        );
    }

    #[test]
    fn test_cancellation() {
        let x = var(4);
        let lc = LinearCombination::from_field_var(&(&x - &x), true);
        assert_eq!(lc.to_constant(), Some(Fp::from(0u64)));

        let lhs = LinearCombination::from_field_var(&(&x + &FieldVar::constant(Fp::from(2u64))), true);
        let rhs = LinearCombination::constant(Fp::from(2u64));
        let diff = lhs.sub(&rhs).normalized();
        assert_eq!(diff.terms, vec![(Fp::from(1u64), 4)]);
        assert_eq!(diff.constant, Fp::from(0u64));
    }
}
