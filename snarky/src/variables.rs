use ark_ff::PrimeField;
use log::trace;

use crate::{
    config::Unification,
    errors::{SnarkyResult, SnarkyRuntimeError, SnarkyRuntimeResult},
    linear_combination::LinearCombination,
    union_find::{DisjointSet, Root},
};

/// The variables of a session: allocation order (the index), the witness
/// value when one is known, and the equivalence classes built by
/// unification.
#[derive(Debug, Clone, Default)]
pub struct VariableTable<F> {
    witnesses: Vec<Option<F>>,
    classes: DisjointSet<F>,
    public_input_size: usize,
}

impl<F> VariableTable<F>
where
    F: PrimeField,
{
    pub fn new() -> Self {
        VariableTable {
            witnesses: vec![],
            classes: DisjointSet::new(),
            public_input_size: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        VariableTable {
            witnesses: Vec::with_capacity(capacity),
            classes: DisjointSet::with_capacity(capacity),
            public_input_size: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.witnesses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.witnesses.is_empty()
    }

    pub fn public_input_size(&self) -> usize {
        self.public_input_size
    }

    pub fn alloc(&mut self, witness: Option<F>) -> usize {
        let idx = self.classes.make_set();
        self.witnesses.push(witness);
        debug_assert_eq!(idx + 1, self.witnesses.len());
        idx
    }

    /// Public inputs take the first indices, so they are never placed under
    /// another representative.
    pub fn alloc_public(&mut self, witness: Option<F>) -> usize {
        debug_assert_eq!(self.public_input_size, self.len());
        self.public_input_size += 1;
        self.alloc(witness)
    }

    pub fn is_public(&self, idx: usize) -> bool {
        idx < self.public_input_size
    }

    pub fn witness(&self, idx: usize) -> SnarkyRuntimeResult<F> {
        self.witnesses
            .get(idx)
            .copied()
            .flatten()
            .ok_or(SnarkyRuntimeError::MissingWitness(idx))
    }

    pub fn witnesses(&self) -> &[Option<F>] {
        &self.witnesses
    }

    pub fn representative(&mut self, idx: usize) -> Root<F> {
        self.classes.find(idx).unwrap_or(Root::Var {
            var: idx,
            coeff: F::one(),
            offset: F::zero(),
        })
    }

    /// Rewrites every variable of `lc` in terms of the representative of its
    /// class.
    pub fn resolve(&mut self, lc: &LinearCombination<F>, normalize: bool) -> LinearCombination<F> {
        let mut terms = Vec::with_capacity(lc.terms.len());
        let mut constant = lc.constant;
        for (c, v) in &lc.terms {
            match self.representative(*v) {
                Root::Var { var, coeff, offset } => {
                    terms.push((*c * coeff, var));
                    constant += *c * offset;
                }
                Root::Constant(k) => constant += *c * k,
            }
        }
        let resolved = LinearCombination { terms, constant };
        if normalize {
            resolved.normalized()
        } else {
            resolved
        }
    }

    /// Tries to absorb the equation `lc = 0` into the equivalence classes.
    /// Returns `true` when nothing is left to constrain.
    ///
    /// With [Unification::Aliases] only `x = y` and `±x = c` are absorbed,
    /// [Unification::Affine] absorbs any equation over at most two classes.
    /// Public inputs are never eliminated.
    pub fn unify(
        &mut self,
        lc: &LinearCombination<F>,
        policy: Unification,
        label: Option<&str>,
    ) -> SnarkyResult<bool> {
        if policy == Unification::Off {
            return Ok(false);
        }

        let resolved = self.resolve(lc, true);
        let constant = resolved.constant;
        match resolved.terms.as_slice() {
            [] if constant.is_zero() => Ok(true),
            [] => Err(SnarkyRuntimeError::unsatisfied(
                label,
                format!("{} = 0", crate::asm::pretty(constant)),
                vec![],
            )
            .into()),
            [(c, u)] => {
                let unit = c.is_one() || (-*c).is_one();
                if self.is_public(*u) || (policy == Unification::Aliases && !unit) {
                    return Ok(false);
                }
                let value = -constant / c;
                trace!("pinning v{u} to {}", crate::asm::pretty(value));
                self.classes.pin(*u, value);
                Ok(true)
            }
            [(cu, u), (cv, v)] => {
                // normalized terms are sorted, so `u` is the older variable
                let alias = (*cu + cv).is_zero() && constant.is_zero();
                if self.is_public(*v) || (policy == Unification::Aliases && !alias) {
                    return Ok(false);
                }
                let coeff = -*cu / cv;
                let offset = -constant / cv;
                trace!(
                    "linking v{v} = {}*v{u} + {}",
                    crate::asm::pretty(coeff),
                    crate::asm::pretty(offset)
                );
                self.classes.link(*v, *u, coeff, offset);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
