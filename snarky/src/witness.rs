use ark_ff::PrimeField;

use crate::errors::{SnarkyRuntimeError, SnarkyRuntimeResult};

/// The values computed for the variables of a circuit, by allocation order.
/// Public inputs come first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Witness<F> {
    values: Vec<Option<F>>,
    public_input_size: usize,
}

impl<F: PrimeField> Witness<F> {
    pub fn new(values: Vec<Option<F>>, public_input_size: usize) -> Self {
        Witness {
            values,
            public_input_size,
        }
    }

    pub fn get(&self, idx: usize) -> SnarkyRuntimeResult<F> {
        self.values
            .get(idx)
            .copied()
            .flatten()
            .ok_or(SnarkyRuntimeError::MissingWitness(idx))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Option<F>] {
        &self.values
    }

    pub fn public_input_size(&self) -> usize {
        self.public_input_size
    }

    pub fn public_inputs(&self) -> SnarkyRuntimeResult<Vec<F>> {
        (0..self.public_input_size).map(|idx| self.get(idx)).collect()
    }
}
