//! The finalized (frozen) constraint system, its digest, and the interchange
//! format.
//!
//! Wires number the variables from `1`: the `n` variables allocated by the
//! circuit come first (variable `i` is wire `i + 1`), followed by the
//! internal variables introduced while lowering. Wire `0` marks an unused
//! register.

use ark_ff::PrimeField;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use snarky_utils::hasher::CryptoDigest;

use crate::{
    asm::pretty,
    errors::{SnarkyCompilationError, SnarkyCompileResult, SnarkyResult, SnarkyRuntimeError},
    gate::{Gate, GateType, Wire, COLUMNS},
    generic::{generic_equation, GENERIC_COEFFS, GENERIC_REGISTERS},
    lowering::{InternalVar, OptimizationStats, V},
    witness::Witness,
};

/// What the digest of a constraint system covers.
#[derive(Serialize)]
#[serde(bound = "F: PrimeField")]
struct DigestInput<'a, F: PrimeField> {
    public_input_size: u32,
    gates: &'a [Gate<F>],
}

impl<F: PrimeField> CryptoDigest for DigestInput<'_, F> {
    const PREFIX: &'static [u8; 15] = b"snarky-circuit0";
}

fn public_input_size_u32(size: usize) -> SnarkyCompileResult<u32> {
    u32::try_from(size).map_err(|_| SnarkyCompilationError::WireOverflow(size))
}

/// The SHA-256 digest of a list of gates and a public input size.
pub fn digest<F: PrimeField>(gates: &[Gate<F>], public_input_size: u32) -> SnarkyResult<[u8; 32]> {
    Ok(DigestInput {
        public_input_size,
        gates,
    }
    .digest()?)
}

/// A circuit, lowered to gates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstraintSystem<F: PrimeField> {
    gates: Vec<Gate<F>>,
    public_input_size: usize,
    /// Variables allocated by the circuit.
    num_external: usize,
    /// Definitions of the internal variables, in wire order.
    internal_vars: Vec<InternalVar<F>>,
    digest: [u8; 32],
    stats: OptimizationStats,
}

impl<F: PrimeField> ConstraintSystem<F> {
    pub(crate) fn new(
        gates: Vec<Gate<F>>,
        public_input_size: usize,
        num_external: usize,
        internal_vars: Vec<InternalVar<F>>,
        stats: OptimizationStats,
    ) -> SnarkyResult<Self> {
        let digest = digest(&gates, public_input_size_u32(public_input_size)?)?;
        Ok(ConstraintSystem {
            gates,
            public_input_size,
            num_external,
            internal_vars,
            digest,
            stats,
        })
    }

    pub fn rows(&self) -> usize {
        self.gates.len()
    }

    pub fn gates(&self) -> &[Gate<F>] {
        &self.gates
    }

    pub fn public_input_size(&self) -> usize {
        self.public_input_size
    }

    /// Number of variables the wires can refer to.
    pub fn num_vars(&self) -> usize {
        self.num_external + self.internal_vars.len()
    }

    pub fn digest(&self) -> [u8; 32] {
        self.digest
    }

    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }

    pub fn stats(&self) -> OptimizationStats {
        self.stats
    }

    pub fn to_doc(&self) -> SnarkyResult<ConstraintSystemDoc<F>> {
        Ok(ConstraintSystemDoc {
            gates: self.gates.clone(),
            public_input_size: public_input_size_u32(self.public_input_size)?,
            digest: self.digest_hex(),
        })
    }

    /// The JSON interchange format, see [ConstraintSystemDoc].
    pub fn to_json(&self) -> SnarkyResult<String> {
        Ok(serde_json::to_string(&self.to_doc()?)?)
    }

    fn var_of_wire(&self, wire: Wire) -> V {
        let idx = wire as usize - 1;
        if idx < self.num_external {
            V::External(idx)
        } else {
            V::Internal(idx - self.num_external)
        }
    }

    /// Fills the registers of every row from the values of the variables
    /// allocated by the circuit, computing the internal variables on the way.
    pub fn compute_witness(&self, witness: &Witness<F>) -> SnarkyResult<Vec<[F; COLUMNS]>> {
        let mut internal: Vec<F> = Vec::with_capacity(self.internal_vars.len());
        for (terms, constant) in &self.internal_vars {
            let mut value = *constant;
            for (coeff, var) in terms {
                let term = match var {
                    V::External(idx) => witness.get(*idx)?,
                    // definitions only refer to earlier internal variables
                    V::Internal(idx) => internal[*idx],
                };
                value += *coeff * term;
            }
            internal.push(value);
        }

        self.gates
            .iter()
            .map(|gate| -> SnarkyResult<[F; COLUMNS]> {
                let mut row = [F::zero(); COLUMNS];
                for (cell, wire) in row.iter_mut().zip(gate.wires) {
                    if wire == 0 {
                        continue;
                    }
                    *cell = match self.var_of_wire(wire) {
                        V::External(idx) => witness.get(idx)?,
                        V::Internal(idx) => internal[idx],
                    };
                }
                Ok(row)
            })
            .collect()
    }

    /// Checks the generic rows of an assignment, in parallel. Public input
    /// rows must hold the given public values. Rows of other kinds are not
    /// checked.
    pub fn verify_witness(&self, rows: &[[F; COLUMNS]], public: &[F]) -> SnarkyResult<()> {
        if public.len() != self.public_input_size {
            return Err(
                SnarkyRuntimeError::PubInputMismatch(public.len(), self.public_input_size).into(),
            );
        }
        if rows.len() != self.gates.len() {
            return Err(SnarkyRuntimeError::WitnessSizeMismatch(rows.len(), self.gates.len()).into());
        }

        self.gates
            .par_iter()
            .zip(rows.par_iter())
            .enumerate()
            .try_for_each(|(row, (gate, values))| -> SnarkyResult<()> {
                if gate.typ != GateType::Generic {
                    return Ok(());
                }
                for (half, coeffs) in gate.coeffs.chunks_exact(GENERIC_COEFFS).enumerate() {
                    let regs = &values[half * GENERIC_REGISTERS..][..GENERIC_REGISTERS];
                    let regs = [regs[0], regs[1], regs[2]];
                    let mut res = generic_equation(coeffs, regs);
                    if row < self.public_input_size {
                        res -= public[row];
                    }
                    if !res.is_zero() {
                        return Err(SnarkyRuntimeError::UnsatisfiedConstraint {
                            label: format!("row{row}"),
                            constraint: format!("{} (half {half})", gate.typ),
                            values: regs.iter().map(|x| pretty(*x)).collect(),
                        }
                        .into());
                    }
                }
                Ok(())
            })
    }
}

/// The interchange format of a constraint system:
///
/// ```text
/// { "gates": [ { "kind": "Generic", "wires": [1, 2, 3, 0, ...], "coeffs": ["1", ...] }, ... ],
///   "public_input_size": 0,
///   "digest": "<hex>" }
/// ```
///
/// Coefficients are the decimal strings of their canonical representative.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "F: PrimeField")]
pub struct ConstraintSystemDoc<F: PrimeField> {
    pub gates: Vec<Gate<F>>,
    pub public_input_size: u32,
    pub digest: String,
}

impl<F: PrimeField> ConstraintSystemDoc<F> {
    /// Parses a document, and checks its gates and its digest.
    pub fn from_json(json: &str) -> SnarkyResult<Self> {
        let doc: Self = serde_json::from_str(json)?;
        doc.validate()?;
        Ok(doc)
    }

    pub fn rows(&self) -> usize {
        self.gates.len()
    }

    /// Every gate must fit its kind, and the digest must be the one of the
    /// gates.
    pub fn validate(&self) -> SnarkyResult<()> {
        for gate in &self.gates {
            gate.validate()?;
        }
        let computed = hex::encode(digest(&self.gates, self.public_input_size)?);
        if computed != self.digest {
            return Err(SnarkyCompilationError::DigestMismatch {
                expected: self.digest.clone(),
                computed,
            }
            .into());
        }
        Ok(())
    }
}
