use snarky_utils::{hasher::DigestError, FieldHelpersError};
use thiserror::Error;

use crate::{gate::GateType, mode::Mode};

/// A result type for Snarky errors.
pub type SnarkyResult<T> = std::result::Result<T, SnarkyError>;

/// A result type for Snarky runtime errors.
pub type SnarkyRuntimeResult<T> = std::result::Result<T, SnarkyRuntimeError>;

/// A result type for Snarky compilation errors.
pub type SnarkyCompileResult<T> = std::result::Result<T, SnarkyCompilationError>;

/// Snarky errors can come from either a compilation or runtime error,
/// or from external input that could not be decoded.
#[derive(Debug, Clone, Error)]
pub enum SnarkyError {
    #[error("a compilation error occurred: {0}")]
    CompilationError(#[from] SnarkyCompilationError),

    #[error("a runtime error occurred: {0}")]
    RuntimeError(#[from] SnarkyRuntimeError),

    #[error("malformed input: {0}")]
    MalformedInput(String),
}

impl From<FieldHelpersError> for SnarkyError {
    fn from(err: FieldHelpersError) -> Self {
        SnarkyError::MalformedInput(err.to_string())
    }
}

impl From<serde_json::Error> for SnarkyError {
    fn from(err: serde_json::Error) -> Self {
        SnarkyError::MalformedInput(err.to_string())
    }
}

impl From<DigestError> for SnarkyError {
    fn from(err: DigestError) -> Self {
        SnarkyError::CompilationError(SnarkyCompilationError::Serialization(err.to_string()))
    }
}

/// Errors that can occur during compilation of a circuit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnarkyCompilationError {
    #[error("a {kind} gate supports at most {max_wires} wires and {max_coeffs} coefficients, got {wires} and {coeffs}")]
    GateOverflow {
        kind: GateType,
        wires: usize,
        coeffs: usize,
        max_wires: usize,
        max_coeffs: usize,
    },

    #[error("no constraint system is being recorded")]
    EmptySystem,

    #[error("public inputs must be allocated before any other variable ({0} already allocated)")]
    PublicInputAfterVariables(usize),

    #[error("the circuit uses {0} wires, which does not fit the wire encoding")]
    WireOverflow(usize),

    #[error("failed to serialize the constraint system: {0}")]
    Serialization(String),

    #[error("the digest in the document ({expected}) does not match its gates ({computed})")]
    DigestMismatch { expected: String, computed: String },
}

/// Errors that can occur during runtime (witness generation and proving),
/// or while checking the constraints being recorded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnarkyRuntimeError {
    #[error("`{operation}` cannot be used in {mode} mode")]
    Mode {
        operation: &'static str,
        mode: Mode,
    },

    #[error("unsatisfied constraint `{label}`: {constraint} with values [{}]", .values.join(", "))]
    UnsatisfiedConstraint {
        label: String,
        constraint: String,
        values: Vec<String>,
    },

    #[error("variable v{0} has no witness value")]
    MissingWitness(usize),

    #[error("the number of public inputs passed ({0}) does not match the number of public inputs expected ({1})")]
    PubInputMismatch(usize, usize),

    #[error("a witness computation returned {0} values, but {1} variables were requested")]
    WitnessSizeMismatch(usize, usize),
}

impl SnarkyRuntimeError {
    pub(crate) fn mode(operation: &'static str, mode: Mode) -> Self {
        SnarkyRuntimeError::Mode { operation, mode }
    }

    pub(crate) fn unsatisfied(
        label: Option<&str>,
        constraint: impl ToString,
        values: Vec<String>,
    ) -> Self {
        SnarkyRuntimeError::UnsatisfiedConstraint {
            label: label.unwrap_or("<unlabeled>").to_string(),
            constraint: constraint.to_string(),
            values,
        }
    }
}
