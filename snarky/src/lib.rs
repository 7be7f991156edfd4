#![doc = include_str!("../README.md")]
// Allow non_local_definitions from derive macros (proptest_derive)
// until upstream crates are updated.
#![allow(non_local_definitions)]

pub use snarky_curves;
pub use snarky_utils;

pub mod asm;
pub mod config;
pub mod constraint;
pub mod constraint_system;
pub mod cvar;
pub mod errors;
pub mod gate;
pub mod generic;
pub mod linear_combination;
pub mod lowering;
pub mod mode;
pub mod runner;
pub mod session;
pub mod union_find;
pub mod variables;
pub mod witness;

#[cfg(test)]
mod tests;

/// A handy module that you can import the content of to easily use snarky.
pub mod prelude {
    use super::*;
    pub use config::{OptimizationConfig, OptimizationMode};
    pub use constraint::RangeCheckVariant;
    pub use constraint_system::{ConstraintSystem, ConstraintSystemDoc};
    pub use cvar::FieldVar;
    pub use errors::{SnarkyError, SnarkyResult};
    pub use gate::GateType;
    pub use generic::GenericGate;
    pub use mode::Mode;
    pub use runner::{RunState, WitnessGeneration};
    pub use session::Session;
    pub use witness::Witness;
}
