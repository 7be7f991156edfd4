//! The two Pasta prime fields.
//!
//! `Fp` is the base field of Pallas (and the scalar field of Vesta), `Fq` is
//! the other way around. Circuits compiled by `snarky` live over `Fp`.

pub mod fp;
pub use self::fp::*;

pub mod fq;
pub use self::fq::*;

#[cfg(test)]
mod tests;
