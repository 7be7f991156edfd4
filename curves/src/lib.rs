#![deny(unsafe_code)]
#![deny(clippy::all)]
// Field moduli are written as unseparated decimal literals to match the
// published parameters.
#![allow(clippy::unreadable_literal)]

pub mod pasta;

pub use pasta::{Fp, Fq};
