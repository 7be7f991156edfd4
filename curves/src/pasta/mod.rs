pub mod fields;

pub use fields::{Fp, Fq};
