pub mod field_helpers;
pub mod hasher;
pub mod serialization;

pub use field_helpers::{FieldHelpers, FieldHelpersError};
pub use hasher::CryptoDigest;
