//! This module includes the [CryptoDigest] trait,
//! which provides a generic interface for hashing.
//!
//! To use it, simply implement [CryptoDigest] for your type:
//!
//! ```
//! use snarky_utils::hasher::CryptoDigest;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct A {
//!     thing: u8,
//! }
//!
//! impl CryptoDigest for A {
//!     const PREFIX: &'static [u8; 15] = b"snarky-doctest0";
//! }
//!
//! let a = A { thing: 1 };
//! let expected_result = [125, 37, 211, 109, 247, 164, 129, 97, 244, 227, 172, 231, 213, 178, 171, 41, 188, 158, 22, 28, 196, 65, 141, 198, 136, 249, 222, 131, 70, 153, 125, 211];
//! assert_eq!(a.digest().unwrap(), expected_result);
//!
//! let b = A { thing: 1 };
//! assert_eq!(a.hex_digest().unwrap(), b.hex_digest().unwrap());
//! ```
//!
//! Warning: make sure not to reuse the same `PREFIX`
//! for different types. This prefix is here to semantically
//! distinguish the hash of different types
//! (and thus different use-case).

use serde::Serialize;
use sha2::{Digest, Sha256};

pub use rmp_serde::encode::Error as DigestError;

pub trait CryptoDigest: Serialize {
    /// The domain separation string to use in the hash.
    ///
    /// Warning: careful not to use the same separation string with
    /// two different types.
    const PREFIX: &'static [u8; 15];

    /// Returns the digest of `self`: the SHA-256 of [Self::PREFIX]
    /// followed by the messagepack encoding of `self`.
    fn digest(&self) -> Result<[u8; 32], DigestError> {
        let encoded = rmp_serde::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(Self::PREFIX);
        hasher.update(&encoded);
        Ok(hasher.finalize().into())
    }

    /// Lowercase hexadecimal rendering of [Self::digest].
    fn hex_digest(&self) -> Result<String, DigestError> {
        Ok(hex::encode(self.digest()?))
    }
}
