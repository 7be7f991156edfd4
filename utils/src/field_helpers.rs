use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;
use thiserror::Error;

// Field helpers error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldHelpersError {
    #[error("empty field element encoding")]
    Empty,
    #[error("failed to decode `{0}` as a decimal integer")]
    DecodeDecimal(String),
    #[error("failed to decode `{0}` as a hexadecimal integer")]
    DecodeHex(String),
    #[error("{0} is not a canonical field element (it is not below the modulus)")]
    NonCanonical(String),
}
pub type Result<T> = std::result::Result<T, FieldHelpersError>;

/// Field element helpers
///
/// Encodings are canonical: decimal strings have no sign, separators or
/// surrounding whitespace, hexadecimal strings are big-endian with an optional
/// `0x` prefix, and in both cases the value must be strictly below the
/// modulus.
pub trait FieldHelpers<F> {
    /// Converts an integer, failing if it is not below the modulus
    fn from_biguint(big: &BigUint) -> Result<F>;

    /// Deserialize from a decimal string
    fn from_decimal(s: &str) -> Result<F>;

    /// Deserialize from a hexadecimal string
    fn from_hex(s: &str) -> Result<F>;

    /// Deserialize from a hexadecimal string if it is `0x`-prefixed,
    /// from a decimal string otherwise
    fn from_canonical_str(s: &str) -> Result<F> {
        if s.starts_with("0x") || s.starts_with("0X") {
            Self::from_hex(s)
        } else {
            Self::from_decimal(s)
        }
    }

    /// The canonical integer representative
    fn to_biguint(self) -> BigUint;

    /// Serialize to a decimal string
    fn to_decimal(self) -> String;

    /// Serialize to a `0x`-prefixed, lowercase, big-endian hexadecimal string
    fn to_hex(self) -> String;

    /// Get the modulus as `BigUint`
    fn modulus_biguint() -> BigUint
    where
        F: PrimeField,
    {
        BigUint::from_bytes_le(&F::MODULUS.to_bytes_le())
    }
}

impl<F: PrimeField> FieldHelpers<F> for F {
    fn from_biguint(big: &BigUint) -> Result<F> {
        if *big >= F::modulus_biguint() {
            return Err(FieldHelpersError::NonCanonical(big.to_string()));
        }
        Ok(F::from(big.clone()))
    }

    fn from_decimal(s: &str) -> Result<F> {
        if s.is_empty() {
            return Err(FieldHelpersError::Empty);
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FieldHelpersError::DecodeDecimal(s.to_string()));
        }
        let big = BigUint::parse_bytes(s.as_bytes(), 10)
            .ok_or_else(|| FieldHelpersError::DecodeDecimal(s.to_string()))?;
        F::from_biguint(&big)
    }

    fn from_hex(s: &str) -> Result<F> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.is_empty() {
            return Err(FieldHelpersError::Empty);
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(FieldHelpersError::DecodeHex(s.to_string()));
        }
        let big = BigUint::parse_bytes(digits.as_bytes(), 16)
            .ok_or_else(|| FieldHelpersError::DecodeHex(s.to_string()))?;
        F::from_biguint(&big)
    }

    fn to_biguint(self) -> BigUint {
        self.into()
    }

    fn to_decimal(self) -> String {
        self.to_biguint().to_str_radix(10)
    }

    fn to_hex(self) -> String {
        format!("0x{}", self.to_biguint().to_str_radix(16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::{One, Zero};
    use snarky_curves::pasta::Fp;

    const MODULUS: &str =
        "28948022309329048855892746252171976963363056481941560715954676764349967630337";

    #[test]
    fn test_decimal() {
        assert_eq!(Fp::from_decimal("0").unwrap(), Fp::zero());
        assert_eq!(Fp::from_decimal("12").unwrap(), Fp::from(12u64));
        assert_eq!(Fp::from(12u64).to_decimal(), "12");

        let minus_one = -Fp::one();
        let encoded = minus_one.to_decimal();
        assert_eq!(
            encoded,
            "28948022309329048855892746252171976963363056481941560715954676764349967630336"
        );
        assert_eq!(Fp::from_decimal(&encoded).unwrap(), minus_one);
    }

    #[test]
    fn test_hex() {
        assert_eq!(Fp::from(255u64).to_hex(), "0xff");
        assert_eq!(Fp::zero().to_hex(), "0x0");
        assert_eq!(Fp::from_hex("0xFF").unwrap(), Fp::from(255u64));
        assert_eq!(Fp::from_hex("ff").unwrap(), Fp::from(255u64));
        assert_eq!(Fp::from_canonical_str("0x10").unwrap(), Fp::from(16u64));
        assert_eq!(Fp::from_canonical_str("10").unwrap(), Fp::from(10u64));

        let x = Fp::from(123_456_789u64);
        assert_eq!(Fp::from_hex(&x.to_hex()).unwrap(), x);
    }

    #[test]
    fn test_modulus() {
        assert_eq!(Fp::modulus_biguint().to_string(), MODULUS);
        assert!(matches!(
            Fp::from_decimal(MODULUS),
            Err(FieldHelpersError::NonCanonical(_))
        ));
        assert!(matches!(
            Fp::from_hex("0x40000000000000000000000000000000224698fc094cf91b992d30ed00000001"),
            Err(FieldHelpersError::NonCanonical(_))
        ));
    }

    #[test]
    fn test_malformed() {
        assert_eq!(Fp::from_decimal(""), Err(FieldHelpersError::Empty));
        assert_eq!(Fp::from_hex("0x"), Err(FieldHelpersError::Empty));
        assert!(matches!(
            Fp::from_decimal("-1"),
            Err(FieldHelpersError::DecodeDecimal(_))
        ));
        assert!(matches!(
            Fp::from_decimal("1_000"),
            Err(FieldHelpersError::DecodeDecimal(_))
        ));
        assert!(matches!(
            Fp::from_decimal(" 7"),
            Err(FieldHelpersError::DecodeDecimal(_))
        ));
        assert!(matches!(
            Fp::from_hex("0xzz"),
            Err(FieldHelpersError::DecodeHex(_))
        ));
    }
}
