//! [serde_with] adapters writing prime field elements as canonical strings,
//! the encoding used by the constraint-system interchange format.
//!
//! Use them with annotations like
//! `#[serde_as(as = "Vec<snarky_utils::serialization::DecimalString>")]`.

use crate::field_helpers::FieldHelpers;
use ark_ff::PrimeField;
use serde::{Deserialize, Deserializer, Serializer};
use serde_with::{DeserializeAs, SerializeAs};

/// Writes the canonical decimal form. Reading accepts decimal, or hexadecimal
/// when `0x`-prefixed.
pub struct DecimalString;

/// Writes the canonical `0x`-prefixed hexadecimal form. Reading accepts the
/// same inputs as [DecimalString].
pub struct HexString;

fn deserialize_canonical<'de, F, D>(deserializer: D) -> Result<F, D::Error>
where
    F: PrimeField,
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    F::from_canonical_str(&s).map_err(serde::de::Error::custom)
}

impl<F: PrimeField> SerializeAs<F> for DecimalString {
    fn serialize_as<S>(val: &F, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&val.to_decimal())
    }
}

impl<'de, F: PrimeField> DeserializeAs<'de, F> for DecimalString {
    fn deserialize_as<D>(deserializer: D) -> Result<F, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_canonical(deserializer)
    }
}

impl<F: PrimeField> SerializeAs<F> for HexString {
    fn serialize_as<S>(val: &F, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&val.to_hex())
    }
}

impl<'de, F: PrimeField> DeserializeAs<'de, F> for HexString {
    fn deserialize_as<D>(deserializer: D) -> Result<F, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_canonical(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::{One, UniformRand};
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};
    use serde::Serialize;
    use serde_with::serde_as;
    use snarky_curves::pasta::Fp;

    #[serde_as]
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Coeffs {
        #[serde_as(as = "Vec<DecimalString>")]
        decimal: Vec<Fp>,
        #[serde_as(as = "HexString")]
        hex: Fp,
    }

    #[test]
    fn test_string_forms() {
        let coeffs = Coeffs {
            decimal: vec![Fp::from(3u64), -Fp::one()],
            hex: Fp::from(255u64),
        };
        let json = serde_json::to_string(&coeffs).unwrap();
        assert_eq!(
            json,
            r#"{"decimal":["3","28948022309329048855892746252171976963363056481941560715954676764349967630336"],"hex":"0xff"}"#
        );
        let back: Coeffs = serde_json::from_str(&json).unwrap();
        assert_eq!(back, coeffs);
    }

    #[test]
    fn test_rejects_non_canonical() {
        let json = r#"{"decimal":["28948022309329048855892746252171976963363056481941560715954676764349967630337"],"hex":"0x1"}"#;
        assert!(serde_json::from_str::<Coeffs>(json).is_err());

        let json = r#"{"decimal":["1.5"],"hex":"0x1"}"#;
        assert!(serde_json::from_str::<Coeffs>(json).is_err());
    }

    proptest! {
        #[test]
        fn test_messagepack_roundtrip(seed in any::<[u8; 32]>()) {
            let rng = &mut StdRng::from_seed(seed);
            let coeffs = Coeffs {
                decimal: (0..3).map(|_| Fp::rand(rng)).collect(),
                hex: Fp::rand(rng),
            };
            let bytes = rmp_serde::to_vec(&coeffs).unwrap();
            let back: Coeffs = rmp_serde::from_slice(&bytes).unwrap();
            prop_assert_eq!(back, coeffs);
        }
    }
}
