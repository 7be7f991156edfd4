use crate::pasta::*;
use ark_ff::{FftField, Field, One, PrimeField, UniformRand, Zero};
use rand::{rngs::StdRng, SeedableRng};

fn field_laws<F: Field>(a: F, b: F) {
    assert_eq!(a + b, b + a);
    assert_eq!(a * b, b * a);
    assert_eq!((a + b) * a, a * a + b * a);
    assert_eq!(a - a, F::zero());
    assert_eq!(a + F::zero(), a);
    assert_eq!(a * F::one(), a);
    if let Some(inv) = a.inverse() {
        assert_eq!(a * inv, F::one());
    } else {
        assert!(a.is_zero());
    }
}

#[test]
fn test_fp() {
    let mut rng = StdRng::from_seed([7u8; 32]);
    for _ in 0..32 {
        let a = Fp::rand(&mut rng);
        let b = Fp::rand(&mut rng);
        field_laws(a, b);
    }
    assert_eq!(Fp::MODULUS_BIT_SIZE, 255);
    assert_eq!(<Fp as FftField>::TWO_ADICITY, 32);
}

#[test]
fn test_fq() {
    let mut rng = StdRng::from_seed([11u8; 32]);
    for _ in 0..32 {
        let a = Fq::rand(&mut rng);
        let b = Fq::rand(&mut rng);
        field_laws(a, b);
    }
    assert_eq!(Fq::MODULUS_BIT_SIZE, 255);
    assert_eq!(<Fq as FftField>::TWO_ADICITY, 32);
}

#[test]
fn test_minus_one_wraps() {
    let minus_one = -Fp::one();
    assert_eq!(minus_one + Fp::one(), Fp::zero());
    assert_ne!(Fp::MODULUS, Fq::MODULUS);
}
