//! Field element ⇄ 32-bit limb conversion.
//!
//! Limb vectors returned by [`to_limbs`] are big-endian (most significant limb
//! first). Evaluators and the witness buffer store limbs least significant
//! first; [`FieldCodec::scratch_words`] performs that reversal so callers never
//! index limbs by hand.

use ark_bn254::Fr;
use ark_ff::PrimeField;
use num_bigint::{BigInt, BigUint, Sign};
use thiserror::Error;

/// Value needs more limbs than the field width allows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("value needs {required} limbs, only {available} available")]
pub struct LimbOverflow {
    pub required: usize,
    pub available: usize,
}

/// Decomposes `value` into exactly `n32` big-endian limbs, zero-padded on the left.
pub fn to_limbs(value: &BigUint, n32: usize) -> Result<Vec<u32>, LimbOverflow> {
    let digits = value.to_u32_digits();
    if digits.len() > n32 {
        return Err(LimbOverflow {
            required: digits.len(),
            available: n32,
        });
    }

    let mut limbs = vec![0u32; n32 - digits.len()];
    limbs.extend(digits.iter().rev());
    Ok(limbs)
}

/// Recomposes big-endian limbs into an integer.
pub fn from_limbs(limbs: &[u32]) -> BigUint {
    BigUint::new(limbs.iter().rev().copied().collect())
}

/// Reduces any integer into `[0, prime)`.
pub fn normalize(value: &BigInt, prime: &BigUint) -> BigUint {
    let modulus = BigInt::from(prime.clone());
    let mut reduced = value % &modulus;
    if reduced.sign() == Sign::Minus {
        reduced += &modulus;
    }
    let (_, magnitude) = reduced.into_parts();
    magnitude
}

/// Codec bound to one field: its prime and limb width.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldCodec {
    prime: BigUint,
    n32: usize,
}

impl FieldCodec {
    pub fn new(prime: BigUint, n32: usize) -> Self {
        Self { prime, n32 }
    }

    /// Codec for the BN254 scalar field (8 limbs).
    pub fn bn254() -> Self {
        let prime: BigUint = <Fr as PrimeField>::MODULUS.into();
        let n32 = prime.to_u32_digits().len();
        Self { prime, n32 }
    }

    pub fn prime(&self) -> &BigUint {
        &self.prime
    }

    pub fn n32(&self) -> usize {
        self.n32
    }

    pub fn normalize(&self, value: &BigInt) -> BigUint {
        normalize(value, &self.prime)
    }

    /// Normalizes `value` and returns its limbs in scratch order
    /// (offset 0 = least significant limb).
    pub fn scratch_words(&self, value: &BigInt) -> Result<Vec<u32>, LimbOverflow> {
        let canonical = self.normalize(value);
        let mut limbs = to_limbs(&canonical, self.n32)?;
        limbs.reverse();
        Ok(limbs)
    }

    /// Inverse of [`scratch_words`](Self::scratch_words) for an already canonical value.
    pub fn from_scratch_words(&self, words: &[u32]) -> BigUint {
        BigUint::new(words.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::{One, Zero};
    use proptest::prelude::*;

    #[test]
    fn test_pads_on_the_left() {
        assert_eq!(to_limbs(&BigUint::from(5u32), 3), Ok(vec![0, 0, 5]));
        let v = (BigUint::one() << 32) + BigUint::from(7u32);
        assert_eq!(to_limbs(&v, 2), Ok(vec![1, 7]));
        assert_eq!(to_limbs(&BigUint::zero(), 2), Ok(vec![0, 0]));
    }

    #[test]
    fn test_overflow_reports_limb_counts() {
        let v = BigUint::one() << 64;
        assert_eq!(
            to_limbs(&v, 2),
            Err(LimbOverflow {
                required: 3,
                available: 2
            })
        );
    }

    #[test]
    fn test_normalize_wraps_negative_values_once() {
        let p = BigUint::from(97u32);
        assert_eq!(normalize(&BigInt::from(-1), &p), BigUint::from(96u32));
        assert_eq!(normalize(&BigInt::from(-97), &p), BigUint::zero());
        assert_eq!(normalize(&BigInt::from(200), &p), BigUint::from(6u32));
    }

    #[test]
    fn test_bn254_codec_uses_eight_limbs() {
        let codec = FieldCodec::bn254();
        assert_eq!(codec.n32(), 8);
        assert_eq!(
            codec.prime().to_str_radix(10),
            "21888242871839275222246405745257275088548364400416034343698204186575808495617"
        );
        // p - 1 encodes, p itself normalizes to zero.
        let p = BigInt::from(codec.prime().clone());
        assert_eq!(codec.scratch_words(&p).unwrap(), vec![0u32; 8]);
        let top = codec.scratch_words(&(p - 1)).unwrap();
        assert_eq!(codec.from_scratch_words(&top), codec.prime() - 1u32);
    }

    #[test]
    fn test_scratch_order_is_least_significant_first() {
        let codec = FieldCodec::new(BigUint::one() << 96, 3);
        let v = BigInt::from((3u128 << 64) | (2u128 << 32) | 1);
        assert_eq!(codec.scratch_words(&v).unwrap(), vec![1, 2, 3]);
    }

    proptest! {
        #[test]
        fn test_limbs_round_trip_below_bn254_prime(bytes in proptest::collection::vec(any::<u8>(), 0..32)) {
            let codec = FieldCodec::bn254();
            let value = BigUint::from_bytes_be(&bytes) % codec.prime();
            let limbs = to_limbs(&value, codec.n32()).unwrap();
            prop_assert_eq!(limbs.len(), 8);
            prop_assert_eq!(from_limbs(&limbs), value);
        }
    }
}
