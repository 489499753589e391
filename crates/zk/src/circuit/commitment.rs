//! Native Poseidon commitment over BN254.
//!
//! Parameters: rate 2, capacity 1, alpha 5, 8 full and 57 partial rounds.
//! [`hash_two`] must agree with
//! [`poseidon_hash_two_gadget`](super::gadgets::poseidon_hash_two_gadget),
//! which is checked by the tests below.

use std::sync::OnceLock;

use ark_bn254::Fr as Fp254;
use ark_crypto_primitives::sponge::{
    CryptographicSponge,
    poseidon::{PoseidonConfig, PoseidonSponge, find_poseidon_ark_and_mds},
};
use game_core::Move;
use num_bigint::BigUint;

use crate::ProofError;

static POSEIDON_CONFIG: OnceLock<PoseidonConfig<Fp254>> = OnceLock::new();

/// Cached Poseidon config (8/57 rounds, 128-bit security).
pub fn get_poseidon_config() -> &'static PoseidonConfig<Fp254> {
    POSEIDON_CONFIG.get_or_init(|| {
        let (ark, mds) = find_poseidon_ark_and_mds::<Fp254>(254, 2, 8, 57, 0);
        PoseidonConfig::new(8, 57, 5, mds, ark, 2, 1)
    })
}

/// Absorbs `left` then `right` as two separate absorb calls.
pub fn hash_two(left: Fp254, right: Fp254) -> Result<Fp254, ProofError> {
    let mut sponge = PoseidonSponge::<Fp254>::new(get_poseidon_config());
    sponge.absorb(&[left].as_slice());
    sponge.absorb(&[right].as_slice());
    sponge
        .squeeze_field_elements::<Fp254>(1)
        .first()
        .copied()
        .ok_or_else(|| ProofError::EvaluatorFault("Poseidon squeeze failed".to_string()))
}

/// Attestation of `mv` under `secret`: `Poseidon(move, secret)`.
///
/// `secret` is reduced into the field first, exactly as the circuit sees it.
pub fn move_attestation(mv: Move, secret: &BigUint) -> Result<BigUint, ProofError> {
    let secret = Fp254::from(secret.clone());
    let digest = hash_two(Fp254::from(mv.code()), secret)?;
    Ok(digest.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_r1cs_std::R1CSVar;
    use ark_r1cs_std::alloc::AllocVar;
    use ark_r1cs_std::fields::fp::FpVar;
    use ark_relations::r1cs::ConstraintSystem;

    use crate::circuit::gadgets::poseidon_hash_two_gadget;

    #[test]
    fn test_hash_two_order_matters() {
        let (left, right) = (Fp254::from(3u64), Fp254::from(4u64));
        let result1 = hash_two(left, right).expect("hash_two should succeed");
        let result2 = hash_two(right, left).expect("hash_two should succeed");
        assert_ne!(result1, result2);
    }

    #[test]
    fn test_hash_two_matches_gadget() {
        let (left, right) = (Fp254::from(10u64), Fp254::from(20u64));
        let native = hash_two(left, right).unwrap();

        let cs = ConstraintSystem::<Fp254>::new_ref();
        let left_var = FpVar::new_witness(cs.clone(), || Ok(left)).unwrap();
        let right_var = FpVar::new_witness(cs.clone(), || Ok(right)).unwrap();
        let digest = poseidon_hash_two_gadget(cs.clone(), &left_var, &right_var).unwrap();

        assert_eq!(digest.value().unwrap(), native);
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_attestation_binds_move_and_secret() {
        let secret = BigUint::from(123_152_419_872_319_823_719_238_712_098u128);
        let rock = move_attestation(Move::Rock, &secret).unwrap();
        let paper = move_attestation(Move::Paper, &secret).unwrap();
        assert_ne!(rock, paper);
        assert_ne!(
            rock,
            move_attestation(Move::Rock, &(secret + 1u32)).unwrap()
        );
    }
}
