//! R1CS gadgets shared by the move circuits.

use ark_bn254::Fr as Fp254;
use ark_crypto_primitives::sponge::constraints::CryptographicSpongeVar;
use ark_crypto_primitives::sponge::poseidon::constraints::PoseidonSpongeVar;
use ark_r1cs_std::fields::{FieldVar, fp::FpVar};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::commitment::get_poseidon_config;

/// In-circuit counterpart of [`commitment::hash_two`](super::commitment::hash_two).
///
/// The full permutation is constrained; the digest is not a free witness.
pub fn poseidon_hash_two_gadget(
    cs: ConstraintSystemRef<Fp254>,
    left: &FpVar<Fp254>,
    right: &FpVar<Fp254>,
) -> Result<FpVar<Fp254>, SynthesisError> {
    let mut sponge = PoseidonSpongeVar::new(cs, get_poseidon_config());
    sponge.absorb(left)?;
    sponge.absorb(right)?;
    sponge
        .squeeze_field_elements(1)?
        .pop()
        .ok_or(SynthesisError::Unsatisfiable)
}

/// Enforces `value ∈ {0, 1, 2}` as `value · (value − 1) · (value − 2) = 0`.
pub fn enforce_valid_move(value: &FpVar<Fp254>) -> Result<(), SynthesisError> {
    let partial = value * (value - Fp254::from(1u64));
    let last = value - Fp254::from(2u64);
    partial.mul_equals(&last, &FpVar::zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_r1cs_std::alloc::AllocVar;
    use ark_relations::r1cs::ConstraintSystem;

    fn move_satisfies(code: u64) -> bool {
        let cs = ConstraintSystem::<Fp254>::new_ref();
        let value = FpVar::new_witness(cs.clone(), || Ok(Fp254::from(code))).unwrap();
        enforce_valid_move(&value).unwrap();
        cs.is_satisfied().unwrap()
    }

    #[test]
    fn test_valid_moves_accepted() {
        for code in 0..3 {
            assert!(move_satisfies(code), "move {code}");
        }
    }

    #[test]
    fn test_invalid_moves_rejected() {
        for code in [3, 4, 1000] {
            assert!(!move_satisfies(code), "move {code}");
        }
    }
}
