//! `attestValidMove`: commits to a hidden move.
//!
//! Private inputs `move` and `secret`; public output
//! `attestation = Poseidon(move, secret)`. The move is constrained to
//! rock (0), paper (1) or scissors (2).

use ark_bn254::Fr as Fp254;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::commitment::hash_two;
use super::gadgets::{enforce_valid_move, poseidon_hash_two_gadget};
use super::{NativeCircuit, SignalSpec, SignalValues};

const INPUTS: &[SignalSpec] = &[SignalSpec::scalar("move"), SignalSpec::scalar("secret")];

#[derive(Clone, Copy, Debug, Default)]
pub struct AttestValidMove;

impl AttestValidMove {
    pub const NAME: &'static str = "attestValidMove";
}

impl NativeCircuit for AttestValidMove {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn inputs(&self) -> &'static [SignalSpec] {
        INPUTS
    }

    fn public_signals(&self) -> usize {
        1
    }

    fn synthesize(
        &self,
        cs: ConstraintSystemRef<Fp254>,
        values: Option<&SignalValues>,
    ) -> Result<(), SynthesisError> {
        let attestation = FpVar::new_input(cs.clone(), || {
            let mv = SignalValues::lookup(values, "move", 0)?;
            let secret = SignalValues::lookup(values, "secret", 0)?;
            hash_two(mv, secret).map_err(|_| SynthesisError::Unsatisfiable)
        })?;
        let mv = FpVar::new_witness(cs.clone(), || SignalValues::lookup(values, "move", 0))?;
        let secret = FpVar::new_witness(cs.clone(), || SignalValues::lookup(values, "secret", 0))?;

        enforce_valid_move(&mv)?;
        let digest = poseidon_hash_two_gadget(cs, &mv, &secret)?;
        digest.enforce_equal(&attestation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_relations::r1cs::ConstraintSystem;

    fn synthesize_with(mv: u64, secret: u64) -> ConstraintSystemRef<Fp254> {
        let mut values = SignalValues::new();
        values.insert("move", vec![Fp254::from(mv)]);
        values.insert("secret", vec![Fp254::from(secret)]);

        let cs = ConstraintSystem::<Fp254>::new_ref();
        AttestValidMove.synthesize(cs.clone(), Some(&values)).unwrap();
        cs
    }

    #[test]
    fn test_valid_move_is_satisfied() {
        let cs = synthesize_with(2, 77);
        assert!(cs.is_satisfied().unwrap());
        // constant one + attestation
        assert_eq!(cs.num_instance_variables(), 2);
    }

    #[test]
    fn test_out_of_range_move_is_unsatisfied() {
        let cs = synthesize_with(3, 77);
        assert!(!cs.is_satisfied().unwrap());
    }
}
