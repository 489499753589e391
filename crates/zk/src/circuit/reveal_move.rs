//! `revealMove`: opens an attestation to the move it commits to.
//!
//! Public input `moveAttestation`, private input `secret`. Public output 0 is
//! the move `m ∈ {0, 1, 2}` with `Poseidon(m, secret) = moveAttestation`;
//! the attestation itself follows as public variable 1. The move is found
//! by trial during witness generation and then constrained.

use ark_bn254::Fr as Fp254;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::commitment::hash_two;
use super::gadgets::{enforce_valid_move, poseidon_hash_two_gadget};
use super::{NativeCircuit, SignalSpec, SignalValues};

const INPUTS: &[SignalSpec] = &[
    SignalSpec::scalar("moveAttestation"),
    SignalSpec::scalar("secret"),
];

#[derive(Clone, Copy, Debug, Default)]
pub struct RevealMove;

impl RevealMove {
    pub const NAME: &'static str = "revealMove";
}

/// Finds the move code whose attestation under `secret` is `attestation`.
fn open_attestation(attestation: Fp254, secret: Fp254) -> Result<Fp254, SynthesisError> {
    for code in 0u64..3 {
        let candidate = Fp254::from(code);
        let digest = hash_two(candidate, secret).map_err(|_| SynthesisError::Unsatisfiable)?;
        if digest == attestation {
            return Ok(candidate);
        }
    }
    Err(SynthesisError::Unsatisfiable)
}

impl NativeCircuit for RevealMove {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn inputs(&self) -> &'static [SignalSpec] {
        INPUTS
    }

    fn public_signals(&self) -> usize {
        2
    }

    fn synthesize(
        &self,
        cs: ConstraintSystemRef<Fp254>,
        values: Option<&SignalValues>,
    ) -> Result<(), SynthesisError> {
        let revealed = FpVar::new_input(cs.clone(), || {
            let attestation = SignalValues::lookup(values, "moveAttestation", 0)?;
            let secret = SignalValues::lookup(values, "secret", 0)?;
            open_attestation(attestation, secret)
        })?;
        let attestation = FpVar::new_input(cs.clone(), || {
            SignalValues::lookup(values, "moveAttestation", 0)
        })?;
        let secret = FpVar::new_witness(cs.clone(), || SignalValues::lookup(values, "secret", 0))?;

        enforce_valid_move(&revealed)?;
        let digest = poseidon_hash_two_gadget(cs, &revealed, &secret)?;
        digest.enforce_equal(&attestation)
    }
}
