//! Shared fixtures: keys are generated once per test binary.

#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use ark_bn254::Bn254;
use ark_groth16::VerifyingKey;
use ark_std::test_rng;
use num_bigint::BigInt;
use zk::circuit::{AttestValidMove, RevealMove};
use zk::{CircuitKeys, ProofBackend, ProofContext, ProofOrchestrator, ProvingKeyRef};

/// Round secret used by the original example flow.
pub const SECRET: &str = "123152419872319823719238712098";

pub struct Fixture {
    pub key_bytes: Vec<u8>,
    pub verifying_key: VerifyingKey<Bn254>,
    pub num_public: usize,
}

pub fn secret() -> BigInt {
    SECRET.parse().expect("decimal secret")
}

fn build(keys: CircuitKeys) -> Fixture {
    Fixture {
        key_bytes: keys.to_bytes().expect("serialize keys"),
        num_public: keys.num_public_inputs(),
        verifying_key: keys.verifying_key,
    }
}

pub fn attest_keys() -> &'static Fixture {
    static KEYS: OnceLock<Fixture> = OnceLock::new();
    KEYS.get_or_init(|| {
        build(CircuitKeys::setup(Arc::new(AttestValidMove), &mut test_rng()).expect("attest setup"))
    })
}

pub fn reveal_keys() -> &'static Fixture {
    static KEYS: OnceLock<Fixture> = OnceLock::new();
    KEYS.get_or_init(|| {
        build(CircuitKeys::setup(Arc::new(RevealMove), &mut test_rng()).expect("reveal setup"))
    })
}

pub fn orchestrator(
    circuit: &str,
    fixture: &Fixture,
    backend: Arc<dyn ProofBackend>,
    proving_key: Option<ProvingKeyRef>,
) -> ProofOrchestrator {
    ProofOrchestrator::new(
        zk::shared_evaluator(circuit).expect("registered circuit"),
        ProofContext {
            backend,
            proving_key: proving_key
                .unwrap_or_else(|| ProvingKeyRef::from_bytes(fixture.key_bytes.clone())),
            num_signals: fixture.num_public,
            sanity_check: true,
        },
    )
}
