//! Witness computation and Groth16 proof orchestration for move attestation.
//!
//! The pipeline turns named circuit inputs into a BN254 witness and a proof
//! in on-chain verifier layout:
//!
//! ```text
//! CircuitInput
//!   ↓ WitnessAssembler (FNV-1a signal addressing, limb codec, evaluator protocol)
//! WitnessBuffer + public signals
//!   ↓ ProofBackend (file-path | in-memory | bridged)
//! RawProof (snarkjs layout)
//!   ↓ ProofOrchestrator
//! CanonicalProof (8 elements) + public signals
//! ```
//!
//! # Modules
//!
//! - [`witness`]: signal hashing, field codec, inputs, assembler, witness buffer
//! - [`evaluator`]: evaluator protocol, guarded adapter, native arkworks engine
//! - [`circuit`]: `attestValidMove` / `revealMove` circuits, Poseidon, Groth16 keys
//! - [`prover`]: backend contract and the three backends
//! - [`orchestrator`]: end-to-end proving and the canonical proof layout
//! - [`ffi`]: C ABI entry points used by the bridged backend and host apps
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> Result<(), zk::ProofError> {
//! use std::sync::Arc;
//! use zk::{CircuitInput, InMemoryBackend, ProofContext, ProofOrchestrator, ProvingKeyRef};
//!
//! let orchestrator = ProofOrchestrator::new(
//!     zk::shared_evaluator("attestValidMove")?,
//!     ProofContext {
//!         backend: Arc::new(InMemoryBackend::spawn()?),
//!         proving_key: ProvingKeyRef::Path("keys/attestValidMove.zkey".into()),
//!         num_signals: 1,
//!         sanity_check: true,
//!     },
//! );
//! let input = CircuitInput::new().scalar("move", 1)?.scalar("secret", 42)?;
//! let proof = orchestrator.prove(input).await?;
//! println!("{:?}", proof.proof.to_hex_strings());
//! # Ok(())
//! # }
//! ```

pub mod circuit;
pub mod error;
pub mod evaluator;
pub mod ffi;
pub mod orchestrator;
pub mod prover;
pub mod witness;

pub use circuit::groth16::{CircuitKeys, fingerprint};
pub use circuit::{CIRCUIT_NAMES, NativeCircuit, circuit_by_name};
pub use error::{InputError, ProofError};
pub use evaluator::{CircuitEvaluator, EvaluatorAdapter, NativeEvaluator, SharedEvaluator};
pub use orchestrator::{
    CanonicalProof, GeneratedProof, ProofContext, ProofOrchestrator, ProofTimings, verify_canonical,
};
pub use prover::{
    BackendKind, BackendOutput, BridgedBackend, FilePathBackend, InMemoryBackend, ProofBackend,
    ProvingKeyRef, RawProof,
};
pub use witness::{CircuitInput, WitnessAssembler, WitnessBuffer, WitnessOutput};

/// Builds a mutex-guarded native evaluator for a registered circuit.
pub fn shared_evaluator(circuit: &str) -> Result<SharedEvaluator, ProofError> {
    let circuit = circuit_by_name(circuit)
        .ok_or_else(|| ProofError::EvaluatorFault(format!("unknown circuit `{circuit}`")))?;
    let engine = NativeEvaluator::new(circuit).map_err(|e| ProofError::EvaluatorFault(e.to_string()))?;
    Ok(SharedEvaluator::new(Box::new(engine)))
}
