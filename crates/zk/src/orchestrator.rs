//! Proof orchestration: witness assembly, backend dispatch, canonical layout.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ark_bn254::{Bn254, Fr as Fp254};
use ark_groth16::{Proof, VerifyingKey};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ProofError;
use crate::circuit::groth16;
use crate::evaluator::SharedEvaluator;
use crate::prover::{BackendKind, ProofBackend, ProvingKeyRef, RawProof, proof_from_coordinates};
use crate::witness::{CircuitInput, WitnessAssembler, WitnessOutput};

/// Everything a proof request needs besides its input.
#[derive(Clone)]
pub struct ProofContext {
    pub backend: Arc<dyn ProofBackend>,
    pub proving_key: ProvingKeyRef,
    /// Public signals read from witness indices `1..=num_signals`.
    pub num_signals: usize,
    pub sanity_check: bool,
}

impl fmt::Debug for ProofContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProofContext")
            .field("backend", &self.backend.kind())
            .field("proving_key", &self.proving_key)
            .field("num_signals", &self.num_signals)
            .field("sanity_check", &self.sanity_check)
            .finish()
    }
}

/// Groth16 proof in verifier calldata order:
/// `[A.x, A.y, B[0].y, B[0].x, B[1].y, B[1].x, C.x, C.y]`.
///
/// `B[k]` is the raw `[c0, c1]` pair, so each pair is swapped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[String; 8]", into = "[String; 8]")]
pub struct CanonicalProof([BigUint; 8]);

impl CanonicalProof {
    pub fn from_raw(raw: &RawProof) -> Result<Self, ProofError> {
        let ordered = [
            &raw.pi_a[0],
            &raw.pi_a[1],
            &raw.pi_b[0][1],
            &raw.pi_b[0][0],
            &raw.pi_b[1][1],
            &raw.pi_b[1][0],
            &raw.pi_c[0],
            &raw.pi_c[1],
        ];
        let mut elements: [BigUint; 8] = Default::default();
        for (slot, text) in elements.iter_mut().zip(ordered) {
            *slot = parse_decimal(text)?;
        }
        Ok(Self(elements))
    }

    pub fn elements(&self) -> &[BigUint; 8] {
        &self.0
    }

    pub fn to_decimal_strings(&self) -> [String; 8] {
        self.0.clone().map(|v| v.to_string())
    }

    /// `0x`-prefixed, zero-padded to 32 bytes.
    pub fn to_hex_strings(&self) -> [String; 8] {
        self.0.clone().map(|v| format!("0x{v:064x}"))
    }

    pub fn to_ark(&self) -> Result<Proof<Bn254>, ProofError> {
        proof_from_coordinates(&self.0)
    }
}

impl TryFrom<[String; 8]> for CanonicalProof {
    type Error = ProofError;

    fn try_from(texts: [String; 8]) -> Result<Self, Self::Error> {
        let mut elements: [BigUint; 8] = Default::default();
        for (slot, text) in elements.iter_mut().zip(&texts) {
            *slot = parse_decimal(text)?;
        }
        Ok(Self(elements))
    }
}

impl From<CanonicalProof> for [String; 8] {
    fn from(proof: CanonicalProof) -> Self {
        proof.to_decimal_strings()
    }
}

fn parse_decimal(text: &str) -> Result<BigUint, ProofError> {
    text.parse::<BigUint>()
        .map_err(|e| ProofError::SerializationError(format!("`{text}` is not a decimal integer: {e}")))
}

/// Verifies a canonical proof against `public_inputs` (every public
/// variable, in witness order).
pub fn verify_canonical(
    proof: &CanonicalProof,
    public_inputs: &[BigUint],
    vk: &VerifyingKey<Bn254>,
) -> Result<bool, ProofError> {
    let proof = proof.to_ark()?;
    let inputs: Vec<Fp254> = public_inputs.iter().map(|v| Fp254::from(v.clone())).collect();
    groth16::verify(&proof, &inputs, vk)
}

/// Wall-clock time spent in each stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProofTimings {
    pub witness: Duration,
    pub proving: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedProof {
    pub circuit: String,
    pub backend: BackendKind,
    pub proof: CanonicalProof,
    /// Decimal public signals from witness indices `1..=num_signals`.
    #[serde(with = "decimal_vec")]
    pub public_signals: Vec<BigUint>,
    #[serde(skip)]
    pub timings: ProofTimings,
}

/// Drives one evaluator and one backend.
#[derive(Clone, Debug)]
pub struct ProofOrchestrator {
    evaluator: SharedEvaluator,
    context: ProofContext,
}

impl ProofOrchestrator {
    pub fn new(evaluator: SharedEvaluator, context: ProofContext) -> Self {
        Self { evaluator, context }
    }

    pub fn context(&self) -> &ProofContext {
        &self.context
    }

    /// Assembles the witness off the async executor.
    pub async fn witness(&self, input: CircuitInput) -> Result<WitnessOutput, ProofError> {
        let evaluator = self.evaluator.clone();
        let num_signals = self.context.num_signals;
        let sanity_check = self.context.sanity_check;

        tokio::task::spawn_blocking(move || {
            let mut adapter = evaluator.lock()?;
            WitnessAssembler::new(&mut adapter).assemble(&input, num_signals, sanity_check)
        })
        .await
        .map_err(|e| ProofError::EvaluatorFault(format!("witness task failed: {e}")))?
    }

    /// Full pipeline: witness, backend proof, canonical reshape.
    pub async fn prove(&self, input: CircuitInput) -> Result<GeneratedProof, ProofError> {
        let circuit = self.evaluator.circuit_name().to_string();
        let backend = self.context.backend.kind();
        info!(%circuit, %backend, "proof requested");

        let started = Instant::now();
        let witness = self.witness(input).await?;
        let witness_time = started.elapsed();
        debug!(%circuit, elements = witness.buffer.len(), ?witness_time, "witness ready");

        let started = Instant::now();
        let output = self
            .context
            .backend
            .prove(witness.buffer, &self.context.proving_key)
            .await?;
        let proving_time = started.elapsed();

        let backend_signals = output
            .public_signals
            .iter()
            .map(|s| parse_decimal(s))
            .collect::<Result<Vec<_>, _>>()?;
        if !backend_signals.starts_with(&witness.public_signals) {
            return Err(ProofError::backend(
                backend,
                "public signals disagree with the assembled witness",
            ));
        }

        let proof = CanonicalProof::from_raw(&output.proof)?;
        info!(%circuit, %backend, ?proving_time, "proof generated");

        Ok(GeneratedProof {
            circuit,
            backend,
            proof,
            public_signals: witness.public_signals,
            timings: ProofTimings {
                witness: witness_time,
                proving: proving_time,
            },
        })
    }
}

mod decimal_vec {
    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(values: &[BigUint], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| v.to_string()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<BigUint>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|s| s.parse().map_err(D::Error::custom))
            .collect()
    }
}
