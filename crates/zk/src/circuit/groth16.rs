//! Groth16 keys and proving over BN254.
//!
//! Proving-key blobs carry the circuit's R1CS matrices next to the
//! arkworks `ProvingKey`, so a witness vector alone is enough to prove:
//!
//! ```text
//! "RPSZKEY1" ‖ ProvingKey (compressed) ‖ matrices
//! matrices = n_instance u64 ‖ n_witness u64 ‖ n_constraints u64 ‖ A ‖ B ‖ C
//! matrix   = rows u64 ‖ { entries u64 ‖ { coeff Fr ‖ column u64 } }
//! ```
//!
//! Verifying keys are stored separately as a compressed `VerifyingKey`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ark_bn254::{Bn254, Fr as Fp254};
use ark_ff::{One, UniformRand, Zero};
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof, ProvingKey, VerifyingKey};
use ark_relations::r1cs::{
    ConstraintMatrices, ConstraintSystem, Matrix, OptimizationGoal, SynthesisError, SynthesisMode,
};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, Read, Write};
use ark_std::rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::{CircuitSynthesis, NativeCircuit};
use crate::ProofError;

/// Leading bytes of every proving-key blob.
pub const KEY_MAGIC: &[u8; 8] = b"RPSZKEY1";

/// Reasons a witness vector cannot be proven against a key.
#[derive(Debug, Error)]
pub enum ProvingError {
    #[error("witness has {actual} elements, key expects {expected}")]
    WitnessLength { expected: usize, actual: usize },

    #[error("witness element 0 is not the constant one")]
    MissingOne,

    #[error("witness does not satisfy constraint {0}")]
    Unsatisfied(usize),

    #[error("Groth16 proving failed: {0}")]
    Synthesis(#[from] SynthesisError),
}

/// Proving key, verifying key and R1CS matrices of one circuit.
pub struct CircuitKeys {
    pub proving_key: ProvingKey<Bn254>,
    pub verifying_key: VerifyingKey<Bn254>,
    pub matrices: ConstraintMatrices<Fp254>,
}

impl std::fmt::Debug for CircuitKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitKeys")
            .field("num_instance_variables", &self.matrices.num_instance_variables)
            .field("num_witness_variables", &self.matrices.num_witness_variables)
            .field("num_constraints", &self.matrices.num_constraints)
            .finish_non_exhaustive()
    }
}

/// Synthesizes `circuit` in setup mode and returns its constraint matrices.
///
/// Uses the same optimization goal as Groth16 key generation, so the
/// variable layout matches the generated keys.
pub fn circuit_matrices(circuit: &dyn NativeCircuit) -> Result<ConstraintMatrices<Fp254>, ProofError> {
    let cs = ConstraintSystem::<Fp254>::new_ref();
    cs.set_optimization_goal(OptimizationGoal::Constraints);
    cs.set_mode(SynthesisMode::Setup);
    circuit.synthesize(cs.clone(), None).map_err(|e| {
        ProofError::EvaluatorFault(format!("{} setup synthesis failed: {e}", circuit.name()))
    })?;
    cs.finalize();
    cs.to_matrices().ok_or_else(|| {
        ProofError::EvaluatorFault(format!("{} produced no constraint matrices", circuit.name()))
    })
}

impl CircuitKeys {
    /// Circuit-specific Groth16 setup.
    ///
    /// The randomness drawn from `rng` is toxic waste; production keys come
    /// from a ceremony, not from this function.
    pub fn setup<R: RngCore>(circuit: Arc<dyn NativeCircuit>, rng: &mut R) -> Result<Self, ProofError> {
        let matrices = circuit_matrices(circuit.as_ref())?;
        let name = circuit.name();
        let proving_key = Groth16::<Bn254>::generate_random_parameters_with_reduction(
            CircuitSynthesis::setup(circuit),
            rng,
        )
        .map_err(|e| ProofError::KeyUnavailable(format!("{name} key generation failed: {e:?}")))?;

        Ok(Self {
            verifying_key: proving_key.vk.clone(),
            proving_key,
            matrices,
        })
    }

    /// Number of elements a full witness vector must have.
    pub fn witness_len(&self) -> usize {
        self.matrices.num_instance_variables + self.matrices.num_witness_variables
    }

    /// Number of public inputs the verifier expects (excluding the constant).
    pub fn num_public_inputs(&self) -> usize {
        self.matrices.num_instance_variables.saturating_sub(1)
    }

    /// Serializes the proving-key blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProofError> {
        let mut bytes = KEY_MAGIC.to_vec();
        self.proving_key
            .serialize_compressed(&mut bytes)
            .map_err(|e| ProofError::SerializationError(e.to_string()))?;
        write_matrices(&self.matrices, &mut bytes)
            .map_err(|e| ProofError::SerializationError(e.to_string()))?;
        Ok(bytes)
    }

    /// Parses a proving-key blob.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProofError> {
        let mut reader = bytes
            .strip_prefix(KEY_MAGIC.as_slice())
            .ok_or_else(|| ProofError::KeyUnavailable("not a proving-key blob (bad magic)".into()))?;

        let proving_key = ProvingKey::<Bn254>::deserialize_compressed(&mut reader)
            .map_err(|e| ProofError::KeyUnavailable(format!("malformed proving key: {e}")))?;
        let matrices = read_matrices(&mut reader)
            .map_err(|e| ProofError::KeyUnavailable(format!("malformed constraint matrices: {e}")))?;
        if !reader.is_empty() {
            return Err(ProofError::KeyUnavailable(format!(
                "{} trailing bytes after proving key",
                reader.len()
            )));
        }

        Ok(Self {
            verifying_key: proving_key.vk.clone(),
            proving_key,
            matrices,
        })
    }

    pub fn verifying_key_bytes(&self) -> Result<Vec<u8>, ProofError> {
        let mut bytes = Vec::new();
        self.verifying_key
            .serialize_compressed(&mut bytes)
            .map_err(|e| ProofError::SerializationError(e.to_string()))?;
        Ok(bytes)
    }

    /// Writes `<name>.zkey` and `<name>.vkey` into `dir`.
    pub fn write_to_dir(&self, dir: &Path, name: &str) -> Result<(PathBuf, PathBuf), ProofError> {
        std::fs::create_dir_all(dir)
            .map_err(|e| ProofError::KeyUnavailable(format!("{}: {e}", dir.display())))?;
        let zkey = proving_key_path(dir, name);
        let vkey = verifying_key_path(dir, name);
        std::fs::write(&zkey, self.to_bytes()?)
            .map_err(|e| ProofError::KeyUnavailable(format!("{}: {e}", zkey.display())))?;
        std::fs::write(&vkey, self.verifying_key_bytes()?)
            .map_err(|e| ProofError::KeyUnavailable(format!("{}: {e}", vkey.display())))?;
        Ok((zkey, vkey))
    }

    /// Checks every R1CS row `⟨A,z⟩·⟨B,z⟩ = ⟨C,z⟩` for the full assignment `z`.
    pub fn check_witness(&self, assignment: &[Fp254]) -> Result<(), ProvingError> {
        let expected = self.witness_len();
        if assignment.len() != expected {
            return Err(ProvingError::WitnessLength {
                expected,
                actual: assignment.len(),
            });
        }
        if !assignment[0].is_one() {
            return Err(ProvingError::MissingOne);
        }

        let m = &self.matrices;
        for (row, ((a, b), c)) in m.a.iter().zip(&m.b).zip(&m.c).enumerate() {
            let lhs = evaluate_row(a, assignment) * evaluate_row(b, assignment);
            if lhs != evaluate_row(c, assignment) {
                return Err(ProvingError::Unsatisfied(row));
            }
        }
        Ok(())
    }

    /// Proves a full witness vector (`[1, instance…, witness…]`).
    pub fn prove_witness<R: RngCore>(
        &self,
        assignment: &[Fp254],
        rng: &mut R,
    ) -> Result<Proof<Bn254>, ProvingError> {
        self.check_witness(assignment)?;

        let r = Fp254::rand(rng);
        let s = Fp254::rand(rng);
        let proof = Groth16::<Bn254>::create_proof_with_reduction_and_matrices(
            &self.proving_key,
            r,
            s,
            &self.matrices,
            self.matrices.num_instance_variables,
            self.matrices.num_constraints,
            assignment,
        )?;
        Ok(proof)
    }
}

fn evaluate_row(row: &[(Fp254, usize)], assignment: &[Fp254]) -> Fp254 {
    row.iter().fold(Fp254::zero(), |acc, (coeff, column)| {
        acc + *coeff * assignment.get(*column).copied().unwrap_or_default()
    })
}

pub fn proving_key_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.zkey"))
}

pub fn verifying_key_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.vkey"))
}

/// SHA-256 of a key blob, lower-case hex.
pub fn fingerprint(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

pub fn deserialize_verifying_key(bytes: &[u8]) -> Result<VerifyingKey<Bn254>, ProofError> {
    VerifyingKey::<Bn254>::deserialize_compressed(bytes)
        .map_err(|e| ProofError::KeyUnavailable(format!("malformed verifying key: {e}")))
}

/// Verify a Groth16 proof against the circuit's public inputs.
pub fn verify(
    proof: &Proof<Bn254>,
    public_inputs: &[Fp254],
    vk: &VerifyingKey<Bn254>,
) -> Result<bool, ProofError> {
    let pvk = prepare_verifying_key(vk);
    verify_with_prepared_vk(proof, public_inputs, &pvk)
}

pub fn prepare_verifying_key(vk: &VerifyingKey<Bn254>) -> PreparedVerifyingKey<Bn254> {
    ark_groth16::prepare_verifying_key(vk)
}

pub fn verify_with_prepared_vk(
    proof: &Proof<Bn254>,
    public_inputs: &[Fp254],
    pvk: &PreparedVerifyingKey<Bn254>,
) -> Result<bool, ProofError> {
    Groth16::<Bn254>::verify_proof(pvk, proof, public_inputs).map_err(|e| {
        ProofError::SerializationError(format!("Groth16 verification failed: {e:?}"))
    })
}

fn write_matrices<W: Write>(
    m: &ConstraintMatrices<Fp254>,
    mut writer: W,
) -> Result<(), ark_serialize::SerializationError> {
    (m.num_instance_variables as u64).serialize_compressed(&mut writer)?;
    (m.num_witness_variables as u64).serialize_compressed(&mut writer)?;
    (m.num_constraints as u64).serialize_compressed(&mut writer)?;
    for matrix in [&m.a, &m.b, &m.c] {
        (matrix.len() as u64).serialize_compressed(&mut writer)?;
        for row in matrix {
            (row.len() as u64).serialize_compressed(&mut writer)?;
            for (coeff, column) in row {
                coeff.serialize_compressed(&mut writer)?;
                (*column as u64).serialize_compressed(&mut writer)?;
            }
        }
    }
    Ok(())
}

fn read_len<R: Read>(reader: &mut R) -> Result<usize, ark_serialize::SerializationError> {
    let value = u64::deserialize_compressed(reader)?;
    usize::try_from(value).map_err(|_| ark_serialize::SerializationError::InvalidData)
}

fn read_matrices<R: Read>(
    mut reader: R,
) -> Result<ConstraintMatrices<Fp254>, ark_serialize::SerializationError> {
    let num_instance_variables = read_len(&mut reader)?;
    let num_witness_variables = read_len(&mut reader)?;
    let num_constraints = read_len(&mut reader)?;
    let num_variables = num_instance_variables + num_witness_variables;

    let mut matrices: Vec<Matrix<Fp254>> = Vec::with_capacity(3);
    for _ in 0..3 {
        let rows = read_len(&mut reader)?;
        if rows != num_constraints {
            return Err(ark_serialize::SerializationError::InvalidData);
        }
        let mut matrix = Vec::new();
        for _ in 0..rows {
            let entries = read_len(&mut reader)?;
            let mut row = Vec::new();
            for _ in 0..entries {
                let coeff = Fp254::deserialize_compressed(&mut reader)?;
                let column = read_len(&mut reader)?;
                if column >= num_variables {
                    return Err(ark_serialize::SerializationError::InvalidData);
                }
                row.push((coeff, column));
            }
            matrix.push(row);
        }
        matrices.push(matrix);
    }

    let c = matrices.pop().unwrap_or_default();
    let b = matrices.pop().unwrap_or_default();
    let a = matrices.pop().unwrap_or_default();
    let non_zero = |m: &Matrix<Fp254>| m.iter().map(Vec::len).sum();

    Ok(ConstraintMatrices {
        num_instance_variables,
        num_witness_variables,
        num_constraints,
        a_num_non_zero: non_zero(&a),
        b_num_non_zero: non_zero(&b),
        c_num_non_zero: non_zero(&c),
        a,
        b,
        c,
    })
}
