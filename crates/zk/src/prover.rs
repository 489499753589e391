//! Proving backends.
//!
//! Every backend implements [`ProofBackend`]: take a witness buffer and a
//! proving-key reference, return a snarkjs-shaped [`RawProof`] with the
//! public signals. Backends differ only in how the witness and key reach
//! the Groth16 prover:
//!
//! - [`FilePathBackend`]: base64 witness + key path handed to a
//!   [`ProvingModule`], which memory-maps the key.
//! - [`InMemoryBackend`]: witness and key bytes moved to a dedicated
//!   prover thread, answered over a oneshot channel.
//! - [`BridgedBackend`]: the C ABI entry point, with fixed buffer bounds.

mod bridged;
mod file_path;
mod in_memory;

use std::path::PathBuf;
use std::sync::Arc;

use ark_bn254::{Bn254, Fq, Fq2, Fr as Fp254, G1Affine, G2Affine};
use ark_groth16::Proof;
use async_trait::async_trait;
use num_bigint::BigUint;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use tracing::debug;

use crate::ProofError;
use crate::circuit::groth16::{CircuitKeys, fingerprint};
use crate::witness::{FieldCodec, WitnessBuffer};

pub use bridged::{BridgedBackend, MAX_ERROR_BYTES, MAX_WITNESS_BYTES, ProveFn};
pub use file_path::{FilePathBackend, MmapProvingModule, ProvingModule};
pub use in_memory::InMemoryBackend;

/// Identifies which proving backend generated a proof.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum BackendKind {
    FilePath,
    InMemory,
    Bridged,
}

/// Where a proving-key blob lives.
#[derive(Clone, Debug)]
pub enum ProvingKeyRef {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

impl ProvingKeyRef {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Loads the key fully into memory.
    pub async fn load(&self) -> Result<Arc<[u8]>, ProofError> {
        match self {
            Self::Bytes(bytes) => Ok(bytes.clone()),
            Self::Path(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|e| ProofError::KeyUnavailable(format!("{}: {e}", path.display())))?;
                Ok(bytes.into())
            }
        }
    }
}

/// Groth16 proof in snarkjs JSON layout (decimal coordinates).
///
/// `pi_b` holds `[[x.c0, x.c1], [y.c0, y.c1], ["1", "0"]]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProof {
    pub pi_a: [String; 3],
    pub pi_b: [[String; 2]; 3],
    pub pi_c: [String; 3],
    pub protocol: String,
    pub curve: String,
}

impl RawProof {
    pub fn from_ark(proof: &Proof<Bn254>) -> Self {
        let dec = |v: Fq| BigUint::from(v).to_string();
        let one = || "1".to_string();
        Self {
            pi_a: [dec(proof.a.x), dec(proof.a.y), one()],
            pi_b: [
                [dec(proof.b.x.c0), dec(proof.b.x.c1)],
                [dec(proof.b.y.c0), dec(proof.b.y.c1)],
                [one(), "0".to_string()],
            ],
            pi_c: [dec(proof.c.x), dec(proof.c.y), one()],
            protocol: "groth16".to_string(),
            curve: "bn128".to_string(),
        }
    }
}

/// Backend result: raw proof plus every public signal, as decimal strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendOutput {
    pub proof: RawProof,
    pub public_signals: Vec<String>,
}

/// One proving strategy.
#[async_trait]
pub trait ProofBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Proves `witness` against the key. All-or-nothing; the witness is
    /// consumed and wiped when the call returns.
    async fn prove(
        &self,
        witness: WitnessBuffer,
        key: &ProvingKeyRef,
    ) -> Result<BackendOutput, ProofError>;
}

/// Parses a witness buffer into field elements, rejecting non-canonical ones.
pub fn witness_field_elements(witness: &WitnessBuffer) -> Result<Vec<Fp254>, String> {
    let codec = FieldCodec::bn254();
    if witness.n32() != codec.n32() {
        return Err(format!(
            "witness uses {} limbs per element, BN254 needs {}",
            witness.n32(),
            codec.n32()
        ));
    }

    witness
        .elements()
        .enumerate()
        .map(|(index, value)| {
            if &value >= codec.prime() {
                Err(format!("witness element {index} is not reduced"))
            } else {
                Ok(Fp254::from(value))
            }
        })
        .collect()
}

/// Groth16 proving over a key blob. Shared by every backend.
pub fn prove_with_key(
    keys: &CircuitKeys,
    witness: &WitnessBuffer,
) -> Result<BackendOutput, String> {
    let assignment = witness_field_elements(witness)?;
    let proof = keys
        .prove_witness(&assignment, &mut OsRng)
        .map_err(|e| e.to_string())?;

    let public_signals = assignment[1..keys.matrices.num_instance_variables]
        .iter()
        .map(|v| BigUint::from(*v).to_string())
        .collect();
    Ok(BackendOutput {
        proof: RawProof::from_ark(&proof),
        public_signals,
    })
}

/// Parses a key blob and proves. Key errors map to `KeyUnavailable`,
/// proving errors to a fault of `kind`.
pub(crate) fn prove_blob(
    kind: BackendKind,
    key_bytes: &[u8],
    witness: &WitnessBuffer,
) -> Result<BackendOutput, ProofError> {
    debug!(backend = %kind, key = %fingerprint(key_bytes), "loading proving key");
    let keys = CircuitKeys::from_bytes(key_bytes)?;
    prove_with_key(&keys, witness).map_err(|message| ProofError::backend(kind, message))
}

/// Maps canonical-order coordinates back to curve points, checking each is
/// on the curve and in the prime-order subgroup.
pub(crate) fn proof_from_coordinates(coords: &[BigUint; 8]) -> Result<Proof<Bn254>, ProofError> {
    let q: BigUint = <Fq as ark_ff::PrimeField>::MODULUS.into();
    let fq = |v: &BigUint| {
        if v >= &q {
            Err(ProofError::SerializationError(
                "proof coordinate exceeds the base field".to_string(),
            ))
        } else {
            Ok(Fq::from(v.clone()))
        }
    };

    let a = G1Affine::new_unchecked(fq(&coords[0])?, fq(&coords[1])?);
    let b = G2Affine::new_unchecked(
        Fq2::new(fq(&coords[3])?, fq(&coords[2])?),
        Fq2::new(fq(&coords[5])?, fq(&coords[4])?),
    );
    let c = G1Affine::new_unchecked(fq(&coords[6])?, fq(&coords[7])?);

    let valid_g1 = |p: &G1Affine| p.is_on_curve() && p.is_in_correct_subgroup_assuming_on_curve();
    let valid_g2 = |p: &G2Affine| p.is_on_curve() && p.is_in_correct_subgroup_assuming_on_curve();
    if !(valid_g1(&a) && valid_g2(&b) && valid_g1(&c)) {
        return Err(ProofError::SerializationError(
            "proof point is not on the curve".to_string(),
        ));
    }
    Ok(Proof { a, b, c })
}
