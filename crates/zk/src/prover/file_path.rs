//! File-path backend: the prover reads the key from disk itself.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use memmap2::Mmap;
use tracing::debug;

use super::{BackendKind, BackendOutput, ProofBackend, ProvingKeyRef, prove_blob};
use crate::ProofError;
use crate::witness::{FieldCodec, WitnessBuffer};

/// A proving module reachable by key path and base64 witness.
///
/// Returns `{"proof": …, "public_signals": […]}` JSON, the shape native
/// snarkjs-style provers hand back.
pub trait ProvingModule: Send + Sync {
    fn groth16_prove(&self, zkey_path: &Path, witness_base64: &str) -> Result<String, ProofError>;
}

/// In-process module that memory-maps the key file for each call.
#[derive(Clone, Copy, Debug, Default)]
pub struct MmapProvingModule;

impl ProvingModule for MmapProvingModule {
    fn groth16_prove(&self, zkey_path: &Path, witness_base64: &str) -> Result<String, ProofError> {
        let file = File::open(zkey_path)
            .map_err(|e| ProofError::KeyUnavailable(format!("{}: {e}", zkey_path.display())))?;
        // SAFETY: key files are written once by setup and not modified
        // while a proof holds the mapping.
        let mmap = unsafe { Mmap::map(&file) }
            .map_err(|e| ProofError::KeyUnavailable(format!("{}: {e}", zkey_path.display())))?;
        debug!(path = %zkey_path.display(), bytes = mmap.len(), "mapped proving key");

        let witness = WitnessBuffer::from_base64(witness_base64, FieldCodec::bn254().n32())?;
        let output = prove_blob(BackendKind::FilePath, &mmap, &witness)?;
        serde_json::to_string(&output).map_err(|e| ProofError::SerializationError(e.to_string()))
    }
}

pub struct FilePathBackend {
    module: Arc<dyn ProvingModule>,
}

impl FilePathBackend {
    pub fn new(module: Arc<dyn ProvingModule>) -> Self {
        Self { module }
    }
}

impl Default for FilePathBackend {
    fn default() -> Self {
        Self::new(Arc::new(MmapProvingModule))
    }
}

#[async_trait]
impl ProofBackend for FilePathBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::FilePath
    }

    async fn prove(
        &self,
        witness: WitnessBuffer,
        key: &ProvingKeyRef,
    ) -> Result<BackendOutput, ProofError> {
        let ProvingKeyRef::Path(path) = key else {
            return Err(ProofError::KeyUnavailable(
                "file-path backend needs a proving key path".to_string(),
            ));
        };
        let path = path.clone();
        let encoded = witness.to_base64();
        drop(witness);

        let module = Arc::clone(&self.module);
        let json = tokio::task::spawn_blocking(move || module.groth16_prove(&path, &encoded))
            .await
            .map_err(|e| ProofError::backend(BackendKind::FilePath, format!("prover task failed: {e}")))??;

        serde_json::from_str(&json).map_err(|e| {
            ProofError::backend(BackendKind::FilePath, format!("malformed module output: {e}"))
        })
    }
}
