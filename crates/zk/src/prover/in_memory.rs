//! In-memory backend: a dedicated prover thread fed by value.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, mpsc};
use std::thread;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use super::{BackendKind, BackendOutput, ProofBackend, ProvingKeyRef, prove_with_key};
use crate::ProofError;
use crate::circuit::groth16::{CircuitKeys, fingerprint};
use crate::witness::WitnessBuffer;

type ProveFn = fn(&CircuitKeys, &WitnessBuffer) -> Result<BackendOutput, String>;

struct ProveJob {
    witness: WitnessBuffer,
    key: Arc<[u8]>,
    reply: oneshot::Sender<Result<BackendOutput, ProofError>>,
}

/// Sends jobs to one prover thread, which handles them in arrival order.
///
/// The thread keeps the most recently parsed key, so repeated proofs for
/// the same circuit skip key deserialization. It exits when the backend
/// is dropped.
pub struct InMemoryBackend {
    jobs: mpsc::Sender<ProveJob>,
}

impl InMemoryBackend {
    pub fn spawn() -> Result<Self, ProofError> {
        Self::spawn_with(prove_with_key)
    }

    fn spawn_with(prove: ProveFn) -> Result<Self, ProofError> {
        let (jobs, queue) = mpsc::channel::<ProveJob>();
        thread::Builder::new()
            .name("rps-prover".to_string())
            .spawn(move || prover_thread(queue, prove))
            .map_err(|e| ProofError::backend(BackendKind::InMemory, format!("spawn failed: {e}")))?;
        Ok(Self { jobs })
    }
}

fn prover_thread(queue: mpsc::Receiver<ProveJob>, prove: ProveFn) {
    let mut cached: Option<(String, CircuitKeys)> = None;

    while let Ok(job) = queue.recv() {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            run_job(&mut cached, &job.key, &job.witness, prove)
        }));
        let result = match outcome {
            Ok(result) => result,
            Err(_) => {
                error!("prover panicked; dropping cached key");
                cached = None;
                Err(ProofError::backend(BackendKind::InMemory, "prover panicked"))
            }
        };
        drop(job.witness);
        if job.reply.send(result).is_err() {
            warn!("proof requester went away before completion");
        }
    }
    info!("prover thread stopped");
}

fn run_job(
    cached: &mut Option<(String, CircuitKeys)>,
    key: &[u8],
    witness: &WitnessBuffer,
    prove: ProveFn,
) -> Result<BackendOutput, ProofError> {
    let digest = fingerprint(key);
    if cached.as_ref().map(|(d, _)| d) != Some(&digest) {
        let keys = CircuitKeys::from_bytes(key)?;
        debug!(key = %digest, "prover thread loaded key");
        *cached = Some((digest, keys));
    }

    match cached {
        Some((_, keys)) => {
            prove(keys, witness).map_err(|message| ProofError::backend(BackendKind::InMemory, message))
        }
        None => Err(ProofError::KeyUnavailable("no key loaded".to_string())),
    }
}

#[async_trait]
impl ProofBackend for InMemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::InMemory
    }

    async fn prove(
        &self,
        witness: WitnessBuffer,
        key: &ProvingKeyRef,
    ) -> Result<BackendOutput, ProofError> {
        let key = key.load().await?;
        let (reply, response) = oneshot::channel();
        self.jobs
            .send(ProveJob {
                witness,
                key,
                reply,
            })
            .map_err(|_| ProofError::backend(BackendKind::InMemory, "prover thread is gone"))?;

        response.await.map_err(|_| {
            ProofError::backend(BackendKind::InMemory, "prover thread dropped the request")
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::AttestValidMove;
    use ark_std::test_rng;

    fn panics_on_first_word(_: &CircuitKeys, witness: &WitnessBuffer) -> Result<BackendOutput, String> {
        if witness.as_bytes()[0] == 0xff {
            panic!("corrupt witness");
        }
        Err("declined".to_string())
    }

    fn witness(first: u8) -> WitnessBuffer {
        let mut bytes = vec![0u8; 32];
        bytes[0] = first;
        WitnessBuffer::from_bytes(bytes, 8).unwrap()
    }

    #[tokio::test]
    async fn test_panicking_job_leaves_the_thread_serving() {
        let keys = CircuitKeys::setup(Arc::new(AttestValidMove), &mut test_rng()).unwrap();
        let key = ProvingKeyRef::from_bytes(keys.to_bytes().unwrap());
        let backend = InMemoryBackend::spawn_with(panics_on_first_word).unwrap();

        let err = backend.prove(witness(0xff), &key).await.unwrap_err();
        assert!(matches!(
            err,
            ProofError::BackendFault { backend: BackendKind::InMemory, ref message }
                if message == "prover panicked"
        ));

        let err = backend.prove(witness(0), &key).await.unwrap_err();
        assert!(matches!(
            err,
            ProofError::BackendFault { ref message, .. } if message == "declined"
        ));
    }
}
