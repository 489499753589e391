//! Background proof worker.
//!
//! Receives proof requests over a bounded channel and answers each through
//! its oneshot reply. Every request runs as its own task: requests for
//! different circuits prove in parallel, while requests for the same circuit
//! queue on that circuit's evaluator lock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use zk::{CircuitInput, GeneratedProof, ProofOrchestrator};

use crate::api::{Result, RuntimeError};
use crate::workers::ProofMetrics;

/// Commands accepted by the prover worker.
pub enum Command {
    Prove {
        circuit: String,
        input: CircuitInput,
        reply: oneshot::Sender<Result<GeneratedProof>>,
    },
    /// Stop accepting requests, finish in-flight ones, then exit.
    Shutdown { reply: oneshot::Sender<()> },
}

pub struct ProverWorker {
    orchestrators: HashMap<String, ProofOrchestrator>,
    command_rx: mpsc::Receiver<Command>,
    metrics: Arc<ProofMetrics>,
    save_proofs_dir: Option<PathBuf>,
}

impl ProverWorker {
    pub fn new(
        orchestrators: HashMap<String, ProofOrchestrator>,
        command_rx: mpsc::Receiver<Command>,
        metrics: Arc<ProofMetrics>,
        save_proofs_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            orchestrators,
            command_rx,
            metrics,
            save_proofs_dir,
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        info!(circuits = self.orchestrators.len(), "ProverWorker started");
        let mut in_flight = JoinSet::new();
        let mut shutdown_reply = None;

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(Command::Prove { circuit, input, reply }) => {
                        self.dispatch(&mut in_flight, circuit, input, reply);
                    }
                    Some(Command::Shutdown { reply }) => {
                        shutdown_reply = Some(reply);
                        break;
                    }
                    None => break,
                },
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        error!("proof task panicked: {e}");
                    }
                }
            }
        }

        // Requests already queued behind the shutdown get an error reply.
        self.command_rx.close();
        while let Some(cmd) = self.command_rx.recv().await {
            if let Command::Prove { reply, .. } = cmd {
                self.metrics.dequeue();
                let _ = reply.send(Err(RuntimeError::CommandChannelClosed));
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                error!("proof task panicked: {e}");
            }
        }

        info!(
            generated = self.metrics.generated(),
            failed = self.metrics.failed(),
            "ProverWorker stopped"
        );
        if let Some(reply) = shutdown_reply {
            let _ = reply.send(());
        }
    }

    fn dispatch(
        &self,
        in_flight: &mut JoinSet<()>,
        circuit: String,
        input: CircuitInput,
        reply: oneshot::Sender<Result<GeneratedProof>>,
    ) {
        let Some(orchestrator) = self.orchestrators.get(&circuit).cloned() else {
            self.metrics.record_failure("unknown_circuit");
            self.metrics.dequeue();
            let _ = reply.send(Err(RuntimeError::UnknownCircuit(circuit)));
            return;
        };

        let metrics = Arc::clone(&self.metrics);
        let save_dir = self.save_proofs_dir.clone();

        in_flight.spawn(async move {
            debug!(%circuit, "proof task started");
            let result = orchestrator.prove(input).await;
            metrics.dequeue();

            let result = match result {
                Ok(proof) => {
                    metrics.record_success(proof.timings.witness, proof.timings.proving);
                    if let Some(dir) = save_dir {
                        save_proof_to_file(&dir, &proof).await;
                    }
                    Ok(proof)
                }
                Err(e) => {
                    error!(%circuit, category = e.category(), "proof generation failed: {e}");
                    metrics.record_failure(e.category());
                    Err(RuntimeError::from(e))
                }
            };

            if reply.send(result).is_err() {
                debug!(%circuit, "requester dropped before the proof was ready");
            }
        });
    }
}

/// Writes `proof_{circuit}_{timestamp}.json` into `dir`; failures only warn.
async fn save_proof_to_file(dir: &Path, proof: &GeneratedProof) {
    use tokio::fs;

    if let Err(e) = fs::create_dir_all(dir).await {
        warn!("Failed to create proof directory {:?}: {}", dir, e);
        return;
    }

    let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.6fZ");
    let filepath = dir.join(format!("proof_{}_{}.json", proof.circuit, stamp));

    let json = match serde_json::to_vec_pretty(proof) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize proof for {:?}: {}", filepath, e);
            return;
        }
    };

    match fs::write(&filepath, &json).await {
        Ok(()) => info!(
            "Proof saved: {} ({} bytes, backend: {})",
            filepath.display(),
            json.len(),
            proof.backend
        ),
        Err(e) => warn!("Failed to save proof to {:?}: {}", filepath, e),
    }
}
